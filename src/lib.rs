pub mod action;
pub use action::*;

pub mod state;
pub use state::*;

pub mod reducer;
pub use reducer::*;

pub mod store_impl;
pub use store_impl::*;

pub mod builder;
pub use builder::*;

pub mod metrics;
pub use metrics::{CountMetrics, Metrics, MetricsSnapshot};

pub mod subscriber;
pub use subscriber::*;

pub mod selector;
pub use selector::*;

pub mod store_droppable;
pub use store_droppable::*;

pub mod todo;

pub mod store;
pub use store::*;

#[cfg(test)]
pub(crate) mod test_mock;
