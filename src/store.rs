use crate::{Action, BoxError, State, Subscriber, Subscription};
use std::sync::Arc;

/// Default name of a store, used in logs
pub const DEFAULT_STORE_NAME: &str = "store";

/// StoreError represents an error that occurred in the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// the store was set up with an invalid registry or initial state
    #[error("configuration error: {0}")]
    ConfigurationError(String),
    /// a reducer failed, the dispatch was abandoned
    #[error("reducer error in slice '{slice}': {source}")]
    ReducerError {
        slice: String,
        #[source]
        source: BoxError,
    },
    #[error("store '{0}' is disposed")]
    StoreDisposedError(String),
}

/// Store holds the composed state of named slices.
///
/// The state is replaced only through `dispatch`, every successful dispatch is
/// followed by a synchronous notification of all subscribers in registration order.
///
/// [`StoreImpl`](crate::StoreImpl) is the default implementation, user code should depend on this trait.
pub trait Store<A>: Send + Sync
where
    A: Action,
{
    /// Get the current state.
    ///
    /// The same `Arc` is returned until the next successful dispatch.
    fn get_state(&self) -> Arc<State>;

    /// Dispatch an action
    ///
    /// ### Return
    /// * Ok(()) : the action was reduced and subscribers were notified,
    ///   or the action was queued because a dispatch is in flight on this thread
    /// * Err(StoreError::ReducerError) : a reducer failed, state and subscribers are untouched
    /// * Err(StoreError::StoreDisposedError) : the store is disposed
    fn dispatch(&self, action: A) -> Result<(), StoreError>;

    /// Add a subscriber to the store.
    /// The subscriber only sees states produced by later dispatches.
    fn subscribe(
        &self,
        subscriber: Arc<dyn Subscriber<A> + Send + Sync>,
    ) -> Result<Box<dyn Subscription>, StoreError>;

    /// Remove the first registration of `subscriber`, returns false if it was not registered
    fn unsubscribe(&self, subscriber: &Arc<dyn Subscriber<A> + Send + Sync>) -> bool;

    /// Dispose the store, subsequent `dispatch` and `subscribe` calls fail
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}
