use std::fmt::Debug;

/// Action describes an intended state transition.
///
/// Actions are plain immutable values, usually a closed enum per domain.
/// `action_type` is the string discriminator used in logs and metrics.
pub trait Action: Clone + Debug + Send + Sync + 'static {
    fn action_type(&self) -> &str;
}

/// AsAction projects a store-wide action onto a domain action.
///
/// A reducer written for a domain action `D` can be registered in a store whose
/// action type wraps `D`, it only sees the actions for which `as_action` returns `Some`.
pub trait AsAction<D> {
    fn as_action(&self) -> Option<&D>;
}

impl<D> AsAction<D> for D {
    fn as_action(&self) -> Option<&D> {
        Some(self)
    }
}
