use crate::{Action, StoreImpl};
use std::ops::Deref;
use std::sync::Arc;

/// DroppableStore disposes the wrapped store when it goes out of scope.
///
/// Other clones of the `Arc<StoreImpl>` stay valid, but every operation on them
/// then fails with [`StoreError::StoreDisposedError`](crate::StoreError::StoreDisposedError).
pub struct DroppableStore<A>
where
    A: Action,
{
    inner: Arc<StoreImpl<A>>,
}

impl<A> DroppableStore<A>
where
    A: Action,
{
    pub fn new(store: Arc<StoreImpl<A>>) -> Self {
        Self { inner: store }
    }
}

impl<A> Drop for DroppableStore<A>
where
    A: Action,
{
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl<A> Deref for DroppableStore<A>
where
    A: Action,
{
    type Target = Arc<StoreImpl<A>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
