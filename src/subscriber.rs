use std::any::Any;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{same_slice, Action, Selector, SliceRef, State};

/// Subscriber is a trait that can be implemented to receive notifications from the store.
pub trait Subscriber<A>
where
    A: Action,
{
    /// on_notify is called after every successful dispatch with the new state
    /// and the action that produced it.
    fn on_notify(&self, state: &Arc<State>, action: &A);

    /// on_unsubscribe is called when the registration is removed or the store is disposed
    fn on_unsubscribe(&self) {}
}

/// Subscription is a handle to unsubscribe from the store.
///
/// `unsubscribe` removes exactly the registration that created the handle,
/// calling it again does nothing.
pub trait Subscription: Send + Sync {
    fn unsubscribe(&self);
}

/// A registered subscriber, the id tells duplicate registrations apart
pub(crate) struct SubscriberWithId<A>
where
    A: Action,
{
    pub(crate) id: u64,
    pub(crate) subscriber: Arc<dyn Subscriber<A> + Send + Sync>,
}

impl<A> Clone for SubscriberWithId<A>
where
    A: Action,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            subscriber: self.subscriber.clone(),
        }
    }
}

impl<A> SubscriberWithId<A>
where
    A: Action,
{
    pub(crate) fn new(id: u64, subscriber: Arc<dyn Subscriber<A> + Send + Sync>) -> Self {
        Self { id, subscriber }
    }

    pub(crate) fn is(&self, subscriber: &Arc<dyn Subscriber<A> + Send + Sync>) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.subscriber) as *const (),
            Arc::as_ptr(subscriber) as *const (),
        )
    }

    pub(crate) fn on_notify(&self, state: &Arc<State>, action: &A) {
        self.subscriber.on_notify(state, action);
    }

    pub(crate) fn on_unsubscribe(&self) {
        self.subscriber.on_unsubscribe();
    }
}

/// FnSubscriber is a subscriber that is created from a function.
pub struct FnSubscriber<F, A>
where
    F: Fn(&Arc<State>, &A),
{
    func: F,
    _marker: PhantomData<fn(&A)>,
}

impl<F, A> Subscriber<A> for FnSubscriber<F, A>
where
    F: Fn(&Arc<State>, &A),
    A: Action,
{
    fn on_notify(&self, state: &Arc<State>, action: &A) {
        (self.func)(state, action)
    }
}

impl<F, A> From<F> for FnSubscriber<F, A>
where
    F: Fn(&Arc<State>, &A),
{
    fn from(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

/// SelectorSubscriber is a subscriber that has a selector.
/// It is used to subscribe to a specific part of the state.
/// `on_change` is called only when the selected value differs from the last one.
pub struct SelectorSubscriber<A, Select, Output>
where
    A: Action,
    Select: Selector<Output>,
{
    selector: Select,
    last_value: Mutex<Option<Output>>,
    on_change: Box<dyn Fn(Output, &A) + Send + Sync>,
}

impl<A, Select, Output> SelectorSubscriber<A, Select, Output>
where
    A: Action,
    Select: Selector<Output>,
    Output: PartialEq + Clone,
{
    pub fn new<F>(selector: Select, on_change: F) -> Self
    where
        F: Fn(Output, &A) + Send + Sync + 'static,
    {
        Self {
            selector,
            last_value: Mutex::new(None),
            on_change: Box::new(on_change),
        }
    }
}

impl<A, Select, Output> Subscriber<A> for SelectorSubscriber<A, Select, Output>
where
    A: Action,
    Select: Selector<Output>,
    Output: PartialEq + Clone,
{
    fn on_notify(&self, state: &Arc<State>, action: &A) {
        let selected = self.selector.select(state);
        let mut last_value = self.last_value.lock().unwrap_or_else(PoisonError::into_inner);

        match last_value.as_ref() {
            Some(last) if *last == selected => {}
            _ => {
                (self.on_change)(selected.clone(), action);
                *last_value = Some(selected);
            }
        }
    }
}

/// SliceSubscriber watches one slice by identity.
///
/// Reducers return the same `Arc` when nothing changed, so comparing pointers
/// is enough to skip notifications for untouched slices.
pub struct SliceSubscriber<T, A>
where
    T: Any + Send + Sync,
    A: Action,
{
    name: String,
    last: Mutex<Option<SliceRef>>,
    on_change: Box<dyn Fn(Arc<T>, &A) + Send + Sync>,
}

impl<T, A> SliceSubscriber<T, A>
where
    T: Any + Send + Sync,
    A: Action,
{
    /// `initial` is the state the subscriber starts comparing against, usually `store.get_state()`
    pub fn new<F>(name: impl Into<String>, initial: &State, on_change: F) -> Self
    where
        F: Fn(Arc<T>, &A) + Send + Sync + 'static,
    {
        let name = name.into();
        let last = initial.slice_ref(&name).cloned();
        Self {
            name,
            last: Mutex::new(last),
            on_change: Box::new(on_change),
        }
    }
}

impl<T, A> Subscriber<A> for SliceSubscriber<T, A>
where
    T: Any + Send + Sync,
    A: Action,
{
    fn on_notify(&self, state: &Arc<State>, action: &A) {
        let Some(current) = state.slice_ref(&self.name) else {
            return;
        };
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref().is_some_and(|last| same_slice(last, current)) {
            return;
        }
        *last = Some(current.clone());
        drop(last);

        if let Some(typed) = state.slice::<T>(&self.name) {
            (self.on_change)(typed, action);
        }
    }
}
