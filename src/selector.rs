use crate::State;
use std::marker::PhantomData;

/// Selector is a function that selects a part of the state.
pub trait Selector<Output> {
    /// Selects a part of the state.
    fn select(&self, state: &State) -> Output;
}

/// FnSelector is a selector that is a function.
pub struct FnSelector<F, Output>
where
    F: Fn(&State) -> Output,
{
    func: F,
    _marker: PhantomData<fn() -> Output>,
}

impl<F, Output> Selector<Output> for FnSelector<F, Output>
where
    F: Fn(&State) -> Output,
{
    fn select(&self, state: &State) -> Output {
        (self.func)(state)
    }
}

impl<F, Output> From<F> for FnSelector<F, Output>
where
    F: Fn(&State) -> Output,
{
    fn from(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}
