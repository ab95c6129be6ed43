use crate::state::{InitialState, SliceRef, State};
use crate::{Action, StoreError};
use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Boxed cause of a reducer failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of reducing a slice of type `S`
pub type ReduceResult<S> = Result<Arc<S>, BoxError>;

/// A reducer panicked while reducing its slice
#[derive(Debug, thiserror::Error)]
#[error("reducer panicked: {0}")]
pub struct ReducerPanic(pub String);

/// A slice value did not have the type its reducer works on
#[derive(Debug, thiserror::Error)]
#[error("slice holds a value of unexpected type, expected {expected}")]
pub struct SliceTypeMismatch {
    pub expected: &'static str,
}

/// Reducer computes the next value of one slice from the previous value and an action.
///
/// A reducer must not read other slices, and must return the given `Arc` itself
/// for actions it does not handle so observers can detect "no change" by identity.
pub trait Reducer<A>: Send + Sync
where
    A: Action,
{
    type Slice: Send + Sync + 'static;

    /// value of the slice when the store is built without an initial value for it
    fn initial_state(&self) -> Self::Slice;

    /// called once when the store is built, with the initial value given to the store if any
    fn bootstrap(&self, initial: Option<Arc<Self::Slice>>) -> ReduceResult<Self::Slice> {
        Ok(initial.unwrap_or_else(|| Arc::new(self.initial_state())))
    }

    fn reduce(&self, slice: &Arc<Self::Slice>, action: &A) -> ReduceResult<Self::Slice>;
}

/// FnReducer is a reducer that is created from an initial value and a function.
pub struct FnReducer<S, A, F>
where
    F: Fn(&Arc<S>, &A) -> ReduceResult<S>,
{
    initial: S,
    func: F,
    _marker: PhantomData<fn(&A)>,
}

impl<S, A, F> FnReducer<S, A, F>
where
    F: Fn(&Arc<S>, &A) -> ReduceResult<S>,
{
    pub fn new(initial: S, func: F) -> Self {
        Self {
            initial,
            func,
            _marker: PhantomData,
        }
    }
}

impl<S, A, F> Reducer<A> for FnReducer<S, A, F>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
    F: Fn(&Arc<S>, &A) -> ReduceResult<S> + Send + Sync,
{
    type Slice = S;

    fn initial_state(&self) -> S {
        self.initial.clone()
    }

    fn reduce(&self, slice: &Arc<S>, action: &A) -> ReduceResult<S> {
        (self.func)(slice, action)
    }
}

/// type-erased reducer, works on `SliceRef`
trait SliceReducer<A>: Send + Sync {
    fn slice_type(&self) -> &'static str;
    fn accepts(&self, value: &SliceRef) -> bool;
    fn bootstrap(&self, initial: Option<SliceRef>) -> Result<SliceRef, BoxError>;
    fn reduce(&self, slice: &SliceRef, action: &A) -> Result<SliceRef, BoxError>;
}

struct TypedReducer<R>(R);

fn downcast_slice<S: Any + Send + Sync>(value: SliceRef) -> Result<Arc<S>, SliceTypeMismatch> {
    value.downcast::<S>().map_err(|_| SliceTypeMismatch {
        expected: type_name::<S>(),
    })
}

impl<A, R> SliceReducer<A> for TypedReducer<R>
where
    A: Action,
    R: Reducer<A>,
{
    fn slice_type(&self) -> &'static str {
        type_name::<R::Slice>()
    }

    fn accepts(&self, value: &SliceRef) -> bool {
        value.is::<R::Slice>()
    }

    fn bootstrap(&self, initial: Option<SliceRef>) -> Result<SliceRef, BoxError> {
        let initial = initial.map(downcast_slice::<R::Slice>).transpose()?;
        let slice: SliceRef = self.0.bootstrap(initial)?;
        Ok(slice)
    }

    fn reduce(&self, slice: &SliceRef, action: &A) -> Result<SliceRef, BoxError> {
        let typed = downcast_slice::<R::Slice>(slice.clone())?;
        let next: SliceRef = self.0.reduce(&typed, action)?;
        Ok(next)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// a panicking reducer is reported like a failing one
fn guarded<T>(f: impl FnOnce() -> Result<T, BoxError>) -> Result<T, BoxError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(Box::new(ReducerPanic(panic_message(payload.as_ref())))),
    }
}

/// ReducerRegistry maps slice names to reducers and combines them.
///
/// The registry is fixed once the store is built. Slices are reduced in
/// registration order, each reducer sees only its own slice.
pub struct ReducerRegistry<A>
where
    A: Action,
{
    entries: Vec<(String, Box<dyn SliceReducer<A>>)>,
}

impl<A> Default for ReducerRegistry<A>
where
    A: Action,
{
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<A> fmt::Debug for ReducerRegistry<A>
where
    A: Action,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, reducer)| (name, reducer.slice_type())))
            .finish()
    }
}

impl<A> ReducerRegistry<A>
where
    A: Action,
{
    pub fn new() -> Self {
        Default::default()
    }

    /// register a reducer for the slice `name`
    pub fn register<R>(mut self, name: impl Into<String>, reducer: R) -> Self
    where
        R: Reducer<A> + 'static,
    {
        self.add(name, reducer);
        self
    }

    pub fn add<R>(&mut self, name: impl Into<String>, reducer: R)
    where
        R: Reducer<A> + 'static,
    {
        self.entries.push((name.into(), Box::new(TypedReducer(reducer))));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// slice names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// check that the registry is usable by a store
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.entries.is_empty() {
            return Err(StoreError::ConfigurationError(
                "at least one reducer is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for (name, _) in &self.entries {
            if name.is_empty() {
                return Err(StoreError::ConfigurationError(
                    "slice name is empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(StoreError::ConfigurationError(format!(
                    "slice '{}' is registered more than once",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Build the initial state.
    ///
    /// Every reducer is bootstrapped with its entry of `initial`, or none.
    /// `initial` must not name a slice that has no reducer.
    pub fn initial_state(&self, mut initial: InitialState) -> Result<State, StoreError> {
        self.validate()?;

        if let Some(unknown) = initial.keys().find(|key| !self.entries.iter().any(|(n, _)| n == *key)) {
            return Err(StoreError::ConfigurationError(format!(
                "initial value given for unknown slice '{}'",
                unknown
            )));
        }

        let mut slices = BTreeMap::new();
        for (name, reducer) in &self.entries {
            let value = initial.remove(name);
            if let Some(value) = value.as_ref() {
                if !reducer.accepts(value) {
                    return Err(StoreError::ConfigurationError(format!(
                        "initial value of slice '{}' is not a {}",
                        name,
                        reducer.slice_type()
                    )));
                }
            }
            let slice = guarded(|| reducer.bootstrap(value)).map_err(|source| {
                StoreError::ReducerError {
                    slice: name.clone(),
                    source,
                }
            })?;
            slices.insert(name.clone(), slice);
        }
        Ok(State::from_slices(slices))
    }

    /// Compute the next composed state.
    ///
    /// The result is always a new `State`, slices untouched by the action keep their identity.
    /// Fails on the first reducer error, `state` is left as is.
    pub fn combine(&self, state: &State, action: &A) -> Result<State, StoreError> {
        let mut slices = BTreeMap::new();
        for (name, reducer) in &self.entries {
            let current = state.slice_ref(name).ok_or_else(|| {
                StoreError::ConfigurationError(format!("slice '{}' is missing from state", name))
            })?;
            let next = guarded(|| reducer.reduce(current, action)).map_err(|source| {
                StoreError::ReducerError {
                    slice: name.clone(),
                    source,
                }
            })?;
            slices.insert(name.clone(), next);
        }
        Ok(State::from_slices(slices))
    }
}
