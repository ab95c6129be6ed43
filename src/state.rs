use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A slice value as stored in the composed state.
///
/// Only the reducer registered for the slice knows its concrete type.
pub type SliceRef = Arc<dyn Any + Send + Sync>;

/// Initial slice values keyed by slice name, used at construction
/// in place of the reducers' defaults.
pub type InitialState = BTreeMap<String, SliceRef>;

/// true if both slices point to the same allocation
pub fn same_slice(a: &SliceRef, b: &SliceRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// State is the composed state tree: one entry per registered slice.
///
/// A `State` is never mutated once built, every successful dispatch produces a fresh one.
#[derive(Clone, Default)]
pub struct State {
    slices: BTreeMap<String, SliceRef>,
}

impl State {
    pub(crate) fn from_slices(slices: BTreeMap<String, SliceRef>) -> Self {
        Self { slices }
    }

    /// borrow a slice as its concrete type
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.slices.get(name).and_then(|slice| slice.downcast_ref::<T>())
    }

    /// shared handle to a slice as its concrete type
    pub fn slice<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.slices.get(name).and_then(|slice| slice.clone().downcast::<T>().ok())
    }

    /// the untyped slice, for identity checks
    pub fn slice_ref(&self, name: &str) -> Option<&SliceRef> {
        self.slices.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slices.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// true if the slice has the concrete type `T`
    pub fn is_slice_of<T: Any>(&self, name: &str) -> bool {
        self.slices.get(name).is_some_and(|slice| (**slice).type_id() == TypeId::of::<T>())
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // slice values are opaque here
        f.debug_struct("State").field("slices", &self.slices.keys().collect::<Vec<_>>()).finish()
    }
}
