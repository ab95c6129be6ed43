use crate::store::DEFAULT_STORE_NAME;
use crate::{Action, InitialState, Metrics, Reducer, ReducerRegistry, StoreError, StoreImpl};
use std::any::Any;
use std::sync::Arc;

pub struct StoreBuilder<A>
where
    A: Action,
{
    name: String,
    registry: ReducerRegistry<A>,
    initial: InitialState,
    metrics: Option<Arc<dyn Metrics>>,
}

impl<A> Default for StoreBuilder<A>
where
    A: Action,
{
    fn default() -> Self {
        StoreBuilder {
            name: DEFAULT_STORE_NAME.to_string(),
            registry: ReducerRegistry::new(),
            initial: InitialState::new(),
            metrics: None,
        }
    }
}

impl<A> StoreBuilder<A>
where
    A: Action,
{
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// register `reducer` for the slice `name`
    pub fn with_reducer<R>(mut self, name: impl Into<String>, reducer: R) -> Self
    where
        R: Reducer<A> + 'static,
    {
        self.registry.add(name, reducer);
        self
    }

    /// replace all registered reducers
    pub fn with_registry(mut self, registry: ReducerRegistry<A>) -> Self {
        self.registry = registry;
        self
    }

    /// start the slice `name` from `value` instead of its reducer's default
    pub fn with_initial_slice<T>(mut self, name: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.initial.insert(name.into(), Arc::new(value));
        self
    }

    pub fn with_initial_state(mut self, initial: InitialState) -> Self {
        self.initial = initial;
        self
    }

    /// report store events to `metrics` as well, `StoreImpl::get_metrics` keeps counting
    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<Arc<StoreImpl<A>>, StoreError> {
        StoreImpl::new_with_metrics(self.name, self.registry, self.initial, self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::ReducerPanic;
    use crate::test_mock::{CounterError, CounterReducer, MockReducer, TestAction};
    use crate::ReduceResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// i32 slice whose bootstrap fails, by error or by panic
    struct BrokenBootstrap {
        panics: bool,
    }

    impl Reducer<TestAction> for BrokenBootstrap {
        type Slice = i32;

        fn initial_state(&self) -> i32 {
            0
        }

        fn bootstrap(&self, _initial: Option<Arc<i32>>) -> ReduceResult<i32> {
            if self.panics {
                panic!("bootstrap panicked on purpose");
            }
            Err(Box::new(CounterError))
        }

        fn reduce(&self, slice: &Arc<i32>, _action: &TestAction) -> ReduceResult<i32> {
            Ok(slice.clone())
        }
    }

    /// overrides only part of the metrics events
    #[derive(Default)]
    struct RecordingMetrics {
        dispatched: Mutex<Vec<String>>,
        errors: AtomicUsize,
    }

    impl Metrics for RecordingMetrics {
        fn action_dispatched(&self, action_type: &str) {
            self.dispatched.lock().unwrap().push(action_type.to_string());
        }

        fn error_occurred(&self, _error: &StoreError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_builder() {
        let store = StoreBuilder::<TestAction>::default()
            .with_reducer("counter", CounterReducer)
            .build();
        assert!(store.is_ok());
    }

    #[test]
    fn test_builder_with_name() {
        let store = StoreBuilder::<TestAction>::new()
            .with_reducer("counter", CounterReducer)
            .with_name("test")
            .build()
            .unwrap();
        assert_eq!(store.name(), "test");
    }

    #[test]
    fn test_builder_empty_name() {
        let store = StoreBuilder::<TestAction>::new()
            .with_reducer("counter", CounterReducer)
            .with_name("")
            .build();
        assert!(matches!(store, Err(StoreError::ConfigurationError(_))));
    }

    #[test]
    fn test_builder_without_reducers() {
        let store = StoreBuilder::<TestAction>::new().build();
        assert!(matches!(store, Err(StoreError::ConfigurationError(_))));
    }

    #[test]
    fn test_builder_with_registry() {
        let registry = ReducerRegistry::new()
            .register("counter", CounterReducer)
            .register("flag", MockReducer::new(false));
        let store = StoreBuilder::<TestAction>::new().with_registry(registry).build().unwrap();
        assert_eq!(store.get_state().keys().collect::<Vec<_>>(), vec!["counter", "flag"]);
    }

    #[test]
    fn test_builder_with_initial_slice() {
        let store = StoreBuilder::<TestAction>::new()
            .with_reducer("counter", CounterReducer)
            .with_initial_slice("counter", 7_i32)
            .build()
            .unwrap();
        assert_eq!(store.get_state().get::<i32>("counter"), Some(&7));
    }

    #[test]
    fn test_builder_initial_slice_of_wrong_type() {
        let store = StoreBuilder::<TestAction>::new()
            .with_reducer("counter", CounterReducer)
            .with_initial_slice("counter", 7_u64)
            .build();
        assert!(matches!(store, Err(StoreError::ConfigurationError(_))));
    }

    #[test]
    fn test_builder_initial_slice_without_reducer() {
        let store = StoreBuilder::<TestAction>::new()
            .with_reducer("counter", CounterReducer)
            .with_initial_slice("extra", 1_i32)
            .build();
        assert!(matches!(store, Err(StoreError::ConfigurationError(_))));
    }

    #[test]
    fn test_builder_failing_bootstrap() {
        let store = StoreBuilder::<TestAction>::new()
            .with_reducer("counter", CounterReducer)
            .with_reducer("broken", BrokenBootstrap { panics: false })
            .build();
        match store {
            Err(StoreError::ReducerError { slice, source }) => {
                assert_eq!(slice, "broken");
                assert!(source.is::<CounterError>());
            }
            Err(other) => panic!("expected ReducerError, got {:?}", other),
            Ok(_) => panic!("expected ReducerError, got a store"),
        }
    }

    #[test]
    fn test_builder_panicking_bootstrap() {
        let store = StoreBuilder::<TestAction>::new()
            .with_reducer("broken", BrokenBootstrap { panics: true })
            .build();
        match store {
            Err(StoreError::ReducerError { slice, source }) => {
                assert_eq!(slice, "broken");
                assert!(source.is::<ReducerPanic>());
            }
            Err(other) => panic!("expected ReducerError, got {:?}", other),
            Ok(_) => panic!("expected ReducerError, got a store"),
        }
    }

    #[test]
    fn test_builder_with_metrics() {
        let metrics = Arc::new(RecordingMetrics::default());
        let store = StoreBuilder::<TestAction>::new()
            .with_reducer("counter", CounterReducer)
            .with_metrics(metrics.clone())
            .build()
            .unwrap();

        store.dispatch(TestAction::Add(1)).unwrap();
        let _ = store.dispatch(TestAction::Fail);

        assert_eq!(*metrics.dispatched.lock().unwrap(), vec!["ADD", "FAIL"]);
        assert_eq!(metrics.errors.load(Ordering::SeqCst), 1);
        // built-in counters keep running
        let snapshot = store.get_metrics();
        assert_eq!(snapshot.action_dispatched, 2);
        assert_eq!(snapshot.reducer_failed, 1);
    }
}
