use slice_store::todo::{Item, TodoAction, TodoReducer, TodoState};
use slice_store::{Action, State, StoreBuilder, StoreError};
use std::sync::Arc;

fn print_todos(state: &State) {
    if let Some(todos) = state.get::<TodoState>("todos") {
        for item in todos.data.iter() {
            println!("  [{}] {}", if item.complete { "x" } else { " " }, item.label);
        }
    }
}

pub fn main() -> Result<(), StoreError> {
    env_logger::init();

    let store = StoreBuilder::<TodoAction>::new()
        .with_name("todo-list")
        .with_reducer("todos", TodoReducer)
        .build()?;

    println!("initial todos:");
    print_todos(&store.get_state());

    let subscription = store.subscribe_fn(|state: &Arc<State>, action: &TodoAction| {
        let count = state.get::<TodoState>("todos").map_or(0, |todos| todos.data.len());
        println!("{} -> {} todos", action.action_type(), count);
    })?;

    store.dispatch(TodoAction::AddItem(Item::new("Walk the dog")))?;
    store.dispatch(TodoAction::AddItem(Item {
        label: "Water the plants".to_string(),
        complete: true,
    }))?;
    store.dispatch(TodoAction::RemoveItem {
        label: "Eat Pizza".to_string(),
    })?;

    // items can also come in as json from a ui layer
    let json = r#"{ "type": "ADD_ITEM", "payload": { "label": "Call mom", "complete": false } }"#;
    match serde_json::from_str::<TodoAction>(json) {
        Ok(action) => store.dispatch(action)?,
        Err(e) => println!("invalid action: {}", e),
    }

    subscription.unsubscribe();
    // not printed, the subscription is gone
    store.dispatch(TodoAction::RemoveItem {
        label: "Walk the dog".to_string(),
    })?;

    println!("final todos:");
    print_todos(&store.get_state());

    store.dispose();
    Ok(())
}
