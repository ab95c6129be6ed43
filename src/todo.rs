//! A todo list slice.
//!
//! Actions serialize as `{ "type": "ADD_ITEM", "payload": { "label": .., "complete": .. } }`
//! and `{ "type": "REMOVE_ITEM", "payload": { "label": .. } }`.

use crate::{Action, AsAction, ReduceResult, Reducer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const ADD_ITEM: &str = "ADD_ITEM";
pub const REMOVE_ITEM: &str = "REMOVE_ITEM";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub label: String,
    pub complete: bool,
}

impl Item {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            complete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    pub loaded: bool,
    pub loading: bool,
    pub data: Vec<Item>,
}

impl Default for TodoState {
    fn default() -> Self {
        TodoState {
            loaded: false,
            loading: false,
            data: vec![Item::new("Eat Pizza")],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum TodoAction {
    /// append the item, labels may repeat
    #[serde(rename = "ADD_ITEM")]
    AddItem(Item),
    /// remove every item with this label
    #[serde(rename = "REMOVE_ITEM")]
    RemoveItem { label: String },
}

impl Action for TodoAction {
    fn action_type(&self) -> &str {
        match self {
            TodoAction::AddItem(_) => ADD_ITEM,
            TodoAction::RemoveItem { .. } => REMOVE_ITEM,
        }
    }
}

/// Reducer of the todo list slice.
///
/// Works in any store whose action can be projected onto a [`TodoAction`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TodoReducer;

impl<A> Reducer<A> for TodoReducer
where
    A: Action + AsAction<TodoAction>,
{
    type Slice = TodoState;

    fn initial_state(&self) -> TodoState {
        TodoState::default()
    }

    fn reduce(&self, slice: &Arc<TodoState>, action: &A) -> ReduceResult<TodoState> {
        match AsAction::<TodoAction>::as_action(action) {
            Some(TodoAction::AddItem(item)) => {
                let mut data = slice.data.clone();
                data.push(item.clone());
                Ok(Arc::new(TodoState {
                    loaded: slice.loaded,
                    loading: slice.loading,
                    data,
                }))
            }
            Some(TodoAction::RemoveItem { label }) => {
                // no match keeps the slice itself
                if !slice.data.iter().any(|item| item.label == *label) {
                    return Ok(slice.clone());
                }
                let data = slice.data.iter().filter(|item| item.label != *label).cloned().collect();
                Ok(Arc::new(TodoState {
                    loaded: slice.loaded,
                    loading: slice.loading,
                    data,
                }))
            }
            None => Ok(slice.clone()),
        }
    }
}
