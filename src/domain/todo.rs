use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Completable, Labels, RecordId, Resource};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: RecordId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Update body. Unknown keys (`id`, `createdAt`, ...) are dropped on
/// deserialization, so a whole record can be sent back as a patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl Resource for Todo {
    type Patch = TodoPatch;

    const LABELS: Labels = Labels {
        singular: "todo",
        plural: "todos",
        display: "Todo",
        item: "task",
        item_display: "Task",
    };

    fn id(&self) -> &RecordId { &self.id }
    fn text(&self) -> &str { &self.text }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }

    fn text_patch(text: String) -> TodoPatch { TodoPatch { text: Some(text), completed: None } }
    fn patch_text(patch: &TodoPatch) -> Option<&str> { patch.text.as_deref() }
}

impl Completable for Todo {
    fn completed(&self) -> bool { self.completed }

    fn toggled(&self) -> TodoPatch {
        TodoPatch { text: Some(self.text.clone()), completed: Some(!self.completed) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case() {
        let now = Utc::now();
        let todo = Todo { id: RecordId::from("a"), text: "Buy milk".into(), completed: false, created_at: now, updated_at: now };
        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["id"], "a");
        assert_eq!(value["completed"], false);
        assert!(value["createdAt"].is_string());
        assert!(value["updatedAt"].is_string());
    }

    #[test]
    fn full_record_body_reduces_to_mutable_fields() {
        let body = json!({ "id": "x", "text": "t", "completed": true, "createdAt": "2020-01-01T00:00:00Z", "extra": 1 });
        let patch: TodoPatch = serde_json::from_value(body).unwrap();
        assert_eq!(patch, TodoPatch { text: Some("t".into()), completed: Some(true) });
    }

    #[test]
    fn toggled_flips_only_completed() {
        let now = Utc::now();
        let todo = Todo { id: RecordId::from("a"), text: "x".into(), completed: true, created_at: now, updated_at: now };
        assert_eq!(todo.toggled(), TodoPatch { text: Some("x".into()), completed: Some(false) });
    }
}
