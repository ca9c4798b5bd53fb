use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Labels, RecordId, Resource};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: RecordId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Resource for Feedback {
    type Patch = FeedbackPatch;

    const LABELS: Labels = Labels {
        singular: "feedback",
        plural: "feedbacks",
        display: "Feedback",
        item: "feedback",
        item_display: "Feedback",
    };

    fn id(&self) -> &RecordId { &self.id }
    fn text(&self) -> &str { &self.text }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }

    fn text_patch(text: String) -> FeedbackPatch { FeedbackPatch { text: Some(text) } }
    fn patch_text(patch: &FeedbackPatch) -> Option<&str> { patch.text.as_deref() }
}
