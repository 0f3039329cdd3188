use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A note attached to one configuration key
///
/// Invalid values carry the `rule` they broke; advisories carry a `note`
/// explaining the operational risk of an otherwise valid value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueFinding {
    /// Configuration key the finding is about
    pub key: String,

    /// Raw value as it appeared in the document
    pub value: Value,

    /// Validation rule the value failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,

    /// Advisory text for a structurally valid but risky value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ValueFinding {
    /// Create a new finding for a key and its raw value
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            rule: None,
            note: None,
        }
    }

    /// Record the rule the value failed
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Attach advisory text
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
