//! Record change events and subscription topics.

use serde::{Deserialize, Serialize};

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordAction {
    Create,
    Update,
    Delete,
}

/// A change pushed for a subscribed collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEvent {
    pub action: RecordAction,
    /// The record after the change (before it, for deletes).
    pub record: serde_json::Value,
}

impl RecordEvent {
    pub fn record_id(&self) -> Option<&str> {
        self.record.get("id").and_then(|v| v.as_str())
    }

    /// String field of the record, e.g. `"workspace"`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.record.get(name).and_then(|v| v.as_str())
    }
}

/// Topic string for every record of `collection`, optionally narrowed by a
/// server-side filter expression.
///
/// `episodes/*` or `episodes/*?options=<urlencoded {"query":{"filter":..}}>`.
pub fn topic(collection: &str, filter: Option<&str>) -> String {
    let base = format!("{collection}/*");
    match filter.filter(|f| !f.is_empty()) {
        Some(filter) => {
            let options = serde_json::json!({ "query": { "filter": filter } }).to_string();
            let encoded: String = url::form_urlencoded::byte_serialize(options.as_bytes()).collect();
            format!("{base}?options={encoded}")
        }
        None => base,
    }
}

/// Filter expression restricting a collection to one workspace.
pub fn workspace_filter(workspace_id: &str) -> String {
    format!("workspace = \"{}\"", workspace_id.replace('"', "\\\""))
}
