//! Record store abstraction the pipeline reads from and writes back to.
//!
//! Records mirror spreadsheet rows: a stable id plus named cells. Cell values keep the JSON
//! shapes a spreadsheet API hands out (plain scalars, `{id}` link objects, `{name}` choices, or
//! lists of these) so snapshots and HTTP payloads stay interchangeable with exported data.

mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use memory::{MemoryRecordStore, SnapshotStore, StoreSnapshot};

/// Identifier wrapper for rows in any table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object cell entry carrying an `id`: a link to a row in another table, or a select option
/// as scripting APIs return it (`{id, name}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLink {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RecordLink {
    pub fn new(id: RecordId) -> Self {
        Self { id, name: None }
    }
}

/// Single- or multi-select option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub name: String,
}

impl Choice {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Cell value as stored. Variant order matters for untagged decoding: objects with an `id`
/// decode as links and keep their `name`, bare `{name}` objects decode as choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Link(RecordLink),
    Choice(Choice),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn choice(name: impl Into<String>) -> Self {
        Self::Choice(Choice::new(name))
    }

    pub fn links<'a>(ids: impl IntoIterator<Item = &'a RecordId>) -> Self {
        Self::List(
            ids.into_iter()
                .map(|id| Self::Link(RecordLink::new(id.clone())))
                .collect(),
        )
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(value) => value.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Non-blank text, or the name of a choice or named link.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) if !value.trim().is_empty() => Some(value.as_str()),
            FieldValue::Choice(choice) => Some(choice.name.as_str()),
            FieldValue::Link(RecordLink {
                name: Some(name), ..
            }) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Numbers, or text that parses as one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(value) => value.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_links(&self) -> Vec<RecordId> {
        match self {
            FieldValue::Link(link) => vec![link.id.clone()],
            FieldValue::List(items) => items
                .iter()
                .filter_map(|item| match item {
                    FieldValue::Link(link) => Some(link.id.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Flattens a list of plain strings and/or `{name}` / `{id, name}` options into their names.
    pub fn as_names(&self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items
                .iter()
                .filter_map(|item| item.as_text().map(str::to_string))
                .collect(),
            other => other.as_text().map(str::to_string).into_iter().collect(),
        }
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

/// One row of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub fields: Fields,
}

impl Record {
    pub fn new(id: RecordId, fields: Fields) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn has_value(&self, field: &str) -> bool {
        self.get(field).map(|value| !value.is_blank()).unwrap_or(false)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    pub fn links(&self, field: &str) -> Vec<RecordId> {
        self.get(field).map(FieldValue::as_links).unwrap_or_default()
    }

    pub fn names(&self, field: &str) -> Vec<String> {
        self.get(field).map(FieldValue::as_names).unwrap_or_default()
    }
}

/// Minimal contract the pipeline needs from whatever backs the spreadsheet.
pub trait RecordStore: Send + Sync {
    fn list_records(&self, table: &str) -> Result<Vec<Record>, StoreError>;
    fn get_record(&self, table: &str, id: &RecordId) -> Result<Record, StoreError>;
    fn create_record(&self, table: &str, fields: Fields) -> Result<RecordId, StoreError>;
    /// Merges `fields` into the stored row; cells not named are left untouched.
    fn update_record(&self, table: &str, id: &RecordId, fields: Fields) -> Result<(), StoreError>;
}

impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    fn list_records(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        (**self).list_records(table)
    }

    fn get_record(&self, table: &str, id: &RecordId) -> Result<Record, StoreError> {
        (**self).get_record(table, id)
    }

    fn create_record(&self, table: &str, fields: Fields) -> Result<RecordId, StoreError> {
        (**self).create_record(table, fields)
    }

    fn update_record(&self, table: &str, id: &RecordId, fields: Fields) -> Result<(), StoreError> {
        (**self).update_record(table, id, fields)
    }
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record {id} not found in {table}")]
    NotFound { table: String, id: RecordId },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_cell_shapes() {
        let fields: Fields = serde_json::from_value(json!({
            "Full Name": "Ada Lovelace",
            "Preferred Hourly Rate": 95.5,
            "Currency": { "name": "EUR" },
            "Application ID": [{ "id": "rec1", "name": "APP-1" }],
            "Technologies": ["Rust", { "name": "Postgres" }],
            "End Date": null,
            "Remote": true
        }))
        .expect("fields decode");

        assert_eq!(fields["Full Name"], FieldValue::text("Ada Lovelace"));
        assert_eq!(fields["Preferred Hourly Rate"], FieldValue::Number(95.5));
        assert_eq!(fields["Currency"], FieldValue::choice("EUR"));
        assert_eq!(
            fields["Application ID"].as_links(),
            vec![RecordId::new("rec1")]
        );
        assert_eq!(
            fields["Technologies"].as_names(),
            vec!["Rust".to_string(), "Postgres".to_string()]
        );
        assert_eq!(fields["End Date"], FieldValue::Null);
        assert_eq!(fields["Remote"], FieldValue::Bool(true));
    }

    #[test]
    fn accessors_treat_blank_cells_as_missing() {
        let mut fields = Fields::new();
        fields.insert("Email".to_string(), FieldValue::text("   "));
        fields.insert("Rate".to_string(), FieldValue::text("120"));
        fields.insert("Links".to_string(), FieldValue::List(Vec::new()));
        let record = Record::new(RecordId::new("rec9"), fields);

        assert_eq!(record.text("Email"), None);
        assert!(!record.has_value("Email"));
        assert_eq!(record.number("Rate"), Some(120.0));
        assert!(record.links("Links").is_empty());
        assert!(record.links("Missing").is_empty());
        assert!(record.names("Missing").is_empty());
    }

    #[test]
    fn id_bearing_options_yield_their_names() {
        let fields: Fields = serde_json::from_value(json!({
            "Technologies": [{ "id": "selA", "name": "Rust" }, { "name": "Go" }, "SQL"],
            "Currency": { "id": "selB", "name": "EUR" },
            "Applicant": [{ "id": "rec1" }]
        }))
        .expect("fields decode");
        let record = Record::new(RecordId::new("rec2"), fields);

        assert_eq!(
            record.names("Technologies"),
            vec!["Rust".to_string(), "Go".to_string(), "SQL".to_string()]
        );
        assert_eq!(record.text("Currency"), Some("EUR"));
        assert_eq!(record.text("Applicant"), None);
        assert_eq!(
            serde_json::to_value(FieldValue::links([&RecordId::new("rec1")])).expect("encodes"),
            json!([{ "id": "rec1" }])
        );
    }
}
