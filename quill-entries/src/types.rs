//! Entry types: Entry, EntryFieldValue, StoredValue

use chrono::{DateTime, Utc};
use quill_common::{ContentTypeId, EntryId, UserId};
use quill_fields::FieldTypeTag;
use serde::{Deserialize, Serialize};

/// The storage payload of one field value. Untagged — the shape is
/// recovered from the adjacent `fieldType` discriminant, never from the
/// JSON alone.
///
/// DATE stores an ISO-8601 string or null; MEDIA/LINK store an ordered list
/// of ULID strings; CHOICE/LIST store a string list; the rest are scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl StoredValue {
    pub fn is_null(&self) -> bool {
        matches!(self, StoredValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            StoredValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// One stored field value: the internal, self-describing shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFieldValue {
    pub name: String,
    pub field_type: FieldTypeTag,
    pub value: StoredValue,
}

impl EntryFieldValue {
    pub fn new(name: impl Into<String>, field_type: FieldTypeTag, value: StoredValue) -> Self {
        Self {
            name: name.into(),
            field_type,
            value,
        }
    }
}

/// An entry — a record conforming to a content type's schema.
///
/// `fields` holds one value per non-disabled field at the time of last
/// write; updates rewrite the whole list, they never merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default)]
    pub id: EntryId,
    pub content_type_id: ContentTypeId,
    pub owner_id: UserId,
    pub last_modified_by: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: Vec<EntryFieldValue>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl Entry {
    /// Create a new unpublished entry with no field values.
    pub fn new(content_type_id: ContentTypeId, owner_id: UserId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: EntryId::new(),
            content_type_id,
            owner_id,
            last_modified_by: owner_id,
            name: name.into(),
            published: None,
            fields: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_fields(mut self, fields: Vec<EntryFieldValue>) -> Self {
        self.fields = fields;
        self
    }

    /// Find a stored value by field name.
    pub fn field(&self, name: &str) -> Option<&EntryFieldValue> {
        self.fields.iter().find(|f| f.name == name)
    }
}
