//! Field kinds and content-type definitions
//!
//! The field-kind model is a closed tagged union over ten kinds. Each kind
//! carries its own constraint payload; there is no shared behavior beyond
//! the common attributes on [`FieldSchema`], and dispatch is always a
//! by-kind match.

use chrono::{DateTime, Utc};
use quill_common::{ContentTypeId, ProjectId, UserId};
use serde::{Deserialize, Serialize};

/// String format constraint for TEXT fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    Plaintext,
    Uri,
    Email,
}

/// Numeric format constraint for NUMBER fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    Number,
    Integer,
}

/// Precision of a DATE field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    Date,
    Datetime,
}

/// Cardinality of a CHOICE field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceFormat {
    Single,
    Multiple,
}

/// Hex color shape for COLOR fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    Rgb,
    Rgba,
}

/// The kind of a field — determines the value's storage shape and its
/// validation grammar. Tagged by `fieldType` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "fieldType")]
pub enum FieldKind {
    #[serde(rename = "TEXT", rename_all = "camelCase")]
    Text {
        min_length: usize,
        max_length: usize,
        format: TextFormat,
    },
    #[serde(rename = "LONGTEXT", rename_all = "camelCase")]
    LongText { min_length: usize, max_length: usize },
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "NUMBER", rename_all = "camelCase")]
    Number {
        min_value: f64,
        max_value: f64,
        format: NumberFormat,
    },
    #[serde(rename = "DATE")]
    Date { format: DateFormat },
    #[serde(rename = "CHOICE")]
    Choice {
        choices: Vec<String>,
        format: ChoiceFormat,
    },
    #[serde(rename = "COLOR")]
    Color { format: ColorFormat },
    /// Ordered references to media assets; bounds apply to the id list.
    #[serde(rename = "MEDIA", rename_all = "camelCase")]
    Media { min_length: usize, max_length: usize },
    /// Ordered references to sibling entries; bounds apply to the id list.
    #[serde(rename = "LINK", rename_all = "camelCase")]
    Link { min_length: usize, max_length: usize },
    #[serde(rename = "LIST", rename_all = "camelCase")]
    List { min_length: usize, max_length: usize },
}

/// The bare ten-value field-kind discriminant, without constraint payload.
/// This is what entry storage records next to each value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTypeTag {
    #[serde(rename = "TEXT")]
    Text,
    #[serde(rename = "LONGTEXT")]
    LongText,
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "NUMBER")]
    Number,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "CHOICE")]
    Choice,
    #[serde(rename = "COLOR")]
    Color,
    #[serde(rename = "MEDIA")]
    Media,
    #[serde(rename = "LINK")]
    Link,
    #[serde(rename = "LIST")]
    List,
}

impl FieldTypeTag {
    /// All ten tags, in declaration order.
    pub const ALL: [FieldTypeTag; 10] = [
        FieldTypeTag::Text,
        FieldTypeTag::LongText,
        FieldTypeTag::Boolean,
        FieldTypeTag::Number,
        FieldTypeTag::Date,
        FieldTypeTag::Choice,
        FieldTypeTag::Color,
        FieldTypeTag::Media,
        FieldTypeTag::Link,
        FieldTypeTag::List,
    ];

    /// The wire name of this tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldTypeTag::Text => "TEXT",
            FieldTypeTag::LongText => "LONGTEXT",
            FieldTypeTag::Boolean => "BOOLEAN",
            FieldTypeTag::Number => "NUMBER",
            FieldTypeTag::Date => "DATE",
            FieldTypeTag::Choice => "CHOICE",
            FieldTypeTag::Color => "COLOR",
            FieldTypeTag::Media => "MEDIA",
            FieldTypeTag::Link => "LINK",
            FieldTypeTag::List => "LIST",
        }
    }
}

impl std::fmt::Display for FieldTypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldKind {
    /// The discriminant of this kind.
    pub fn tag(&self) -> FieldTypeTag {
        match self {
            FieldKind::Text { .. } => FieldTypeTag::Text,
            FieldKind::LongText { .. } => FieldTypeTag::LongText,
            FieldKind::Boolean => FieldTypeTag::Boolean,
            FieldKind::Number { .. } => FieldTypeTag::Number,
            FieldKind::Date { .. } => FieldTypeTag::Date,
            FieldKind::Choice { .. } => FieldTypeTag::Choice,
            FieldKind::Color { .. } => FieldTypeTag::Color,
            FieldKind::Media { .. } => FieldTypeTag::Media,
            FieldKind::Link { .. } => FieldTypeTag::Link,
            FieldKind::List { .. } => FieldTypeTag::List,
        }
    }
}

/// A single declared field on a content type: common attributes plus the
/// kind-specific constraint payload, flattened so the wire shape is one
/// object discriminated by `fieldType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSchema {
    /// Create a field with the given name and kind; label defaults to the name.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            description: String::new(),
            required: false,
            disabled: false,
            kind,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// A project-scoped content type: an ordered list of field schemas that
/// entries of this type must conform to.
///
/// Definitions are replaced wholesale on update, never patched, and are
/// treated as immutable within a request's scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeDefinition {
    /// Generated when a submitted document does not carry one yet.
    #[serde(default)]
    pub id: ContentTypeId,
    pub project_id: ProjectId,
    pub owner_id: UserId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl ContentTypeDefinition {
    /// Create a new definition with no fields.
    pub fn new(project_id: ProjectId, owner_id: UserId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ContentTypeId::new(),
            project_id,
            owner_id,
            name: name.into(),
            description: String::new(),
            metadata: serde_json::Value::Null,
            fields: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldSchema>) -> Self {
        self.fields = fields;
        self
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The non-disabled fields, in declaration order. Entry validation and
    /// marshalling only ever see these.
    pub fn active_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| !f.disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_kind_json_round_trip() {
        let kind = FieldKind::Text {
            min_length: 1,
            max_length: 80,
            format: TextFormat::Email,
        };
        let value = serde_json::to_value(&kind).unwrap();
        assert_eq!(
            value,
            json!({"fieldType": "TEXT", "minLength": 1, "maxLength": 80, "format": "email"})
        );
        let parsed: FieldKind = serde_json::from_value(value).unwrap();
        assert_eq!(kind, parsed);
    }

    #[test]
    fn boolean_kind_has_no_payload() {
        let value = serde_json::to_value(FieldKind::Boolean).unwrap();
        assert_eq!(value, json!({"fieldType": "BOOLEAN"}));
    }

    #[test]
    fn choice_kind_json_round_trip() {
        let kind = FieldKind::Choice {
            choices: vec!["draft".into(), "published".into()],
            format: ChoiceFormat::Single,
        };
        let value = serde_json::to_value(&kind).unwrap();
        let parsed: FieldKind = serde_json::from_value(value).unwrap();
        assert_eq!(kind, parsed);
    }

    #[test]
    fn field_schema_flattens_kind() {
        let field = FieldSchema::new(
            "cover",
            FieldKind::Media {
                min_length: 0,
                max_length: 4,
            },
        )
        .required(true);

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["fieldType"], "MEDIA");
        assert_eq!(value["name"], "cover");
        assert_eq!(value["minLength"], 0);
        assert_eq!(value["required"], true);

        let parsed: FieldSchema = serde_json::from_value(value).unwrap();
        assert_eq!(field, parsed);
    }

    #[test]
    fn unknown_field_type_rejected_on_deserialize() {
        let value = json!({
            "name": "x", "label": "x",
            "fieldType": "GEOPOINT"
        });
        assert!(serde_json::from_value::<FieldSchema>(value).is_err());
    }

    #[test]
    fn kind_tag_matches_wire_name() {
        let kind = FieldKind::Link {
            min_length: 0,
            max_length: 10,
        };
        assert_eq!(kind.tag(), FieldTypeTag::Link);
        assert_eq!(kind.tag().as_str(), "LINK");
    }

    #[test]
    fn definition_round_trips_with_camel_case_keys() {
        let def = ContentTypeDefinition::new(ProjectId::new(), UserId::new(), "article")
            .with_fields(vec![FieldSchema::new(
                "title",
                FieldKind::Text {
                    min_length: 1,
                    max_length: 120,
                    format: TextFormat::Plaintext,
                },
            )]);
        let value = serde_json::to_value(&def).unwrap();
        assert!(value.get("projectId").is_some());
        assert!(value.get("createdAt").is_some());
        let parsed: ContentTypeDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(def, parsed);
    }

    #[test]
    fn active_fields_skips_disabled() {
        let def = ContentTypeDefinition::new(ProjectId::new(), UserId::new(), "article")
            .with_fields(vec![
                FieldSchema::new(
                    "title",
                    FieldKind::Text {
                        min_length: 0,
                        max_length: 10,
                        format: TextFormat::Plaintext,
                    },
                ),
                FieldSchema::new("old", FieldKind::Boolean).disabled(true),
            ]);
        let names: Vec<_> = def.active_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["title"]);
    }
}
