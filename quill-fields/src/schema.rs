//! Structural JSON-schema compiler
//!
//! Compiles the schema a content-type definition document must satisfy: top
//! level attributes plus a `fields` array whose every element matches exactly
//! one of the ten kind sub-schemas, discriminated by `fieldType`.
//!
//! The emitted shape is an external contract — stored definitions are
//! validated against it, so the discriminated-union layout (ten `oneOf`
//! branches keyed by a `fieldType` const) must stay stable.

use serde_json::{json, Map, Value};

/// Maximum character length of a content-type name and of a field label.
pub const NAME_MAX_LEN: usize = 64;

/// Maximum character length of description attributes.
pub const DESCRIPTION_MAX_LEN: usize = 256;

/// Maximum serialized size of the free-form `metadata` attribute, in bytes.
pub const METADATA_MAX_BYTES: usize = 4096;

/// Grammar for field names: identifier-shaped, starting with a letter.
pub const FIELD_NAME_PATTERN: &str = "^[A-Za-z][A-Za-z0-9_]*$";

/// Compile the structural schema for content-type definition documents.
pub fn structural_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "ContentTypeDefinition",
        "type": "object",
        "properties": {
            "id": { "type": "string" },
            "projectId": { "type": "string", "minLength": 1 },
            "ownerId": { "type": "string", "minLength": 1 },
            "name": { "type": "string", "minLength": 1, "maxLength": NAME_MAX_LEN },
            "description": { "type": "string", "maxLength": DESCRIPTION_MAX_LEN },
            "metadata": {},
            "fields": {
                "type": "array",
                "items": { "oneOf": field_branches() }
            },
            "createdAt": { "type": "string" },
            "modifiedAt": { "type": "string" }
        },
        "required": ["projectId", "ownerId", "name", "fields"],
        "additionalProperties": false
    })
}

/// The ten kind sub-schemas, in the canonical tag order.
fn field_branches() -> Vec<Value> {
    vec![
        branch(
            "TEXT",
            json!({
                "minLength": { "type": "integer", "minimum": 0 },
                "maxLength": { "type": "integer", "minimum": 0 },
                "format": { "enum": ["plaintext", "uri", "email"] }
            }),
            &["minLength", "maxLength", "format"],
        ),
        branch(
            "LONGTEXT",
            json!({
                "minLength": { "type": "integer", "minimum": 0 },
                "maxLength": { "type": "integer", "minimum": 0 }
            }),
            &["minLength", "maxLength"],
        ),
        branch("BOOLEAN", json!({}), &[]),
        branch(
            "NUMBER",
            json!({
                "minValue": { "type": "number" },
                "maxValue": { "type": "number" },
                "format": { "enum": ["number", "integer"] }
            }),
            &["minValue", "maxValue", "format"],
        ),
        branch(
            "DATE",
            json!({
                "format": { "enum": ["date", "datetime"] }
            }),
            &["format"],
        ),
        branch(
            "CHOICE",
            json!({
                "choices": {
                    "type": "array",
                    "items": { "type": "string", "minLength": 1 },
                    "minItems": 2,
                    "uniqueItems": true
                },
                "format": { "enum": ["single", "multiple"] }
            }),
            &["choices", "format"],
        ),
        branch(
            "COLOR",
            json!({
                "format": { "enum": ["rgb", "rgba"] }
            }),
            &["format"],
        ),
        branch(
            "MEDIA",
            json!({
                "minLength": { "type": "integer", "minimum": 0 },
                "maxLength": { "type": "integer", "minimum": 0 }
            }),
            &["minLength", "maxLength"],
        ),
        branch(
            "LINK",
            json!({
                "minLength": { "type": "integer", "minimum": 0 },
                "maxLength": { "type": "integer", "minimum": 0 }
            }),
            &["minLength", "maxLength"],
        ),
        branch(
            "LIST",
            json!({
                "minLength": { "type": "integer", "minimum": 0 },
                "maxLength": { "type": "integer", "minimum": 0 }
            }),
            &["minLength", "maxLength"],
        ),
    ]
}

/// Build one kind sub-schema: the common field attributes plus the kind's
/// own payload, closed against unknown keys.
fn branch(tag: &str, payload: Value, payload_required: &[&str]) -> Value {
    let mut properties = Map::new();
    properties.insert("fieldType".into(), json!({ "const": tag }));
    properties.insert(
        "name".into(),
        json!({
            "type": "string",
            "pattern": FIELD_NAME_PATTERN,
            "maxLength": NAME_MAX_LEN
        }),
    );
    properties.insert(
        "label".into(),
        json!({ "type": "string", "minLength": 1, "maxLength": NAME_MAX_LEN }),
    );
    properties.insert(
        "description".into(),
        json!({ "type": "string", "maxLength": DESCRIPTION_MAX_LEN }),
    );
    properties.insert("required".into(), json!({ "type": "boolean" }));
    properties.insert("disabled".into(), json!({ "type": "boolean" }));

    if let Value::Object(payload) = payload {
        properties.extend(payload);
    }

    let mut required: Vec<&str> = vec!["fieldType", "name", "label"];
    required.extend(payload_required);

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}
