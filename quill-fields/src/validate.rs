//! Structural validation of content-type definitions
//!
//! Two layers: the compiled JSON schema (kind grammar, attribute presence,
//! value ranges) and the checks JSON Schema cannot express — duplicate field
//! names, `min ≤ max` bound ordering, choice uniqueness, metadata size.
//! Every problem is collected into one field-name-keyed map before the
//! operation fails; nothing is ever partially applied.

use quill_common::ErrorMap;
use serde_json::Value;
use tracing::debug;

use crate::error::{FieldsError, Result};
use crate::schema::{
    structural_schema, DESCRIPTION_MAX_LEN, FIELD_NAME_PATTERN, METADATA_MAX_BYTES, NAME_MAX_LEN,
};
use crate::types::{ContentTypeDefinition, FieldKind, FieldSchema};

/// Validate a submitted definition document and deserialize it.
///
/// Runs the compiled structural schema first, then the code-level checks on
/// the typed form. Returns the definition only when both layers pass; any
/// failure carries the full per-field-name error map.
pub fn validate_definition(value: &Value) -> Result<ContentTypeDefinition> {
    let schema = structural_schema();
    let validator =
        jsonschema::validator_for(&schema).map_err(|e| FieldsError::SchemaCompile {
            message: e.to_string(),
        })?;

    let mut errors = ErrorMap::new();
    for error in validator.iter_errors(value) {
        let key = error_key(value, &error.instance_path.to_string());
        errors.push(key, error.to_string());
    }
    if !errors.is_empty() {
        debug!(fields = errors.len(), "definition failed schema validation");
        return Err(FieldsError::structural(errors));
    }

    let definition: ContentTypeDefinition = serde_json::from_value(value.clone())?;
    definition.validate()?;
    Ok(definition)
}

/// Map a JSON-pointer instance path to the error-map key: the offending
/// field's declared name for `/fields/N/...` paths, the top-level attribute
/// name otherwise.
fn error_key(value: &Value, path: &str) -> String {
    let mut parts = path.split('/').filter(|s| !s.is_empty());
    match parts.next() {
        Some("fields") => match parts.next().and_then(|s| s.parse::<usize>().ok()) {
            Some(idx) => value["fields"][idx]["name"]
                .as_str()
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("fields[{idx}]")),
            None => "fields".to_string(),
        },
        Some(attribute) => attribute.to_string(),
        None => "definition".to_string(),
    }
}

impl ContentTypeDefinition {
    /// The code-level structural checks, on an already-typed definition.
    ///
    /// Re-run on every update — definitions are replaced wholesale.
    pub fn validate(&self) -> Result<()> {
        let mut errors = ErrorMap::new();

        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > NAME_MAX_LEN {
            errors.push("name", format!("must be 1..={NAME_MAX_LEN} characters"));
        }
        if self.description.chars().count() > DESCRIPTION_MAX_LEN {
            errors.push(
                "description",
                format!("must be at most {DESCRIPTION_MAX_LEN} characters"),
            );
        }
        if !self.metadata.is_null() {
            // serialized-size bound; arbitrary JSON is allowed inside it
            let serialized = serde_json::to_string(&self.metadata)?;
            if serialized.len() > METADATA_MAX_BYTES {
                errors.push(
                    "metadata",
                    format!("serialized size exceeds {METADATA_MAX_BYTES} bytes"),
                );
            }
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                errors.push(field.name.clone(), "duplicate field name");
            }
            validate_field(field, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            debug!(fields = errors.len(), "definition failed structural checks");
            Err(FieldsError::structural(errors))
        }
    }
}

fn validate_field(field: &FieldSchema, errors: &mut ErrorMap) {
    if !is_valid_field_name(&field.name) {
        errors.push(
            field.name.clone(),
            format!("name must match {FIELD_NAME_PATTERN} and be at most {NAME_MAX_LEN} characters"),
        );
    }
    let label_len = field.label.chars().count();
    if label_len == 0 || label_len > NAME_MAX_LEN {
        errors.push(
            field.name.clone(),
            format!("label must be 1..={NAME_MAX_LEN} characters"),
        );
    }

    match &field.kind {
        FieldKind::Text {
            min_length,
            max_length,
            ..
        }
        | FieldKind::LongText {
            min_length,
            max_length,
        }
        | FieldKind::Media {
            min_length,
            max_length,
        }
        | FieldKind::Link {
            min_length,
            max_length,
        }
        | FieldKind::List {
            min_length,
            max_length,
        } => {
            if min_length > max_length {
                errors.push(field.name.clone(), "minLength must not exceed maxLength");
            }
        }
        FieldKind::Number {
            min_value,
            max_value,
            ..
        } => {
            if !min_value.is_finite() || !max_value.is_finite() {
                errors.push(field.name.clone(), "numeric bounds must be finite");
            } else if min_value > max_value {
                errors.push(field.name.clone(), "minValue must not exceed maxValue");
            }
        }
        FieldKind::Choice { choices, .. } => {
            if choices.len() < 2 {
                errors.push(field.name.clone(), "must declare at least 2 choices");
            }
            let mut unique = std::collections::HashSet::new();
            for choice in choices {
                if choice.is_empty() {
                    errors.push(field.name.clone(), "choices must be non-empty strings");
                }
                if !unique.insert(choice.as_str()) {
                    errors.push(field.name.clone(), format!("duplicate choice: {choice}"));
                }
            }
        }
        FieldKind::Boolean | FieldKind::Date { .. } | FieldKind::Color { .. } => {}
    }
}

fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.len() <= NAME_MAX_LEN
}
