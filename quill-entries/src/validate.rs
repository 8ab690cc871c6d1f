//! Dynamic per-field entry validation
//!
//! A content type's field list compiles — via the pure
//! [`ConstraintSet::compile`] — into one constraint set per non-disabled
//! field. The sets are plain data evaluated by a local evaluator; nothing is
//! registered into shared validator state. All per-field checks, including
//! the asynchronous referential lookups for MEDIA/LINK, are issued together
//! and run to completion: the caller gets every problem at once, keyed by
//! field name.

use std::collections::HashSet;

use futures::future::join_all;
use once_cell::sync::Lazy;
use quill_common::{ErrorMap, ProjectId, UserId};
use quill_fields::{
    ChoiceFormat, ColorFormat, ContentTypeDefinition, DateFormat, FieldKind, FieldSchema,
    NumberFormat, TextFormat,
};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;
use ulid::Ulid;

use crate::error::{EntriesError, Result};
use crate::store::{MembershipLookup, ReferenceLoader};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Failed to compile email regex")
});
static HEX_RGB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("Failed to compile rgb regex"));
static HEX_RGBA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{8}$").expect("Failed to compile rgba regex"));

/// The constraint grammar of one field kind, stripped of schema concerns.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Text {
        min: usize,
        max: usize,
        format: TextFormat,
    },
    LongText {
        min: usize,
        max: usize,
    },
    Boolean,
    Number {
        min: f64,
        max: f64,
        format: NumberFormat,
    },
    Date {
        format: DateFormat,
    },
    Choice {
        choices: Vec<String>,
        format: ChoiceFormat,
    },
    Color {
        format: ColorFormat,
    },
    /// Referential: ids must resolve to media records in the project.
    Media {
        min: usize,
        max: usize,
    },
    /// Referential: ids must resolve to entries in the project.
    Link {
        min: usize,
        max: usize,
    },
    List {
        min: usize,
        max: usize,
    },
}

/// The compiled ruleset for one field: presence plus kind constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    pub field: String,
    pub required: bool,
    pub constraint: Constraint,
}

impl ConstraintSet {
    /// Derive the constraint set from a field schema. Pure — memoizable per
    /// definition, since definitions are immutable within a request.
    pub fn compile(field: &FieldSchema) -> Self {
        let constraint = match &field.kind {
            FieldKind::Text {
                min_length,
                max_length,
                format,
            } => Constraint::Text {
                min: *min_length,
                max: *max_length,
                format: *format,
            },
            FieldKind::LongText {
                min_length,
                max_length,
            } => Constraint::LongText {
                min: *min_length,
                max: *max_length,
            },
            FieldKind::Boolean => Constraint::Boolean,
            FieldKind::Number {
                min_value,
                max_value,
                format,
            } => Constraint::Number {
                min: *min_value,
                max: *max_value,
                format: *format,
            },
            FieldKind::Date { format } => Constraint::Date { format: *format },
            FieldKind::Choice { choices, format } => Constraint::Choice {
                choices: choices.clone(),
                format: *format,
            },
            FieldKind::Color { format } => Constraint::Color { format: *format },
            FieldKind::Media {
                min_length,
                max_length,
            } => Constraint::Media {
                min: *min_length,
                max: *max_length,
            },
            FieldKind::Link {
                min_length,
                max_length,
            } => Constraint::Link {
                min: *min_length,
                max: *max_length,
            },
            FieldKind::List {
                min_length,
                max_length,
            } => Constraint::List {
                min: *min_length,
                max: *max_length,
            },
        };
        Self {
            field: field.name.clone(),
            required: field.required,
            constraint,
        }
    }
}

/// Validates submitted entry payloads against one content type.
///
/// Construction pre-compiles the constraint sets; the validator instance is
/// the per-definition memo and can be reused for every payload within the
/// request.
#[derive(Debug)]
pub struct EntryValidator {
    constraints: Vec<ConstraintSet>,
}

impl EntryValidator {
    /// Compile the ruleset for every non-disabled field.
    pub fn new(definition: &ContentTypeDefinition) -> Self {
        Self {
            constraints: definition.active_fields().map(ConstraintSet::compile).collect(),
        }
    }

    /// The compiled constraint sets, in field declaration order.
    pub fn constraints(&self) -> &[ConstraintSet] {
        &self.constraints
    }

    /// Validate an external payload. All fields are checked concurrently and
    /// to completion; any message at all fails the whole operation with the
    /// accumulated per-field map. Storage failures during referential checks
    /// propagate unchanged.
    pub async fn validate(
        &self,
        external: &Map<String, Value>,
        project: ProjectId,
        media: &dyn ReferenceLoader,
        entries: &dyn ReferenceLoader,
    ) -> Result<()> {
        let checks = self.constraints.iter().map(|set| async move {
            let messages =
                evaluate(set, external.get(&set.field), project, media, entries).await?;
            Ok::<_, EntriesError>((set.field.as_str(), messages))
        });

        let mut errors = ErrorMap::new();
        for result in join_all(checks).await {
            let (field, messages) = result?;
            for message in messages {
                errors.push(field, message);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            debug!(fields = errors.len(), "entry payload failed validation");
            Err(EntriesError::validation(errors))
        }
    }
}

/// Evaluate one constraint set against the submitted value for its field.
async fn evaluate(
    set: &ConstraintSet,
    submitted: Option<&Value>,
    project: ProjectId,
    media: &dyn ReferenceLoader,
    entries: &dyn ReferenceLoader,
) -> Result<Vec<String>> {
    let value = match submitted {
        None | Some(Value::Null) => {
            return Ok(if set.required {
                vec!["is required".to_string()]
            } else {
                Vec::new()
            });
        }
        Some(value) => value,
    };

    let mut messages = Vec::new();
    match &set.constraint {
        Constraint::Text { min, max, format } => match value.as_str() {
            None => messages.push("must be a string".into()),
            Some(s) => {
                check_char_length(s, *min, *max, &mut messages);
                match format {
                    TextFormat::Plaintext => {}
                    TextFormat::Uri => {
                        if url::Url::parse(s).is_err() {
                            messages.push("must be a valid URI".into());
                        }
                    }
                    TextFormat::Email => {
                        if !EMAIL.is_match(s) {
                            messages.push("must be a valid email address".into());
                        }
                    }
                }
            }
        },
        Constraint::LongText { min, max } => match value.as_str() {
            None => messages.push("must be a string".into()),
            Some(s) => check_char_length(s, *min, *max, &mut messages),
        },
        Constraint::Boolean => {
            if !value.is_boolean() {
                messages.push("must be a boolean".into());
            }
        }
        Constraint::Number { min, max, format } => match value.as_f64() {
            None => messages.push("must be a number".into()),
            Some(n) => {
                if n < *min {
                    messages.push(format!("is below the minimum of {min}"));
                }
                if n > *max {
                    messages.push(format!("exceeds the maximum of {max}"));
                }
                if *format == NumberFormat::Integer && n.fract() != 0.0 {
                    messages.push("must be an integer".into());
                }
            }
        },
        Constraint::Date { format } => match value.as_str() {
            None => messages.push("must be a date string".into()),
            Some(s) => match format {
                DateFormat::Date => {
                    if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() {
                        messages.push("must be a date in YYYY-MM-DD form".into());
                    }
                }
                DateFormat::Datetime => {
                    if chrono::DateTime::parse_from_rfc3339(s).is_err() {
                        messages.push("must be an RFC 3339 datetime".into());
                    }
                }
            },
        },
        Constraint::Choice { choices, format } => {
            check_choice(value, choices, *format, &mut messages);
        }
        Constraint::Color { format } => match value.as_str() {
            None => messages.push("must be a string".into()),
            Some(s) => {
                let ok = match format {
                    ColorFormat::Rgb => HEX_RGB.is_match(s),
                    ColorFormat::Rgba => HEX_RGBA.is_match(s),
                };
                if !ok {
                    let shape = match format {
                        ColorFormat::Rgb => "#RRGGBB",
                        ColorFormat::Rgba => "#RRGGBBAA",
                    };
                    messages.push(format!("must be a {shape} hex color"));
                }
            }
        },
        Constraint::Media { min, max } => {
            check_references(value, *min, *max, project, media, &mut messages).await?;
        }
        Constraint::Link { min, max } => {
            check_references(value, *min, *max, project, entries, &mut messages).await?;
        }
        Constraint::List { min, max } => match value.as_array() {
            None => messages.push("must be an array of strings".into()),
            Some(items) => {
                if items.iter().any(|item| !item.is_string()) {
                    messages.push("must be an array of strings".into());
                }
                check_item_count(items.len(), *min, *max, "items", &mut messages);
            }
        },
    }

    Ok(messages)
}

fn check_char_length(s: &str, min: usize, max: usize, messages: &mut Vec<String>) {
    // char count, not byte length
    let len = s.chars().count();
    if len < min || len > max {
        messages.push(format!("must be between {min} and {max} characters"));
    }
}

fn check_item_count(count: usize, min: usize, max: usize, noun: &str, messages: &mut Vec<String>) {
    if count < min || count > max {
        messages.push(format!("must have between {min} and {max} {noun}"));
    }
}

fn check_choice(
    value: &Value,
    choices: &[String],
    format: ChoiceFormat,
    messages: &mut Vec<String>,
) {
    let items: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => {
            if items.iter().any(|item| !item.is_string()) {
                messages.push("must be a choice value or array of choice values".into());
                return;
            }
            items.iter().filter_map(Value::as_str).collect()
        }
        _ => {
            messages.push("must be a choice value or array of choice values".into());
            return;
        }
    };

    match format {
        ChoiceFormat::Single => {
            if items.len() != 1 {
                messages.push("must have exactly one value".into());
            }
        }
        ChoiceFormat::Multiple => {
            if items.is_empty() {
                messages.push("must have at least one value".into());
            }
            let mut seen = HashSet::new();
            if !items.iter().all(|item| seen.insert(*item)) {
                messages.push("must not contain duplicate values".into());
            }
        }
    }

    for item in &items {
        if !choices.iter().any(|choice| choice == item) {
            messages.push(format!("is not one of the declared choices: {item}"));
        }
    }
}

/// Shape, length, and referential-integrity checks for MEDIA/LINK values.
/// The batched existence count must equal the number of distinct submitted
/// ids — any shortfall means at least one id is missing or foreign.
async fn check_references(
    value: &Value,
    min: usize,
    max: usize,
    project: ProjectId,
    loader: &dyn ReferenceLoader,
    messages: &mut Vec<String>,
) -> Result<()> {
    let Some(items) = value.as_array() else {
        messages.push("must be an array of references".into());
        return Ok(());
    };

    check_item_count(items.len(), min, max, "references", messages);

    let mut malformed = false;
    let mut distinct = Vec::new();
    let mut seen = HashSet::new();
    for item in items {
        let id = item
            .as_object()
            .and_then(|obj| obj.get("id"))
            .and_then(Value::as_str)
            .and_then(|s| Ulid::from_string(s).ok());
        match id {
            Some(id) => {
                if seen.insert(id) {
                    distinct.push(id);
                }
            }
            None => malformed = true,
        }
    }

    if malformed {
        messages.push("every reference must be an object with a valid id".into());
        return Ok(());
    }
    if distinct.is_empty() {
        return Ok(());
    }

    let existing = loader.count_in_project(project, &distinct).await?;
    if existing != distinct.len() {
        messages.push("references records that do not exist in this project".into());
    }
    Ok(())
}

/// The membership validator: a simpler constraint sharing the async
/// evaluator shape. Used by the membership-update flow, not by entries.
pub async fn validate_project_member(
    lookup: &dyn MembershipLookup,
    user: UserId,
    project: ProjectId,
    role: Option<&str>,
) -> Result<()> {
    if lookup.is_active_member(user, project, role).await? {
        Ok(())
    } else {
        let mut errors = ErrorMap::new();
        errors.push("member", "user is not an active member of this project");
        Err(EntriesError::validation(errors))
    }
}
