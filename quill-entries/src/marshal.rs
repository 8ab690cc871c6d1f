//! Two-way field marshalling between the external (API) and internal
//! (storage) representations of entry data
//!
//! `to_internal` is pure: per-kind coercion plus default fill, in the
//! definition's declaration order, with disabled fields silently dropped.
//! `to_external` rehydrates: scalars pass through, referential fields issue
//! one batched lookup each and reconstruct the stored order — batched
//! fetches make no ordering guarantee, and the stored order is the field's
//! semantic order.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use quill_fields::{ContentTypeDefinition, DateFormat, FieldKind, FieldTypeTag};
use serde_json::{json, Map, Value};
use tracing::debug;
use ulid::Ulid;

use crate::error::Result;
use crate::store::ReferenceLoader;
use crate::types::{EntryFieldValue, StoredValue};

/// Convert a submitted external payload into the internal storage shape.
///
/// Every non-disabled field yields exactly one value; absent fields take
/// their kind's default. Values for disabled fields are dropped even when
/// present in the payload — the next full rewrite discards them.
pub fn to_internal(
    definition: &ContentTypeDefinition,
    external: &Map<String, Value>,
) -> Vec<EntryFieldValue> {
    definition
        .active_fields()
        .map(|field| {
            let submitted = external.get(&field.name);
            let value = coerce(&field.kind, submitted);
            EntryFieldValue::new(&field.name, field.kind.tag(), value)
        })
        .collect()
}

fn coerce(kind: &FieldKind, submitted: Option<&Value>) -> StoredValue {
    match kind {
        FieldKind::Text { .. } | FieldKind::LongText { .. } | FieldKind::Color { .. } => {
            StoredValue::Text(
                submitted
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            )
        }
        FieldKind::Boolean => StoredValue::Bool(js_truthy(submitted)),
        FieldKind::Number { .. } => submitted
            .and_then(Value::as_f64)
            .map(StoredValue::Number)
            .unwrap_or(StoredValue::Null),
        FieldKind::Date { format } => parse_date(submitted, *format)
            .map(StoredValue::Text)
            .unwrap_or(StoredValue::Null),
        FieldKind::Choice { .. } | FieldKind::List { .. } => {
            StoredValue::List(string_items(submitted))
        }
        FieldKind::Media { .. } | FieldKind::Link { .. } => {
            StoredValue::List(reference_ids(submitted))
        }
    }
}

/// Double-negation truthiness, matching the loose boolean coercion the API
/// has always applied: null/absent, false, 0, NaN, and "" are false.
fn js_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Parse a submitted date to its canonical stored string: `YYYY-MM-DD` for
/// date precision, RFC 3339 in UTC for datetime precision. Unparseable
/// input maps to null — validation runs before marshalling on writes.
fn parse_date(value: Option<&Value>, format: DateFormat) -> Option<String> {
    let s = value.and_then(Value::as_str)?;
    match format {
        DateFormat::Date => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .map(|d| d.format("%Y-%m-%d").to_string()),
        DateFormat::Datetime => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).to_rfc3339()),
    }
}

/// A bare string becomes a one-element list (CHOICE `single` submissions);
/// arrays keep their string items; anything else is empty.
fn string_items(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Extract referenced ids in submission order. Elements are objects
/// carrying an `id`; bare string ids are tolerated.
fn reference_ids(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => obj.get("id").and_then(Value::as_str),
                Value::String(s) => Some(s.as_str()),
                _ => None,
            })
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Reconstitute the external payload from stored values.
///
/// Every declared field appears in the output. A field with no stored value
/// (added to the schema after the entry was written, or stored under a
/// different kind) resolves to its kind's default — null for scalars, an
/// empty array for list kinds — never an error.
pub async fn to_external(
    definition: &ContentTypeDefinition,
    internal: &[EntryFieldValue],
    media: &dyn ReferenceLoader,
    entries: &dyn ReferenceLoader,
) -> Result<Map<String, Value>> {
    let stored: HashMap<(&str, FieldTypeTag), &StoredValue> = internal
        .iter()
        .map(|fv| ((fv.name.as_str(), fv.field_type), &fv.value))
        .collect();

    let mut external = Map::new();
    for field in &definition.fields {
        let value = stored.get(&(field.name.as_str(), field.kind.tag())).copied();
        let converted = match &field.kind {
            FieldKind::Text { .. }
            | FieldKind::LongText { .. }
            | FieldKind::Color { .. }
            | FieldKind::Date { .. }
            | FieldKind::Boolean
            | FieldKind::Number { .. } => value.map(scalar_to_json).unwrap_or(Value::Null),
            FieldKind::Choice { .. } | FieldKind::List { .. } => value
                .and_then(|v| v.as_list())
                .map(|items| json!(items))
                .unwrap_or_else(|| json!([])),
            FieldKind::Media { .. } => rehydrate(&field.name, value, media).await?,
            FieldKind::Link { .. } => rehydrate(&field.name, value, entries).await?,
        };
        external.insert(field.name.clone(), converted);
    }
    Ok(external)
}

fn scalar_to_json(value: &StoredValue) -> Value {
    match value {
        StoredValue::Null => Value::Null,
        StoredValue::Bool(b) => Value::Bool(*b),
        StoredValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        StoredValue::Text(s) => Value::String(s.clone()),
        StoredValue::List(items) => json!(items),
    }
}

/// One batched fetch, then stored-order reconstruction. Ids whose target no
/// longer exists are omitted without error — references may dangle after
/// deletions elsewhere.
async fn rehydrate(
    name: &str,
    value: Option<&StoredValue>,
    loader: &dyn ReferenceLoader,
) -> Result<Value> {
    let ids: Vec<Ulid> = value
        .and_then(|v| v.as_list())
        .unwrap_or_default()
        .iter()
        .filter_map(|s| Ulid::from_string(s).ok())
        .collect();
    if ids.is_empty() {
        return Ok(json!([]));
    }

    let fetched = loader.fetch_by_ids(&ids).await?;
    let mut by_id: HashMap<Ulid, Value> = fetched.into_iter().map(|r| (r.id, r.data)).collect();
    let records: Vec<Value> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    if records.len() < ids.len() {
        debug!(
            field = name,
            missing = ids.len() - records.len(),
            "omitting dangling references"
        );
    }
    Ok(Value::Array(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LoadedRecord;
    use async_trait::async_trait;
    use quill_common::{ProjectId, UserId};
    use quill_fields::{ChoiceFormat, ColorFormat, FieldSchema, NumberFormat, TextFormat};

    /// In-memory loader that returns fetches in reverse id order, to prove
    /// the marshaller reorders.
    struct FakeLoader {
        records: Vec<LoadedRecord>,
    }

    impl FakeLoader {
        fn new(records: Vec<LoadedRecord>) -> Self {
            Self { records }
        }

        fn empty() -> Self {
            Self {
                records: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl ReferenceLoader for FakeLoader {
        async fn count_in_project(&self, _project: ProjectId, ids: &[Ulid]) -> Result<usize> {
            Ok(ids
                .iter()
                .filter(|id| self.records.iter().any(|r| r.id == **id))
                .count())
        }

        async fn fetch_by_ids(&self, ids: &[Ulid]) -> Result<Vec<LoadedRecord>> {
            let mut found: Vec<LoadedRecord> = self
                .records
                .iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect();
            found.reverse();
            Ok(found)
        }
    }

    fn definition() -> ContentTypeDefinition {
        ContentTypeDefinition::new(ProjectId::new(), UserId::new(), "article").with_fields(vec![
            FieldSchema::new(
                "title",
                FieldKind::Text {
                    min_length: 1,
                    max_length: 10,
                    format: TextFormat::Plaintext,
                },
            ),
            FieldSchema::new("featured", FieldKind::Boolean),
            FieldSchema::new(
                "rating",
                FieldKind::Number {
                    min_value: 0.0,
                    max_value: 5.0,
                    format: NumberFormat::Number,
                },
            ),
            FieldSchema::new(
                "status",
                FieldKind::Choice {
                    choices: vec!["draft".into(), "published".into()],
                    format: ChoiceFormat::Single,
                },
            ),
            FieldSchema::new("accent", FieldKind::Color { format: ColorFormat::Rgb }),
            FieldSchema::new(
                "gallery",
                FieldKind::Media {
                    min_length: 0,
                    max_length: 8,
                },
            ),
        ])
    }

    fn payload(entries: Vec<(&str, Value)>) -> Map<String, Value> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn absent_fields_take_kind_defaults() {
        let internal = to_internal(&definition(), &Map::new());
        let by_name: HashMap<&str, &StoredValue> = internal
            .iter()
            .map(|fv| (fv.name.as_str(), &fv.value))
            .collect();

        assert_eq!(by_name["title"], &StoredValue::Text(String::new()));
        assert_eq!(by_name["featured"], &StoredValue::Bool(false));
        assert_eq!(by_name["rating"], &StoredValue::Null);
        assert_eq!(by_name["status"], &StoredValue::List(vec![]));
        assert_eq!(by_name["accent"], &StoredValue::Text(String::new()));
        assert_eq!(by_name["gallery"], &StoredValue::List(vec![]));
    }

    #[test]
    fn disabled_fields_dropped_even_when_present() {
        let mut def = definition();
        def.fields[0].disabled = true;
        let external = payload(vec![("title", json!("sneaky"))]);

        let internal = to_internal(&def, &external);
        assert!(internal.iter().all(|fv| fv.name != "title"));
        assert_eq!(internal.len(), def.fields.len() - 1);
    }

    #[test]
    fn choice_single_string_wrapped_into_list() {
        let external = payload(vec![("status", json!("draft"))]);
        let internal = to_internal(&definition(), &external);
        let status = internal.iter().find(|fv| fv.name == "status").unwrap();
        assert_eq!(status.value, StoredValue::List(vec!["draft".into()]));
    }

    #[test]
    fn media_ids_extracted_in_submission_order() {
        let a = Ulid::new();
        let b = Ulid::new();
        let external = payload(vec![(
            "gallery",
            json!([{ "id": b.to_string() }, { "id": a.to_string() }]),
        )]);
        let internal = to_internal(&definition(), &external);
        let gallery = internal.iter().find(|fv| fv.name == "gallery").unwrap();
        assert_eq!(
            gallery.value,
            StoredValue::List(vec![b.to_string(), a.to_string()])
        );
        assert_eq!(gallery.field_type, FieldTypeTag::Media);
    }

    #[test]
    fn boolean_coerces_by_truthiness() {
        for (submitted, expected) in [
            (json!(true), true),
            (json!(1), true),
            (json!("yes"), true),
            (json!(""), false),
            (json!(0), false),
            (json!(null), false),
        ] {
            let external = payload(vec![("featured", submitted)]);
            let internal = to_internal(&definition(), &external);
            let featured = internal.iter().find(|fv| fv.name == "featured").unwrap();
            assert_eq!(featured.value, StoredValue::Bool(expected));
        }
    }

    #[test]
    fn datetime_normalizes_to_utc() {
        let def = ContentTypeDefinition::new(ProjectId::new(), UserId::new(), "event")
            .with_fields(vec![FieldSchema::new(
                "starts",
                FieldKind::Date {
                    format: DateFormat::Datetime,
                },
            )]);
        let external = payload(vec![("starts", json!("2024-06-01T12:00:00+02:00"))]);
        let internal = to_internal(&def, &external);
        assert_eq!(
            internal[0].value,
            StoredValue::Text("2024-06-01T10:00:00+00:00".into())
        );
    }

    #[tokio::test]
    async fn to_external_defaults_for_missing_stored_values() {
        let def = definition();
        let external = to_external(&def, &[], &FakeLoader::empty(), &FakeLoader::empty())
            .await
            .unwrap();

        assert_eq!(external["title"], json!(null));
        assert_eq!(external["status"], json!([]));
        assert_eq!(external["gallery"], json!([]));
    }

    #[tokio::test]
    async fn to_external_ignores_stored_value_with_wrong_kind() {
        // a field renamed from TEXT to NUMBER leaves a stale TEXT row behind
        let def = definition();
        let internal = vec![EntryFieldValue::new(
            "rating",
            FieldTypeTag::Text,
            StoredValue::Text("stale".into()),
        )];
        let external = to_external(&def, &internal, &FakeLoader::empty(), &FakeLoader::empty())
            .await
            .unwrap();
        assert_eq!(external["rating"], json!(null));
    }

    #[tokio::test]
    async fn rehydration_preserves_stored_order() {
        let (a, b, c) = (Ulid::new(), Ulid::new(), Ulid::new());
        let loader = FakeLoader::new(vec![
            LoadedRecord::new(a, json!({"id": a.to_string(), "n": "a"})),
            LoadedRecord::new(b, json!({"id": b.to_string(), "n": "b"})),
            LoadedRecord::new(c, json!({"id": c.to_string(), "n": "c"})),
        ]);
        let internal = vec![EntryFieldValue::new(
            "gallery",
            FieldTypeTag::Media,
            StoredValue::List(vec![c.to_string(), a.to_string(), b.to_string()]),
        )];

        let external = to_external(&definition(), &internal, &loader, &FakeLoader::empty())
            .await
            .unwrap();
        let names: Vec<&str> = external["gallery"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["n"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn dangling_references_silently_omitted() {
        let (a, b, c) = (Ulid::new(), Ulid::new(), Ulid::new());
        // b's record has been deleted elsewhere
        let loader = FakeLoader::new(vec![
            LoadedRecord::new(a, json!({"id": a.to_string()})),
            LoadedRecord::new(c, json!({"id": c.to_string()})),
        ]);
        let internal = vec![EntryFieldValue::new(
            "gallery",
            FieldTypeTag::Media,
            StoredValue::List(vec![c.to_string(), b.to_string(), a.to_string()]),
        )];

        let external = to_external(&definition(), &internal, &loader, &FakeLoader::empty())
            .await
            .unwrap();
        let ids: Vec<&str> = external["gallery"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, [c.to_string(), a.to_string()]);
    }
}
