//! Field-kind schema model and content-type structural compiler
//!
//! `quill-fields` owns the closed set of ten field kinds, the content-type
//! definition that orders them, and the structural compiler that turns a
//! definition into the JSON schema its stored document must satisfy.
//!
//! # Architecture
//!
//! - **Schema-only**: owns field definitions, not field values — entry
//!   values live in `quill-entries`
//! - **Tagged union**: one `FieldKind` variant per `fieldType`, dispatch is
//!   always a by-kind match
//! - **Two validation layers**: the compiled JSON schema for the kind
//!   grammar, code checks for what JSON Schema cannot express (duplicate
//!   names, bound ordering, choice uniqueness)

pub mod error;
pub mod schema;
pub mod types;
pub mod validate;

pub use error::{FieldsError, Result};
pub use schema::structural_schema;
pub use types::{
    ChoiceFormat, ColorFormat, ContentTypeDefinition, DateFormat, FieldKind, FieldSchema,
    FieldTypeTag, NumberFormat, TextFormat,
};
pub use validate::validate_definition;
