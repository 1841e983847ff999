//! Declarative validation for untyped tool arguments.
//!
//! A [`Schema`] checks a `serde_json::Value`, collects every [`Issue`] with its path, and
//! renders the same declaration as JSON Schema for tool listings.

mod error;
mod issue;
mod json_schema;
mod path;
mod schema;

pub use error::ValidationError;
pub use issue::{FieldValueProblem, Issue, IssueKind, RECORD_ID_MESSAGE, type_name};
pub use path::{PathSegment, display_path};
pub use schema::{Field, ObjectSchema, Schema};
