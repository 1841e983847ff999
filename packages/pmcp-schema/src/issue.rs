use std::fmt::{Display, Formatter};

use serde::Serialize;
use serde_json::Value;

use crate::path::{self, PathSegment};

pub const RECORD_ID_MESSAGE: &str = r#"A record must have an "id" or "_id" field."#;

#[derive(Clone, Debug, PartialEq)]
pub enum IssueKind {
	InvalidType { expected: String, received: String },
	InvalidValue { options: Vec<String> },
	UnrecognizedKeys { keys: Vec<String> },
	InvalidUnion { branches: Vec<Vec<Issue>>, received: String },
	TooSmall { origin: &'static str, minimum: u64 },
	TooBig { origin: &'static str, maximum: i64 },
	FieldValue(FieldValueProblem),
	Custom { message: String },
}

/// Reasons a record field value is rejected. Each has its own wording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValueProblem {
	Null,
	NestedObject,
	NonStringElement { received: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Issue {
	pub path: Vec<PathSegment>,
	pub kind: IssueKind,
}
impl Issue {
	pub fn new(path: &[PathSegment], kind: IssueKind) -> Self {
		Self { path: path.to_vec(), kind }
	}

	pub fn path_display(&self) -> String {
		path::display_path(&self.path)
	}

	/// The problem description without the path prefix.
	pub fn message(&self) -> String {
		match &self.kind {
			IssueKind::InvalidType { expected, received } =>
				format!("Expected {expected}, received {received}"),
			IssueKind::InvalidValue { options } => {
				let quoted: Vec<String> = options.iter().map(|o| format!("\"{o}\"")).collect();

				format!("Expected {}", quoted.join(" | "))
			},
			IssueKind::UnrecognizedKeys { keys } => {
				let plural = if keys.len() == 1 { "" } else { "s" };
				let quoted: Vec<String> = keys.iter().map(|k| format!("\"{k}\"")).collect();

				format!("Unrecognized key{plural}: {}", quoted.join(", "))
			},
			IssueKind::InvalidUnion { branches, received } => union_message(branches, received),
			IssueKind::TooSmall { origin: "array", minimum } =>
				format!("Too small: expected array to have >={minimum} items"),
			IssueKind::TooSmall { origin, minimum } =>
				format!("Too small: expected {origin} to be >={minimum}"),
			IssueKind::TooBig { origin, maximum } =>
				format!("Too big: expected {origin} to be <={maximum}"),
			IssueKind::FieldValue(FieldValueProblem::Null) =>
				"Field values must not be null".to_string(),
			IssueKind::FieldValue(FieldValueProblem::NestedObject) =>
				"Field values must not be objects; nested objects are not permitted".to_string(),
			IssueKind::FieldValue(FieldValueProblem::NonStringElement { received }) =>
				format!("Array field values may only contain strings, received {received}"),
			IssueKind::Custom { message } => message.clone(),
		}
	}

	pub fn to_value(&self) -> Value {
		serde_json::to_value(IssueView { path: self.path_display(), message: self.message() })
			.unwrap_or(Value::Null)
	}
}
impl Display for Issue {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.path_display(), self.message())
	}
}

#[derive(Serialize)]
struct IssueView {
	path: String,
	message: String,
}

/// JavaScript-style type name of a value, with `undefined` standing for an absent value.
pub fn type_name(value: Option<&Value>) -> &'static str {
	match value {
		None => "undefined",
		Some(Value::Null) => "null",
		Some(Value::Bool(_)) => "boolean",
		Some(Value::Number(_)) => "number",
		Some(Value::String(_)) => "string",
		Some(Value::Array(_)) => "array",
		Some(Value::Object(_)) => "object",
	}
}

fn union_message(branches: &[Vec<Issue>], received: &str) -> String {
	let mut expected: Vec<&str> = Vec::new();

	for issue in branches.iter().flatten() {
		if let IssueKind::InvalidType { expected: name, .. } = &issue.kind
			&& !expected.contains(&name.as_str())
		{
			expected.push(name);
		}
	}

	if expected.is_empty() {
		return "Invalid union value".to_string();
	}

	format!("Expected {}, received {received}", expected.join(" | "))
}
