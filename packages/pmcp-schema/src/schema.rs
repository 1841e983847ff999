use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
	error::ValidationError,
	issue::{FieldValueProblem, Issue, IssueKind, type_name},
	path::PathSegment,
};

#[derive(Clone, Debug)]
pub enum Schema {
	String,
	Number,
	Integer { minimum: Option<i64>, maximum: Option<i64> },
	Boolean,
	/// Any present value, passed through untouched.
	Any,
	Enum(Vec<&'static str>),
	Array { items: Box<Schema>, min_items: Option<usize> },
	Object(ObjectSchema),
	/// An object with arbitrary string keys whose values all match one schema.
	Record(Box<Schema>),
	Union(Vec<Schema>),
	Optional(Box<Schema>),
	Refine { inner: Box<Schema>, check: fn(&Value) -> bool, message: &'static str },
	/// A flat record field value: string, number, boolean, or array of strings.
	FieldValue,
}
impl Schema {
	/// An integer in `minimum..=u32::MAX`, for counts the backend takes as `u32`.
	pub fn count(minimum: u32) -> Self {
		Self::Integer { minimum: Some(minimum.into()), maximum: Some(u32::MAX.into()) }
	}

	pub fn enumeration(options: &[&'static str]) -> Self {
		Self::Enum(options.to_vec())
	}

	pub fn array(items: Schema) -> Self {
		Self::Array { items: Box::new(items), min_items: None }
	}

	pub fn non_empty_array(items: Schema) -> Self {
		Self::Array { items: Box::new(items), min_items: Some(1) }
	}

	pub fn record(values: Schema) -> Self {
		Self::Record(Box::new(values))
	}

	pub fn union(branches: Vec<Schema>) -> Self {
		Self::Union(branches)
	}

	pub fn object(fields: Vec<Field>) -> Self {
		Self::Object(ObjectSchema { fields, strict: false })
	}

	/// Like [`Schema::object`], but unknown keys are reported instead of dropped.
	pub fn strict_object(fields: Vec<Field>) -> Self {
		Self::Object(ObjectSchema { fields, strict: true })
	}

	pub fn refine(self, check: fn(&Value) -> bool, message: &'static str) -> Self {
		Self::Refine { inner: Box::new(self), check, message }
	}

	pub fn validate(&self, value: &Value) -> Result<Value, ValidationError> {
		let mut path = Vec::new();
		let mut issues = Vec::new();
		let cleaned = self.check(Some(value), &mut path, &mut issues);

		if !issues.is_empty() {
			return Err(ValidationError::new(issues));
		}

		Ok(cleaned.unwrap_or(Value::Null))
	}

	/// Validates and then deserializes into the typed request.
	pub fn parse<T>(&self, value: &Value) -> Result<T, ValidationError>
	where
		T: DeserializeOwned,
	{
		let cleaned = self.validate(value)?;

		serde_json::from_value(cleaned).map_err(|err| {
			ValidationError::new(vec![Issue::new(&[], IssueKind::Custom {
				message: err.to_string(),
			})])
		})
	}

	pub(crate) fn check(
		&self,
		value: Option<&Value>,
		path: &mut Vec<PathSegment>,
		issues: &mut Vec<Issue>,
	) -> Option<Value> {
		match self {
			Self::String => match value {
				Some(Value::String(_)) => value.cloned(),
				_ => invalid_type("string", value, path, issues),
			},
			Self::Number => match value {
				Some(Value::Number(_)) => value.cloned(),
				_ => invalid_type("number", value, path, issues),
			},
			Self::Integer { minimum, maximum } =>
				check_integer(*minimum, *maximum, value, path, issues),
			Self::Boolean => match value {
				Some(Value::Bool(_)) => value.cloned(),
				_ => invalid_type("boolean", value, path, issues),
			},
			Self::Any => value.cloned(),
			Self::Enum(options) => match value {
				Some(Value::String(text)) if options.iter().any(|option| option == text) =>
					value.cloned(),
				_ => {
					issues.push(Issue::new(path, IssueKind::InvalidValue {
						options: options.iter().map(ToString::to_string).collect(),
					}));

					None
				},
			},
			Self::Array { items, min_items } => {
				let Some(Value::Array(elements)) = value else {
					return invalid_type("array", value, path, issues);
				};
				let mut out = Vec::with_capacity(elements.len());

				for (index, element) in elements.iter().enumerate() {
					path.push(PathSegment::Index(index));

					if let Some(cleaned) = items.check(Some(element), path, issues) {
						out.push(cleaned);
					}

					path.pop();
				}

				if let Some(min) = min_items
					&& elements.len() < *min
				{
					issues.push(Issue::new(path, IssueKind::TooSmall {
						origin: "array",
						minimum: *min as u64,
					}));
				}

				Some(Value::Array(out))
			},
			Self::Object(object) => object.check(value, path, issues),
			Self::Record(values) => {
				let Some(Value::Object(map)) = value else {
					return invalid_type("record", value, path, issues);
				};
				let mut out = Map::new();

				for (key, entry) in map {
					path.push(PathSegment::Key(key.clone()));

					if let Some(cleaned) = values.check(Some(entry), path, issues) {
						out.insert(key.clone(), cleaned);
					}

					path.pop();
				}

				Some(Value::Object(out))
			},
			Self::Union(branches) => {
				let mut branch_issues = Vec::with_capacity(branches.len());

				for branch in branches {
					let mut local = Vec::new();
					let cleaned = branch.check(value, path, &mut local);

					if local.is_empty() {
						return cleaned;
					}

					branch_issues.push(local);
				}

				issues.push(Issue::new(path, IssueKind::InvalidUnion {
					branches: branch_issues,
					received: type_name(value).to_string(),
				}));

				None
			},
			Self::Optional(inner) => match value {
				None => None,
				Some(_) => inner.check(value, path, issues),
			},
			Self::Refine { inner, check, message } => {
				let before = issues.len();
				let cleaned = inner.check(value, path, issues);

				if issues.len() == before
					&& let Some(candidate) = cleaned.as_ref()
					&& !check(candidate)
				{
					issues.push(Issue::new(path, IssueKind::Custom {
						message: (*message).to_string(),
					}));
				}

				cleaned
			},
			Self::FieldValue => check_field_value(value, path, issues),
		}
	}
}

#[derive(Clone, Debug)]
pub struct ObjectSchema {
	pub fields: Vec<Field>,
	pub strict: bool,
}
impl ObjectSchema {
	fn check(
		&self,
		value: Option<&Value>,
		path: &mut Vec<PathSegment>,
		issues: &mut Vec<Issue>,
	) -> Option<Value> {
		let Some(Value::Object(map)) = value else {
			return invalid_type("object", value, path, issues);
		};
		let mut out = Map::new();

		for field in &self.fields {
			path.push(PathSegment::Key(field.name.to_string()));

			if let Some(cleaned) = field.schema.check(map.get(field.name), path, issues) {
				out.insert(field.name.to_string(), cleaned);
			}

			path.pop();
		}

		if self.strict {
			let unknown: Vec<String> = map
				.keys()
				.filter(|key| !self.fields.iter().any(|field| field.name == key.as_str()))
				.cloned()
				.collect();

			if !unknown.is_empty() {
				issues.push(Issue::new(path, IssueKind::UnrecognizedKeys { keys: unknown }));
			}
		}

		Some(Value::Object(out))
	}
}

#[derive(Clone, Debug)]
pub struct Field {
	pub name: &'static str,
	pub schema: Schema,
	pub description: Option<&'static str>,
}
impl Field {
	pub fn required(name: &'static str, schema: Schema) -> Self {
		Self { name, schema, description: None }
	}

	pub fn optional(name: &'static str, schema: Schema) -> Self {
		Self { name, schema: Schema::Optional(Box::new(schema)), description: None }
	}

	pub fn describe(mut self, description: &'static str) -> Self {
		self.description = Some(description);

		self
	}

	pub fn is_required(&self) -> bool {
		!matches!(self.schema, Schema::Optional(_) | Schema::Any)
	}
}

fn invalid_type(
	expected: &str,
	value: Option<&Value>,
	path: &[PathSegment],
	issues: &mut Vec<Issue>,
) -> Option<Value> {
	issues.push(Issue::new(path, IssueKind::InvalidType {
		expected: expected.to_string(),
		received: type_name(value).to_string(),
	}));

	None
}

fn check_integer(
	minimum: Option<i64>,
	maximum: Option<i64>,
	value: Option<&Value>,
	path: &[PathSegment],
	issues: &mut Vec<Issue>,
) -> Option<Value> {
	let Some(Value::Number(number)) = value else {
		return invalid_type("number", value, path, issues);
	};
	let Some(raw) = number.as_f64() else {
		return invalid_type("number", value, path, issues);
	};

	if !raw.is_finite() || raw.fract() != 0.0 {
		return invalid_type("integer", value, path, issues);
	}
	if let Some(min) = minimum
		&& raw < min as f64
	{
		issues.push(Issue::new(path, IssueKind::TooSmall {
			origin: "number",
			minimum: min.max(0) as u64,
		}));

		return None;
	}
	if let Some(max) = maximum
		&& raw > max as f64
	{
		issues.push(Issue::new(path, IssueKind::TooBig { origin: "number", maximum: max }));

		return None;
	}

	let normalized = match number.as_i64() {
		Some(int) => Value::from(int),
		None => match number.as_u64() {
			Some(uint) => Value::from(uint),
			None => Value::from(raw as i64),
		},
	};

	Some(normalized)
}

fn check_field_value(
	value: Option<&Value>,
	path: &mut Vec<PathSegment>,
	issues: &mut Vec<Issue>,
) -> Option<Value> {
	match value {
		None => invalid_type("string | number | boolean | array", value, path, issues),
		Some(Value::Null) => {
			issues.push(Issue::new(path, IssueKind::FieldValue(FieldValueProblem::Null)));

			None
		},
		Some(Value::Object(_)) => {
			issues.push(Issue::new(path, IssueKind::FieldValue(FieldValueProblem::NestedObject)));

			None
		},
		Some(Value::Array(elements)) => {
			for (index, element) in elements.iter().enumerate() {
				if element.is_string() {
					continue;
				}

				path.push(PathSegment::Index(index));
				issues.push(Issue::new(
					path,
					IssueKind::FieldValue(FieldValueProblem::NonStringElement {
						received: type_name(Some(element)).to_string(),
					}),
				));
				path.pop();
			}

			value.cloned()
		},
		Some(_) => value.cloned(),
	}
}
