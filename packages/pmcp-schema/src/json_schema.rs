use serde_json::{Map, Value, json};

use crate::schema::{ObjectSchema, Schema};

impl Schema {
	/// JSON Schema for this declaration, as advertised in tool listings.
	pub fn to_json_schema(&self) -> Value {
		match self {
			Self::String => json!({ "type": "string" }),
			Self::Number => json!({ "type": "number" }),
			Self::Integer { minimum, maximum } => {
				let mut out = json!({ "type": "integer" });

				if let Some(min) = minimum {
					out["minimum"] = json!(min);
				}
				if let Some(max) = maximum {
					out["maximum"] = json!(max);
				}

				out
			},
			Self::Boolean => json!({ "type": "boolean" }),
			Self::Any => json!({}),
			Self::Enum(options) => json!({ "type": "string", "enum": options }),
			Self::Array { items, min_items } => {
				let mut out = json!({ "type": "array", "items": items.to_json_schema() });

				if let Some(min) = min_items {
					out["minItems"] = json!(min);
				}

				out
			},
			Self::Object(object) => object.to_json_schema(),
			Self::Record(values) =>
				json!({ "type": "object", "additionalProperties": values.to_json_schema() }),
			Self::Union(branches) => json!({
				"anyOf": branches.iter().map(Schema::to_json_schema).collect::<Vec<_>>()
			}),
			Self::Optional(inner) | Self::Refine { inner, .. } => inner.to_json_schema(),
			Self::FieldValue => json!({
				"anyOf": [
					{ "type": "string" },
					{ "type": "number" },
					{ "type": "boolean" },
					{ "type": "array", "items": { "type": "string" } }
				]
			}),
		}
	}

	/// The root object schema as a JSON object, ready for a tool's `input_schema`.
	pub fn to_json_object(&self) -> Map<String, Value> {
		match self.to_json_schema() {
			Value::Object(map) => map,
			_ => Map::new(),
		}
	}
}

impl ObjectSchema {
	fn to_json_schema(&self) -> Value {
		let mut properties = Map::new();
		let mut required = Vec::new();

		for field in &self.fields {
			let mut property = field.schema.to_json_schema();

			if let (Some(description), Value::Object(map)) = (field.description, &mut property) {
				map.insert("description".to_string(), Value::String(description.to_string()));
			}
			if field.is_required() {
				required.push(Value::String(field.name.to_string()));
			}

			properties.insert(field.name.to_string(), property);
		}

		let mut out = json!({
			"type": "object",
			"properties": properties,
			"additionalProperties": !self.strict,
		});

		if !required.is_empty() {
			out["required"] = Value::Array(required);
		}

		out
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use crate::{Field, Schema};

	#[test]
	fn object_lists_required_fields_and_descriptions() {
		let schema = Schema::object(vec![
			Field::required("name", Schema::String).describe("Index name."),
			Field::optional("topN", Schema::Number),
		]);

		assert_eq!(
			schema.to_json_schema(),
			json!({
				"type": "object",
				"properties": {
					"name": { "type": "string", "description": "Index name." },
					"topN": { "type": "number" }
				},
				"additionalProperties": true,
				"required": ["name"]
			})
		);
	}
}
