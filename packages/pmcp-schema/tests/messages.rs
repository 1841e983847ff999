use serde_json::{Value, json};

use pmcp_schema::{Field, FieldValueProblem, IssueKind, RECORD_ID_MESSAGE, Schema};

fn record_schema() -> Schema {
	Schema::record(Schema::FieldValue).refine(
		|value| value.get("id").is_some() || value.get("_id").is_some(),
		RECORD_ID_MESSAGE,
	)
}

fn first_message(schema: &Schema, input: Value) -> String {
	let err = schema.validate(&input).expect_err("Expected validation to fail.");

	err.messages().into_iter().next().expect("Expected at least one issue.")
}

#[test]
fn type_mismatch_names_field_and_types() {
	let schema = Schema::object(vec![Field::required("name", Schema::String)]);

	assert_eq!(
		first_message(&schema, json!({ "name": 123 })),
		"name: Expected string, received number"
	);
}

#[test]
fn nested_paths_use_dots() {
	let schema = Schema::object(vec![Field::required(
		"user",
		Schema::object(vec![Field::required("email", Schema::String)]),
	)]);

	assert_eq!(
		first_message(&schema, json!({ "user": { "email": 42 } })),
		"user.email: Expected string, received number"
	);
}

#[test]
fn array_indices_use_brackets() {
	let schema = Schema::object(vec![Field::required("items", Schema::array(Schema::String))]);

	assert_eq!(
		first_message(&schema, json!({ "items": ["a", "b", 123] })),
		"items[2]: Expected string, received number"
	);
}

#[test]
fn root_failures_render_root_path() {
	let schema = Schema::object(vec![]);

	assert_eq!(first_message(&schema, json!(null)), "(root): Expected object, received null");
	assert_eq!(first_message(&schema, json!([])), "(root): Expected object, received array");
}

#[test]
fn missing_fields_are_received_as_undefined() {
	let schema = Schema::object(vec![Field::required("name", Schema::String)]);

	assert_eq!(first_message(&schema, json!({})), "name: Expected string, received undefined");
}

#[test]
fn enum_violation_lists_quoted_options() {
	let schema = Schema::object(vec![Field::required(
		"status",
		Schema::enumeration(&["active", "inactive", "pending"]),
	)]);

	assert_eq!(
		first_message(&schema, json!({ "status": "unknown" })),
		r#"status: Expected "active" | "inactive" | "pending""#
	);
}

#[test]
fn strict_object_reports_single_unrecognized_key() {
	let schema = Schema::strict_object(vec![Field::required("name", Schema::String)]);
	let message = first_message(&schema, json!({ "name": "test", "extra": "value" }));

	assert_eq!(message, r#"(root): Unrecognized key: "extra""#);
}

#[test]
fn strict_object_reports_plural_unrecognized_keys_in_order() {
	let schema = Schema::strict_object(vec![Field::required("name", Schema::String)]);
	let message = first_message(&schema, json!({ "name": "test", "extra1": "a", "extra2": "b" }));

	assert!(message.contains("Unrecognized keys:"), "Unexpected message: {message}");
	assert!(message.contains(r#""extra1""#));
	assert!(message.contains(r#""extra2""#));
	assert!(message.find("extra1") < message.find("extra2"));
}

#[test]
fn non_strict_object_drops_unknown_keys() {
	let schema = Schema::object(vec![Field::required("name", Schema::String)]);
	let cleaned = schema.validate(&json!({ "name": "a", "extra": 1 })).expect("Expected valid.");

	assert_eq!(cleaned, json!({ "name": "a" }));
}

#[test]
fn union_collects_expected_types_from_every_branch() {
	let schema = Schema::object(vec![Field::required(
		"value",
		Schema::union(vec![Schema::String, Schema::Number]),
	)]);

	assert_eq!(
		first_message(&schema, json!({ "value": [] })),
		"value: Expected string | number, received array"
	);
}

#[test]
fn union_of_enums_falls_back_to_generic_message() {
	let schema = Schema::union(vec![Schema::enumeration(&["a"]), Schema::enumeration(&["b"])]);

	assert_eq!(first_message(&schema, json!("c")), "(root): Invalid union value");
}

#[test]
fn every_issue_is_reported_together() {
	let schema = Schema::object(vec![
		Field::required("name", Schema::String),
		Field::required("topK", Schema::count(1)),
	]);
	let err = schema.validate(&json!({ "name": 1, "topK": "ten" })).expect_err("Expected error.");

	assert_eq!(
		err.messages(),
		vec!["name: Expected string, received number", "topK: Expected number, received string"]
	);
	assert_eq!(err.to_string(), err.messages().join("\n"));
}

#[test]
fn non_empty_array_rejects_empty_input() {
	let schema =
		Schema::object(vec![Field::required("ids", Schema::non_empty_array(Schema::String))]);

	assert_eq!(
		first_message(&schema, json!({ "ids": [] })),
		"ids: Too small: expected array to have >=1 items"
	);
}

#[test]
fn record_requires_an_identifier() {
	let err = record_schema().validate(&json!({ "text": "hello" })).expect_err("Expected error.");

	assert_eq!(err.issues().len(), 1);
	assert_eq!(err.issues()[0].message(), RECORD_ID_MESSAGE);
	assert_eq!(err.issues()[0].message(), r#"A record must have an "id" or "_id" field."#);
}

#[test]
fn record_accepts_either_identifier_spelling() {
	assert!(record_schema().validate(&json!({ "id": "1", "text": "a" })).is_ok());
	assert!(record_schema().validate(&json!({ "_id": "1", "text": "a" })).is_ok());
}

#[test]
fn record_field_values_have_distinct_problems() {
	let schema = Schema::object(vec![Field::required("records", Schema::array(record_schema()))]);
	let err = schema
		.validate(&json!({
			"records": [{
				"id": "1",
				"nothing": null,
				"nested": { "a": "b" },
				"tags": ["ok", 7],
				"count": 3,
				"flag": true
			}]
		}))
		.expect_err("Expected error.");
	let kinds: Vec<&IssueKind> = err.issues().iter().map(|issue| &issue.kind).collect();

	assert_eq!(kinds, vec![
		&IssueKind::FieldValue(FieldValueProblem::Null),
		&IssueKind::FieldValue(FieldValueProblem::NestedObject),
		&IssueKind::FieldValue(FieldValueProblem::NonStringElement {
			received: "number".to_string()
		}),
	]);
	assert_eq!(err.messages(), vec![
		"records[0].nothing: Field values must not be null",
		"records[0].nested: Field values must not be objects; nested objects are not permitted",
		"records[0].tags[1]: Array field values may only contain strings, received number",
	]);
}

#[test]
fn parse_produces_typed_values() {
	#[derive(serde::Deserialize)]
	struct Target {
		name: String,
		#[serde(rename = "topK")]
		top_k: u32,
	}

	let schema = Schema::object(vec![
		Field::required("name", Schema::String),
		Field::required("topK", Schema::count(1)),
	]);
	let target: Target =
		schema.parse(&json!({ "name": "idx", "topK": 5.0 })).expect("Expected valid input.");

	assert_eq!(target.name, "idx");
	assert_eq!(target.top_k, 5);
}
