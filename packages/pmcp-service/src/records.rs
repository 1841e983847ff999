use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{PineconeService, Result, ToolRequest};
use pmcp_backend::{Caller, Record, SearchTarget};
use pmcp_schema::{Field, RECORD_ID_MESSAGE, Schema};

pub const UPSERTED: &str = "Data upserted successfully";
pub const DELETED: &str = "Records deleted successfully";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpsertRecordsRequest {
	pub name: String,
	pub namespace: String,
	pub records: Vec<Record>,
}
impl ToolRequest for UpsertRecordsRequest {
	fn schema() -> Schema {
		Schema::strict_object(vec![
			Field::required("name", Schema::String).describe("The index to upsert into."),
			Field::required("namespace", Schema::String).describe("The namespace to upsert into."),
			Field::required("records", Schema::array(record_schema())).describe(
				"A set of records to upsert into the index. Use a consistent schema for all \
				 records in the index.",
			),
		])
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteIndexRecordsRequest {
	pub name: String,
	pub namespace: String,
	pub ids: Vec<String>,
}
impl ToolRequest for DeleteIndexRecordsRequest {
	fn schema() -> Schema {
		Schema::strict_object(vec![
			Field::required("name", Schema::String).describe("The index to delete from."),
			Field::required("namespace", Schema::String).describe("The namespace to delete from."),
			Field::required("ids", Schema::non_empty_array(Schema::String))
				.describe("A list of record IDs to delete."),
		])
	}
}

/// A flat record with an `id` or `_id`; values are strings, numbers, booleans, or string arrays.
pub fn record_schema() -> Schema {
	Schema::record(Schema::FieldValue).refine(has_record_id, RECORD_ID_MESSAGE)
}

fn has_record_id(record: &Value) -> bool {
	record.get("id").is_some() || record.get("_id").is_some()
}

impl PineconeService {
	pub async fn upsert_records(
		&self,
		caller: Option<&Caller>,
		req: UpsertRecordsRequest,
	) -> Result<&'static str> {
		let backend = self.backend(caller)?;
		let target = SearchTarget::new(req.name, req.namespace);

		backend.upsert_records(&target, &req.records).await?;

		Ok(UPSERTED)
	}

	pub async fn delete_index_records(
		&self,
		caller: Option<&Caller>,
		req: DeleteIndexRecordsRequest,
	) -> Result<&'static str> {
		let backend = self.backend(caller)?;
		let target = SearchTarget::new(req.name, req.namespace);

		backend.delete_records(&target, &req.ids).await?;

		Ok(DELETED)
	}
}
