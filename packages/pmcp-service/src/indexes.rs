use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};

use crate::{Error, PineconeService, Result, ToolRequest};
use pmcp_backend::{
	Caller, Cloud, EmbedConfig, EmbedModel, IndexForModelSpec, IndexList, IndexModel, IndexStats,
	VectorBackend,
};
use pmcp_schema::{Field, Schema};

const EMBED_MODEL_DESCRIPTION: &str = "The embedding model to use for the index. \
	multilingual-e5-large suits messy data and short queries, llama-text-embed-v2 suits longer \
	passages and structured documents, and pinecone-sparse-english-v0 produces sparse vectors \
	for keyword or hybrid search.";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListIndexesRequest {}
impl ToolRequest for ListIndexesRequest {
	fn schema() -> Schema {
		Schema::strict_object(Vec::new())
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DescribeIndexRequest {
	pub name: String,
}
impl ToolRequest for DescribeIndexRequest {
	fn schema() -> Schema {
		Schema::strict_object(vec![
			Field::required("name", Schema::String).describe("The name of the index to describe."),
		])
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DescribeIndexStatsRequest {
	pub name: String,
}
impl ToolRequest for DescribeIndexStatsRequest {
	fn schema() -> Schema {
		Schema::strict_object(vec![
			Field::required("name", Schema::String)
				.describe("The name of the index to describe the statistics of."),
		])
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateIndexForModelRequest {
	pub name: String,
	pub embed: EmbedConfig,
	#[serde(default)]
	pub cloud: Option<Cloud>,
	#[serde(default)]
	pub region: Option<String>,
}
impl ToolRequest for CreateIndexForModelRequest {
	fn schema() -> Schema {
		let field_map = Schema::object(vec![
			Field::required("text", Schema::String).describe(
				"The name of the field in the data records that contains the text to embed.",
			),
		]);
		let embed = Schema::object(vec![
			Field::required("model", Schema::Enum(EmbedModel::names()))
				.describe(EMBED_MODEL_DESCRIPTION),
			Field::required("fieldMap", field_map)
				.describe("Identifies which field from the data records will be embedded."),
		]);

		Schema::strict_object(vec![
			Field::required("name", Schema::String)
				.describe("A unique name to identify the new index."),
			Field::required("embed", embed)
				.describe("Configuration for integrated inference embedding."),
			Field::optional("cloud", Schema::Enum(Cloud::names()))
				.describe("The cloud provider hosting the index."),
			Field::optional("region", Schema::String)
				.describe("The cloud region hosting the index."),
		])
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum CreateIndexOutcome {
	AlreadyExists(IndexModel),
	Created(IndexModel),
}
impl CreateIndexOutcome {
	pub fn to_text(&self) -> Result<String> {
		match self {
			Self::AlreadyExists(index) => Ok(format!(
				"Index not created. An index named \"{}\" already exists:\n{}",
				index.name,
				crate::to_pretty_json(index)?
			)),
			Self::Created(index) => crate::to_pretty_json(index),
		}
	}
}

impl PineconeService {
	pub async fn list_indexes(&self, caller: Option<&Caller>) -> Result<IndexList> {
		Ok(self.backend(caller)?.list_indexes().await?)
	}

	pub async fn describe_index(
		&self,
		caller: Option<&Caller>,
		req: DescribeIndexRequest,
	) -> Result<IndexModel> {
		Ok(self.backend(caller)?.describe_index(&req.name).await?)
	}

	pub async fn describe_index_stats(
		&self,
		caller: Option<&Caller>,
		req: DescribeIndexStatsRequest,
	) -> Result<IndexStats> {
		Ok(self.backend(caller)?.describe_index_stats(&req.name).await?)
	}

	pub async fn create_index_for_model(
		&self,
		caller: Option<&Caller>,
		req: CreateIndexForModelRequest,
	) -> Result<CreateIndexOutcome> {
		let backend = self.backend(caller)?;
		let existing = backend.list_indexes().await?;

		if let Some(index) = existing.indexes.into_iter().find(|index| index.name == req.name) {
			return Ok(CreateIndexOutcome::AlreadyExists(index));
		}

		let spec = IndexForModelSpec {
			tags: BTreeMap::from([
				("source".to_string(), "mcp".to_string()),
				("embedding_model".to_string(), req.embed.model.as_str().to_string()),
			]),
			name: req.name,
			cloud: req.cloud.unwrap_or(self.index_defaults.cloud),
			region: req.region.unwrap_or_else(|| self.index_defaults.region.clone()),
			embed: req.embed,
		};
		let created = backend.create_index_for_model(&spec).await?;

		if created.is_ready() {
			return Ok(CreateIndexOutcome::Created(created));
		}

		let ready = self.wait_until_ready(backend.as_ref(), &spec.name).await?;

		Ok(CreateIndexOutcome::Created(ready))
	}

	async fn wait_until_ready(
		&self,
		backend: &dyn VectorBackend,
		name: &str,
	) -> Result<IndexModel> {
		let deadline = Instant::now() + self.readiness.timeout;

		loop {
			let index = backend.describe_index(name).await?;

			if index.is_ready() {
				return Ok(index);
			}
			if Instant::now() >= deadline {
				tracing::warn!(
					index = name,
					state = %index.status.state,
					"Index did not become ready."
				);

				return Err(Error::Backend(pmcp_backend::Error::Timeout {
					operation: "wait_until_ready".to_string(),
				}));
			}

			time::sleep(self.readiness.poll).await;
		}
	}
}
