use serde::{Deserialize, Serialize};

use crate::{PineconeService, Result, ToolRequest};
use pmcp_backend::{
	Caller, RerankModel, SearchQuery, SearchRecordsResponse, SearchRerank, SearchResult,
	SearchTarget, VectorBackend,
};
use pmcp_schema::{Field, Schema};

const FILTER_DESCRIPTION: &str = "Optional metadata filter to apply to the search. The filter \
	language is based on MongoDB query operators: $eq, $ne, $gt, $gte, $lt, $lte, $in, $nin, \
	$exists, $and, $or.";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRecordsRequest {
	pub name: String,
	pub namespace: String,
	pub query: SearchQuery,
	#[serde(default)]
	pub rerank: Option<SearchRerank>,
}
impl ToolRequest for SearchRecordsRequest {
	fn schema() -> Schema {
		Schema::strict_object(vec![
			Field::required("name", Schema::String).describe("The name of the index to search."),
			Field::required("namespace", Schema::String).describe("The namespace to search."),
			Field::required("query", query_schema()).describe("A query to search for records."),
			Field::optional("rerank", rerank_spec_schema()).describe(
				"Provide this parameter to rerank the results with a specialized reranking model.",
			),
		])
	}
}

/// `{topK, inputs: {text}, filter?}`, shared by single-source and cascading search.
pub fn query_schema() -> Schema {
	Schema::object(vec![
		Field::required("topK", Schema::count(1))
			.describe("The number of results to return."),
		Field::required(
			"inputs",
			Schema::object(vec![
				Field::required("text", Schema::String).describe("The text to search for."),
			]),
		),
		Field::optional("filter", Schema::Any).describe(FILTER_DESCRIPTION),
	])
}

pub fn rerank_model_schema() -> Schema {
	Schema::Enum(RerankModel::names())
}

/// `{model, topN?, rankFields, query?}`, shared by single-source and cascading search.
pub fn rerank_spec_schema() -> Schema {
	Schema::object(vec![
		Field::required("model", rerank_model_schema()).describe("The reranking model to use."),
		Field::optional("topN", Schema::count(0)).describe(
			"The number of top results to return after reranking. Defaults to query.topK.",
		),
		Field::required("rankFields", Schema::non_empty_array(Schema::String)).describe(
			"The fields to rerank on. bge-reranker-v2-m3 and pinecone-rerank-v0 accept a single \
			 field; cohere-rerank-3.5 ranks on several fields in the order given.",
		),
		Field::optional("query", Schema::String).describe(
			"A query to rerank against instead of query.inputs.text.",
		),
	])
}

/// Runs one query against one index/namespace and returns the hits untouched.
pub async fn search(
	backend: &dyn VectorBackend,
	target: &SearchTarget,
	query: &SearchQuery,
) -> Result<SearchResult> {
	let request = pmcp_backend::SearchRecordsRequest::plain(query.clone());
	let response = backend.search_records(target, &request).await?;

	Ok(response.result)
}

impl PineconeService {
	pub async fn search_records(
		&self,
		caller: Option<&Caller>,
		req: SearchRecordsRequest,
	) -> Result<SearchRecordsResponse> {
		let backend = self.backend(caller)?;
		let target = SearchTarget::new(req.name, req.namespace);
		let request = pmcp_backend::SearchRecordsRequest { query: req.query, rerank: req.rerank };

		Ok(backend.search_records(&target, &request).await?)
	}
}
