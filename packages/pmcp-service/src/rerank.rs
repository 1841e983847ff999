use serde::{Deserialize, Serialize};

use crate::{PineconeService, Result, ToolRequest, search::rerank_model_schema};
use pmcp_backend::{
	Caller, RerankDocuments, RerankModel, RerankRequest, RerankResult, VectorBackend,
};
use pmcp_schema::{Field, Schema};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankOptions {
	#[serde(default)]
	pub top_n: Option<u32>,
	#[serde(default)]
	pub rank_fields: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RerankDocumentsRequest {
	pub model: RerankModel,
	pub query: String,
	pub documents: RerankDocuments,
	#[serde(default)]
	pub options: Option<RerankOptions>,
}
impl ToolRequest for RerankDocumentsRequest {
	fn schema() -> Schema {
		let documents = Schema::union(vec![
			Schema::array(Schema::String),
			Schema::array(Schema::record(Schema::String)),
		]);
		let options = Schema::object(vec![
			Field::optional("topN", Schema::count(0))
				.describe("The number of top results to return after reranking."),
			Field::optional("rankFields", Schema::array(Schema::String)).describe(
				"The fields to rerank on. Only meaningful when the documents are records.",
			),
		]);

		Schema::strict_object(vec![
			Field::required("model", rerank_model_schema()).describe("The reranking model to use."),
			Field::required("query", Schema::String)
				.describe("The query to rerank documents against."),
			Field::required("documents", documents).describe(
				"The documents to rerank: either an array of texts or an array of flat records.",
			),
			Field::optional("options", options).describe("Options for reranking."),
		])
	}
}

/// Ranked documents, or nothing when there was nothing to rank.
#[derive(Clone, Debug, PartialEq)]
pub enum RankedOutcome {
	Empty,
	Ranked(RerankResult),
}
impl RankedOutcome {
	pub fn ranked(&self) -> Option<&RerankResult> {
		match self {
			Self::Empty => None,
			Self::Ranked(result) => Some(result),
		}
	}

	/// `[]` for an empty outcome, otherwise the backend's result as pretty JSON.
	pub fn to_text(&self) -> Result<String> {
		match self {
			Self::Empty => crate::to_pretty_json(&Vec::<()>::new()),
			Self::Ranked(result) => crate::to_pretty_json(result),
		}
	}
}

/// Shapes one rerank call. Ranking itself happens in the backend.
pub async fn rerank(
	backend: &dyn VectorBackend,
	model: RerankModel,
	query: &str,
	documents: RerankDocuments,
	options: RerankOptions,
) -> Result<RerankResult> {
	let request = RerankRequest {
		model,
		query: query.to_string(),
		documents,
		top_n: options.top_n,
		rank_fields: options.rank_fields.filter(|fields| !fields.is_empty()),
	};

	Ok(backend.rerank(&request).await?)
}

impl PineconeService {
	pub async fn rerank_documents(
		&self,
		caller: Option<&Caller>,
		req: RerankDocumentsRequest,
	) -> Result<RankedOutcome> {
		let backend = self.backend(caller)?;

		if req.documents.is_empty() {
			return Ok(RankedOutcome::Empty);
		}

		let options = req.options.unwrap_or_default();
		let result = rerank(backend.as_ref(), req.model, &req.query, req.documents, options).await?;

		Ok(RankedOutcome::Ranked(result))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_outcome_renders_empty_array() {
		assert_eq!(RankedOutcome::Empty.to_text().expect("Render failed."), "[]");
	}

	#[test]
	fn documents_accept_texts_or_string_records() {
		let args = serde_json::json!({
			"model": "bge-reranker-v2-m3",
			"query": "q",
			"documents": [{ "text": "a", "tag": "b" }]
		});
		let req = RerankDocumentsRequest::from_args(&args).expect("Request should parse.");

		assert!(matches!(req.documents, RerankDocuments::Records(_)));
	}

	#[test]
	fn mixed_documents_report_every_branch() {
		let args = serde_json::json!({
			"model": "bge-reranker-v2-m3",
			"query": "q",
			"documents": "not a list"
		});
		let err = RerankDocumentsRequest::from_args(&args).expect_err("Expected validation error.");

		assert_eq!(err.to_string(), "documents: Expected array, received string");
	}
}
