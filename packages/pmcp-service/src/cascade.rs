//! Cascading search: fan a query out over several index/namespace pairs, keep the first hit
//! seen for every record id, and rerank the survivors.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
	PineconeService, Result, ToolRequest,
	rerank::{self, RankedOutcome, RerankOptions},
	search::{self, query_schema, rerank_spec_schema},
};
use pmcp_backend::{Caller, RerankDocuments, SearchQuery, SearchRerank, SearchResult, SearchTarget};
use pmcp_schema::{Field, Schema};

/// How cascading search results are reranked. Same shape as a search-records rerank.
pub type RerankSpec = SearchRerank;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CascadingSearchRequest {
	pub indexes: Vec<SearchTarget>,
	pub query: SearchQuery,
	pub rerank: RerankSpec,
}
impl CascadingSearchRequest {
	/// The rerank query, falling back to the search text when none (or an empty one) is given.
	pub fn rerank_query(&self) -> &str {
		match self.rerank.query.as_deref() {
			Some(query) if !query.is_empty() => query,
			_ => &self.query.inputs.text,
		}
	}

	/// `rerank.topN` unless absent or zero, otherwise `query.topK`.
	pub fn rerank_top_n(&self) -> u32 {
		match self.rerank.top_n {
			Some(top_n) if top_n > 0 => top_n,
			_ => self.query.top_k,
		}
	}
}
impl ToolRequest for CascadingSearchRequest {
	fn schema() -> Schema {
		let target = Schema::object(vec![
			Field::required("name", Schema::String).describe("The name of an index to search."),
			Field::optional("namespace", Schema::String).describe(
				"The namespace to search. Defaults to the index's default namespace.",
			),
		]);

		Schema::strict_object(vec![
			Field::required("indexes", Schema::non_empty_array(target)).describe(
				"The indexes/namespaces to search across. Records in the namespaces should share \
				 a common schema.",
			),
			Field::required("query", query_schema()).describe("A query to search for records."),
			Field::required("rerank", rerank_spec_schema())
				.describe("Specifies how the results should be reranked."),
		])
	}
}

/// Keeps the fields of the first hit seen for every id, in target order then hit order.
pub fn dedup_hits(results: &[SearchResult]) -> Vec<Map<String, Value>> {
	let mut seen = HashSet::new();
	let mut documents = Vec::new();

	for hit in results.iter().flat_map(|result| &result.hits) {
		if seen.insert(hit.id.as_str()) {
			documents.push(hit.fields.clone());
		}
	}

	documents
}

impl PineconeService {
	pub async fn cascading_search(
		&self,
		caller: Option<&Caller>,
		req: CascadingSearchRequest,
	) -> Result<RankedOutcome> {
		let backend = self.backend(caller)?;
		let searches =
			req.indexes.iter().map(|target| search::search(backend.as_ref(), target, &req.query));
		let results = futures::future::try_join_all(searches).await?;
		let documents = dedup_hits(&results);

		if documents.is_empty() {
			return Ok(RankedOutcome::Empty);
		}

		let options = RerankOptions {
			top_n: Some(req.rerank_top_n()),
			rank_fields: Some(req.rerank.rank_fields.clone()),
		};
		let ranked = rerank::rerank(
			backend.as_ref(),
			req.rerank.model,
			req.rerank_query(),
			RerankDocuments::Records(documents),
			options,
		)
		.await?;

		Ok(RankedOutcome::Ranked(ranked))
	}
}
