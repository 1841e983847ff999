use serde::{Deserialize, Serialize};

use crate::{BoxFuture, Result, ToolRequest};
use pmcp_schema::{Field, Schema};

/// A remote documentation search that answers with text passages.
pub trait DocsSearch
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<String>>>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchDocsRequest {
	pub query: String,
}
impl ToolRequest for SearchDocsRequest {
	fn schema() -> Schema {
		Schema::strict_object(vec![
			Field::required("query", Schema::String).describe("The text to search for."),
		])
	}
}

/// Forwards the query and returns the remote passages unmodified.
pub async fn search_docs(docs: &dyn DocsSearch, req: SearchDocsRequest) -> Result<Vec<String>> {
	docs.search(&req.query).await
}
