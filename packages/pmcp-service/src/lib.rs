//! Tool operations for the Pinecone MCP server.
//!
//! Each module pairs its request types and their [`Schema`] declarations with the
//! [`PineconeService`] methods that run them.

pub mod cascade;
pub mod docs;
pub mod indexes;
pub mod records;
pub mod rerank;
pub mod search;

mod error;

use std::{sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

pub use cascade::{CascadingSearchRequest, RerankSpec};
pub use docs::{DocsSearch, SearchDocsRequest};
pub use error::{Error, Result};
pub use indexes::{
	CreateIndexForModelRequest, CreateIndexOutcome, DescribeIndexRequest,
	DescribeIndexStatsRequest, ListIndexesRequest,
};
pub use records::{DeleteIndexRecordsRequest, UpsertRecordsRequest};
pub use rerank::{RankedOutcome, RerankDocumentsRequest, RerankOptions};
pub use search::SearchRecordsRequest;
pub use pmcp_backend::BoxFuture;
use pmcp_backend::{Caller, ClientProvider, Cloud, VectorBackend};
use pmcp_schema::Schema;

/// A tool's argument type together with the schema that guards it.
pub trait ToolRequest
where
	Self: Sized + DeserializeOwned,
{
	fn schema() -> Schema;

	fn from_args(args: &Value) -> Result<Self> {
		Ok(Self::schema().parse(args)?)
	}
}

/// Placement used when `create-index-for-model` omits cloud or region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexDefaults {
	pub cloud: Cloud,
	pub region: String,
}
impl Default for IndexDefaults {
	fn default() -> Self {
		Self { cloud: Cloud::Aws, region: "us-east-1".to_string() }
	}
}

/// How long to wait for a freshly created index to report ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Readiness {
	pub timeout: Duration,
	pub poll: Duration,
}
impl Default for Readiness {
	fn default() -> Self {
		Self { timeout: Duration::from_secs(300), poll: Duration::from_secs(1) }
	}
}

pub struct PineconeService {
	pub provider: Arc<ClientProvider>,
	pub index_defaults: IndexDefaults,
	pub readiness: Readiness,
}
impl PineconeService {
	pub fn new(provider: Arc<ClientProvider>) -> Self {
		Self { provider, index_defaults: IndexDefaults::default(), readiness: Readiness::default() }
	}

	pub fn with_index_defaults(mut self, index_defaults: IndexDefaults) -> Self {
		self.index_defaults = index_defaults;

		self
	}

	pub fn with_readiness(mut self, readiness: Readiness) -> Self {
		self.readiness = readiness;

		self
	}

	pub(crate) fn backend(&self, caller: Option<&Caller>) -> Result<Arc<dyn VectorBackend>> {
		Ok(self.provider.get_client(caller)?)
	}
}

/// Two-space indented JSON, the text form of every structured tool result.
pub fn to_pretty_json<T>(value: &T) -> Result<String>
where
	T: ?Sized + Serialize,
{
	Ok(serde_json::to_string_pretty(value)?)
}
