pub mod pinecone;
pub mod provider;
pub mod types;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

pub use error::{Error, Result};
pub use pinecone::{DEFAULT_NAMESPACE, PineconeClient, PineconeFactory, PineconeSettings};
pub use provider::{Caller, CallerTag, ClientOptions, ClientProvider, cache_key};
pub use types::*;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Operations the tool layer needs from a vector database.
pub trait VectorBackend
where
	Self: Send + Sync,
{
	fn list_indexes(&self) -> BoxFuture<'_, Result<IndexList>>;

	fn describe_index<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<IndexModel>>;

	fn describe_index_stats<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<IndexStats>>;

	fn create_index_for_model<'a>(
		&'a self,
		spec: &'a IndexForModelSpec,
	) -> BoxFuture<'a, Result<IndexModel>>;

	fn upsert_records<'a>(
		&'a self,
		target: &'a SearchTarget,
		records: &'a [Record],
	) -> BoxFuture<'a, Result<()>>;

	fn search_records<'a>(
		&'a self,
		target: &'a SearchTarget,
		request: &'a SearchRecordsRequest,
	) -> BoxFuture<'a, Result<SearchRecordsResponse>>;

	fn delete_records<'a>(
		&'a self,
		target: &'a SearchTarget,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<()>>;

	fn rerank<'a>(&'a self, request: &'a RerankRequest) -> BoxFuture<'a, Result<RerankResult>>;
}

/// Builds one backend handle per client cache key.
pub trait BackendFactory
where
	Self: Send + Sync,
{
	fn build(&self, options: ClientOptions) -> Result<Arc<dyn VectorBackend>>;
}
