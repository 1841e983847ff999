//! In-memory stand-ins for the Pinecone API and the docs assistant.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex, MutexGuard},
};

use serde_json::{Map, Value};

use pmcp_backend::{
	BackendFactory, BoxFuture, ClientOptions, ClientProvider, Error, Hit, IndexForModelSpec,
	IndexList, IndexModel, IndexStats, IndexStatus, NamespaceSummary, RankedDocument, Record,
	RerankDocuments, RerankRequest, RerankResult, RerankUsage, Result, SearchRecordsRequest,
	SearchRecordsResponse, SearchTarget, VectorBackend,
};
use pmcp_service::DocsSearch;

pub const TEST_SOURCE_TAG: &str = "pinecone-mcp@test";

enum Scripted {
	Hits(Vec<Hit>),
	Failure(String),
}

#[derive(Default)]
struct State {
	searches: HashMap<(String, String), Scripted>,
	indexes: Vec<IndexModel>,
	records: HashMap<(String, String), Vec<Record>>,
	rerank_failure: Option<String>,
	ready_after: usize,
	describe_calls: usize,
	search_calls: Vec<(SearchTarget, SearchRecordsRequest)>,
	rerank_calls: Vec<RerankRequest>,
	created: Vec<IndexForModelSpec>,
	deleted: Vec<(SearchTarget, Vec<String>)>,
}

/// A [`VectorBackend`] whose answers are scripted per index/namespace and whose calls are
/// recorded for assertions.
#[derive(Default)]
pub struct ScriptedBackend {
	state: Mutex<State>,
}
impl ScriptedBackend {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_hits(self, name: &str, namespace: &str, hits: Vec<Hit>) -> Self {
		self.lock().searches.insert(key(name, namespace), Scripted::Hits(hits));

		self
	}

	pub fn with_search_failure(self, name: &str, namespace: &str, message: &str) -> Self {
		self.lock().searches.insert(key(name, namespace), Scripted::Failure(message.to_string()));

		self
	}

	pub fn with_rerank_failure(self, message: &str) -> Self {
		self.lock().rerank_failure = Some(message.to_string());

		self
	}

	pub fn with_index(self, index: IndexModel) -> Self {
		self.lock().indexes.push(index);

		self
	}

	/// Newly created indexes report ready only after this many describe calls.
	pub fn with_ready_after(self, describe_calls: usize) -> Self {
		self.lock().ready_after = describe_calls;

		self
	}

	pub fn search_calls(&self) -> Vec<(SearchTarget, SearchRecordsRequest)> {
		self.lock().search_calls.clone()
	}

	pub fn rerank_calls(&self) -> Vec<RerankRequest> {
		self.lock().rerank_calls.clone()
	}

	pub fn created(&self) -> Vec<IndexForModelSpec> {
		self.lock().created.clone()
	}

	pub fn describe_calls(&self) -> usize {
		self.lock().describe_calls
	}

	pub fn records(&self, name: &str, namespace: &str) -> Vec<Record> {
		self.lock().records.get(&key(name, namespace)).cloned().unwrap_or_default()
	}

	pub fn deleted(&self) -> Vec<(SearchTarget, Vec<String>)> {
		self.lock().deleted.clone()
	}

	fn lock(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn find_index(&self, name: &str) -> Result<IndexModel> {
		let mut state = self.lock();

		state.describe_calls += 1;

		let ready = state.describe_calls >= state.ready_after;
		let index = state
			.indexes
			.iter_mut()
			.find(|index| index.name == name)
			.ok_or_else(|| not_found(name))?;

		if ready {
			index.status = ready_status();
		}

		Ok(index.clone())
	}

	fn run_search(
		&self,
		target: &SearchTarget,
		request: &SearchRecordsRequest,
	) -> Result<SearchRecordsResponse> {
		let mut state = self.lock();

		state.search_calls.push((target.clone(), request.clone()));

		match state.searches.get(&key(&target.name, &target.namespace)) {
			Some(Scripted::Hits(hits)) => {
				let top_k = request.query.top_k as usize;

				Ok(SearchRecordsResponse::from_hits(hits.iter().take(top_k).cloned().collect()))
			},
			Some(Scripted::Failure(message)) =>
				Err(Error::Api { status: 500, message: message.clone() }),
			None => Err(not_found(&target.name)),
		}
	}

	fn run_rerank(&self, request: &RerankRequest) -> Result<RerankResult> {
		let mut state = self.lock();

		state.rerank_calls.push(request.clone());

		if let Some(message) = &state.rerank_failure {
			return Err(Error::Api { status: 500, message: message.clone() });
		}

		Ok(ranked(request))
	}
}
impl VectorBackend for ScriptedBackend {
	fn list_indexes(&self) -> BoxFuture<'_, Result<IndexList>> {
		let indexes = self.lock().indexes.clone();

		Box::pin(async move { Ok(IndexList { indexes }) })
	}

	fn describe_index<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<IndexModel>> {
		let result = self.find_index(name);

		Box::pin(async move { result })
	}

	fn describe_index_stats<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<IndexStats>> {
		let state = self.lock();
		let result = if state.indexes.iter().any(|index| index.name == name) {
			let namespaces: std::collections::BTreeMap<String, NamespaceSummary> = state
				.records
				.iter()
				.filter(|((index, _), _)| index == name)
				.map(|((_, namespace), records)| {
					(namespace.clone(), NamespaceSummary { record_count: records.len() as u64 })
				})
				.collect();
			let total_record_count = namespaces.values().map(|ns| ns.record_count).sum();

			Ok(IndexStats { namespaces, dimension: Some(1024), total_record_count })
		} else {
			Err(not_found(name))
		};

		drop(state);

		Box::pin(async move { result })
	}

	fn create_index_for_model<'a>(
		&'a self,
		spec: &'a IndexForModelSpec,
	) -> BoxFuture<'a, Result<IndexModel>> {
		let mut state = self.lock();
		let index = IndexModel {
			name: spec.name.clone(),
			host: format!("{}-test.svc.pinecone.io", spec.name),
			status: IndexStatus { ready: false, state: "Initializing".to_string() },
			extra: Map::from_iter([(
				"embed".to_string(),
				serde_json::json!({
					"model": spec.embed.model.as_str(),
					"field_map": { "text": spec.embed.field_map.text },
				}),
			)]),
		};

		state.created.push(spec.clone());
		state.indexes.push(index.clone());
		state.describe_calls = 0;

		drop(state);

		Box::pin(async move { Ok(index) })
	}

	fn upsert_records<'a>(
		&'a self,
		target: &'a SearchTarget,
		records: &'a [Record],
	) -> BoxFuture<'a, Result<()>> {
		self.lock()
			.records
			.entry(key(&target.name, &target.namespace))
			.or_default()
			.extend(records.iter().cloned());

		Box::pin(async move { Ok(()) })
	}

	fn search_records<'a>(
		&'a self,
		target: &'a SearchTarget,
		request: &'a SearchRecordsRequest,
	) -> BoxFuture<'a, Result<SearchRecordsResponse>> {
		let result = self.run_search(target, request);

		Box::pin(async move { result })
	}

	fn delete_records<'a>(
		&'a self,
		target: &'a SearchTarget,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<()>> {
		self.lock().deleted.push((target.clone(), ids.to_vec()));

		Box::pin(async move { Ok(()) })
	}

	fn rerank<'a>(&'a self, request: &'a RerankRequest) -> BoxFuture<'a, Result<RerankResult>> {
		let result = self.run_rerank(request);

		Box::pin(async move { result })
	}
}

/// Hands out the same scripted backend for every cache key.
pub struct ScriptedFactory {
	backend: Arc<ScriptedBackend>,
}
impl ScriptedFactory {
	pub fn new(backend: Arc<ScriptedBackend>) -> Self {
		Self { backend }
	}
}
impl BackendFactory for ScriptedFactory {
	fn build(&self, _options: ClientOptions) -> Result<Arc<dyn VectorBackend>> {
		Ok(Arc::clone(&self.backend) as Arc<dyn VectorBackend>)
	}
}

/// A configured client provider backed by `backend`.
pub fn provider(backend: Arc<ScriptedBackend>) -> Arc<ClientProvider> {
	Arc::new(ClientProvider::new(
		Some("pc-test".to_string()),
		TEST_SOURCE_TAG,
		Arc::new(ScriptedFactory::new(backend)),
	))
}

/// A client provider with no API key.
pub fn unconfigured_provider() -> Arc<ClientProvider> {
	Arc::new(ClientProvider::new(
		None,
		TEST_SOURCE_TAG,
		Arc::new(ScriptedFactory::new(Arc::new(ScriptedBackend::new()))),
	))
}

pub fn hit(id: &str, score: f64, fields: Value) -> Hit {
	let fields = match fields {
		Value::Object(map) => map,
		_ => Map::new(),
	};

	Hit { id: id.to_string(), score, fields }
}

pub fn ready_index(name: &str) -> IndexModel {
	IndexModel {
		name: name.to_string(),
		host: format!("{name}-test.svc.pinecone.io"),
		status: ready_status(),
		extra: Map::new(),
	}
}

/// A docs assistant that always answers with the same passages, or always fails.
#[derive(Default)]
pub struct StaticDocs {
	passages: Vec<String>,
	failure: Option<String>,
	queries: Mutex<Vec<String>>,
}
impl StaticDocs {
	pub fn new(passages: &[&str]) -> Self {
		Self { passages: passages.iter().map(|p| p.to_string()).collect(), ..Default::default() }
	}

	pub fn failing(message: &str) -> Self {
		Self { failure: Some(message.to_string()), ..Default::default() }
	}

	pub fn queries(&self) -> Vec<String> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl DocsSearch for StaticDocs {
	fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, pmcp_service::Result<Vec<String>>> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).push(query.to_string());

		let result = match &self.failure {
			Some(message) => Err(pmcp_service::Error::Docs { message: message.clone() }),
			None => Ok(self.passages.clone()),
		};

		Box::pin(async move { result })
	}
}

fn key(name: &str, namespace: &str) -> (String, String) {
	(name.to_string(), namespace.to_string())
}

fn not_found(name: &str) -> Error {
	Error::Api { status: 404, message: format!("Index {name} not found") }
}

fn ready_status() -> IndexStatus {
	IndexStatus { ready: true, state: "Ready".to_string() }
}

/// Echoes the documents in submission order with descending scores, cut to `top_n`.
fn ranked(request: &RerankRequest) -> RerankResult {
	let documents: Vec<Map<String, Value>> = match &request.documents {
		RerankDocuments::Texts(texts) => texts
			.iter()
			.map(|text| Map::from_iter([("text".to_string(), Value::String(text.clone()))]))
			.collect(),
		RerankDocuments::Records(records) => records.clone(),
	};
	let limit = request.top_n.map_or(documents.len(), |top_n| top_n as usize);
	let data = documents
		.into_iter()
		.enumerate()
		.take(limit)
		.map(|(index, document)| RankedDocument {
			index,
			score: 1.0 / (index as f64 + 1.0),
			document: Some(document),
		})
		.collect::<Vec<_>>();

	RerankResult {
		model: request.model.as_str().to_string(),
		usage: RerankUsage { rerank_units: 1 },
		data,
	}
}
