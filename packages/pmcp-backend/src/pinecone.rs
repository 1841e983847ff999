// std
use std::{
	collections::{BTreeMap, HashMap},
	sync::{Arc, Mutex, MutexGuard},
	time::Duration,
};

// crates.io
use reqwest::{
	Client, RequestBuilder, StatusCode, Url,
	header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

// self
use crate::{
	BackendFactory, BoxFuture, ClientOptions, Error, IndexForModelSpec, IndexList, IndexModel,
	IndexStats, NamespaceSummary, Record, RerankDocuments, RerankRequest, RerankResult,
	Result, SearchRecordsRequest, SearchRecordsResponse, SearchTarget, VectorBackend,
};

pub const DEFAULT_NAMESPACE: &str = "__default__";

const API_KEY_HEADER: &str = "api-key";
const API_VERSION_HEADER: &str = "x-pinecone-api-version";
const NDJSON: &str = "application/x-ndjson";

/// Connection settings shared by every client the factory builds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PineconeSettings {
	pub control_plane_url: String,
	pub api_version: String,
	pub timeout: Duration,
}

pub struct PineconeFactory {
	settings: PineconeSettings,
}
impl PineconeFactory {
	pub fn new(settings: PineconeSettings) -> Self {
		Self { settings }
	}
}
impl BackendFactory for PineconeFactory {
	fn build(&self, options: ClientOptions) -> Result<Arc<dyn VectorBackend>> {
		Ok(Arc::new(PineconeClient::new(&self.settings, &options)?))
	}
}

pub struct PineconeClient {
	http: Client,
	control_plane_url: String,
	hosts: Mutex<HashMap<String, String>>,
}
impl PineconeClient {
	pub fn new(settings: &PineconeSettings, options: &ClientOptions) -> Result<Self> {
		let http = Client::builder()
			.timeout(settings.timeout)
			.default_headers(default_headers(settings, options)?)
			.build()?;

		Ok(Self {
			http,
			control_plane_url: settings.control_plane_url.trim_end_matches('/').to_string(),
			hosts: Mutex::new(HashMap::new()),
		})
	}

	async fn list(&self) -> Result<IndexList> {
		tracing::debug!("Listing indexes.");

		let url = join_url(&self.control_plane_url, &["indexes"])?;

		send_json("list_indexes", self.http.get(url)).await
	}

	async fn describe(&self, name: &str) -> Result<IndexModel> {
		tracing::debug!(index = name, "Describing index.");

		let url = join_url(&self.control_plane_url, &["indexes", name])?;
		let model: IndexModel = send_json("describe_index", self.http.get(url)).await?;

		if !model.host.is_empty() {
			self.hosts_guard().insert(name.to_string(), data_plane_base(&model.host));
		}

		Ok(model)
	}

	async fn stats(&self, name: &str) -> Result<IndexStats> {
		tracing::debug!(index = name, "Describing index stats.");

		let base = self.data_plane(name).await?;
		let url = join_url(&base, &["describe_index_stats"])?;
		let raw: StatsWire =
			send_json("describe_index_stats", self.http.post(url).json(&Map::new())).await?;

		Ok(raw.into())
	}

	async fn create(&self, spec: &IndexForModelSpec) -> Result<IndexModel> {
		tracing::debug!(index = %spec.name, model = spec.embed.model.as_str(), "Creating index.");

		let url = join_url(&self.control_plane_url, &["indexes", "create-for-model"])?;
		let body = CreateForModelWire::from(spec);

		send_json("create_index_for_model", self.http.post(url).json(&body)).await
	}

	async fn upsert(&self, target: &SearchTarget, records: &[Record]) -> Result<()> {
		tracing::debug!(
			index = %target.name,
			namespace = %target.namespace,
			count = records.len(),
			"Upserting records."
		);

		let base = self.data_plane(&target.name).await?;
		let url = join_url(&base, &["records", "namespaces", namespace_segment(target), "upsert"])?;
		let body = ndjson(records)?;
		let request = self.http.post(url).header(CONTENT_TYPE, NDJSON).body(body);

		send_empty("upsert_records", request).await
	}

	async fn search(
		&self,
		target: &SearchTarget,
		request: &SearchRecordsRequest,
	) -> Result<SearchRecordsResponse> {
		tracing::debug!(index = %target.name, namespace = %target.namespace, "Searching records.");

		let base = self.data_plane(&target.name).await?;
		let url = join_url(&base, &["records", "namespaces", namespace_segment(target), "search"])?;
		let body = SearchWire::from(request);

		send_json("search_records", self.http.post(url).json(&body)).await
	}

	async fn delete(&self, target: &SearchTarget, ids: &[String]) -> Result<()> {
		tracing::debug!(
			index = %target.name,
			namespace = %target.namespace,
			count = ids.len(),
			"Deleting records."
		);

		let base = self.data_plane(&target.name).await?;
		let url = join_url(&base, &["vectors", "delete"])?;
		let body = DeleteWire { ids, namespace: namespace_segment(target) };
		let raw: Value = send_json("delete_records", self.http.post(url).json(&body)).await?;

		tracing::trace!(response = %raw, "Delete acknowledged.");

		Ok(())
	}

	async fn rank(&self, request: &RerankRequest) -> Result<RerankResult> {
		tracing::debug!(
			model = request.model.as_str(),
			documents = request.documents.len(),
			"Reranking documents."
		);

		let url = join_url(&self.control_plane_url, &["rerank"])?;
		let body = RerankWire::from(request);

		send_json("rerank", self.http.post(url).json(&body)).await
	}

	async fn data_plane(&self, name: &str) -> Result<String> {
		let cached = self.hosts_guard().get(name).cloned();

		if let Some(base) = cached {
			return Ok(base);
		}

		let model = self.describe(name).await?;

		if model.host.is_empty() {
			return Err(Error::InvalidResponse {
				message: format!("Index {name:?} has no data plane host yet."),
			});
		}

		Ok(data_plane_base(&model.host))
	}

	fn hosts_guard(&self) -> MutexGuard<'_, HashMap<String, String>> {
		self.hosts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}
impl VectorBackend for PineconeClient {
	fn list_indexes(&self) -> BoxFuture<'_, Result<IndexList>> {
		Box::pin(self.list())
	}

	fn describe_index<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<IndexModel>> {
		Box::pin(self.describe(name))
	}

	fn describe_index_stats<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<IndexStats>> {
		Box::pin(self.stats(name))
	}

	fn create_index_for_model<'a>(
		&'a self,
		spec: &'a IndexForModelSpec,
	) -> BoxFuture<'a, Result<IndexModel>> {
		Box::pin(self.create(spec))
	}

	fn upsert_records<'a>(
		&'a self,
		target: &'a SearchTarget,
		records: &'a [Record],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.upsert(target, records))
	}

	fn search_records<'a>(
		&'a self,
		target: &'a SearchTarget,
		request: &'a SearchRecordsRequest,
	) -> BoxFuture<'a, Result<SearchRecordsResponse>> {
		Box::pin(self.search(target, request))
	}

	fn delete_records<'a>(
		&'a self,
		target: &'a SearchTarget,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.delete(target, ids))
	}

	fn rerank<'a>(&'a self, request: &'a RerankRequest) -> BoxFuture<'a, Result<RerankResult>> {
		Box::pin(self.rank(request))
	}
}

#[derive(Serialize)]
struct CreateForModelWire<'a> {
	name: &'a str,
	cloud: &'static str,
	region: &'a str,
	embed: EmbedWire<'a>,
	tags: &'a BTreeMap<String, String>,
}
impl<'a> From<&'a IndexForModelSpec> for CreateForModelWire<'a> {
	fn from(spec: &'a IndexForModelSpec) -> Self {
		Self {
			name: &spec.name,
			cloud: spec.cloud.as_str(),
			region: &spec.region,
			embed: EmbedWire {
				model: spec.embed.model.as_str(),
				field_map: FieldMapWire { text: &spec.embed.field_map.text },
			},
			tags: &spec.tags,
		}
	}
}

#[derive(Serialize)]
struct EmbedWire<'a> {
	model: &'static str,
	field_map: FieldMapWire<'a>,
}

#[derive(Serialize)]
struct FieldMapWire<'a> {
	text: &'a str,
}

#[derive(Serialize)]
struct SearchWire<'a> {
	query: SearchQueryWire<'a>,
	#[serde(skip_serializing_if = "Option::is_none")]
	rerank: Option<SearchRerankWire<'a>>,
}
impl<'a> From<&'a SearchRecordsRequest> for SearchWire<'a> {
	fn from(request: &'a SearchRecordsRequest) -> Self {
		let query = &request.query;

		Self {
			query: SearchQueryWire {
				top_k: query.top_k,
				inputs: TextInputs { text: &query.inputs.text },
				filter: query.filter.as_ref(),
			},
			rerank: request.rerank.as_ref().map(|rerank| SearchRerankWire {
				model: rerank.model.as_str(),
				rank_fields: &rerank.rank_fields,
				top_n: rerank.top_n,
				query: rerank.query.as_deref(),
			}),
		}
	}
}

#[derive(Serialize)]
struct SearchQueryWire<'a> {
	top_k: u32,
	inputs: TextInputs<'a>,
	#[serde(skip_serializing_if = "Option::is_none")]
	filter: Option<&'a Value>,
}

#[derive(Serialize)]
struct TextInputs<'a> {
	text: &'a str,
}

#[derive(Serialize)]
struct SearchRerankWire<'a> {
	model: &'static str,
	rank_fields: &'a [String],
	#[serde(skip_serializing_if = "Option::is_none")]
	top_n: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	query: Option<&'a str>,
}

#[derive(Serialize)]
struct DeleteWire<'a> {
	ids: &'a [String],
	namespace: &'a str,
}

#[derive(Serialize)]
struct RerankWire<'a> {
	model: &'static str,
	query: &'a str,
	documents: Vec<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	top_n: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	rank_fields: Option<&'a [String]>,
	return_documents: bool,
}
impl<'a> From<&'a RerankRequest> for RerankWire<'a> {
	fn from(request: &'a RerankRequest) -> Self {
		let documents = match &request.documents {
			RerankDocuments::Texts(texts) =>
				texts.iter().map(|text| serde_json::json!({ "text": text })).collect(),
			RerankDocuments::Records(records) =>
				records.iter().cloned().map(Value::Object).collect(),
		};

		Self {
			model: request.model.as_str(),
			query: &request.query,
			documents,
			top_n: request.top_n,
			rank_fields: request.rank_fields.as_deref(),
			return_documents: true,
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsWire {
	#[serde(default)]
	namespaces: BTreeMap<String, NamespaceWire>,
	#[serde(default)]
	dimension: Option<u32>,
	#[serde(default)]
	total_vector_count: u64,
}
impl From<StatsWire> for IndexStats {
	fn from(raw: StatsWire) -> Self {
		Self {
			namespaces: raw
				.namespaces
				.into_iter()
				.map(|(name, ns)| (name, NamespaceSummary { record_count: ns.vector_count }))
				.collect(),
			dimension: raw.dimension,
			total_record_count: raw.total_vector_count,
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceWire {
	#[serde(default)]
	vector_count: u64,
}

fn default_headers(settings: &PineconeSettings, options: &ClientOptions) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(HeaderName::from_static(API_KEY_HEADER), secret_header(&options.api_key)?);
	headers.insert(
		HeaderName::from_static(API_VERSION_HEADER),
		HeaderValue::from_str(&settings.api_version)?,
	);
	headers.insert(USER_AGENT, HeaderValue::from_str(&user_agent(options))?);

	Ok(headers)
}

fn secret_header(raw: &str) -> Result<HeaderValue> {
	let mut value = HeaderValue::from_str(raw)?;

	value.set_sensitive(true);

	Ok(value)
}

fn user_agent(options: &ClientOptions) -> String {
	let Some(caller) = &options.caller else {
		return options.source_tag.clone();
	};

	match &caller.provider {
		Some(provider) => format!("{}; caller={provider}:{}", options.source_tag, caller.model),
		None => format!("{}; caller={}", options.source_tag, caller.model),
	}
}

fn data_plane_base(host: &str) -> String {
	let host = host.trim_end_matches('/');

	if host.starts_with("http://") || host.starts_with("https://") {
		host.to_string()
	} else {
		format!("https://{host}")
	}
}

fn namespace_segment(target: &SearchTarget) -> &str {
	if target.namespace.is_empty() { DEFAULT_NAMESPACE } else { &target.namespace }
}

fn join_url(base: &str, segments: &[&str]) -> Result<Url> {
	let invalid = |message: String| Error::InvalidUrl { url: base.to_string(), message };
	let mut url = Url::parse(base).map_err(|err| invalid(err.to_string()))?;

	url.path_segments_mut()
		.map_err(|()| invalid("URL cannot be a base.".to_string()))?
		.pop_if_empty()
		.extend(segments);

	Ok(url)
}

fn ndjson(records: &[Record]) -> Result<String> {
	let mut body = String::new();

	for record in records {
		body.push_str(&serde_json::to_string(record)?);
		body.push('\n');
	}

	Ok(body)
}

async fn send(operation: &str, request: RequestBuilder) -> Result<reqwest::Response> {
	let response = request.send().await.map_err(|err| transport_error(operation, err))?;
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let body = response.text().await.map_err(|err| transport_error(operation, err))?;

	Err(api_error(status, &body))
}

async fn send_json<T>(operation: &str, request: RequestBuilder) -> Result<T>
where
	T: DeserializeOwned,
{
	let response = send(operation, request).await?;
	let body = response.text().await.map_err(|err| transport_error(operation, err))?;

	if body.trim().is_empty() {
		return serde_json::from_value(Value::Object(Map::new())).map_err(Error::from);
	}

	serde_json::from_str(&body).map_err(|err| Error::InvalidResponse {
		message: format!("Pinecone {operation} response could not be decoded: {err}"),
	})
}

async fn send_empty(operation: &str, request: RequestBuilder) -> Result<()> {
	send(operation, request).await.map(|_| ())
}

fn transport_error(operation: &str, err: reqwest::Error) -> Error {
	if err.is_timeout() {
		Error::Timeout { operation: operation.to_string() }
	} else {
		Error::Transport { operation: operation.to_string(), source: err }
	}
}

/// Builds the error for a non-success response, preferring the backend's own message.
pub fn api_error(status: StatusCode, body: &str) -> Error {
	let message = serde_json::from_str::<Value>(body)
		.ok()
		.and_then(|json| {
			json.pointer("/error/message")
				.or_else(|| json.get("message"))
				.and_then(Value::as_str)
				.map(str::to_string)
		})
		.filter(|message| !message.trim().is_empty())
		.unwrap_or_else(|| {
			let body = body.trim();

			if body.is_empty() {
				format!("HTTP {}", status.as_u16())
			} else {
				format!("HTTP {}: {body}", status.as_u16())
			}
		});

	Error::Api { status: status.as_u16(), message }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		Cloud, EmbedConfig, EmbedModel, FieldMap, QueryInputs, RerankModel, SearchQuery,
		SearchRerank, provider::CallerTag,
	};

	fn options(caller: Option<CallerTag>) -> ClientOptions {
		ClientOptions {
			api_key: "pc-test".to_string(),
			source_tag: "pinecone-mcp@0.1.0".to_string(),
			caller,
		}
	}

	#[test]
	fn api_error_prefers_nested_message() {
		let body = r#"{"error":{"code":"NOT_FOUND","message":"Index not found"},"status":404}"#;
		let err = api_error(StatusCode::NOT_FOUND, body);

		assert_eq!(err.to_string(), "Index not found");
		assert!(matches!(err, Error::Api { status: 404, .. }));
	}

	#[test]
	fn api_error_reads_flat_message() {
		let err = api_error(StatusCode::BAD_REQUEST, r#"{"code":3,"message":"Bad filter"}"#);

		assert_eq!(err.to_string(), "Bad filter");
	}

	#[test]
	fn api_error_falls_back_to_status_and_body() {
		assert_eq!(
			api_error(StatusCode::BAD_GATEWAY, "upstream down").to_string(),
			"HTTP 502: upstream down"
		);
		assert_eq!(api_error(StatusCode::BAD_GATEWAY, " ").to_string(), "HTTP 502");
	}

	#[test]
	fn empty_namespace_maps_to_default() {
		assert_eq!(namespace_segment(&SearchTarget::new("docs", "")), "__default__");
		assert_eq!(namespace_segment(&SearchTarget::new("docs", "faq")), "faq");
	}

	#[test]
	fn join_url_escapes_segments() {
		let url = join_url("https://docs-abc.svc.pinecone.io", &["records", "namespaces", "a b"])
			.expect("URL should build.");

		assert_eq!(url.as_str(), "https://docs-abc.svc.pinecone.io/records/namespaces/a%20b");
	}

	#[test]
	fn data_plane_base_adds_scheme() {
		assert_eq!(data_plane_base("docs-abc.svc.pinecone.io"), "https://docs-abc.svc.pinecone.io");
		assert_eq!(data_plane_base("http://localhost:5080/"), "http://localhost:5080");
	}

	#[test]
	fn user_agent_carries_caller() {
		assert_eq!(user_agent(&options(None)), "pinecone-mcp@0.1.0");

		let tag =
			CallerTag { model: "claude".to_string(), provider: Some("anthropic".to_string()) };

		assert_eq!(user_agent(&options(Some(tag))), "pinecone-mcp@0.1.0; caller=anthropic:claude");
	}

	#[test]
	fn search_body_uses_wire_names() {
		let request = SearchRecordsRequest {
			query: SearchQuery {
				top_k: 3,
				inputs: QueryInputs { text: "hello".to_string() },
				filter: Some(serde_json::json!({ "genre": { "$eq": "news" } })),
			},
			rerank: Some(SearchRerank {
				model: RerankModel::BgeRerankerV2M3,
				top_n: None,
				rank_fields: vec!["text".to_string()],
				query: None,
			}),
		};
		let body =
			serde_json::to_value(SearchWire::from(&request)).expect("Body should serialize.");

		assert_eq!(
			body,
			serde_json::json!({
				"query": {
					"top_k": 3,
					"inputs": { "text": "hello" },
					"filter": { "genre": { "$eq": "news" } }
				},
				"rerank": { "model": "bge-reranker-v2-m3", "rank_fields": ["text"] }
			})
		);
	}

	#[test]
	fn rerank_body_wraps_plain_texts() {
		let request = RerankRequest {
			model: RerankModel::CohereRerank35,
			query: "q".to_string(),
			documents: RerankDocuments::Texts(vec!["a".to_string()]),
			top_n: Some(1),
			rank_fields: None,
		};
		let body =
			serde_json::to_value(RerankWire::from(&request)).expect("Body should serialize.");

		assert_eq!(body["documents"], serde_json::json!([{ "text": "a" }]));
		assert_eq!(body["top_n"], 1);
		assert!(body.get("rank_fields").is_none());
	}

	#[test]
	fn create_body_carries_tags_and_field_map() {
		let spec = IndexForModelSpec {
			name: "docs".to_string(),
			cloud: Cloud::Aws,
			region: "us-east-1".to_string(),
			embed: EmbedConfig {
				model: EmbedModel::LlamaTextEmbedV2,
				field_map: FieldMap { text: "chunk".to_string() },
			},
			tags: BTreeMap::from([("source".to_string(), "mcp".to_string())]),
		};
		let body =
			serde_json::to_value(CreateForModelWire::from(&spec)).expect("Body should serialize.");

		assert_eq!(body["embed"]["field_map"]["text"], "chunk");
		assert_eq!(body["cloud"], "aws");
		assert_eq!(body["tags"]["source"], "mcp");
	}

	#[test]
	fn stats_rename_vector_counts() {
		let raw: StatsWire = serde_json::from_value(serde_json::json!({
			"namespaces": { "": { "vectorCount": 2 }, "faq": { "vectorCount": 5 } },
			"dimension": 1024,
			"totalVectorCount": 7
		}))
		.expect("Stats should parse.");
		let stats = IndexStats::from(raw);

		assert_eq!(stats.total_record_count, 7);
		assert_eq!(stats.namespaces["faq"].record_count, 5);
	}

	#[test]
	fn ndjson_writes_one_record_per_line() {
		let records: Vec<Record> = vec![
			serde_json::from_value(serde_json::json!({ "id": "1", "text": "a" }))
				.expect("Record should parse."),
			serde_json::from_value(serde_json::json!({ "id": "2", "text": "b" }))
				.expect("Record should parse."),
		];

		assert_eq!(
			ndjson(&records).expect("NDJSON should encode."),
			"{\"id\":\"1\",\"text\":\"a\"}\n{\"id\":\"2\",\"text\":\"b\"}\n"
		);
	}
}
