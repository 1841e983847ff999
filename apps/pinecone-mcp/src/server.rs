use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use color_eyre::Result;
use rmcp::{
	ErrorData, ServerHandler, ServiceExt,
	handler::server::router::tool::ToolRouter,
	model::{CallToolResult, Content, Implementation, JsonObject, ServerCapabilities, ServerInfo},
	transport::streamable_http_server::{
		StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
	},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use pmcp_backend::Caller;
use pmcp_schema::{Issue, IssueKind, PathSegment, ValidationError, type_name};
use pmcp_service::{
	CascadingSearchRequest, CreateIndexForModelRequest, DeleteIndexRecordsRequest,
	DescribeIndexRequest, DescribeIndexStatsRequest, DocsSearch, Error, ListIndexesRequest,
	PineconeService, RerankDocumentsRequest, SearchDocsRequest, SearchRecordsRequest,
	ToolRequest, UpsertRecordsRequest, docs, to_pretty_json,
};

const LLM_PROVIDER: &str = "llm_provider";
const LLM_MODEL: &str = "llm_model";
const LLM_PROVIDER_DESCRIPTION: &str = "Optional. If you are an AI model, the name of the company \
	that trained you (for example \"Anthropic\", \"OpenAI\" or \"Google\"). Approximate values are \
	fine. Omit the field if you do not know it. Do not prompt the user for this. Used for usage \
	analytics.";
const LLM_MODEL_DESCRIPTION: &str = "Optional. If you are an AI model, your model name (for \
	example \"gpt-4o\" or \"Claude Sonnet 4\"). Include a version only if you know it. Omit the \
	field if you do not know it. Do not prompt the user for this. Used for usage analytics.";

const SERVER_INSTRUCTIONS: &str = "\
This server helps you write code for Pinecone and manage Pinecone indexes and records.

When asked for Pinecone code, search the documentation with `search-docs` first and base the \
answer on the snippets it returns. Prefer the latest SDK releases (for example `pip install \
pinecone`, not the retired `pinecone-client` package) and never invent field names or values.

Index management: `list-indexes` lists every index, `describe-index` shows one index's \
configuration, and `describe-index-stats` reports record counts per namespace. \
`create-index-for-model` creates an index with integrated embedding.

Records: `upsert-records` inserts or updates records. Keep one schema per namespace. Only the \
field named in the index's `fieldMap` is embedded; other fields are metadata and must be \
strings, numbers, booleans or arrays of strings.

Search: `search-records` queries one namespace, optionally with a metadata filter and a \
reranker. `cascading-search` queries several indexes or namespaces at once, deduplicates hits by \
`_id` and reranks the merged set, which suits hybrid dense plus sparse setups. \
`rerank-documents` reranks documents you already hold.

If anything is unclear or a tool fails unexpectedly, use `search-docs` to look it up.";

#[derive(Clone)]
pub struct PineconeMcp {
	service: Arc<PineconeService>,
	docs: Option<Arc<dyn DocsSearch>>,
	tool_router: ToolRouter<Self>,
}
impl PineconeMcp {
	/// Database tools need an API key and the docs tool needs a live docs connection; groups
	/// whose prerequisite is missing are left out of the tool listing.
	pub fn new(service: Arc<PineconeService>, docs: Option<Arc<dyn DocsSearch>>) -> Self {
		let mut tool_router = ToolRouter::new();

		if service.provider.is_configured() {
			tool_router = tool_router + Self::database_router();
		}
		if docs.is_some() {
			tool_router = tool_router + Self::docs_router();
		}

		Self { service, docs, tool_router }
	}

	pub fn tool_names(&self) -> Vec<String> {
		let mut names = self
			.tool_router
			.list_all()
			.into_iter()
			.map(|tool| tool.name.to_string())
			.collect::<Vec<_>>();

		names.sort();

		names
	}
}

#[rmcp::tool_router(router = database_router)]
impl PineconeMcp {
	#[rmcp::tool(
		name = "list-indexes",
		description = "List all Pinecone indexes.",
		input_schema = list_indexes_schema()
	)]
	async fn list_indexes(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let result = async {
			let (caller, _) = parse_request::<ListIndexesRequest>(params)?;

			to_pretty_json(&self.service.list_indexes(caller.as_ref()).await?)
		};

		respond("list-indexes", result.await)
	}

	#[rmcp::tool(
		name = "describe-index",
		description = "Describe the configuration of a Pinecone index: its host, status, \
			dimension, metric and, for integrated indexes, the embedding model and \
			\"embed.fieldMap\".",
		input_schema = describe_index_schema()
	)]
	async fn describe_index(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let result = async {
			let (caller, req) = parse_request::<DescribeIndexRequest>(params)?;

			to_pretty_json(&self.service.describe_index(caller.as_ref(), req).await?)
		};

		respond("describe-index", result.await)
	}

	#[rmcp::tool(
		name = "describe-index-stats",
		description = "Describe the statistics of a Pinecone index. \"totalRecordCount\" is the \
			number of records in the index and \"namespaces\" breaks the count down by namespace.",
		input_schema = describe_index_stats_schema()
	)]
	async fn describe_index_stats(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let result = async {
			let (caller, req) = parse_request::<DescribeIndexStatsRequest>(params)?;

			to_pretty_json(&self.service.describe_index_stats(caller.as_ref(), req).await?)
		};

		respond("describe-index-stats", result.await)
	}

	#[rmcp::tool(
		name = "create-index-for-model",
		description = "Create a Pinecone index with integrated inference. Choose a unique name, \
			an embedding model, and the record field that should be embedded. Existing indexes \
			are never modified.",
		input_schema = create_index_for_model_schema()
	)]
	async fn create_index_for_model(
		&self,
		params: JsonObject,
	) -> Result<CallToolResult, ErrorData> {
		let result = async {
			let (caller, req) = parse_request::<CreateIndexForModelRequest>(params)?;

			self.service.create_index_for_model(caller.as_ref(), req).await?.to_text()
		};

		respond("create-index-for-model", result.await)
	}

	#[rmcp::tool(
		name = "upsert-records",
		description = "Insert or update records in a Pinecone index.",
		input_schema = upsert_records_schema()
	)]
	async fn upsert_records(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let result = async {
			let (caller, req) = parse_request::<UpsertRecordsRequest>(params)?;

			Ok(self.service.upsert_records(caller.as_ref(), req).await?.to_string())
		};

		respond("upsert-records", result.await)
	}

	#[rmcp::tool(
		name = "search-records",
		description = "Search a namespace for records similar to the query text. The optional \
			\"query.filter\" narrows results by metadata; filter only when a specific value \
			or range is needed. The optional \"rerank\" parameter reorders hits with a \
			reranking model: ask for a larger \"topK\" and let \"rerank.topN\" pick the most \
			relevant ones.\n\n\
			If results look wrong: check with \"describe-index-stats\" that the namespace \
			exists and is not empty, retry without \"query.filter\", and make sure \
			\"rerank.rankFields\" includes the field from the index's \
			\"embed.fieldMap.text\" (see \"describe-index\").",
		input_schema = search_records_schema()
	)]
	async fn search_records(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let result = async {
			let (caller, req) = parse_request::<SearchRecordsRequest>(params)?;

			to_pretty_json(&self.service.search_records(caller.as_ref(), req).await?)
		};

		respond("search-records", result.await)
	}

	#[rmcp::tool(
		name = "cascading-search",
		description = "Search several indexes or namespaces for records similar to the query \
			text. Hits from all targets are deduplicated by their \"_id\" field, keeping the first \
			target's copy, and then reranked with a specialized reranking model. Use this \
			only when the targets hold records with similar schemas, typically a dense and a \
			sparse index over the same data (hybrid search).\n\n\
			The optional \"query.filter\" narrows results by metadata. Filter only when a \
			specific value or range is needed, and only on fields present in the records.\n\n\
			If results look wrong: check with \"describe-index-stats\" that every namespace \
			exists and is not empty, retry without \"query.filter\", and make sure \
			\"rerank.rankFields\" includes the field from the index's \
			\"embed.fieldMap.text\" (see \"describe-index\").",
		input_schema = cascading_search_schema()
	)]
	async fn cascading_search(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let result = async {
			let (caller, req) = parse_request::<CascadingSearchRequest>(params)?;

			self.service.cascading_search(caller.as_ref(), req).await?.to_text()
		};

		respond("cascading-search", result.await)
	}

	#[rmcp::tool(
		name = "rerank-documents",
		description = "Rerank a set of documents against a query. Use this when you already hold \
			a collection of documents and need the ones most relevant to the query.",
		input_schema = rerank_documents_schema()
	)]
	async fn rerank_documents(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let result = async {
			let (caller, req) = parse_request::<RerankDocumentsRequest>(params)?;

			self.service.rerank_documents(caller.as_ref(), req).await?.to_text()
		};

		respond("rerank-documents", result.await)
	}

	#[rmcp::tool(
		name = "delete-index-records",
		description = "Delete records from a Pinecone index by ID.",
		input_schema = delete_index_records_schema()
	)]
	async fn delete_index_records(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let result = async {
			let (caller, req) = parse_request::<DeleteIndexRecordsRequest>(params)?;

			Ok(self.service.delete_index_records(caller.as_ref(), req).await?.to_string())
		};

		respond("delete-index-records", result.await)
	}
}

#[rmcp::tool_router(router = docs_router)]
impl PineconeMcp {
	#[rmcp::tool(
		name = "search-docs",
		description = "Search the Pinecone documentation.",
		input_schema = search_docs_schema()
	)]
	async fn search_docs(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let req = match SearchDocsRequest::from_args(&Value::Object(params)) {
			Ok(req) => req,
			Err(err) => return respond("search-docs", Err(err)),
		};
		let Some(client) = self.docs.as_deref() else {
			return Err(ErrorData::internal_error("Docs search is not connected.", None));
		};

		match docs::search_docs(client, req).await {
			Ok(passages) =>
				Ok(CallToolResult::success(passages.into_iter().map(Content::text).collect())),
			Err(err) => respond("search-docs", Err(err)),
		}
	}
}

#[rmcp::tool_handler]
impl ServerHandler for PineconeMcp {
	fn get_info(&self) -> ServerInfo {
		ServerInfo {
			instructions: Some(SERVER_INSTRUCTIONS.to_string()),
			capabilities: ServerCapabilities::builder().enable_tools().build(),
			server_info: Implementation::from_build_env(),
			..Default::default()
		}
	}
}

pub async fn serve_stdio(
	service: Arc<PineconeService>,
	docs: Option<Arc<dyn DocsSearch>>,
) -> Result<()> {
	let server = PineconeMcp::new(service, docs);

	tracing::info!(tools = ?server.tool_names(), "Serving MCP over stdio.");

	let running = server.serve(rmcp::transport::stdio()).await?;

	running.waiting().await?;

	Ok(())
}

pub async fn serve_http(
	bind_addr: &str,
	service: Arc<PineconeService>,
	docs: Option<Arc<dyn DocsSearch>>,
) -> Result<()> {
	let bind_addr: SocketAddr = bind_addr.parse()?;
	let session_manager: Arc<LocalSessionManager> = Default::default();

	tracing::info!(
		%bind_addr,
		tools = ?PineconeMcp::new(Arc::clone(&service), docs.clone()).tool_names(),
		"Serving MCP over streamable HTTP."
	);

	let http_service = StreamableHttpService::new(
		move || Ok(PineconeMcp::new(Arc::clone(&service), docs.clone())),
		session_manager,
		StreamableHttpServerConfig::default(),
	);
	let router = Router::new().fallback_service(http_service);
	let listener = TcpListener::bind(bind_addr).await?;

	axum::serve(listener, router).await?;

	Ok(())
}

/// Strips the caller identity fields, then validates what remains against the tool's schema.
fn parse_request<R>(mut params: JsonObject) -> pmcp_service::Result<(Option<Caller>, R)>
where
	R: ToolRequest,
{
	let caller = take_caller(&mut params)?;
	let req = R::from_args(&Value::Object(params))?;

	Ok((caller, req))
}

fn take_caller(params: &mut JsonObject) -> Result<Option<Caller>, ValidationError> {
	let provider = take_optional_string(params, LLM_PROVIDER);
	let model = take_optional_string(params, LLM_MODEL);

	match (provider, model) {
		(Ok(None), Ok(None)) => Ok(None),
		(Ok(provider), Ok(model)) => Ok(Some(Caller::new(provider, model))),
		(provider, model) =>
			Err(ValidationError::new(provider.err().into_iter().chain(model.err()).collect())),
	}
}

fn take_optional_string(params: &mut JsonObject, key: &str) -> Result<Option<String>, Issue> {
	match params.remove(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(value)) => {
			let value = value.trim();

			if value.is_empty() { Ok(None) } else { Ok(Some(value.to_string())) }
		},
		Some(other) => {
			let kind = IssueKind::InvalidType {
				expected: "string".to_string(),
				received: type_name(Some(&other)).to_string(),
			};

			Err(Issue::new(&[PathSegment::Key(key.to_string())], kind))
		},
	}
}

/// Every failure, validation included, is reported in-band so the model can read and react to it.
fn respond(tool: &str, result: pmcp_service::Result<String>) -> Result<CallToolResult, ErrorData> {
	match result {
		Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
		Err(Error::Validation(err)) => {
			tracing::debug!(tool, error = %err, "Tool arguments rejected.");

			Ok(rejected(&err))
		},
		Err(err) => {
			tracing::warn!(tool, error = %err, "Tool call failed.");

			Ok(CallToolResult::error(vec![Content::text(format!("Error: {err}"))]))
		},
	}
}

fn rejected(err: &ValidationError) -> CallToolResult {
	let mut result = CallToolResult::error(vec![Content::text(format!("Error: {err}"))]);

	result.structured_content = Some(json!({ "issues": err.to_value() }));

	result
}

fn tool_schema<R>() -> Arc<JsonObject>
where
	R: ToolRequest,
{
	let mut schema = R::schema().to_json_object();
	let properties = schema
		.entry("properties")
		.or_insert_with(|| Value::Object(JsonObject::new()));

	if let Value::Object(properties) = properties {
		properties.insert(
			LLM_PROVIDER.to_string(),
			json!({ "type": "string", "description": LLM_PROVIDER_DESCRIPTION }),
		);
		properties.insert(
			LLM_MODEL.to_string(),
			json!({ "type": "string", "description": LLM_MODEL_DESCRIPTION }),
		);
	}

	Arc::new(schema)
}

fn list_indexes_schema() -> Arc<JsonObject> {
	tool_schema::<ListIndexesRequest>()
}

fn describe_index_schema() -> Arc<JsonObject> {
	tool_schema::<DescribeIndexRequest>()
}

fn describe_index_stats_schema() -> Arc<JsonObject> {
	tool_schema::<DescribeIndexStatsRequest>()
}

fn create_index_for_model_schema() -> Arc<JsonObject> {
	tool_schema::<CreateIndexForModelRequest>()
}

fn upsert_records_schema() -> Arc<JsonObject> {
	tool_schema::<UpsertRecordsRequest>()
}

fn search_records_schema() -> Arc<JsonObject> {
	tool_schema::<SearchRecordsRequest>()
}

fn cascading_search_schema() -> Arc<JsonObject> {
	tool_schema::<CascadingSearchRequest>()
}

fn rerank_documents_schema() -> Arc<JsonObject> {
	tool_schema::<RerankDocumentsRequest>()
}

fn delete_index_records_schema() -> Arc<JsonObject> {
	tool_schema::<DeleteIndexRecordsRequest>()
}

fn search_docs_schema() -> Arc<JsonObject> {
	Arc::new(SearchDocsRequest::schema().to_json_object())
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use rmcp::model::{CallToolResult, JsonObject};
	use serde_json::{Value, json};

	use crate::server::{PineconeMcp, cascading_search_schema, search_docs_schema};
	use pmcp_service::{DocsSearch, PineconeService};
	use pmcp_testkit::{ScriptedBackend, StaticDocs, hit, provider, unconfigured_provider};

	const DATABASE_TOOLS: [&str; 9] = [
		"cascading-search",
		"create-index-for-model",
		"delete-index-records",
		"describe-index",
		"describe-index-stats",
		"list-indexes",
		"rerank-documents",
		"search-records",
		"upsert-records",
	];

	fn server(backend: ScriptedBackend) -> (Arc<ScriptedBackend>, PineconeMcp) {
		let backend = Arc::new(backend);
		let service = Arc::new(PineconeService::new(provider(Arc::clone(&backend))));

		(backend, PineconeMcp::new(service, None))
	}

	fn params(value: Value) -> JsonObject {
		match value {
			Value::Object(map) => map,
			_ => panic!("Expected a JSON object."),
		}
	}

	fn cascade_params() -> JsonObject {
		params(json!({
			"indexes": [
				{ "name": "dense", "namespace": "docs" },
				{ "name": "sparse", "namespace": "docs" }
			],
			"query": { "topK": 5, "inputs": { "text": "hello" } },
			"rerank": { "model": "cohere-rerank-3.5", "rankFields": ["c"] },
			"llm_provider": "Anthropic",
			"llm_model": "Claude"
		}))
	}

	fn text(result: &CallToolResult) -> String {
		result
			.content
			.iter()
			.filter_map(|content| content.raw.as_text().map(|text| text.text.clone()))
			.collect::<Vec<_>>()
			.join("\n")
	}

	#[test]
	fn tools_depend_on_configured_credentials() {
		let service = Arc::new(PineconeService::new(unconfigured_provider()));
		let bare = PineconeMcp::new(Arc::clone(&service), None);
		let docs: Arc<dyn DocsSearch> = Arc::new(StaticDocs::new(&["passage"]));
		let docs_only = PineconeMcp::new(service, Some(docs));
		let (_, database) = server(ScriptedBackend::new());

		assert!(bare.tool_names().is_empty());
		assert_eq!(docs_only.tool_names(), vec!["search-docs".to_string()]);
		assert_eq!(database.tool_names(), DATABASE_TOOLS.map(str::to_string).to_vec());
	}

	#[test]
	fn database_schemas_advertise_caller_fields() {
		let schema = cascading_search_schema();
		let properties = schema["properties"].as_object().expect("properties");

		assert!(properties.contains_key("llm_provider"));
		assert!(properties.contains_key("llm_model"));
		assert_eq!(schema["required"], json!(["indexes", "query", "rerank"]));
		assert!(!search_docs_schema()["properties"].as_object().expect("properties").contains_key(
			"llm_model"
		));
	}

	#[tokio::test]
	async fn failing_target_is_reported_in_band() {
		let (backend, server) = server(
			ScriptedBackend::new()
				.with_hits("dense", "docs", vec![hit("x", 0.9, json!({ "c": "a" }))])
				.with_search_failure("sparse", "docs", "Search failed"),
		);
		let result = server.cascading_search(cascade_params()).await.expect("Tool call failed.");

		assert_eq!(result.is_error, Some(true));
		assert_eq!(text(&result), "Error: Search failed");
		assert!(backend.rerank_calls().is_empty());
	}

	#[tokio::test]
	async fn empty_cascade_renders_empty_array() {
		let (_, server) = server(
			ScriptedBackend::new()
				.with_hits("dense", "docs", Vec::new())
				.with_hits("sparse", "docs", Vec::new()),
		);
		let result = server.cascading_search(cascade_params()).await.expect("Tool call failed.");

		assert_ne!(result.is_error, Some(true));
		assert_eq!(text(&result), "[]");
	}

	#[tokio::test]
	async fn caller_fields_are_stripped_before_validation() {
		let (backend, server) = server(
			ScriptedBackend::new()
				.with_hits("dense", "docs", vec![hit("x", 0.9, json!({ "c": "a" }))])
				.with_hits("sparse", "docs", vec![hit("y", 0.8, json!({ "c": "b" }))]),
		);
		let result = server.cascading_search(cascade_params()).await.expect("Tool call failed.");
		let parsed: Value = serde_json::from_str(&text(&result)).expect("Output should be JSON.");

		assert_ne!(result.is_error, Some(true));
		assert_eq!(parsed["data"].as_array().map(Vec::len), Some(2));
		assert_eq!(backend.search_calls().len(), 2);
	}

	#[tokio::test]
	async fn invalid_arguments_are_reported_in_band() {
		let (backend, server) = server(ScriptedBackend::new());
		let result = server
			.cascading_search(params(json!({
				"indexes": [],
				"query": { "topK": 0, "inputs": { "text": "hello" } },
				"rerank": { "model": "cohere-rerank-3.5", "rankFields": ["c"] }
			})))
			.await
			.expect("Tool call failed.");
		let issues = result.structured_content.as_ref().and_then(|data| data["issues"].as_array());

		assert_eq!(result.is_error, Some(true));
		assert!(text(&result).starts_with("Error: indexes: Too small"), "{}", text(&result));
		assert_eq!(issues.map(Vec::len), Some(2));
		assert!(backend.search_calls().is_empty());
	}

	#[tokio::test]
	async fn mistyped_index_name_is_reported_in_band() {
		let (_, server) = server(ScriptedBackend::new());
		let result = server
			.describe_index(params(json!({ "name": 123 })))
			.await
			.expect("Tool call failed.");

		assert_eq!(result.is_error, Some(true));
		assert_eq!(text(&result), "Error: name: Expected string, received number");
	}

	#[tokio::test]
	async fn non_string_caller_field_is_rejected() {
		let (_, server) = server(ScriptedBackend::new());
		let result = server
			.list_indexes(params(json!({ "llm_model": 4 })))
			.await
			.expect("Tool call failed.");

		assert_eq!(result.is_error, Some(true));
		assert_eq!(text(&result), "Error: llm_model: Expected string, received number");
	}

	#[tokio::test]
	async fn upsert_reports_plain_confirmation() {
		let (backend, server) = server(ScriptedBackend::new());
		let result = server
			.upsert_records(params(json!({
				"name": "docs",
				"namespace": "faq",
				"records": [{ "id": "1", "text": "hello" }]
			})))
			.await
			.expect("Tool call failed.");

		assert_eq!(text(&result), "Data upserted successfully");
		assert_eq!(backend.records("docs", "faq").len(), 1);
	}

	#[tokio::test]
	async fn docs_passages_become_text_contents() {
		let service = Arc::new(PineconeService::new(unconfigured_provider()));
		let docs: Arc<dyn DocsSearch> = Arc::new(StaticDocs::new(&["One.", "Two."]));
		let server = PineconeMcp::new(service, Some(docs));
		let result =
			server.search_docs(params(json!({ "query": "upsert" }))).await.expect("Tool failed.");

		assert_eq!(result.content.len(), 2);
		assert_eq!(text(&result), "One.\nTwo.");
	}
}
