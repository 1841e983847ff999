use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};

use pmcp_backend::{Caller, Cloud, RerankDocuments};
use pmcp_service::{
	CreateIndexForModelRequest, CreateIndexOutcome, DeleteIndexRecordsRequest,
	DescribeIndexStatsRequest, IndexDefaults, PineconeService, RankedOutcome, Readiness,
	RerankDocumentsRequest, SearchDocsRequest, SearchRecordsRequest, ToolRequest,
	UpsertRecordsRequest, docs,
};
use pmcp_testkit::{ScriptedBackend, StaticDocs, hit, provider, ready_index};

fn service(backend: &Arc<ScriptedBackend>) -> PineconeService {
	PineconeService::new(provider(Arc::clone(backend))).with_readiness(Readiness {
		timeout: Duration::from_millis(200),
		poll: Duration::from_millis(1),
	})
}

fn parse<T: ToolRequest>(args: Value) -> T {
	T::from_args(&args).expect("Request should parse.")
}

#[tokio::test]
async fn create_returns_existing_index_untouched() {
	let backend = Arc::new(ScriptedBackend::new().with_index(ready_index("docs")));
	let req: CreateIndexForModelRequest = parse(json!({
		"name": "docs",
		"embed": { "model": "llama-text-embed-v2", "fieldMap": { "text": "chunk" } }
	}));
	let outcome = service(&backend)
		.create_index_for_model(None, req)
		.await
		.expect("Create failed.");
	let text = outcome.to_text().expect("Render failed.");

	assert!(matches!(outcome, CreateIndexOutcome::AlreadyExists(_)));
	assert!(text.starts_with("Index not created. An index named \"docs\" already exists:\n{"));
	assert!(backend.created().is_empty());
}

#[tokio::test]
async fn create_tags_index_and_waits_until_ready() {
	let backend = Arc::new(ScriptedBackend::new().with_ready_after(3));
	let req: CreateIndexForModelRequest = parse(json!({
		"name": "fresh",
		"embed": { "model": "multilingual-e5-large", "fieldMap": { "text": "body" } },
		"region": "eu-west-1"
	}));
	let outcome = service(&backend)
		.with_index_defaults(IndexDefaults {
			cloud: Cloud::Gcp,
			region: "us-central1".to_string(),
		})
		.create_index_for_model(None, req)
		.await
		.expect("Create failed.");
	let CreateIndexOutcome::Created(index) = outcome else {
		panic!("Expected a created index.");
	};
	let spec = &backend.created()[0];

	assert!(index.is_ready());
	assert_eq!(backend.describe_calls(), 3);
	assert_eq!(spec.cloud, Cloud::Gcp);
	assert_eq!(spec.region, "eu-west-1");
	assert_eq!(spec.tags["source"], "mcp");
	assert_eq!(spec.tags["embedding_model"], "multilingual-e5-large");
}

#[tokio::test]
async fn create_times_out_when_index_never_becomes_ready() {
	let backend = Arc::new(ScriptedBackend::new().with_ready_after(usize::MAX));
	let req: CreateIndexForModelRequest = parse(json!({
		"name": "stuck",
		"embed": { "model": "multilingual-e5-large", "fieldMap": { "text": "body" } }
	}));
	let err = service(&backend)
		.with_readiness(Readiness {
			timeout: Duration::from_millis(5),
			poll: Duration::from_millis(1),
		})
		.create_index_for_model(None, req)
		.await
		.expect_err("Expected a timeout.");

	assert_eq!(err.to_string(), "Pinecone wait_until_ready request timed out.");
}

#[tokio::test]
async fn upsert_then_stats_count_records_per_namespace() {
	let backend = Arc::new(ScriptedBackend::new().with_index(ready_index("docs")));
	let service = service(&backend);
	let upsert: UpsertRecordsRequest = parse(json!({
		"name": "docs",
		"namespace": "faq",
		"records": [{ "id": "1", "text": "a" }, { "_id": "2", "text": "b" }]
	}));
	let message = service.upsert_records(None, upsert).await.expect("Upsert failed.");
	let stats = service
		.describe_index_stats(None, parse::<DescribeIndexStatsRequest>(json!({ "name": "docs" })))
		.await
		.expect("Stats failed.");

	assert_eq!(message, "Data upserted successfully");
	assert_eq!(backend.records("docs", "faq").len(), 2);
	assert_eq!(stats.total_record_count, 2);
	assert_eq!(stats.namespaces["faq"].record_count, 2);
}

#[tokio::test]
async fn delete_forwards_ids() {
	let backend = Arc::new(ScriptedBackend::new());
	let req: DeleteIndexRecordsRequest =
		parse(json!({ "name": "docs", "namespace": "", "ids": ["1", "2"] }));
	let message = service(&backend).delete_index_records(None, req).await.expect("Delete failed.");
	let deleted = backend.deleted();

	assert_eq!(message, "Records deleted successfully");
	assert_eq!(deleted[0].0.namespace, "");
	assert_eq!(deleted[0].1, vec!["1".to_string(), "2".to_string()]);
}

#[tokio::test]
async fn search_records_passes_rerank_through() {
	let backend = Arc::new(
		ScriptedBackend::new()
			.with_hits("docs", "faq", vec![hit("1", 0.4, json!({ "text": "a" }))]),
	);
	let req: SearchRecordsRequest = parse(json!({
		"name": "docs",
		"namespace": "faq",
		"query": { "topK": 5, "inputs": { "text": "a" }, "filter": { "genre": { "$eq": "x" } } },
		"rerank": { "model": "bge-reranker-v2-m3", "rankFields": ["text"] }
	}));
	let response = service(&backend).search_records(None, req).await.expect("Search failed.");
	let (_, sent) = &backend.search_calls()[0];

	assert_eq!(response.hits().len(), 1);
	assert_eq!(sent.query.filter, Some(json!({ "genre": { "$eq": "x" } })));
	assert_eq!(sent.rerank.as_ref().map(|rerank| rerank.rank_fields.clone()), Some(vec![
		"text".to_string()
	]));
}

#[tokio::test]
async fn rerank_documents_wraps_texts_and_skips_empty_lists() {
	let backend = Arc::new(ScriptedBackend::new());
	let service = service(&backend);
	let empty: RerankDocumentsRequest =
		parse(json!({ "model": "cohere-rerank-3.5", "query": "q", "documents": [] }));
	let texts: RerankDocumentsRequest = parse(json!({
		"model": "cohere-rerank-3.5",
		"query": "q",
		"documents": ["a", "b", "c"],
		"options": { "topN": 2 }
	}));

	assert_eq!(
		service.rerank_documents(None, empty).await.expect("Rerank failed."),
		RankedOutcome::Empty
	);

	let outcome = service.rerank_documents(None, texts).await.expect("Rerank failed.");
	let call = &backend.rerank_calls()[0];

	assert_eq!(backend.rerank_calls().len(), 1);
	assert!(matches!(call.documents, RerankDocuments::Texts(_)));
	assert_eq!(call.top_n, Some(2));
	assert_eq!(outcome.ranked().map(|result| result.data.len()), Some(2));
}

#[tokio::test]
async fn caller_identity_is_accepted() {
	let backend = Arc::new(ScriptedBackend::new().with_index(ready_index("docs")));
	let caller = Caller::new(Some("anthropic".to_string()), Some("claude".to_string()));
	let list = service(&backend).list_indexes(Some(&caller)).await.expect("List failed.");

	assert_eq!(list.names(), vec!["docs"]);
}

#[tokio::test]
async fn docs_search_returns_passages_unmodified() {
	let docs = StaticDocs::new(&["First passage.", "Second passage."]);
	let req: SearchDocsRequest = parse(json!({ "query": "upsert" }));
	let passages = docs::search_docs(&docs, req).await.expect("Docs search failed.");

	assert_eq!(passages, vec!["First passage.", "Second passage."]);
	assert_eq!(docs.queries(), vec!["upsert"]);
}

#[tokio::test]
async fn docs_failure_keeps_remote_message() {
	let docs = StaticDocs::failing("Assistant unavailable");
	let req: SearchDocsRequest = parse(json!({ "query": "upsert" }));
	let err = docs::search_docs(&docs, req).await.expect_err("Expected docs failure.");

	assert_eq!(err.to_string(), "Assistant unavailable");
}
