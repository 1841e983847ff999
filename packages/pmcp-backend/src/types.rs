// std
use std::{collections::BTreeMap, fmt, str::FromStr};

// crates.io
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A flat record as upserted into an integrated-embedding index.
pub type Record = Map<String, Value>;

/// One index/namespace pair addressed by a data-plane call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTarget {
	pub name: String,
	#[serde(default)]
	pub namespace: String,
}
impl SearchTarget {
	pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
		Self { name: name.into(), namespace: namespace.into() }
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
	pub top_k: u32,
	pub inputs: QueryInputs,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub filter: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInputs {
	pub text: String,
}

/// Backend-side rerank attached to a single-source search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRerank {
	pub model: RerankModel,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub top_n: Option<u32>,
	pub rank_fields: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub query: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchRecordsRequest {
	pub query: SearchQuery,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rerank: Option<SearchRerank>,
}
impl SearchRecordsRequest {
	pub fn plain(query: SearchQuery) -> Self {
		Self { query, rerank: None }
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
	#[serde(rename = "_id")]
	pub id: String,
	#[serde(rename = "_score")]
	pub score: f64,
	#[serde(default)]
	pub fields: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	#[serde(default)]
	pub hits: Vec<Hit>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRecordsResponse {
	#[serde(default)]
	pub result: SearchResult,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub usage: Option<Value>,
}
impl SearchRecordsResponse {
	pub fn from_hits(hits: Vec<Hit>) -> Self {
		Self { result: SearchResult { hits }, usage: None }
	}

	pub fn hits(&self) -> &[Hit] {
		&self.result.hits
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RerankModel {
	#[serde(rename = "cohere-rerank-3.5")]
	CohereRerank35,
	#[serde(rename = "bge-reranker-v2-m3")]
	BgeRerankerV2M3,
	#[serde(rename = "pinecone-rerank-v0")]
	PineconeRerankV0,
}
impl RerankModel {
	pub const ALL: [Self; 3] =
		[Self::CohereRerank35, Self::BgeRerankerV2M3, Self::PineconeRerankV0];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::CohereRerank35 => "cohere-rerank-3.5",
			Self::BgeRerankerV2M3 => "bge-reranker-v2-m3",
			Self::PineconeRerankV0 => "pinecone-rerank-v0",
		}
	}

	pub fn names() -> Vec<&'static str> {
		Self::ALL.iter().map(|model| model.as_str()).collect()
	}
}
impl fmt::Display for RerankModel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Documents handed to the rerank endpoint, either bare strings or flat records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RerankDocuments {
	Texts(Vec<String>),
	Records(Vec<Map<String, Value>>),
}
impl RerankDocuments {
	pub fn len(&self) -> usize {
		match self {
			Self::Texts(texts) => texts.len(),
			Self::Records(records) => records.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct RerankRequest {
	pub model: RerankModel,
	pub query: String,
	pub documents: RerankDocuments,
	pub top_n: Option<u32>,
	pub rank_fields: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
	pub index: usize,
	pub score: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub document: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerankUsage {
	#[serde(rename = "rerankUnits", alias = "rerank_units", default)]
	pub rerank_units: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RerankResult {
	pub model: String,
	#[serde(default)]
	pub data: Vec<RankedDocument>,
	#[serde(default)]
	pub usage: RerankUsage,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
	#[serde(default)]
	pub ready: bool,
	#[serde(default)]
	pub state: String,
}

/// Index description. Keys this crate reads are typed; the rest pass through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexModel {
	pub name: String,
	#[serde(default)]
	pub host: String,
	#[serde(default)]
	pub status: IndexStatus,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl IndexModel {
	pub fn is_ready(&self) -> bool {
		self.status.ready
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexList {
	#[serde(default)]
	pub indexes: Vec<IndexModel>,
}
impl IndexList {
	pub fn names(&self) -> Vec<&str> {
		self.indexes.iter().map(|index| index.name.as_str()).collect()
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSummary {
	pub record_count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
	pub namespaces: BTreeMap<String, NamespaceSummary>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dimension: Option<u32>,
	pub total_record_count: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbedModel {
	#[serde(rename = "multilingual-e5-large")]
	MultilingualE5Large,
	#[serde(rename = "llama-text-embed-v2")]
	LlamaTextEmbedV2,
	#[serde(rename = "pinecone-sparse-english-v0")]
	PineconeSparseEnglishV0,
}
impl EmbedModel {
	pub const ALL: [Self; 3] =
		[Self::MultilingualE5Large, Self::LlamaTextEmbedV2, Self::PineconeSparseEnglishV0];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::MultilingualE5Large => "multilingual-e5-large",
			Self::LlamaTextEmbedV2 => "llama-text-embed-v2",
			Self::PineconeSparseEnglishV0 => "pinecone-sparse-english-v0",
		}
	}

	pub fn names() -> Vec<&'static str> {
		Self::ALL.iter().map(|model| model.as_str()).collect()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cloud {
	Aws,
	Gcp,
	Azure,
}
impl Cloud {
	pub const ALL: [Self; 3] = [Self::Aws, Self::Gcp, Self::Azure];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Aws => "aws",
			Self::Gcp => "gcp",
			Self::Azure => "azure",
		}
	}

	pub fn names() -> Vec<&'static str> {
		Self::ALL.iter().map(|cloud| cloud.as_str()).collect()
	}
}
impl FromStr for Cloud {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|cloud| cloud.as_str() == raw)
			.ok_or_else(|| format!("Unknown cloud {raw:?}."))
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
	pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfig {
	pub model: EmbedModel,
	pub field_map: FieldMap,
}

/// Fully resolved create-for-model call; defaults are filled in by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexForModelSpec {
	pub name: String,
	pub cloud: Cloud,
	pub region: String,
	pub embed: EmbedConfig,
	pub tags: BTreeMap<String, String>,
}
