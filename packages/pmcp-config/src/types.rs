use serde::Deserialize;

pub const DEFAULT_CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_API_VERSION: &str = "2025-04";
pub const DEFAULT_DOCS_URL: &str =
	"https://prod-1-data.ke.pinecone.io/mcp/assistants/pinecone-docs";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	#[serde(default)]
	pub pinecone: Pinecone,
	#[serde(default)]
	pub docs: Docs,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
	#[default]
	Stdio,
	Http,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
	#[serde(default)]
	pub transport: Transport,
	#[serde(default = "default_http_bind")]
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self {
			transport: Transport::default(),
			http_bind: default_http_bind(),
			log_level: default_log_level(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pinecone {
	/// Usually left unset in the file and supplied through `PINECONE_API_KEY`.
	pub api_key: Option<String>,
	#[serde(default = "default_control_plane_url")]
	pub control_plane_url: String,
	#[serde(default = "default_api_version")]
	pub api_version: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_index_ready_timeout_ms")]
	pub index_ready_timeout_ms: u64,
	#[serde(default = "default_index_ready_poll_ms")]
	pub index_ready_poll_ms: u64,
	#[serde(default = "default_cloud")]
	pub default_cloud: String,
	#[serde(default = "default_region")]
	pub default_region: String,
}
impl Default for Pinecone {
	fn default() -> Self {
		Self {
			api_key: None,
			control_plane_url: default_control_plane_url(),
			api_version: default_api_version(),
			timeout_ms: default_timeout_ms(),
			index_ready_timeout_ms: default_index_ready_timeout_ms(),
			index_ready_poll_ms: default_index_ready_poll_ms(),
			default_cloud: default_cloud(),
			default_region: default_region(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Docs {
	#[serde(default = "default_true")]
	pub enabled: bool,
	#[serde(default = "default_docs_url")]
	pub url: String,
}
impl Default for Docs {
	fn default() -> Self {
		Self { enabled: true, url: default_docs_url() }
	}
}

fn default_http_bind() -> String {
	"127.0.0.1:8787".to_string()
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_control_plane_url() -> String {
	DEFAULT_CONTROL_PLANE_URL.to_string()
}

fn default_api_version() -> String {
	DEFAULT_API_VERSION.to_string()
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_index_ready_timeout_ms() -> u64 {
	300_000
}

fn default_index_ready_poll_ms() -> u64 {
	1_000
}

fn default_cloud() -> String {
	"aws".to_string()
}

fn default_region() -> String {
	"us-east-1".to_string()
}

fn default_docs_url() -> String {
	DEFAULT_DOCS_URL.to_string()
}

fn default_true() -> bool {
	true
}
