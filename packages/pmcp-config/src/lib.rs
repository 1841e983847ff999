mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, DEFAULT_API_VERSION, DEFAULT_CONTROL_PLANE_URL, DEFAULT_DOCS_URL, Docs, Pinecone,
	Service, Transport,
};

use std::{env, fs, path::Path};

pub const ENV_API_KEY: &str = "PINECONE_API_KEY";
pub const ENV_LOG_LEVEL: &str = "PINECONE_MCP_LOG";

/// Loads the configuration file when one is given, otherwise starts from defaults, then layers
/// the process environment on top.
pub fn load(path: Option<&Path>) -> Result<Config> {
	let mut cfg = match path {
		Some(path) => {
			let raw = fs::read_to_string(path)
				.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

			toml::from_str(&raw)
				.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?
		},
		None => Config::default(),
	};

	apply_env(&mut cfg, |key| env::var(key).ok());
	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn apply_env<F>(cfg: &mut Config, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(key) = lookup(ENV_API_KEY) {
		cfg.pinecone.api_key = Some(key);
	}
	if let Some(level) = lookup(ENV_LOG_LEVEL)
		&& !level.trim().is_empty()
	{
		cfg.service.log_level = level;
	}
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.transport == Transport::Http && cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty when service.transport=http.".to_string(),
		});
	}
	if cfg.pinecone.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "pinecone.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.pinecone.index_ready_poll_ms == 0 {
		return Err(Error::Validation {
			message: "pinecone.index_ready_poll_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.pinecone.index_ready_timeout_ms < cfg.pinecone.index_ready_poll_ms {
		return Err(Error::Validation {
			message: "pinecone.index_ready_timeout_ms must be at least \
				pinecone.index_ready_poll_ms."
				.to_string(),
		});
	}
	if cfg.pinecone.api_version.trim().is_empty() {
		return Err(Error::Validation {
			message: "pinecone.api_version must be non-empty.".to_string(),
		});
	}

	for (label, value) in [
		("pinecone.default_cloud", &cfg.pinecone.default_cloud),
		("pinecone.default_region", &cfg.pinecone.default_region),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !matches!(cfg.pinecone.default_cloud.as_str(), "aws" | "gcp" | "azure") {
		return Err(Error::Validation {
			message: "pinecone.default_cloud must be one of aws, gcp, or azure.".to_string(),
		});
	}

	let mut urls = vec![("pinecone.control_plane_url", &cfg.pinecone.control_plane_url)];

	if cfg.docs.enabled {
		urls.push(("docs.url", &cfg.docs.url));
	}

	for (label, url) in urls {
		if !(url.starts_with("https://") || url.starts_with("http://")) {
			return Err(Error::Validation {
				message: format!("{label} must be an http:// or https:// URL."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.pinecone.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.pinecone.api_key = None;
	}

	let control_plane_url = cfg.pinecone.control_plane_url.trim().trim_end_matches('/');

	cfg.pinecone.control_plane_url = control_plane_url.to_string();
	cfg.docs.url = cfg.docs.url.trim().to_string();
}
