// std
use std::{
	collections::HashMap,
	sync::{Arc, Mutex, MutexGuard},
};

// crates.io
use serde::Serialize;

// self
use crate::{BackendFactory, Error, Result, VectorBackend};

pub const DEFAULT_CACHE_KEY: &str = "default";

/// Identity of the model or agent driving a tool call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Caller {
	pub provider: Option<String>,
	pub model: Option<String>,
}
impl Caller {
	pub fn new(provider: Option<String>, model: Option<String>) -> Self {
		Self { provider, model }
	}

	/// Caller metadata attached to a client. Only present when a model is known.
	pub fn tag(&self) -> Option<CallerTag> {
		let model = self.model.clone()?;

		Some(CallerTag { model, provider: self.provider.clone() })
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallerTag {
	pub model: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub provider: Option<String>,
}

/// Everything a factory needs to build one client handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientOptions {
	pub api_key: String,
	pub source_tag: String,
	pub caller: Option<CallerTag>,
}

pub struct ClientProvider {
	api_key: Option<String>,
	source_tag: String,
	factory: Arc<dyn BackendFactory>,
	cache: Mutex<HashMap<String, Arc<dyn VectorBackend>>>,
}
impl ClientProvider {
	pub fn new(
		api_key: Option<String>,
		source_tag: impl Into<String>,
		factory: Arc<dyn BackendFactory>,
	) -> Self {
		Self { api_key, source_tag: source_tag.into(), factory, cache: Mutex::new(HashMap::new()) }
	}

	pub fn is_configured(&self) -> bool {
		self.api_key.is_some()
	}

	pub fn source_tag(&self) -> &str {
		&self.source_tag
	}

	pub fn get_client(&self, caller: Option<&Caller>) -> Result<Arc<dyn VectorBackend>> {
		let api_key = self.api_key.as_ref().ok_or(Error::MissingApiKey)?;
		let key = cache_key(caller);
		let mut cache = self.lock();

		if let Some(client) = cache.get(&key) {
			return Ok(Arc::clone(client));
		}

		let options = ClientOptions {
			api_key: api_key.clone(),
			source_tag: self.source_tag.clone(),
			caller: caller.and_then(Caller::tag),
		};
		let client = self.factory.build(options)?;

		tracing::debug!(cache_key = %key, "Built Pinecone client.");

		cache.insert(key, Arc::clone(&client));

		Ok(client)
	}

	pub fn reset(&self) {
		self.lock().clear();
	}

	pub fn cached_len(&self) -> usize {
		self.lock().len()
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn VectorBackend>>> {
		// A panic while holding the guard cannot leave the map half-written.
		self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

/// Provider alone does not partition the cache; a model is required for caller metadata.
pub fn cache_key(caller: Option<&Caller>) -> String {
	match caller {
		Some(Caller { provider, model: Some(model) }) =>
			format!("{}:{model}", provider.as_deref().unwrap_or_default()),
		_ => DEFAULT_CACHE_KEY.to_string(),
	}
}
