//! Client side of the hosted documentation assistant, itself an MCP server.

use std::{sync::Arc, time::Duration};

use rmcp::{
	RoleClient, ServiceExt,
	model::CallToolResult,
	service::RunningService,
	transport::StreamableHttpClientTransport,
};
use serde_json::json;

use pmcp_config::Docs;
use pmcp_service::{BoxFuture, DocsSearch, Error, Result};

const DOCS_TOOL: &str = "get_context";

/// A persistent MCP session against the docs assistant, shared by every server session.
pub struct DocsClient {
	session: RunningService<RoleClient, ()>,
}
impl DocsClient {
	pub async fn connect(url: &str) -> Result<Self> {
		let transport = StreamableHttpClientTransport::from_uri(url.to_string());
		let session = ().serve(transport).await.map_err(|err| Error::Docs {
			message: format!("Failed to connect to the docs assistant at {url}: {err}"),
		})?;

		Ok(Self { session })
	}

	async fn get_context(&self, query: &str) -> Result<Vec<String>> {
		let request = serde_json::from_value(json!({
			"name": DOCS_TOOL,
			"arguments": { "query": query },
		}))?;
		let result = self
			.session
			.call_tool(request)
			.await
			.map_err(|err| Error::Docs { message: err.to_string() })?;

		passages(result)
	}
}
impl DocsSearch for DocsClient {
	fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move { self.get_context(query).await })
	}
}

/// Connects when docs search is enabled; any failure disables the docs tool instead of
/// aborting startup.
pub async fn connect(cfg: &Docs, timeout: Duration) -> Option<Arc<dyn DocsSearch>> {
	if !cfg.enabled {
		tracing::info!("Docs search is disabled by configuration.");

		return None;
	}

	match tokio::time::timeout(timeout, DocsClient::connect(&cfg.url)).await {
		Ok(Ok(client)) => {
			tracing::info!(url = %cfg.url, "Connected to the docs assistant.");

			Some(Arc::new(client))
		},
		Ok(Err(err)) => {
			tracing::warn!(error = %err, "Skipping docs tools.");

			None
		},
		Err(_) => {
			tracing::warn!(url = %cfg.url, "Skipping docs tools; the docs assistant timed out.");

			None
		},
	}
}

fn passages(result: CallToolResult) -> Result<Vec<String>> {
	let texts = result
		.content
		.iter()
		.filter_map(|content| content.raw.as_text().map(|text| text.text.clone()))
		.collect::<Vec<_>>();

	if result.is_error == Some(true) {
		let message = if texts.is_empty() {
			"The docs assistant returned an error.".to_string()
		} else {
			texts.join("\n")
		};

		return Err(Error::Docs { message });
	}

	Ok(texts)
}

#[cfg(test)]
mod tests {
	use rmcp::model::{CallToolResult, Content};

	use crate::docs::passages;

	#[test]
	fn passages_keep_remote_text_in_order() {
		let result =
			CallToolResult::success(vec![Content::text("First."), Content::text("Second.")]);

		assert_eq!(passages(result).expect("passages"), vec!["First.", "Second."]);
	}

	#[test]
	fn remote_errors_surface_their_text() {
		let result = CallToolResult::error(vec![Content::text("Assistant unavailable")]);
		let err = passages(result).expect_err("Expected docs failure.");

		assert_eq!(err.to_string(), "Assistant unavailable");
	}
}
