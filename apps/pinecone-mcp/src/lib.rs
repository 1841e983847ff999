pub mod docs;
pub mod server;

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use pmcp_backend::{ClientProvider, Cloud, PineconeFactory, PineconeSettings};
use pmcp_config::{Config, Transport};
use pmcp_service::{IndexDefaults, PineconeService, Readiness};

#[derive(Debug, Parser)]
#[command(
	version = pmcp_cli::VERSION,
	rename_all = "kebab",
	styles = pmcp_cli::styles(),
)]
pub struct Args {
	/// TOML configuration file. Defaults apply when omitted.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,
}

pub async fn run(args: Args) -> Result<()> {
	let config = pmcp_config::load(args.config.as_deref())?;

	init_tracing(&config);

	let service = Arc::new(build_service(&config)?);

	if !service.provider.is_configured() {
		tracing::warn!(
			"{} is not set; database tools are disabled.",
			pmcp_config::ENV_API_KEY
		);
	}

	let docs = docs::connect(&config.docs, Duration::from_millis(config.pinecone.timeout_ms)).await;

	match config.service.transport {
		Transport::Stdio => server::serve_stdio(service, docs).await,
		Transport::Http => {
			enforce_loopback_bind(&config.service.http_bind)?;

			server::serve_http(&config.service.http_bind, service, docs).await
		},
	}
}

pub fn build_service(config: &Config) -> Result<PineconeService> {
	let settings = PineconeSettings {
		control_plane_url: config.pinecone.control_plane_url.clone(),
		api_version: config.pinecone.api_version.clone(),
		timeout: Duration::from_millis(config.pinecone.timeout_ms),
	};
	let provider = ClientProvider::new(
		config.pinecone.api_key.clone(),
		pmcp_cli::source_tag(),
		Arc::new(PineconeFactory::new(settings)),
	);
	let cloud: Cloud =
		config.pinecone.default_cloud.parse().map_err(|err: String| eyre::eyre!(err))?;
	let service = PineconeService::new(Arc::new(provider))
		.with_index_defaults(IndexDefaults {
			cloud,
			region: config.pinecone.default_region.clone(),
		})
		.with_readiness(Readiness {
			timeout: Duration::from_millis(config.pinecone.index_ready_timeout_ms),
			poll: Duration::from_millis(config.pinecone.index_ready_poll_ms),
		});

	Ok(service)
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	// Stdout carries JSON-RPC on the stdio transport.
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn enforce_loopback_bind(http_bind: &str) -> Result<()> {
	let bind_addr: SocketAddr = http_bind.parse().map_err(|err| {
		eyre::eyre!(
			"service.http_bind must be a valid socket address when service.transport=http: {err}"
		)
	})?;

	if !bind_addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"service.http_bind must be a loopback address when service.transport=http."
		));
	}

	Ok(())
}
