use clap::Parser;

use pinecone_mcp::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	pinecone_mcp::run(args).await
}
