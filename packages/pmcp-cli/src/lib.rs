use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identity string attached to every backend request made by this server.
pub fn source_tag() -> String {
	format!("pinecone-mcp@{VERSION}")
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default() | Effects::BOLD)
		.usage(AnsiColor::Green.on_default() | Effects::BOLD)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Yellow.on_default())
}

#[cfg(test)]
mod tests {
	#[test]
	fn source_tag_carries_version() {
		assert_eq!(super::source_tag(), format!("pinecone-mcp@{}", super::VERSION));
	}
}
