pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("PINECONE_API_KEY environment variable is not set.")]
	MissingApiKey,
	#[error("{message}")]
	Api { status: u16, message: String },
	#[error("Pinecone {operation} request timed out.")]
	Timeout { operation: String },
	#[error("Pinecone {operation} request failed: {source}")]
	Transport { operation: String, source: reqwest::Error },
	#[error("Invalid URL {url}: {message}")]
	InvalidUrl { url: String, message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
}
impl Error {
	pub fn is_configuration(&self) -> bool {
		matches!(self, Self::MissingApiKey)
	}
}
