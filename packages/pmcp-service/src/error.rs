use pmcp_schema::ValidationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error(transparent)]
	Backend(#[from] pmcp_backend::Error),
	#[error("{message}")]
	Docs { message: String },
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
}
