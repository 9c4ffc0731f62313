pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Executor error: {message}")]
	Executor { message: String },
	#[error("Audit error: {message}")]
	Audit { message: String },
	#[error("{stage} timed out after {timeout_ms} ms.")]
	Timeout { stage: String, timeout_ms: u64 },
	#[error("Config error: {message}")]
	Config { message: String },
}
impl From<sift_providers::Error> for Error {
	fn from(err: sift_providers::Error) -> Self {
		match err {
			sift_providers::Error::InvalidConfig { message } => Self::Config { message },
			other => Self::Provider { message: other.to_string() },
		}
	}
}

impl From<sift_config::Error> for Error {
	fn from(err: sift_config::Error) -> Self {
		Self::Config { message: err.to_string() }
	}
}
