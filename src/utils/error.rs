use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid response from {endpoint}: {body}")]
    InvalidResponse { endpoint: String, body: String },

    #[error("Command `{command}` timed out after {seconds}s")]
    CommandTimeout { command: String, seconds: u64 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl VerifyError {
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            VerifyError::HttpError(e) if e.is_connect() => "Start the server with: ollama serve",
            VerifyError::HttpError(e) if e.is_timeout() => {
                "The server is slow to answer; raise --timeout-secs or check its load"
            }
            VerifyError::HttpError(_) => "Check the server logs for the failing request",
            VerifyError::IoError(_) => "Check that the path exists and is readable",
            VerifyError::SerializationError(_) | VerifyError::InvalidResponse { .. } => {
                "Make sure --base-url points at an Ollama server"
            }
            VerifyError::CommandTimeout { .. } => "Raise --timeout-secs or run the command by hand",
            VerifyError::ConfigError { .. } | VerifyError::InvalidConfigValueError { .. } => {
                "Fix the flag or config file value and retry"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;
