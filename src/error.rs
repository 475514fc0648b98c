use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LiblibError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("Request error: {0}")]
    Request(String),

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Response error: {0}")]
    Response(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Polling gave up after {attempts} attempts ({elapsed:?})")]
    PollTimeout { attempts: u32, elapsed: Duration },

    #[error("Polling cancelled")]
    Cancelled,
}

impl LiblibError {
    /// True for errors raised before anything was sent over the wire.
    pub fn is_validation(&self) -> bool {
        matches!(self, LiblibError::Validation(_))
    }
}

impl From<serde_json::Error> for LiblibError {
    fn from(e: serde_json::Error) -> Self {
        LiblibError::Serialization(e.to_string())
    }
}

impl From<image::ImageError> for LiblibError {
    fn from(e: image::ImageError) -> Self {
        LiblibError::Image(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LiblibError>;
