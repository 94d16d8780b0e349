use thiserror::Error;

use crate::upload::UploadRejection;

/// Failures surfaced by [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, reset...)
    #[error("Error de red en {path}: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status. `message` is the server's `error` field when
    /// present, otherwise synthesized from the status code.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Success status, but the body is an `{"error": ...}` object.
    #[error("{0}")]
    Server(String),

    /// Body does not match the expected schema.
    #[error("Respuesta inválida de {path}: {reason}")]
    MalformedResponse { path: String, reason: String },

    /// Upload refused before any request was sent.
    #[error("{0}")]
    UploadRejected(#[from] UploadRejection),

    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn malformed(path: &str, reason: impl Into<String>) -> Self {
        ApiError::MalformedResponse {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
