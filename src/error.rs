use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Fallback banner text when the backend gives nothing readable.
pub const GENERIC_REQUEST_ERROR: &str = "Error en la petición";
pub const NETWORK_ERROR: &str = "No se pudo conectar con el servidor";

/// Errors raised by the backend API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success HTTP status. `payload` is the parsed body when it was JSON.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        payload: Option<Value>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Failure that carries its own user-facing text.
    #[error("{0}")]
    Message(String),
}

impl ApiError {
    /// Build the HTTP variant from a permissively parsed response body.
    pub fn from_response(status: u16, body: Value) -> Self {
        let message = match &body {
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
        .or_else(|| match &body {
            Value::String(raw) if !raw.is_empty() => Some(raw.clone()),
            _ => None,
        })
        .unwrap_or_else(|| GENERIC_REQUEST_ERROR.to_string());

        let payload = match body {
            Value::Object(_) | Value::Array(_) => Some(body),
            _ => None,
        };

        ApiError::Http {
            status,
            message,
            payload,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Text suitable for a page banner. Never exposes transport internals.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Network(_) => NETWORK_ERROR.to_string(),
            ApiError::Decode(_) => "Respuesta inválida del servidor".to_string(),
            ApiError::Storage(_) => "No se pudo acceder al almacenamiento local".to_string(),
            ApiError::Message(msg) => msg.clone(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by the local image-library server.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Library error: {0}")]
    Library(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Library(e) => {
                tracing::error!("Library scan failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    crate::api::minigame::LIBRARY_ERROR.to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
