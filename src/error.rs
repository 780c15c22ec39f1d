//! Error kinds surfaced to the player.
//!
//! Three kinds exist: local validation (blank drawing, rejected before any
//! network traffic), transport failures, and failures the server itself
//! reports. All of them end on the error screen with a human-readable
//! message; none are retried automatically.

use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The player submitted without touching the canvas.
    #[error("Please draw something before submitting!")]
    EmptyDrawing,

    /// Fetch rejected, the response body could not be read, or the payload
    /// was not valid JSON. Matches the original client, which funnelled all
    /// of these into its network-error path.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered but flagged the request as failed.
    #[error("{0}")]
    Server(String),
}

impl GameError {
    /// Message for a failed random-class request. The server's own text is
    /// used when present.
    pub fn class_request_failed(detail: Option<String>) -> Self {
        let detail = detail.unwrap_or_else(|| "Unknown error".to_string());
        GameError::Server(format!("Failed to get a drawing prompt: {detail}"))
    }

    /// Message for a failed classification request.
    pub fn prediction_failed(detail: Option<String>) -> Self {
        GameError::Server(
            detail.unwrap_or_else(|| "An error occurred during prediction".to_string()),
        )
    }
}

impl From<GameError> for JsValue {
    fn from(err: GameError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

/// Best-effort message extraction from a rejected JS promise value.
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| "request failed".to_string())
}
