//! Wire protocol for the classifier service.
//!
//! Two endpoints: `GET /get_random_class` hands out the target class and a
//! session id, `POST /submit_drawing` takes the rasterized drawing and
//! returns ranked predictions. Response decoding into domain values is
//! pure so the mapping can be tested on the host; only the fetch helpers
//! at the bottom touch the browser.

use serde::{Deserialize, Serialize};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::error::{GameError, js_error_message};

pub const RANDOM_CLASS_URL: &str = "/get_random_class";
pub const SUBMIT_DRAWING_URL: &str = "/submit_drawing";

// --- Wire types --------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RandomClassResponse {
    pub success: bool,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitDrawingRequest {
    /// Data-URL-encoded PNG of the canvas raster.
    pub image_data: String,
    /// Serialized as `null` when no class request has succeeded yet, which
    /// is what the original client sent in that situation.
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitDrawingResponse {
    pub success: bool,
    #[serde(default)]
    pub target_class: Option<String>,
    #[serde(rename = "match", default)]
    pub matched: Option<bool>,
    #[serde(default)]
    pub predictions: Option<Vec<Prediction>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One (label, probability) pair from the classifier. The server returns
/// these ranked by probability descending.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub class_name: String,
    pub probability: f64,
}

// --- Domain values ------------------------------------------------------------

/// Successful `/get_random_class` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRound {
    pub target_class: String,
    pub session_id: String,
}

/// Successful `/submit_drawing` reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub target_class: String,
    /// Server-reported flag: top prediction equals the target class.
    pub matched: bool,
    /// Non-empty, ranked by probability descending.
    pub predictions: Vec<Prediction>,
}

pub fn parse_random_class(body: &str) -> Result<NewRound, GameError> {
    let resp: RandomClassResponse =
        serde_json::from_str(body).map_err(|e| GameError::Network(e.to_string()))?;
    if !resp.success {
        return Err(GameError::class_request_failed(resp.error));
    }
    match (resp.class_name, resp.session_id) {
        (Some(target_class), Some(session_id)) => Ok(NewRound {
            target_class,
            session_id,
        }),
        _ => Err(GameError::class_request_failed(Some(
            "incomplete response".to_string(),
        ))),
    }
}

pub fn parse_submit_response(body: &str) -> Result<RoundOutcome, GameError> {
    let resp: SubmitDrawingResponse =
        serde_json::from_str(body).map_err(|e| GameError::Network(e.to_string()))?;
    if !resp.success {
        return Err(GameError::prediction_failed(resp.error));
    }
    let predictions = resp.predictions.unwrap_or_default();
    if predictions.is_empty() {
        // A "success" with nothing to show is unrenderable; treat it like a
        // server failure so the page stays interactive.
        return Err(GameError::prediction_failed(None));
    }
    Ok(RoundOutcome {
        target_class: resp.target_class.unwrap_or_default(),
        matched: resp.matched.unwrap_or(false),
        predictions,
    })
}

// --- Presentation helpers -----------------------------------------------------

/// `0.92` -> `"92.0%"`.
pub fn format_probability(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// Label for the top prediction, e.g. `"cat (92.0%)"`.
pub fn recognized_label(predictions: &[Prediction]) -> Option<String> {
    predictions
        .first()
        .map(|p| format!("{} ({})", p.class_name, format_probability(p.probability)))
}

/// Bar width for a prediction row, clamped so tiny probabilities stay visible.
pub fn bar_width_percent(probability: f64) -> f64 {
    (probability * 100.0).max(1.0)
}

/// Texts and CSS class for the result banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banner {
    pub title: &'static str,
    pub message: &'static str,
    pub css_class: &'static str,
}

pub fn outcome_banner(matched: bool) -> Banner {
    if matched {
        Banner {
            title: "Great job!",
            message: "The AI correctly recognized your drawing!",
            css_class: "result-message result-success",
        }
    } else {
        Banner {
            title: "Nice try!",
            message: "The AI didn't recognize your drawing correctly.",
            css_class: "result-message result-failure",
        }
    }
}

// --- Fetch glue (browser only at runtime) ------------------------------------

pub async fn fetch_random_class() -> Result<NewRound, GameError> {
    let body = fetch_text(RANDOM_CLASS_URL).await?;
    parse_random_class(&body)
}

pub async fn post_drawing(payload: &SubmitDrawingRequest) -> Result<RoundOutcome, GameError> {
    let json = serde_json::to_string(payload).map_err(|e| GameError::Network(e.to_string()))?;
    let window = web_sys::window().ok_or_else(|| GameError::Network("no window".to_string()))?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(&json));
    let request = Request::new_with_str_and_init(SUBMIT_DRAWING_URL, &init)
        .map_err(|e| GameError::Network(js_error_message(&e)))?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|e| GameError::Network(js_error_message(&e)))?;

    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| GameError::Network(js_error_message(&e)))?;
    let body = response_text(resp_value).await?;
    parse_submit_response(&body)
}

async fn fetch_text(url: &str) -> Result<String, GameError> {
    let window = web_sys::window().ok_or_else(|| GameError::Network("no window".to_string()))?;
    let resp_value = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| GameError::Network(js_error_message(&e)))?;
    response_text(resp_value).await
}

async fn response_text(resp_value: JsValue) -> Result<String, GameError> {
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| GameError::Network("unexpected fetch result".to_string()))?;
    let text_promise = resp
        .text()
        .map_err(|e| GameError::Network(js_error_message(&e)))?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|e| GameError::Network(js_error_message(&e)))?;
    text.as_string()
        .ok_or_else(|| GameError::Network("non-text response body".to_string()))
}
