//! Quick Sketch core crate.
//!
//! Browser client for the drawing game: the page shows a target class, the
//! player sketches it on a canvas against a 40-second countdown, and the
//! drawing is sent to the classifier service which answers with ranked
//! predictions. The round state machine, countdown and wire protocol are
//! plain Rust (testable on the host); only the `dom` glue touches the
//! browser.

use wasm_bindgen::prelude::*;

pub mod api;
pub mod canvas;
pub mod error;
pub mod round;
pub mod timer;

mod dom;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// Entry point called by the host page once the DOM is ready: wires the
/// canvas, buttons and resize handling, then starts the first round.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    dom::init()
}
