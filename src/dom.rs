//! Page glue: element cache, event wiring and command execution.
//!
//! All DOM callbacks funnel into [`dispatch`], which runs the message
//! through the round controller and then executes the returned commands.
//! Game state lives in a thread-local cell; the browser event loop is
//! single-threaded, so a `RefCell` is enough and borrows never overlap
//! (commands are executed only after the controller borrow is released).

use std::cell::RefCell;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, MouseEvent, TouchEvent, Window};

use crate::api::{self, Prediction, SubmitDrawingRequest};
use crate::canvas::{self, Surface, SurfacePoint};
use crate::error::{GameError, js_error_message};
use crate::round::{Command, Msg, RoundController, Screen};

const HIDDEN_CLASS: &str = "hidden";
const TIMER_WARNING_COLOR: &str = "#ea4335";
/// Below this container width the canvas is shrunk to fit (CSS pixels).
const NARROW_CONTAINER_PX: f64 = 500.0;

/// Handles to the host page's fixed elements.
struct Elements {
    prompt_screen: HtmlElement,
    loading_screen: HtmlElement,
    result_screen: HtmlElement,
    error_screen: HtmlElement,
    drawing_prompt: HtmlElement,
    timer: HtmlElement,
    result_title: HtmlElement,
    result_message: HtmlElement,
    target_class: HtmlElement,
    recognized_class: HtmlElement,
    predictions_container: HtmlElement,
    error_message: HtmlElement,
}

struct Game {
    controller: RoundController,
    surface: Surface,
    elements: Elements,
    interval_id: Option<i32>,
    // Kept alive while the interval runs; dropped when it is cleared.
    tick_closure: Option<Closure<dyn FnMut()>>,
}

thread_local! {
    static GAME: RefCell<Option<Game>> = RefCell::new(None);
}

/// Wire the page and start the first round.
pub fn init() -> Result<(), JsValue> {
    let win = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let canvas: HtmlCanvasElement = element(&doc, "drawing-canvas")?
        .dyn_into()
        .map_err(|_| JsValue::from_str("#drawing-canvas is not a canvas"))?;
    let surface = Surface::new(canvas.clone())?;

    let elements = Elements {
        prompt_screen: html_element(&doc, "prompt-screen")?,
        loading_screen: html_element(&doc, "loading-screen")?,
        result_screen: html_element(&doc, "result-screen")?,
        error_screen: html_element(&doc, "error-screen")?,
        drawing_prompt: html_element(&doc, "drawing-prompt")?,
        timer: html_element(&doc, "timer")?,
        result_title: html_element(&doc, "result-title")?,
        result_message: html_element(&doc, "result-message")?,
        target_class: html_element(&doc, "target-class")?,
        recognized_class: html_element(&doc, "recognized-class")?,
        predictions_container: html_element(&doc, "predictions-container")?,
        error_message: html_element(&doc, "error-message")?,
    };

    wire_buttons(&doc)?;
    wire_canvas(&canvas)?;
    wire_resize(&win, &canvas)?;
    resize_canvas(&canvas);

    let game = Game {
        controller: RoundController::new(),
        surface,
        elements,
        interval_id: None,
        tick_closure: None,
    };
    GAME.with(|cell| cell.replace(Some(game)));

    dispatch(Msg::NewRoundRequested);
    Ok(())
}

/// Single entry point for every event on the page.
pub fn dispatch(msg: Msg) {
    let commands = GAME.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(game) => game.controller.handle(msg),
            None => Vec::new(),
        }
    });
    run_commands(commands);
}

fn with_game<R>(f: impl FnOnce(&mut Game) -> R) -> Option<R> {
    GAME.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn run_commands(commands: Vec<Command>) {
    for command in commands {
        match command {
            Command::ShowScreen(screen) => {
                with_game(|game| show_screen(&game.elements, screen));
            }
            Command::SetPrompt(text) => {
                with_game(|game| {
                    game.elements.drawing_prompt.set_text_content(Some(&text));
                });
            }
            Command::UpdateTimer { seconds, warning } => {
                with_game(|game| update_timer_display(&game.elements, seconds, warning));
            }
            Command::StartTicking => start_interval(),
            Command::StopTicking => stop_interval(),
            Command::ClearSurface => {
                with_game(|game| game.surface.clear());
            }
            Command::BeginStroke(point) => {
                with_game(|game| game.surface.begin(point));
            }
            Command::ExtendStroke(point) => {
                with_game(|game| game.surface.extend(point));
            }
            Command::EndStroke => {
                with_game(|game| game.surface.end());
            }
            Command::BeginSubmit => begin_submit(),
            Command::RequestClass { epoch } => request_class(epoch),
            Command::SendDrawing { epoch, session_id } => send_drawing(epoch, session_id),
            Command::RenderOutcome(outcome) => {
                with_game(|game| render_outcome(&game.elements, &outcome));
            }
            Command::ShowError(message) => {
                with_game(|game| {
                    game.elements.error_message.set_text_content(Some(&message));
                });
            }
        }
    }
}

// --- Element lookup -----------------------------------------------------------

fn element(doc: &Document, id: &str) -> Result<Element, JsValue> {
    doc.get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))
}

fn html_element(doc: &Document, id: &str) -> Result<HtmlElement, JsValue> {
    element(doc, id)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not an HTML element")))
}

// --- Screens & displays -------------------------------------------------------

fn show_screen(elements: &Elements, screen: Screen) {
    let panels = [
        (Screen::Prompt, &elements.prompt_screen),
        (Screen::Loading, &elements.loading_screen),
        (Screen::Result, &elements.result_screen),
        (Screen::Error, &elements.error_screen),
    ];
    for (kind, panel) in panels {
        if kind == screen {
            let _ = panel.class_list().remove_1(HIDDEN_CLASS);
        } else {
            let _ = panel.class_list().add_1(HIDDEN_CLASS);
        }
    }
}

fn update_timer_display(elements: &Elements, seconds: u32, warning: bool) {
    elements.timer.set_text_content(Some(&seconds.to_string()));
    let style = elements.timer.style();
    if warning {
        let _ = style.set_property("color", TIMER_WARNING_COLOR);
    } else {
        let _ = style.remove_property("color");
    }
}

fn render_outcome(elements: &Elements, outcome: &api::RoundOutcome) {
    elements
        .target_class
        .set_text_content(Some(&outcome.target_class));
    if let Some(label) = api::recognized_label(&outcome.predictions) {
        elements.recognized_class.set_text_content(Some(&label));
    }
    let banner = api::outcome_banner(outcome.matched);
    elements.result_title.set_text_content(Some(banner.title));
    elements
        .result_message
        .set_text_content(Some(banner.message));
    elements.result_message.set_class_name(banner.css_class);
    if let Err(err) = render_predictions(&elements.predictions_container, &outcome.predictions) {
        log::warn!("failed to render predictions: {}", js_error_message(&err));
    }
}

/// Build one labelled bar row per prediction.
fn render_predictions(container: &HtmlElement, predictions: &[Prediction]) -> Result<(), JsValue> {
    container.set_inner_html("");
    let doc = container
        .owner_document()
        .ok_or_else(|| JsValue::from_str("detached predictions container"))?;
    for prediction in predictions {
        let row = doc.create_element("div")?;
        row.set_class_name("prediction-item");

        let label = doc.create_element("div")?;
        label.set_class_name("prediction-label");
        label.set_text_content(Some(&prediction.class_name));

        let bar_container = doc.create_element("div")?;
        bar_container.set_class_name("prediction-bar-container");
        let bar = doc.create_element("div")?;
        bar.set_class_name("prediction-bar");
        bar.set_attribute(
            "style",
            &format!("width: {:.1}%", api::bar_width_percent(prediction.probability)),
        )?;
        bar_container.append_child(&bar)?;

        let percentage = doc.create_element("div")?;
        percentage.set_class_name("prediction-percentage");
        percentage.set_text_content(Some(&api::format_probability(prediction.probability)));

        row.append_child(&label)?;
        row.append_child(&bar_container)?;
        row.append_child(&percentage)?;
        container.append_child(&row)?;
    }
    Ok(())
}

// --- Countdown interval -------------------------------------------------------

fn start_interval() {
    stop_interval();
    let closure = Closure::<dyn FnMut()>::wrap(Box::new(|| dispatch(Msg::TimerTick)));
    let id = web_sys::window().and_then(|win| {
        win.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            1000,
        )
        .ok()
    });
    with_game(|game| {
        game.interval_id = id;
        game.tick_closure = Some(closure);
    });
}

fn stop_interval() {
    with_game(|game| {
        if let Some(id) = game.interval_id.take()
            && let Some(win) = web_sys::window()
        {
            win.clear_interval_with_handle(id);
        }
        game.tick_closure = None;
    });
}

// --- Submission ---------------------------------------------------------------

/// Sample the surface, then enter the shared submission path.
fn begin_submit() {
    let surface_blank = with_game(|game| match game.surface.is_empty() {
        Ok(blank) => blank,
        Err(err) => {
            // Sampling failure should not eat the drawing; let it through.
            log::warn!("pixel sampling failed: {}", js_error_message(&err));
            false
        }
    });
    if let Some(surface_blank) = surface_blank {
        dispatch(Msg::SubmitRequested { surface_blank });
    }
}

fn request_class(epoch: u64) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = api::fetch_random_class().await;
        dispatch(Msg::ClassArrived { epoch, result });
    });
}

fn send_drawing(epoch: u64, session_id: Option<String>) {
    let exported = match with_game(|game| game.surface.export_data_url()) {
        Some(Ok(data_url)) => data_url,
        Some(Err(err)) => {
            dispatch(Msg::OutcomeArrived {
                epoch,
                result: Err(GameError::Network(js_error_message(&err))),
            });
            return;
        }
        None => return,
    };
    log::debug!("image payload length: {}", exported.len());
    wasm_bindgen_futures::spawn_local(async move {
        let payload = SubmitDrawingRequest {
            image_data: exported,
            session_id,
        };
        let result = api::post_drawing(&payload).await;
        dispatch(Msg::OutcomeArrived { epoch, result });
    });
}

// --- Event wiring -------------------------------------------------------------

fn wire_buttons(doc: &Document) -> Result<(), JsValue> {
    wire_click(doc, "clear-btn", || dispatch(Msg::ClearClicked))?;
    wire_click(doc, "submit-btn", || dispatch(Msg::SubmitClicked))?;
    wire_click(doc, "continue-btn", || dispatch(Msg::NewRoundRequested))?;
    wire_click(doc, "retry-btn", || dispatch(Msg::NewRoundRequested))?;
    Ok(())
}

fn wire_click(doc: &Document, id: &str, handler: impl FnMut() + 'static) -> Result<(), JsValue> {
    let target = element(doc, id)?;
    let closure = Closure::<dyn FnMut()>::wrap(Box::new(handler));
    target.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn wire_canvas(canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    {
        let canvas_ref = canvas.clone();
        let mousedown = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            e.prevent_default();
            dispatch(Msg::PointerDown(mouse_point(&canvas_ref, &e)));
        }));
        canvas.add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }
    {
        let canvas_ref = canvas.clone();
        let mousemove = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            e.prevent_default();
            dispatch(Msg::PointerMove(mouse_point(&canvas_ref, &e)));
        }));
        canvas.add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())?;
        mousemove.forget();
    }
    for event in ["mouseup", "mouseout"] {
        let mouseup = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_e: MouseEvent| {
            dispatch(Msg::PointerUp);
        }));
        canvas.add_event_listener_with_callback(event, mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }
    {
        let canvas_ref = canvas.clone();
        let touchstart = Closure::<dyn FnMut(TouchEvent)>::wrap(Box::new(move |e: TouchEvent| {
            e.prevent_default();
            if let Some(point) = touch_point(&canvas_ref, &e) {
                dispatch(Msg::PointerDown(point));
            }
        }));
        canvas.add_event_listener_with_callback("touchstart", touchstart.as_ref().unchecked_ref())?;
        touchstart.forget();
    }
    {
        let canvas_ref = canvas.clone();
        // prevent_default also stops the page from scrolling mid-stroke
        let touchmove = Closure::<dyn FnMut(TouchEvent)>::wrap(Box::new(move |e: TouchEvent| {
            e.prevent_default();
            if let Some(point) = touch_point(&canvas_ref, &e) {
                dispatch(Msg::PointerMove(point));
            }
        }));
        canvas.add_event_listener_with_callback("touchmove", touchmove.as_ref().unchecked_ref())?;
        touchmove.forget();
    }
    {
        let touchend = Closure::<dyn FnMut(TouchEvent)>::wrap(Box::new(move |_e: TouchEvent| {
            dispatch(Msg::PointerUp);
        }));
        canvas.add_event_listener_with_callback("touchend", touchend.as_ref().unchecked_ref())?;
        touchend.forget();
    }
    Ok(())
}

fn mouse_point(canvas: &HtmlCanvasElement, event: &MouseEvent) -> SurfacePoint {
    client_to_surface(canvas, event.client_x() as f64, event.client_y() as f64)
}

fn touch_point(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<SurfacePoint> {
    let touch = event.touches().item(0)?;
    Some(client_to_surface(
        canvas,
        touch.client_x() as f64,
        touch.client_y() as f64,
    ))
}

fn client_to_surface(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> SurfacePoint {
    let rect = canvas.get_bounding_client_rect();
    canvas::map_to_surface(
        client_x,
        client_y,
        rect.left(),
        rect.top(),
        rect.width(),
        rect.height(),
        canvas.width() as f64,
        canvas.height() as f64,
    )
}

// --- Responsive sizing --------------------------------------------------------

fn wire_resize(win: &Window, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let canvas_ref = canvas.clone();
    let closure = Closure::<dyn FnMut()>::wrap(Box::new(move || resize_canvas(&canvas_ref)));
    win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Shrink the rendered size on narrow containers. Only CSS size changes;
/// stroke coordinates stay accurate because input mapping rescales by the
/// rendered dimensions.
fn resize_canvas(canvas: &HtmlCanvasElement) {
    let Some(container) = canvas.parent_element() else {
        return;
    };
    if canvas.width() == 0 {
        return;
    }
    let container_width = container.client_width() as f64;
    let style = canvas.style();
    if container_width < NARROW_CONTAINER_PX {
        let aspect = canvas.height() as f64 / canvas.width() as f64;
        let new_width = (container_width - 20.0).min(NARROW_CONTAINER_PX);
        let new_height = new_width * aspect;
        let _ = style.set_property("width", &format!("{new_width}px"));
        let _ = style.set_property("height", &format!("{new_height}px"));
    } else {
        let _ = style.remove_property("width");
        let _ = style.remove_property("height");
    }
}
