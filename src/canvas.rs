//! Drawing surface over the page's 2D canvas.
//!
//! `Surface` owns the stroke state (drawing flag + last point) and paints
//! fixed-width round-capped segments, black ink on a white background.
//! The pixel-space math (blank detection, client-to-surface mapping) is
//! kept in free functions so it runs in host tests without a browser.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub const STROKE_WIDTH: f64 = 15.0;
pub const INK_COLOR: &str = "black";
pub const BACKGROUND_COLOR: &str = "white";

/// Channel floor for blank detection: a pixel still counts as background
/// while each of R, G and B is at or above this value. The slack absorbs
/// anti-aliased stroke edges.
pub const BLANK_CHANNEL_FLOOR: u8 = 250;

/// A point in surface pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfacePoint {
    pub x: f64,
    pub y: f64,
}

/// True iff every pixel of an RGBA buffer is within tolerance of the white
/// background. Alpha is ignored, matching the original client.
pub fn rgba_is_blank(data: &[u8]) -> bool {
    data.chunks_exact(4).all(|px| {
        px[0] >= BLANK_CHANNEL_FLOOR && px[1] >= BLANK_CHANNEL_FLOOR && px[2] >= BLANK_CHANNEL_FLOOR
    })
}

/// Map client (viewport) coordinates into surface pixel space: translate by
/// the surface's on-screen origin, then scale by the ratio of native pixel
/// dimensions to rendered dimensions so strokes stay accurate when CSS
/// shrinks the canvas.
#[allow(clippy::too_many_arguments)]
pub fn map_to_surface(
    client_x: f64,
    client_y: f64,
    rect_left: f64,
    rect_top: f64,
    rect_width: f64,
    rect_height: f64,
    surface_width: f64,
    surface_height: f64,
) -> SurfacePoint {
    let local_x = client_x - rect_left;
    let local_y = client_y - rect_top;
    let scale_x = if rect_width > 0.0 {
        surface_width / rect_width
    } else {
        1.0
    };
    let scale_y = if rect_height > 0.0 {
        surface_height / rect_height
    } else {
        1.0
    };
    SurfacePoint {
        x: local_x * scale_x,
        y: local_y * scale_y,
    }
}

/// Freehand stroke surface bound to the page's canvas element.
pub struct Surface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    drawing: bool,
    last: SurfacePoint,
}

impl Surface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;
        ctx.set_line_width(STROKE_WIDTH);
        ctx.set_line_cap("round");
        ctx.set_line_join("round");
        ctx.set_stroke_style_str(INK_COLOR);
        let surface = Self {
            canvas,
            ctx,
            drawing: false,
            last: SurfacePoint::default(),
        };
        surface.clear();
        Ok(surface)
    }

    /// Enter drawing mode and record the stroke origin.
    pub fn begin(&mut self, point: SurfacePoint) {
        self.drawing = true;
        self.last = point;
    }

    /// Paint a segment from the last recorded point. No-op outside drawing
    /// mode (e.g. a move event before any press).
    pub fn extend(&mut self, point: SurfacePoint) {
        if !self.drawing {
            return;
        }
        self.ctx.begin_path();
        self.ctx.move_to(self.last.x, self.last.y);
        self.ctx.line_to(point.x, point.y);
        self.ctx.stroke();
        self.last = point;
    }

    pub fn end(&mut self) {
        self.drawing = false;
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Repaint the whole surface with the background color.
    pub fn clear(&self) {
        self.ctx.set_fill_style_str(BACKGROUND_COLOR);
        self.ctx.fill_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
        self.ctx.set_stroke_style_str(INK_COLOR);
    }

    /// Sample every pixel and report whether the surface is still blank.
    pub fn is_empty(&self) -> Result<bool, JsValue> {
        let image = self.ctx.get_image_data(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        )?;
        Ok(rgba_is_blank(&image.data()))
    }

    /// Serialize the raster as a PNG data URL for transmission.
    pub fn export_data_url(&self) -> Result<String, JsValue> {
        self.canvas.to_data_url_with_type("image/png")
    }
}
