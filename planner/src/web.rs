//! Browser drawing backend.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.

use std::f64::consts::PI;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::geometry::Point;
use crate::render::{self, Scene, Stroke, Surface, TextAlign, TextStyle};

impl Surface for CanvasRenderingContext2d {
    type Error = JsValue;

    fn clear(&mut self, width: f64, height: f64) -> Result<(), JsValue> {
        self.clear_rect(0.0, 0.0, width, height);
        Ok(())
    }

    fn fill_rect(&mut self, origin: Point, width: f64, height: f64, fill: &str) -> Result<(), JsValue> {
        self.set_fill_style_str(fill);
        CanvasRenderingContext2d::fill_rect(self, origin.x, origin.y, width, height);
        Ok(())
    }

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) -> Result<(), JsValue> {
        apply_stroke(self, stroke)?;
        self.begin_path();
        self.move_to(from.x, from.y);
        self.line_to(to.x, to.y);
        self.stroke();
        reset_dash(self)
    }

    fn circle(
        &mut self,
        center: Point,
        radius: f64,
        fill: Option<&str>,
        stroke: Option<Stroke>,
    ) -> Result<(), JsValue> {
        self.begin_path();
        self.arc(center.x, center.y, radius, 0.0, 2.0 * PI)?;
        if let Some(fill) = fill {
            self.set_fill_style_str(fill);
            self.fill();
        }
        if let Some(stroke) = stroke {
            apply_stroke(self, stroke)?;
            self.stroke();
            reset_dash(self)?;
        }
        Ok(())
    }

    fn text(&mut self, text: &str, at: Point, style: TextStyle) -> Result<(), JsValue> {
        self.set_fill_style_str(style.color);
        self.set_font(style.font);
        self.set_text_align(match style.align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
        });
        self.fill_text(text, at.x, at.y)
    }
}

/// Draw `scene` onto a canvas element's 2D context.
///
/// # Errors
///
/// Returns `Err` if the element has no 2D context or any `Canvas2D` call fails.
pub fn render_to_canvas(canvas: &HtmlCanvasElement, scene: &Scene<'_>) -> Result<(), JsValue> {
    let mut ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    render::draw(&mut ctx, scene)
}

fn apply_stroke(ctx: &CanvasRenderingContext2d, stroke: Stroke) -> Result<(), JsValue> {
    ctx.set_stroke_style_str(stroke.color);
    ctx.set_line_width(stroke.width);
    let dash: js_sys::Array = stroke.dash.iter().map(|d| JsValue::from_f64(*d)).collect();
    ctx.set_line_dash(&dash)
}

fn reset_dash(ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
    ctx.set_line_dash(&js_sys::Array::new())
}
