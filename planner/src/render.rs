//! Rendering: projects a design onto a 2D drawing surface.
//!
//! The drawing backend is a collaborator behind the [`Surface`] trait. This
//! module decides what to draw and where, in the same pixel space that
//! pointer events use; it never mutates application state.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::calibrate::{self, Measurement};
use crate::consts::{
    BACKGROUND_FILL, BACKGROUND_TEXT, CANOPY_FILL, CANOPY_STROKE, CANVAS_HEIGHT_PX, CANVAS_WIDTH_PX,
    DRAFT_FENCE_STROKE, FENCE_STROKE, TRUNK_FILL, TRUNK_RADIUS_PX,
};
use crate::doc::{Design, DraftFence, DraftTree, Fence, Scale, Tree};
use crate::geometry::Point;

/// Dash pattern for the in-progress fence.
const DRAFT_DASH: &[f64] = &[5.0, 5.0];

/// Dash pattern for a tree's radius marker.
const RADIUS_DASH: &[f64] = &[3.0, 3.0];

/// Line styling for strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: &'static str,
    pub width: f64,
    /// Empty for a solid line.
    pub dash: &'static [f64],
}

/// Horizontal text anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// Font and color for a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: &'static str,
    /// CSS font shorthand, e.g. `"12px Arial"`.
    pub font: &'static str,
    pub align: TextAlign,
}

/// The drawing primitives the projector needs from a backend.
pub trait Surface {
    type Error;

    /// Erase the whole drawing area.
    fn clear(&mut self, width: f64, height: f64) -> Result<(), Self::Error>;

    fn fill_rect(&mut self, origin: Point, width: f64, height: f64, fill: &str) -> Result<(), Self::Error>;

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) -> Result<(), Self::Error>;

    /// Draw a circle, filled and/or outlined.
    fn circle(
        &mut self,
        center: Point,
        radius: f64,
        fill: Option<&str>,
        stroke: Option<Stroke>,
    ) -> Result<(), Self::Error>;

    fn text(&mut self, text: &str, at: Point, style: TextStyle) -> Result<(), Self::Error>;
}

/// Read-only view of everything drawn in one frame.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub design: &'a Design,
    /// Fence being dragged out, drawn dashed.
    pub draft_fence: Option<&'a DraftFence>,
    /// Tree being sized.
    pub draft_tree: Option<&'a DraftTree>,
}

impl<'a> Scene<'a> {
    /// A scene with no drafts.
    #[must_use]
    pub fn of(design: &'a Design) -> Self {
        Self { design, draft_fence: None, draft_tree: None }
    }
}

/// Label drawn at a fence's midpoint.
#[must_use]
pub fn fence_label(fence: &Fence) -> String {
    format!("{}: {} ft", fence.name, fence.length)
}

/// Canopy diameter for a radius, in feet when calibrated.
#[must_use]
pub fn diameter_label(radius: f64, scale: Option<Scale>) -> String {
    calibrate::measure(radius * 2.0, scale).to_string()
}

/// The "feet per pixel" caption shown above the canvas, once calibrated.
#[must_use]
pub fn scale_label(scale: Option<Scale>) -> Option<String> {
    scale.map(|s| format!("Scale: {:.2} feet per pixel", calibrate::feet_per_pixel(s)))
}

/// Canopy diameter as a measurement, for side-panel display.
#[must_use]
pub fn tree_diameter(tree: &Tree, scale: Option<Scale>) -> Measurement {
    calibrate::measure(tree.radius * 2.0, scale)
}

/// Draw the full scene: background, fences, trees, then drafts on top of
/// their committed kind.
///
/// # Errors
///
/// Returns the first error the surface reports.
pub fn draw<S: Surface>(surface: &mut S, scene: &Scene<'_>) -> Result<(), S::Error> {
    let design = scene.design;
    surface.clear(CANVAS_WIDTH_PX, CANVAS_HEIGHT_PX)?;

    if design.map_loaded() {
        draw_background(surface)?;
    }

    for fence in design.fences() {
        draw_fence(surface, fence)?;
    }
    if let Some(draft) = scene.draft_fence {
        let stroke = Stroke { color: DRAFT_FENCE_STROKE, width: 3.0, dash: DRAFT_DASH };
        surface.line(draft.start, draft.end, stroke)?;
    }

    for tree in design.trees() {
        draw_canopy(surface, tree.center, tree.radius, design.scale())?;
        let name_style = TextStyle { color: CANOPY_STROKE, font: "11px Arial", align: TextAlign::Center };
        let below = Point::new(tree.center.x, tree.center.y + tree.radius + 15.0);
        surface.text(&tree.name, below, name_style)?;
    }
    if let Some(draft) = scene.draft_tree {
        if draft.radius > 0.0 {
            draw_canopy(surface, draft.center, draft.radius, design.scale())?;
        }
    }

    Ok(())
}

fn draw_background<S: Surface>(surface: &mut S) -> Result<(), S::Error> {
    surface.fill_rect(Point::default(), CANVAS_WIDTH_PX, CANVAS_HEIGHT_PX, BACKGROUND_FILL)?;
    let center = Point::new(CANVAS_WIDTH_PX / 2.0, CANVAS_HEIGHT_PX / 2.0);
    let title = TextStyle { color: BACKGROUND_TEXT, font: "20px Arial", align: TextAlign::Center };
    surface.text("Aerial View Area", center, title)?;
    let caption = TextStyle { font: "14px Arial", ..title };
    surface.text("(Imagery is not loaded; this is a blank drafting area)", center.offset(0.0, 25.0), caption)
}

fn draw_fence<S: Surface>(surface: &mut S, fence: &Fence) -> Result<(), S::Error> {
    surface.line(fence.start, fence.end, Stroke { color: FENCE_STROKE, width: 3.0, dash: &[] })?;
    let label_at = fence.start.midpoint(fence.end).offset(0.0, -5.0);
    let style = TextStyle { color: FENCE_STROKE, font: "12px Arial", align: TextAlign::Center };
    surface.text(&fence_label(fence), label_at, style)
}

fn draw_canopy<S: Surface>(surface: &mut S, center: Point, radius: f64, scale: Option<Scale>) -> Result<(), S::Error> {
    surface.circle(center, TRUNK_RADIUS_PX, Some(TRUNK_FILL), None)?;
    let outline = Stroke { color: CANOPY_STROKE, width: 2.0, dash: &[] };
    surface.circle(center, radius, Some(CANOPY_FILL), Some(outline))?;

    let marker = Stroke { color: CANOPY_STROKE, width: 1.0, dash: RADIUS_DASH };
    surface.line(center, center.offset(radius, 0.0), marker)?;

    let style = TextStyle { color: CANOPY_STROKE, font: "bold 11px Arial", align: TextAlign::Center };
    surface.text(&diameter_label(radius, scale), center.offset(radius / 2.0, -5.0), style)
}
