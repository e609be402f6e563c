//! Shared numeric constants for the planner crate.

// ── Geometry ────────────────────────────────────────────────────

/// Trees whose canopy radius is at or below this many pixels are treated as
/// misclicks and never committed.
pub const MIN_TREE_RADIUS_PX: f64 = 5.0;

/// Radius of the trunk dot drawn at a tree's center, in pixels.
pub const TRUNK_RADIUS_PX: f64 = 4.0;

// ── Canvas ──────────────────────────────────────────────────────

/// Width of the drawing area in pixels.
pub const CANVAS_WIDTH_PX: f64 = 900.0;

/// Height of the drawing area in pixels.
pub const CANVAS_HEIGHT_PX: f64 = 600.0;

// ── Palette ─────────────────────────────────────────────────────

pub const BACKGROUND_FILL: &str = "#e8f5e9";
pub const BACKGROUND_TEXT: &str = "#a5d6a7";
pub const FENCE_STROKE: &str = "#8b4513";
pub const DRAFT_FENCE_STROKE: &str = "#d2691e";
pub const TRUNK_FILL: &str = "#6d4c41";
pub const CANOPY_STROKE: &str = "#2e7d32";
pub const CANOPY_FILL: &str = "rgba(76, 175, 80, 0.2)";

// ── Codec ───────────────────────────────────────────────────────

/// Schema version written into every share token.
pub const SCHEMA_VERSION: u32 = 1;

/// Query parameter that carries the share token.
pub const SHARE_QUERY_PARAM: &str = "data";
