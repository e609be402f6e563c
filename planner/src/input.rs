//! Input model: modes, move targets, and the gesture state machine.
//!
//! `Mode` is the user's drawing intent as picked in the toolbar. `InputState`
//! is the gesture being tracked between pointer-down and pointer-up, carrying
//! the draft or drag context needed to apply pointer moves and to finish the
//! gesture on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::{DraftFence, DraftTree, EntityId};
use crate::geometry::Point;

/// Which drawing mode is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Pointer gestures do nothing unless an entity is being moved.
    #[default]
    View,
    /// Drag to draw a fence line.
    Fence,
    /// Drag outward from a center to size a tree canopy.
    Tree,
}

impl Mode {
    /// Cursor name matching the mode.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::View => "default",
            Self::Fence | Self::Tree => "crosshair",
        }
    }
}

/// Reference to an entity picked for moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Fence(EntityId),
    Tree(EntityId),
}

/// How the host answered a length prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// The user entered text and confirmed.
    Confirmed(String),
    /// The user dismissed the prompt.
    Cancelled,
}

impl PromptOutcome {
    /// Map a host prompt result, where `None` means the dialog was dismissed.
    #[must_use]
    pub fn from_reply(reply: Option<String>) -> Self {
        reply.map_or(Self::Cancelled, Self::Confirmed)
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently selected mode.
    pub mode: Mode,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A fence draft follows the pointer.
    DrawingFence {
        /// The uncommitted fence.
        draft: DraftFence,
    },
    /// A tree draft grows with the pointer's distance from its center.
    DrawingTree {
        /// The uncommitted tree.
        draft: DraftTree,
    },
    /// An entity is picked for moving. Pointer-down starts the drag.
    MovingEntity {
        /// The entity being moved.
        target: EntityRef,
        /// Pointer minus entity anchor, captured on pointer-down. `None`
        /// until the drag begins.
        grab: Option<(f64, f64)>,
    },
    /// A finished fence waits for its length. Pointer input is ignored.
    AwaitingLength {
        /// The fence to commit once a length is confirmed.
        draft: DraftFence,
    },
}

impl InputState {
    /// Whether a pointer gesture is in progress (the pointer is held).
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        match self {
            Self::DrawingFence { .. } | Self::DrawingTree { .. } => true,
            Self::MovingEntity { grab, .. } => grab.is_some(),
            Self::Idle | Self::AwaitingLength { .. } => false,
        }
    }

    /// The entity picked for moving, if any.
    #[must_use]
    pub fn move_target(&self) -> Option<EntityRef> {
        match self {
            Self::MovingEntity { target, .. } => Some(*target),
            _ => None,
        }
    }
}

/// Offset between a pointer and the anchor it grabbed.
#[must_use]
pub fn grab_offset(pointer: Point, anchor: Point) -> (f64, f64) {
    pointer.delta_from(anchor)
}
