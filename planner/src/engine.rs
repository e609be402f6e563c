use crate::calibrate;
use crate::codec;
use crate::doc::{Design, DraftFence, DraftTree, EntityId, Fence, FencePatch, Scale, Tree, TreePatch};
use crate::error::PlannerError;
use crate::geometry::Point;
use crate::input::{EntityRef, InputState, Mode, PromptOutcome, UiState, grab_offset};
use crate::render::Scene;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Why a draft vanished without being committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The length prompt was answered with something that is not a positive number.
    InvalidLength,
    /// The length prompt was dismissed.
    Cancelled,
    /// The tree canopy was too small to keep.
    DegenerateTree,
    /// The pointer left the canvas mid-gesture.
    PointerLeft,
    /// The design refused the draft: a non-finite point, or no id left.
    Rejected,
}

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FenceCommitted(Fence),
    TreeCommitted(Tree),
    FenceUpdated(EntityId),
    TreeUpdated(EntityId),
    FenceDeleted(EntityId),
    TreeDeleted(EntityId),
    ScaleChanged(Option<Scale>),
    /// Ask the user for the real length of the fence just drawn. Answer with
    /// [`Engine::resolve_length`].
    LengthRequested { name: String },
    DraftDiscarded(DiscardReason),
    /// The whole design was replaced (token load or explicit load).
    DesignReplaced,
    /// A non-fatal problem the user should hear about.
    Notice(String),
    SetCursor(&'static str),
    RenderNeeded,
}

/// Owned application state for one planning session.
///
/// Hosts create one `Engine` per session and feed it pointer events and panel
/// actions. Every handler runs to completion synchronously; the only pause is
/// [`InputState::AwaitingLength`], which holds until [`Engine::resolve_length`].
#[derive(Debug, Default)]
pub struct Engine {
    design: Design,
    pub ui: UiState,
    pub input: InputState,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session from an existing design.
    #[must_use]
    pub fn with_design(design: Design) -> Self {
        Self { design, ..Self::default() }
    }

    // --- Queries ---

    #[must_use]
    pub fn design(&self) -> &Design {
        &self.design
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.ui.mode
    }

    /// The fence being drawn or awaiting its length, if any.
    #[must_use]
    pub fn draft_fence(&self) -> Option<&DraftFence> {
        match &self.input {
            InputState::DrawingFence { draft } | InputState::AwaitingLength { draft } => Some(draft),
            _ => None,
        }
    }

    /// The tree being sized, if any.
    #[must_use]
    pub fn draft_tree(&self) -> Option<&DraftTree> {
        match &self.input {
            InputState::DrawingTree { draft } => Some(draft),
            _ => None,
        }
    }

    /// Cursor the host should show over the canvas.
    #[must_use]
    pub fn cursor(&self) -> &'static str {
        if self.input.move_target().is_some() { "move" } else { self.ui.mode.cursor() }
    }

    /// One-line help for the current state.
    #[must_use]
    pub fn instructions(&self) -> &'static str {
        if self.input.move_target().is_some() {
            return "Click and drag on the canvas to move the selected item";
        }
        match self.ui.mode {
            Mode::View => "Select an item to edit or move from the sidebar",
            Mode::Fence => "Click to start a fence line, drag to the end point, release and enter the length in feet",
            Mode::Tree => "Click where you want to place a tree, drag outward to set the canopy size, then release",
        }
    }

    /// Everything the renderer needs for one frame.
    #[must_use]
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            design: &self.design,
            draft_fence: match &self.input {
                InputState::DrawingFence { draft } => Some(draft),
                _ => None,
            },
            draft_tree: self.draft_tree(),
        }
    }

    // --- Mode / move selection ---

    /// Switch drawing mode. Ignored while a draft is open.
    pub fn set_mode(&mut self, mode: Mode) -> Vec<Action> {
        if matches!(
            self.input,
            InputState::DrawingFence { .. } | InputState::DrawingTree { .. } | InputState::AwaitingLength { .. }
        ) {
            return Vec::new();
        }
        self.ui.mode = mode;
        vec![Action::SetCursor(self.cursor())]
    }

    /// Pick an entity to move with the next drag. Switches to view mode.
    pub fn start_move(&mut self, target: EntityRef) -> Vec<Action> {
        let pickable = matches!(self.input, InputState::Idle | InputState::MovingEntity { grab: None, .. });
        if !pickable {
            return Vec::new();
        }
        if self.anchor_of(target).is_none() {
            log_rejected("start_move", &PlannerError::UnknownEntityId(entity_id(target)));
            return Vec::new();
        }
        self.input = InputState::MovingEntity { target, grab: None };
        self.ui.mode = Mode::View;
        tracing::debug!(?target, "move target picked");
        vec![Action::SetCursor(self.cursor())]
    }

    /// Drop the move target without dragging.
    pub fn cancel_move(&mut self) -> Vec<Action> {
        if !matches!(self.input, InputState::MovingEntity { .. }) {
            return Vec::new();
        }
        self.input = InputState::Idle;
        vec![Action::SetCursor(self.cursor()), Action::RenderNeeded]
    }

    // --- Pointer events ---

    pub fn on_pointer_down(&mut self, pt: Point) -> Vec<Action> {
        if !pt.is_finite() {
            return ignored_point("pointer_down", pt);
        }
        match &self.input {
            InputState::MovingEntity { target, .. } => {
                let target = *target;
                let Some(anchor) = self.anchor_of(target) else {
                    self.input = InputState::Idle;
                    return vec![Action::SetCursor(self.cursor())];
                };
                self.input = InputState::MovingEntity { target, grab: Some(grab_offset(pt, anchor)) };
                Vec::new()
            }
            InputState::Idle => match self.ui.mode {
                Mode::Fence => {
                    self.input = InputState::DrawingFence { draft: DraftFence::new(pt, self.design.fences().len()) };
                    vec![Action::RenderNeeded]
                }
                Mode::Tree => {
                    self.input = InputState::DrawingTree { draft: DraftTree::new(pt, self.design.trees().len()) };
                    vec![Action::RenderNeeded]
                }
                Mode::View => Vec::new(),
            },
            // A second press mid-gesture continues the gesture; the prompt is modal.
            InputState::DrawingFence { .. } | InputState::DrawingTree { .. } | InputState::AwaitingLength { .. } => {
                Vec::new()
            }
        }
    }

    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        if !pt.is_finite() {
            return ignored_point("pointer_move", pt);
        }
        match &self.input {
            InputState::DrawingFence { draft } => {
                self.input = InputState::DrawingFence { draft: draft.extend(pt) };
                vec![Action::RenderNeeded]
            }
            InputState::DrawingTree { draft } => {
                self.input = InputState::DrawingTree { draft: draft.extend(pt) };
                vec![Action::RenderNeeded]
            }
            InputState::MovingEntity { target, grab: Some((ox, oy)) } => {
                let target = *target;
                let new_anchor = pt.offset(-ox, -oy);
                match self.drag_to(target, new_anchor) {
                    Ok(action) => vec![action, Action::RenderNeeded],
                    Err(err) => {
                        log_rejected("drag", &err);
                        self.input = InputState::Idle;
                        vec![Action::SetCursor(self.cursor())]
                    }
                }
            }
            InputState::MovingEntity { grab: None, .. } | InputState::Idle | InputState::AwaitingLength { .. } => {
                Vec::new()
            }
        }
    }

    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::DrawingFence { draft } => {
                let name = draft.name.clone();
                self.input = InputState::AwaitingLength { draft };
                vec![Action::LengthRequested { name }, Action::RenderNeeded]
            }
            InputState::DrawingTree { draft } => match self.design.commit_tree(draft) {
                Ok(tree) => {
                    tracing::info!(id = tree.id, radius = tree.radius, "tree committed");
                    vec![Action::TreeCommitted(tree), Action::RenderNeeded]
                }
                Err(err) => {
                    tracing::debug!(%err, "tree draft dropped");
                    vec![Action::DraftDiscarded(discard_reason(&err)), Action::RenderNeeded]
                }
            },
            InputState::MovingEntity { target, grab: Some(_) } => {
                tracing::debug!(?target, "move finished");
                vec![Action::SetCursor(self.cursor()), Action::RenderNeeded]
            }
            other => {
                self.input = other;
                Vec::new()
            }
        }
    }

    /// The pointer left the canvas. Any held gesture ends here.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::DrawingFence { .. } | InputState::DrawingTree { .. } => {
                vec![Action::DraftDiscarded(DiscardReason::PointerLeft), Action::RenderNeeded]
            }
            InputState::MovingEntity { grab: Some(_), .. } => {
                vec![Action::SetCursor(self.cursor()), Action::RenderNeeded]
            }
            other => {
                self.input = other;
                Vec::new()
            }
        }
    }

    /// Answer the pending length prompt.
    pub fn resolve_length(&mut self, outcome: PromptOutcome) -> Vec<Action> {
        let InputState::AwaitingLength { draft } = std::mem::take(&mut self.input) else {
            return Vec::new();
        };
        let text = match outcome {
            PromptOutcome::Cancelled => {
                return vec![Action::DraftDiscarded(DiscardReason::Cancelled), Action::RenderNeeded];
            }
            PromptOutcome::Confirmed(text) => text,
        };
        let before = self.design.scale();
        let committed = calibrate::parse_length(&text).and_then(|feet| self.design.commit_fence(draft, feet));
        match committed {
            Ok(fence) => {
                tracing::info!(id = fence.id, length = fence.length, "fence committed");
                let mut actions = vec![Action::FenceCommitted(fence)];
                self.push_scale_change(before, &mut actions);
                actions.push(Action::RenderNeeded);
                actions
            }
            Err(err) => {
                tracing::debug!(%err, "fence draft dropped");
                vec![Action::DraftDiscarded(discard_reason(&err)), Action::RenderNeeded]
            }
        }
    }

    // --- Side panel edits ---

    pub fn rename_fence(&mut self, id: EntityId, name: impl Into<String>) -> Vec<Action> {
        let patch = FencePatch { name: Some(name.into()), ..FencePatch::default() };
        match self.design.update_fence(id, &patch) {
            Ok(()) => vec![Action::FenceUpdated(id), Action::RenderNeeded],
            Err(err) => rejected("rename_fence", &err),
        }
    }

    /// Re-measure a fence. Its implied ratio is folded into the scale.
    pub fn set_fence_length(&mut self, id: EntityId, feet: f64) -> Vec<Action> {
        let before = self.design.scale();
        let patch = FencePatch { length: Some(feet), ..FencePatch::default() };
        match self.design.update_fence(id, &patch) {
            Ok(()) => {
                let mut actions = vec![Action::FenceUpdated(id)];
                self.push_scale_change(before, &mut actions);
                actions.push(Action::RenderNeeded);
                actions
            }
            Err(err) => rejected("set_fence_length", &err),
        }
    }

    pub fn rename_tree(&mut self, id: EntityId, name: impl Into<String>) -> Vec<Action> {
        let patch = TreePatch { name: Some(name.into()), ..TreePatch::default() };
        match self.design.update_tree(id, &patch) {
            Ok(()) => vec![Action::TreeUpdated(id), Action::RenderNeeded],
            Err(err) => rejected("rename_tree", &err),
        }
    }

    /// Resize a tree from a diameter in feet. Needs a calibrated scale.
    pub fn set_tree_diameter(&mut self, id: EntityId, feet: f64) -> Vec<Action> {
        match self.design.set_tree_diameter(id, feet) {
            Ok(()) => vec![Action::TreeUpdated(id), Action::RenderNeeded],
            Err(err) => rejected("set_tree_diameter", &err),
        }
    }

    pub fn delete_fence(&mut self, id: EntityId) -> Vec<Action> {
        match self.design.delete_fence(id) {
            Ok(_) => {
                self.release_target(EntityRef::Fence(id));
                vec![Action::FenceDeleted(id), Action::RenderNeeded]
            }
            Err(err) => rejected("delete_fence", &err),
        }
    }

    pub fn delete_tree(&mut self, id: EntityId) -> Vec<Action> {
        match self.design.delete_tree(id) {
            Ok(_) => {
                self.release_target(EntityRef::Tree(id));
                vec![Action::TreeDeleted(id), Action::RenderNeeded]
            }
            Err(err) => rejected("delete_tree", &err),
        }
    }

    /// Remove every fence and tree and forget the calibration.
    pub fn clear_all(&mut self) -> Vec<Action> {
        self.design.clear_all();
        if matches!(self.input, InputState::MovingEntity { .. }) {
            self.input = InputState::Idle;
        }
        vec![Action::ScaleChanged(None), Action::SetCursor(self.cursor()), Action::RenderNeeded]
    }

    // --- Session fields ---

    /// Stub address lookup. Returns whether the background area is loaded.
    pub fn load_map(&mut self, address: &str) -> bool {
        let loaded = self.design.load_map(address);
        tracing::info!(address, loaded, "map load requested");
        loaded
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.design.set_notes(notes);
    }

    /// Replace the whole design. Any gesture in progress is dropped.
    pub fn load_design(&mut self, design: Design) -> Vec<Action> {
        self.design = design;
        self.input = InputState::Idle;
        vec![
            Action::DesignReplaced,
            Action::ScaleChanged(self.design.scale()),
            Action::SetCursor(self.cursor()),
            Action::RenderNeeded,
        ]
    }

    /// Replace the design from a share token, falling back to an empty design
    /// (with a notice) when the token does not decode.
    pub fn load_token(&mut self, token: &str) -> Vec<Action> {
        let (design, failure) = codec::decode_or_default(token);
        let mut actions = self.load_design(design);
        if let Some(err) = failure {
            actions.push(Action::Notice(format!("Could not load the shared design: {err}")));
        }
        actions
    }

    /// Shareable URL for the current design.
    #[must_use]
    pub fn share_url(&self, base: &str) -> String {
        codec::share_url(base, &self.design)
    }

    // --- Internals ---

    fn anchor_of(&self, target: EntityRef) -> Option<Point> {
        match target {
            EntityRef::Fence(id) => self.design.fence(id).map(|f| f.start),
            EntityRef::Tree(id) => self.design.tree(id).map(|t| t.center),
        }
    }

    fn drag_to(&mut self, target: EntityRef, anchor: Point) -> Result<Action, PlannerError> {
        match target {
            EntityRef::Fence(id) => {
                let start = self.design.fence(id).ok_or(PlannerError::UnknownEntityId(id))?.start;
                let (dx, dy) = anchor.delta_from(start);
                self.design.translate_fence(id, dx, dy)?;
                Ok(Action::FenceUpdated(id))
            }
            EntityRef::Tree(id) => {
                self.design.move_tree(id, anchor)?;
                Ok(Action::TreeUpdated(id))
            }
        }
    }

    fn release_target(&mut self, removed: EntityRef) {
        if self.input.move_target() == Some(removed) {
            self.input = InputState::Idle;
        }
    }

    fn push_scale_change(&self, before: Option<Scale>, actions: &mut Vec<Action>) {
        let after = self.design.scale();
        if after != before {
            actions.push(Action::ScaleChanged(after));
        }
    }
}

fn entity_id(target: EntityRef) -> EntityId {
    match target {
        EntityRef::Fence(id) | EntityRef::Tree(id) => id,
    }
}

fn discard_reason(err: &PlannerError) -> DiscardReason {
    match err {
        PlannerError::InvalidCalibrationInput(_) => DiscardReason::InvalidLength,
        PlannerError::DegenerateTree { .. } => DiscardReason::DegenerateTree,
        _ => DiscardReason::Rejected,
    }
}

fn ignored_point(op: &str, pt: Point) -> Vec<Action> {
    tracing::warn!(op, x = pt.x, y = pt.y, "non-finite pointer position ignored");
    Vec::new()
}

fn log_rejected(op: &str, err: &PlannerError) {
    tracing::warn!(op, %err, "edit ignored");
}

fn rejected(op: &str, err: &PlannerError) -> Vec<Action> {
    log_rejected(op, err);
    Vec::new()
}
