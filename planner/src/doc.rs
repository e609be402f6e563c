//! Document model: fences, trees, calibration, and the design aggregate.
//!
//! This module defines the committed entity types (`Fence`, `Tree`), their
//! in-progress draft forms (`DraftFence`, `DraftTree`), sparse-update types
//! listing exactly which fields may be edited (`FencePatch`, `TreePatch`), and
//! the aggregate that owns everything a user authors (`Design`).
//!
//! The free functions at the bottom are pure: they take a sequence and return
//! a new one. `Design` layers validation and calibration on top of them and is
//! the only place entity sequences are replaced.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};

use crate::calibrate;
use crate::consts::{MIN_TREE_RADIUS_PX, SCHEMA_VERSION};
use crate::error::PlannerError;
use crate::geometry::Point;

/// Unique identifier for a fence or tree within one design.
pub type EntityId = u64;

/// Calibration ratio in pixels per foot. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scale(f64);

impl Scale {
    /// Wrap a pixels-per-foot ratio. Returns `None` unless it is positive and finite.
    #[must_use]
    pub fn new(pixels_per_foot: f64) -> Option<Self> {
        (pixels_per_foot.is_finite() && pixels_per_foot > 0.0).then_some(Self(pixels_per_foot))
    }

    #[must_use]
    pub fn pixels_per_foot(self) -> f64 {
        self.0
    }
}

/// A committed fence line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fence {
    pub id: EntityId,
    pub name: String,
    pub start: Point,
    pub end: Point,
    /// Real-world length in feet, as entered by the user.
    pub length: f64,
}

impl Fence {
    /// Length of the drawn segment in pixels.
    #[must_use]
    pub fn pixel_length(&self) -> f64 {
        self.start.distance_to(self.end)
    }

    /// The same fence shifted by `(dx, dy)`. Orientation and `length` are kept.
    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Fence {
        Fence { start: self.start.offset(dx, dy), end: self.end.offset(dx, dy), ..self.clone() }
    }
}

/// A committed tree canopy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub id: EntityId,
    pub name: String,
    pub center: Point,
    /// Canopy radius in pixels.
    pub radius: f64,
}

impl Tree {
    /// The same tree with its center replaced.
    #[must_use]
    pub fn moved_to(&self, center: Point) -> Tree {
        Tree { center, ..self.clone() }
    }
}

/// A fence being drawn. It has no id and no length until committed.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftFence {
    pub name: String,
    pub start: Point,
    pub end: Point,
}

impl DraftFence {
    /// Start a draft at `origin`. `existing` is the number of fences already in
    /// the design and only feeds the default name.
    #[must_use]
    pub fn new(origin: Point, existing: usize) -> Self {
        Self { name: format!("Fence {}", existing + 1), start: origin, end: origin }
    }

    /// Replace the moving endpoint.
    #[must_use]
    pub fn extend(&self, end: Point) -> Self {
        Self { end, ..self.clone() }
    }

    #[must_use]
    pub fn pixel_length(&self) -> f64 {
        self.start.distance_to(self.end)
    }
}

/// A tree being sized. Its radius follows the pointer until release.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftTree {
    pub name: String,
    pub center: Point,
    pub radius: f64,
}

impl DraftTree {
    /// Start a zero-radius draft at `center`.
    #[must_use]
    pub fn new(center: Point, existing: usize) -> Self {
        Self { name: format!("Tree {}", existing + 1), center, radius: 0.0 }
    }

    /// Set the radius to the distance from the center to `pointer`.
    #[must_use]
    pub fn extend(&self, pointer: Point) -> Self {
        Self { radius: self.center.distance_to(pointer), ..self.clone() }
    }
}

/// Sparse update for a fence. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FencePatch {
    pub name: Option<String>,
    /// New length in feet. Re-calibrates the design scale when applied.
    pub length: Option<f64>,
}

/// Sparse update for a tree. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreePatch {
    pub name: Option<String>,
    /// New canopy radius in pixels.
    pub radius: Option<f64>,
}

/// Monotonic id counter owned by a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdSource {
    next: EntityId,
}

impl Default for IdSource {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdSource {
    /// Hand out the next id. `EntityId::MAX` is never issued; once the
    /// counter reaches it, `None`.
    pub fn issue(&mut self) -> Option<EntityId> {
        let id = self.next;
        self.next = id.checked_add(1)?;
        Some(id)
    }

    /// Make sure `id` is never issued again.
    pub fn reserve_past(&mut self, id: EntityId) {
        if id >= self.next {
            self.next = id.saturating_add(1);
        }
    }

    #[must_use]
    pub fn peek(&self) -> EntityId {
        self.next
    }
}

// =============================================================
// Pure constructors and updaters
// =============================================================

/// Finalize a draft fence with its measured length.
///
/// # Errors
///
/// Returns [`PlannerError::InvalidCalibrationInput`] unless `length_feet` is a
/// positive finite number, [`PlannerError::NonFinitePoint`] for a NaN or
/// infinite endpoint, and [`PlannerError::IdsExhausted`] when no id is left.
/// No id is consumed on failure.
pub fn commit_fence(draft: DraftFence, length_feet: f64, ids: &mut IdSource) -> Result<Fence, PlannerError> {
    let length = calibrate::validate_length(length_feet)?;
    let start = finite(draft.start)?;
    let end = finite(draft.end)?;
    let id = ids.issue().ok_or(PlannerError::IdsExhausted)?;
    Ok(Fence { id, name: draft.name, start, end, length })
}

/// Finalize a draft tree.
///
/// # Errors
///
/// Returns [`PlannerError::DegenerateTree`] if the radius is at or below
/// [`MIN_TREE_RADIUS_PX`] or not finite, [`PlannerError::NonFinitePoint`] for
/// a NaN or infinite center, and [`PlannerError::IdsExhausted`] when no id is
/// left. No id is consumed on failure.
pub fn commit_tree(draft: DraftTree, ids: &mut IdSource) -> Result<Tree, PlannerError> {
    if !draft.radius.is_finite() || draft.radius <= MIN_TREE_RADIUS_PX {
        return Err(PlannerError::DegenerateTree { radius: draft.radius });
    }
    let center = finite(draft.center)?;
    let id = ids.issue().ok_or(PlannerError::IdsExhausted)?;
    Ok(Tree { id, name: draft.name, center, radius: draft.radius })
}

fn finite(pt: Point) -> Result<Point, PlannerError> {
    if pt.is_finite() { Ok(pt) } else { Err(PlannerError::NonFinitePoint { x: pt.x, y: pt.y }) }
}

/// Replace the fence with `id` by a copy with `patch` merged in.
#[must_use]
pub fn update_fence(fences: &[Fence], id: EntityId, patch: &FencePatch) -> Vec<Fence> {
    fences
        .iter()
        .map(|f| {
            if f.id != id {
                return f.clone();
            }
            Fence {
                name: patch.name.clone().unwrap_or_else(|| f.name.clone()),
                length: patch.length.unwrap_or(f.length),
                ..f.clone()
            }
        })
        .collect()
}

/// Replace the tree with `id` by a copy with `patch` merged in.
#[must_use]
pub fn update_tree(trees: &[Tree], id: EntityId, patch: &TreePatch) -> Vec<Tree> {
    trees
        .iter()
        .map(|t| {
            if t.id != id {
                return t.clone();
            }
            Tree {
                name: patch.name.clone().unwrap_or_else(|| t.name.clone()),
                radius: patch.radius.unwrap_or(t.radius),
                ..t.clone()
            }
        })
        .collect()
}

#[must_use]
pub fn delete_fence(fences: &[Fence], id: EntityId) -> Vec<Fence> {
    fences.iter().filter(|f| f.id != id).cloned().collect()
}

#[must_use]
pub fn delete_tree(trees: &[Tree], id: EntityId) -> Vec<Tree> {
    trees.iter().filter(|t| t.id != id).cloned().collect()
}

// =============================================================
// Design aggregate
// =============================================================

/// Everything a user authors: address, calibration, entities, and notes.
///
/// This is the unit of serialization. Field names on the wire follow the
/// share format (`mapLoaded`, `fenceLines`, `nextId`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Design {
    version: u32,
    address: String,
    map_loaded: bool,
    scale: Option<Scale>,
    #[serde(rename = "fenceLines")]
    fences: Vec<Fence>,
    trees: Vec<Tree>,
    notes: String,
    #[serde(rename = "nextId")]
    ids: IdSource,
}

impl Default for Design {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            address: String::new(),
            map_loaded: false,
            scale: None,
            fences: Vec::new(),
            trees: Vec::new(),
            notes: String::new(),
            ids: IdSource::default(),
        }
    }
}

impl Design {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn map_loaded(&self) -> bool {
        self.map_loaded
    }

    #[must_use]
    pub fn scale(&self) -> Option<Scale> {
        self.scale
    }

    #[must_use]
    pub fn fences(&self) -> &[Fence] {
        &self.fences
    }

    #[must_use]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub fn fence(&self, id: EntityId) -> Option<&Fence> {
        self.fences.iter().find(|f| f.id == id)
    }

    #[must_use]
    pub fn tree(&self, id: EntityId) -> Option<&Tree> {
        self.trees.iter().find(|t| t.id == id)
    }

    /// The id the next commit will receive.
    #[must_use]
    pub fn next_id(&self) -> EntityId {
        self.ids.peek()
    }

    // --- Session fields ---

    /// Stub address lookup: any non-blank address "loads" the background area.
    /// Returns whether the map is loaded afterwards.
    pub fn load_map(&mut self, address: &str) -> bool {
        if address.trim().is_empty() {
            return self.map_loaded;
        }
        self.address = address.to_owned();
        self.map_loaded = true;
        self.map_loaded
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    // --- Commits ---

    /// Commit a draft fence and fold its implied ratio into the scale.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidCalibrationInput`] for a non-positive or
    /// non-finite length. The design is unchanged in that case.
    pub fn commit_fence(&mut self, draft: DraftFence, length_feet: f64) -> Result<Fence, PlannerError> {
        let fence = commit_fence(draft, length_feet, &mut self.ids)?;
        self.observe(fence.pixel_length(), fence.length);
        self.fences = self.fences.iter().cloned().chain(std::iter::once(fence.clone())).collect();
        Ok(fence)
    }

    /// Commit a draft tree.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::DegenerateTree`] when the canopy is too small.
    pub fn commit_tree(&mut self, draft: DraftTree) -> Result<Tree, PlannerError> {
        let tree = commit_tree(draft, &mut self.ids)?;
        self.trees = self.trees.iter().cloned().chain(std::iter::once(tree.clone())).collect();
        Ok(tree)
    }

    // --- Edits ---

    /// Apply a fence patch. A new length re-calibrates the scale from the
    /// fence's current pixel length.
    ///
    /// # Errors
    ///
    /// [`PlannerError::UnknownEntityId`] if no fence has `id`;
    /// [`PlannerError::InvalidCalibrationInput`] if the new length is invalid.
    pub fn update_fence(&mut self, id: EntityId, patch: &FencePatch) -> Result<(), PlannerError> {
        let pixels = self.fence(id).ok_or(PlannerError::UnknownEntityId(id))?.pixel_length();
        if let Some(length) = patch.length {
            let length = calibrate::validate_length(length)?;
            self.observe(pixels, length);
        }
        self.fences = update_fence(&self.fences, id, patch);
        Ok(())
    }

    /// Apply a tree patch.
    ///
    /// # Errors
    ///
    /// [`PlannerError::UnknownEntityId`] if no tree has `id`;
    /// [`PlannerError::DegenerateTree`] if the new radius is not positive.
    pub fn update_tree(&mut self, id: EntityId, patch: &TreePatch) -> Result<(), PlannerError> {
        if self.tree(id).is_none() {
            return Err(PlannerError::UnknownEntityId(id));
        }
        if let Some(radius) = patch.radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(PlannerError::DegenerateTree { radius });
            }
        }
        self.trees = update_tree(&self.trees, id, patch);
        Ok(())
    }

    /// Resize a tree from a diameter in feet, using the current scale.
    ///
    /// # Errors
    ///
    /// [`PlannerError::InvalidCalibrationInput`] when uncalibrated or the
    /// diameter is not a positive finite number.
    pub fn set_tree_diameter(&mut self, id: EntityId, diameter_feet: f64) -> Result<(), PlannerError> {
        let radius = calibrate::diameter_to_radius(diameter_feet, self.scale)?;
        self.update_tree(id, &TreePatch { radius: Some(radius), ..TreePatch::default() })
    }

    /// Shift both endpoints of a fence. Its stored length is untouched.
    ///
    /// # Errors
    ///
    /// [`PlannerError::UnknownEntityId`] if no fence has `id`;
    /// [`PlannerError::NonFinitePoint`] if an endpoint would leave finite
    /// space. Nothing changes on failure.
    pub fn translate_fence(&mut self, id: EntityId, dx: f64, dy: f64) -> Result<(), PlannerError> {
        let moved = self.fence(id).ok_or(PlannerError::UnknownEntityId(id))?.translated(dx, dy);
        finite(moved.start)?;
        finite(moved.end)?;
        self.fences = self.fences.iter().map(|f| if f.id == id { moved.clone() } else { f.clone() }).collect();
        Ok(())
    }

    /// Place a tree's center at `center`.
    ///
    /// # Errors
    ///
    /// [`PlannerError::UnknownEntityId`] if no tree has `id`;
    /// [`PlannerError::NonFinitePoint`] for a NaN or infinite center.
    pub fn move_tree(&mut self, id: EntityId, center: Point) -> Result<(), PlannerError> {
        if self.tree(id).is_none() {
            return Err(PlannerError::UnknownEntityId(id));
        }
        let center = finite(center)?;
        self.trees = self.trees.iter().map(|t| if t.id == id { t.moved_to(center) } else { t.clone() }).collect();
        Ok(())
    }

    /// Remove a fence, returning it.
    ///
    /// # Errors
    ///
    /// [`PlannerError::UnknownEntityId`] if no fence has `id`; nothing changes.
    pub fn delete_fence(&mut self, id: EntityId) -> Result<Fence, PlannerError> {
        let removed = self.fence(id).cloned().ok_or(PlannerError::UnknownEntityId(id))?;
        self.fences = delete_fence(&self.fences, id);
        Ok(removed)
    }

    /// Remove a tree, returning it.
    ///
    /// # Errors
    ///
    /// [`PlannerError::UnknownEntityId`] if no tree has `id`; nothing changes.
    pub fn delete_tree(&mut self, id: EntityId) -> Result<Tree, PlannerError> {
        let removed = self.tree(id).cloned().ok_or(PlannerError::UnknownEntityId(id))?;
        self.trees = delete_tree(&self.trees, id);
        Ok(removed)
    }

    /// Drop every fence and tree and forget the calibration. Address, notes,
    /// and the id counter survive.
    pub fn clear_all(&mut self) {
        self.fences = Vec::new();
        self.trees = Vec::new();
        self.scale = None;
    }

    // --- Integrity ---

    /// Check every invariant a committed design must hold.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidPayload`] naming the first violation.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.version != SCHEMA_VERSION {
            return Err(PlannerError::InvalidPayload(format!("unsupported schema version {}", self.version)));
        }
        if let Some(scale) = self.scale {
            if Scale::new(scale.pixels_per_foot()).is_none() {
                return Err(PlannerError::InvalidPayload("scale must be a positive number".into()));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for fence in &self.fences {
            if fence.id == EntityId::MAX {
                return Err(PlannerError::InvalidPayload(format!("fence id {} is out of range", fence.id)));
            }
            if !seen.insert(fence.id) {
                return Err(PlannerError::InvalidPayload(format!("duplicate fence id {}", fence.id)));
            }
            if !fence.length.is_finite() || fence.length <= 0.0 {
                return Err(PlannerError::InvalidPayload(format!("fence {} has a non-positive length", fence.id)));
            }
            if !fence.start.is_finite() || !fence.end.is_finite() {
                return Err(PlannerError::InvalidPayload(format!("fence {} has non-finite endpoints", fence.id)));
            }
        }
        seen.clear();
        for tree in &self.trees {
            if tree.id == EntityId::MAX {
                return Err(PlannerError::InvalidPayload(format!("tree id {} is out of range", tree.id)));
            }
            if !seen.insert(tree.id) {
                return Err(PlannerError::InvalidPayload(format!("duplicate tree id {}", tree.id)));
            }
            if !tree.radius.is_finite() || tree.radius <= 0.0 {
                return Err(PlannerError::InvalidPayload(format!("tree {} has a non-positive radius", tree.id)));
            }
            if !tree.center.is_finite() {
                return Err(PlannerError::InvalidPayload(format!("tree {} has a non-finite center", tree.id)));
            }
        }
        Ok(())
    }

    /// Raise the id counter past every id already in use.
    pub(crate) fn reserve_existing_ids(&mut self) {
        let used = self.fences.iter().map(|f| f.id).chain(self.trees.iter().map(|t| t.id));
        for id in used {
            self.ids.reserve_past(id);
        }
    }

    fn observe(&mut self, pixels: f64, feet: f64) {
        match calibrate::implied_ratio(pixels, feet) {
            Some(ratio) => {
                let scale = calibrate::fold(self.scale, ratio);
                tracing::debug!(pixels, feet, ratio = ratio.pixels_per_foot(), scale = scale.pixels_per_foot(), "scale refined");
                self.scale = Some(scale);
            }
            None => tracing::warn!(pixels, feet, "fence gives no usable calibration; scale unchanged"),
        }
    }
}
