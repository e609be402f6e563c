#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::Design;
use crate::input::{EntityRef, InputState, Mode, PromptOutcome};

// =============================================================
// Helpers
// =============================================================

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn has_action<F>(actions: &[Action], pred: F) -> bool
where
    F: Fn(&Action) -> bool,
{
    actions.iter().any(pred)
}

fn has_render_needed(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::RenderNeeded))
}

fn confirmed(text: &str) -> PromptOutcome {
    PromptOutcome::Confirmed(text.to_owned())
}

/// Drag a fence from `a` to `b` in fence mode and answer the prompt with `length`.
fn draw_fence(engine: &mut Engine, a: Point, b: Point, length: &str) -> Vec<Action> {
    engine.set_mode(Mode::Fence);
    engine.on_pointer_down(a);
    engine.on_pointer_move(b);
    engine.on_pointer_up();
    engine.resolve_length(confirmed(length))
}

/// Drag a tree from `center` to `edge` in tree mode.
fn draw_tree(engine: &mut Engine, center: Point, edge: Point) -> Vec<Action> {
    engine.set_mode(Mode::Tree);
    engine.on_pointer_down(center);
    engine.on_pointer_move(edge);
    engine.on_pointer_up()
}

fn scale_of(engine: &Engine) -> f64 {
    engine.design().scale().map_or(0.0, crate::doc::Scale::pixels_per_foot)
}

// =============================================================
// Construction and defaults
// =============================================================

#[test]
fn new_engine_is_idle_in_view_mode() {
    let engine = Engine::new();
    assert!(matches!(engine.input, InputState::Idle));
    assert_eq!(engine.mode(), Mode::View);
    assert_eq!(engine.design(), &Design::default());
    assert_eq!(engine.cursor(), "default");
}

#[test]
fn view_mode_pointer_down_does_nothing() {
    let mut engine = Engine::new();
    assert!(engine.on_pointer_down(pt(10.0, 10.0)).is_empty());
    assert!(matches!(engine.input, InputState::Idle));
}

// =============================================================
// Fence drawing
// =============================================================

#[test]
fn fence_pointer_down_creates_draft_at_origin() {
    let mut engine = Engine::new();
    engine.set_mode(Mode::Fence);
    let actions = engine.on_pointer_down(pt(5.0, 6.0));
    assert!(has_render_needed(&actions));
    let draft = engine.draft_fence().unwrap();
    assert_eq!(draft.start, pt(5.0, 6.0));
    assert_eq!(draft.end, pt(5.0, 6.0));
    assert_eq!(draft.name, "Fence 1");
}

#[test]
fn fence_pointer_move_extends_endpoint() {
    let mut engine = Engine::new();
    engine.set_mode(Mode::Fence);
    engine.on_pointer_down(pt(0.0, 0.0));
    engine.on_pointer_move(pt(30.0, 40.0));
    assert_eq!(engine.draft_fence().unwrap().end, pt(30.0, 40.0));
    assert!(engine.scene().draft_fence.is_some());
}

#[test]
fn fence_pointer_up_requests_length_and_suspends() {
    let mut engine = Engine::new();
    engine.set_mode(Mode::Fence);
    engine.on_pointer_down(pt(0.0, 0.0));
    engine.on_pointer_move(pt(100.0, 0.0));
    let actions = engine.on_pointer_up();
    assert!(actions.contains(&Action::LengthRequested { name: "Fence 1".into() }));
    assert!(matches!(engine.input, InputState::AwaitingLength { .. }));
    assert!(engine.design().fences().is_empty());
    // The suspended draft is not drawn as an in-progress line.
    assert!(engine.scene().draft_fence.is_none());
}

#[test]
fn pointer_events_are_ignored_while_awaiting_length() {
    let mut engine = Engine::new();
    engine.set_mode(Mode::Fence);
    engine.on_pointer_down(pt(0.0, 0.0));
    engine.on_pointer_move(pt(100.0, 0.0));
    engine.on_pointer_up();

    assert!(engine.on_pointer_down(pt(300.0, 300.0)).is_empty());
    assert!(engine.on_pointer_move(pt(310.0, 300.0)).is_empty());
    assert!(engine.on_pointer_up().is_empty());
    assert!(engine.on_pointer_leave().is_empty());
    assert!(engine.set_mode(Mode::Tree).is_empty());
    assert_eq!(engine.draft_fence().unwrap().end, pt(100.0, 0.0));
}

#[test]
fn confirmed_length_commits_and_calibrates() {
    let mut engine = Engine::new();
    let actions = draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    assert!(has_action(&actions, |a| matches!(a, Action::FenceCommitted(f) if f.length == 50.0)));
    assert!(has_action(&actions, |a| matches!(a, Action::ScaleChanged(Some(_)))));
    assert!(matches!(engine.input, InputState::Idle));
    assert_eq!(engine.design().fences().len(), 1);
    assert_eq!(scale_of(&engine), 2.0);
}

#[test]
fn two_fence_scenario_averages_scale() {
    let mut engine = Engine::new();
    draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    draw_fence(&mut engine, pt(0.0, 0.0), pt(50.0, 50.0), "100");
    assert_eq!(engine.design().fences().len(), 2);
    assert_eq!(engine.design().fences()[1].name, "Fence 2");
    assert!((scale_of(&engine) - 1.3536).abs() < 1e-4);
}

#[test]
fn invalid_length_discards_draft() {
    for text in ["", "abc", "0", "-10"] {
        let mut engine = Engine::new();
        let actions = draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), text);
        assert!(actions.contains(&Action::DraftDiscarded(DiscardReason::InvalidLength)), "{text:?}");
        assert!(engine.design().fences().is_empty());
        assert!(engine.design().scale().is_none());
        assert!(matches!(engine.input, InputState::Idle));
    }
}

#[test]
fn cancelled_prompt_discards_draft() {
    let mut engine = Engine::new();
    engine.set_mode(Mode::Fence);
    engine.on_pointer_down(pt(0.0, 0.0));
    engine.on_pointer_move(pt(100.0, 0.0));
    engine.on_pointer_up();
    let actions = engine.resolve_length(PromptOutcome::Cancelled);
    assert!(actions.contains(&Action::DraftDiscarded(DiscardReason::Cancelled)));
    assert!(engine.design().fences().is_empty());
    assert!(engine.draft_fence().is_none());
}

#[test]
fn resolve_length_without_prompt_is_noop() {
    let mut engine = Engine::new();
    assert!(engine.resolve_length(confirmed("10")).is_empty());
    assert!(engine.design().fences().is_empty());
}

// =============================================================
// Tree drawing
// =============================================================

#[test]
fn tree_drag_sets_radius_from_center() {
    let mut engine = Engine::new();
    engine.set_mode(Mode::Tree);
    engine.on_pointer_down(pt(10.0, 10.0));
    engine.on_pointer_move(pt(40.0, 50.0));
    let draft = engine.draft_tree().unwrap();
    assert_eq!(draft.center, pt(10.0, 10.0));
    assert_eq!(draft.radius, 50.0);
}

#[test]
fn tree_release_commits_when_large_enough() {
    let mut engine = Engine::new();
    let actions = draw_tree(&mut engine, pt(100.0, 100.0), pt(130.0, 100.0));
    assert!(has_action(&actions, |a| matches!(a, Action::TreeCommitted(t) if t.radius == 30.0)));
    assert_eq!(engine.design().trees().len(), 1);
    assert_eq!(engine.design().trees()[0].name, "Tree 1");
    assert!(matches!(engine.input, InputState::Idle));
}

#[test]
fn small_tree_is_dropped_as_misclick() {
    let mut engine = Engine::new();
    let actions = draw_tree(&mut engine, pt(10.0, 10.0), pt(10.0, 14.0));
    assert!(actions.contains(&Action::DraftDiscarded(DiscardReason::DegenerateTree)));
    assert!(engine.design().trees().is_empty());
}

#[test]
fn tree_commit_does_not_touch_scale() {
    let mut engine = Engine::new();
    draw_tree(&mut engine, pt(10.0, 10.0), pt(60.0, 10.0));
    assert!(engine.design().scale().is_none());
}

// =============================================================
// Moving
// =============================================================

#[test]
fn start_move_switches_to_view_and_move_cursor() {
    let mut engine = Engine::new();
    draw_tree(&mut engine, pt(100.0, 100.0), pt(130.0, 100.0));
    let id = engine.design().trees()[0].id;
    let actions = engine.start_move(EntityRef::Tree(id));
    assert_eq!(actions, vec![Action::SetCursor("move")]);
    assert_eq!(engine.mode(), Mode::View);
    assert_eq!(engine.input.move_target(), Some(EntityRef::Tree(id)));
}

#[test]
fn start_move_unknown_id_is_noop() {
    let mut engine = Engine::new();
    assert!(engine.start_move(EntityRef::Fence(99)).is_empty());
    assert!(matches!(engine.input, InputState::Idle));
}

#[test]
fn moving_tree_keeps_grab_offset() {
    let mut engine = Engine::new();
    draw_tree(&mut engine, pt(100.0, 100.0), pt(130.0, 100.0));
    let id = engine.design().trees()[0].id;
    engine.start_move(EntityRef::Tree(id));

    // Grab 5px right of center: no jump on the first move frame.
    engine.on_pointer_down(pt(105.0, 100.0));
    engine.on_pointer_move(pt(105.0, 100.0));
    assert_eq!(engine.design().tree(id).unwrap().center, pt(100.0, 100.0));

    let actions = engine.on_pointer_move(pt(155.0, 120.0));
    assert!(actions.contains(&Action::TreeUpdated(id)));
    let tree = engine.design().tree(id).unwrap();
    assert_eq!(tree.center, pt(150.0, 120.0));
    assert_eq!(tree.radius, 30.0);

    engine.on_pointer_up();
    assert!(matches!(engine.input, InputState::Idle));
    assert_eq!(engine.design().tree(id).unwrap().center, pt(150.0, 120.0));
}

#[test]
fn moving_fence_translates_both_endpoints_and_keeps_length() {
    let mut engine = Engine::new();
    draw_fence(&mut engine, pt(10.0, 10.0), pt(110.0, 60.0), "40");
    let id = engine.design().fences()[0].id;
    let scale = engine.design().scale();
    engine.start_move(EntityRef::Fence(id));

    engine.on_pointer_down(pt(60.0, 35.0));
    engine.on_pointer_move(pt(70.0, 45.0));
    engine.on_pointer_move(pt(80.0, 15.0));
    engine.on_pointer_up();

    let fence = engine.design().fence(id).unwrap();
    assert_eq!(fence.start, pt(30.0, -10.0));
    assert_eq!(fence.end, pt(130.0, 40.0));
    assert_eq!(fence.length, 40.0);
    assert_eq!(engine.design().scale(), scale);
}

#[test]
fn non_finite_pointer_positions_are_ignored() {
    let mut engine = Engine::new();
    engine.set_mode(Mode::Fence);
    assert!(engine.on_pointer_down(pt(f64::NAN, 0.0)).is_empty());
    assert!(matches!(engine.input, InputState::Idle));

    engine.on_pointer_down(pt(0.0, 0.0));
    engine.on_pointer_move(pt(40.0, 0.0));
    assert!(engine.on_pointer_move(pt(f64::NAN, 0.0)).is_empty());
    assert!(engine.on_pointer_move(pt(0.0, f64::INFINITY)).is_empty());
    engine.on_pointer_up();
    let actions = engine.resolve_length(confirmed("10"));
    assert!(has_action(&actions, |a| matches!(a, Action::FenceCommitted(_))));

    let fence = &engine.design().fences()[0];
    assert_eq!(fence.end, pt(40.0, 0.0));
    let token = crate::codec::encode(engine.design());
    assert_eq!(&crate::codec::decode(&token).unwrap(), engine.design());
}

#[test]
fn non_finite_drag_leaves_entity_in_place() {
    let mut engine = Engine::new();
    draw_tree(&mut engine, pt(100.0, 100.0), pt(130.0, 100.0));
    let id = engine.design().trees()[0].id;
    engine.start_move(EntityRef::Tree(id));
    engine.on_pointer_down(pt(100.0, 100.0));
    assert!(engine.on_pointer_move(pt(f64::NEG_INFINITY, 100.0)).is_empty());
    assert_eq!(engine.design().tree(id).unwrap().center, pt(100.0, 100.0));
}

#[test]
fn exhausted_ids_discard_drafts() {
    let json = format!(
        r#"{{"trees":[{{"id":{},"name":"Tree 1","center":{{"x":0,"y":0}},"radius":20}}]}}"#,
        EntityId::MAX - 1
    );
    let mut engine = Engine::with_design(crate::codec::parse_design(&json).unwrap());

    let actions = draw_tree(&mut engine, pt(100.0, 100.0), pt(130.0, 100.0));
    assert!(actions.contains(&Action::DraftDiscarded(DiscardReason::Rejected)));
    let actions = draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    assert!(actions.contains(&Action::DraftDiscarded(DiscardReason::Rejected)));

    assert_eq!(engine.design().trees().len(), 1);
    assert!(engine.design().fences().is_empty());
    assert!(engine.design().validate().is_ok());
}

#[test]
fn move_before_pointer_down_is_ignored() {
    let mut engine = Engine::new();
    draw_tree(&mut engine, pt(100.0, 100.0), pt(130.0, 100.0));
    let id = engine.design().trees()[0].id;
    engine.start_move(EntityRef::Tree(id));
    assert!(engine.on_pointer_move(pt(300.0, 300.0)).is_empty());
    assert!(engine.on_pointer_up().is_empty());
    assert_eq!(engine.design().tree(id).unwrap().center, pt(100.0, 100.0));
    assert_eq!(engine.input.move_target(), Some(EntityRef::Tree(id)));
}

#[test]
fn moving_wins_over_drawing_mode() {
    let mut engine = Engine::new();
    draw_tree(&mut engine, pt(100.0, 100.0), pt(130.0, 100.0));
    let id = engine.design().trees()[0].id;
    engine.start_move(EntityRef::Tree(id));
    engine.set_mode(Mode::Tree);

    engine.on_pointer_down(pt(100.0, 100.0));
    assert!(engine.draft_tree().is_none());
    engine.on_pointer_move(pt(120.0, 100.0));
    engine.on_pointer_up();

    assert_eq!(engine.design().trees().len(), 1);
    assert_eq!(engine.design().tree(id).unwrap().center, pt(120.0, 100.0));
    assert_eq!(engine.cursor(), "crosshair");
}

#[test]
fn cancel_move_returns_to_idle() {
    let mut engine = Engine::new();
    draw_tree(&mut engine, pt(100.0, 100.0), pt(130.0, 100.0));
    let id = engine.design().trees()[0].id;
    engine.start_move(EntityRef::Tree(id));
    engine.cancel_move();
    assert!(matches!(engine.input, InputState::Idle));
    assert_eq!(engine.cursor(), "default");
}

// =============================================================
// Pointer leave
// =============================================================

#[test]
fn pointer_leave_drops_draft() {
    let mut engine = Engine::new();
    engine.set_mode(Mode::Tree);
    engine.on_pointer_down(pt(10.0, 10.0));
    engine.on_pointer_move(pt(60.0, 10.0));
    let actions = engine.on_pointer_leave();
    assert!(actions.contains(&Action::DraftDiscarded(DiscardReason::PointerLeft)));
    assert!(matches!(engine.input, InputState::Idle));
    // A release after leaving commits nothing.
    engine.on_pointer_up();
    assert!(engine.design().trees().is_empty());
}

#[test]
fn pointer_leave_ends_move_in_place() {
    let mut engine = Engine::new();
    draw_tree(&mut engine, pt(100.0, 100.0), pt(130.0, 100.0));
    let id = engine.design().trees()[0].id;
    engine.start_move(EntityRef::Tree(id));
    engine.on_pointer_down(pt(100.0, 100.0));
    engine.on_pointer_move(pt(140.0, 100.0));
    engine.on_pointer_leave();
    assert!(matches!(engine.input, InputState::Idle));
    assert_eq!(engine.design().tree(id).unwrap().center, pt(140.0, 100.0));
}

// =============================================================
// Side panel edits
// =============================================================

#[test]
fn set_fence_length_refines_scale() {
    let mut engine = Engine::new();
    draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    let id = engine.design().fences()[0].id;
    let actions = engine.set_fence_length(id, 25.0);
    assert!(actions.contains(&Action::FenceUpdated(id)));
    assert!(has_action(&actions, |a| matches!(a, Action::ScaleChanged(Some(_)))));
    assert_eq!(scale_of(&engine), 3.0);
}

#[test]
fn set_fence_length_rejects_bad_value() {
    let mut engine = Engine::new();
    draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    let id = engine.design().fences()[0].id;
    assert!(engine.set_fence_length(id, 0.0).is_empty());
    assert_eq!(engine.design().fences()[0].length, 50.0);
    assert_eq!(scale_of(&engine), 2.0);
}

#[test]
fn rename_and_resize_tree() {
    let mut engine = Engine::new();
    draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    draw_tree(&mut engine, pt(200.0, 200.0), pt(220.0, 200.0));
    let id = engine.design().trees()[0].id;
    engine.rename_tree(id, "Maple");
    engine.set_tree_diameter(id, 20.0);
    let tree = engine.design().tree(id).unwrap();
    assert_eq!(tree.name, "Maple");
    assert_eq!(tree.radius, 20.0);
}

#[test]
fn edits_on_unknown_ids_are_noops() {
    let mut engine = Engine::new();
    draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    let before = engine.design().clone();
    assert!(engine.rename_fence(404, "x").is_empty());
    assert!(engine.delete_fence(404).is_empty());
    assert!(engine.delete_tree(404).is_empty());
    assert!(engine.set_tree_diameter(404, 3.0).is_empty());
    assert_eq!(engine.design(), &before);
}

#[test]
fn deleting_move_target_releases_it() {
    let mut engine = Engine::new();
    draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    let id = engine.design().fences()[0].id;
    engine.start_move(EntityRef::Fence(id));
    let actions = engine.delete_fence(id);
    assert!(actions.contains(&Action::FenceDeleted(id)));
    assert!(matches!(engine.input, InputState::Idle));
    assert!(engine.on_pointer_down(pt(0.0, 0.0)).is_empty());
}

#[test]
fn clear_all_resets_entities_and_scale() {
    let mut engine = Engine::new();
    draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    draw_tree(&mut engine, pt(200.0, 200.0), pt(220.0, 200.0));
    let actions = engine.clear_all();
    assert!(actions.contains(&Action::ScaleChanged(None)));
    assert!(engine.design().fences().is_empty());
    assert!(engine.design().trees().is_empty());
    assert!(engine.design().scale().is_none());
}

// =============================================================
// Session and sharing
// =============================================================

#[test]
fn load_token_round_trips_through_share_url() {
    let mut engine = Engine::new();
    engine.load_map("9 Birch Rd");
    engine.set_notes("mulch in spring");
    draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    draw_tree(&mut engine, pt(200.0, 200.0), pt(220.0, 200.0));

    let url = engine.share_url("https://yard.example/plan");
    let token = crate::codec::token_from_query(&url).unwrap();

    let mut other = Engine::new();
    let actions = other.load_token(&token);
    assert!(actions.contains(&Action::DesignReplaced));
    assert!(!has_action(&actions, |a| matches!(a, Action::Notice(_))));
    assert_eq!(other.design(), engine.design());
}

#[test]
fn bad_token_falls_back_to_empty_design_with_notice() {
    let mut engine = Engine::new();
    draw_fence(&mut engine, pt(0.0, 0.0), pt(100.0, 0.0), "50");
    let actions = engine.load_token("%%% not a token %%%");
    assert!(has_action(&actions, |a| matches!(a, Action::Notice(_))));
    assert_eq!(engine.design(), &Design::default());
}

#[test]
fn load_design_drops_gesture_in_progress() {
    let mut engine = Engine::new();
    engine.set_mode(Mode::Fence);
    engine.on_pointer_down(pt(0.0, 0.0));
    engine.load_design(Design::default());
    assert!(matches!(engine.input, InputState::Idle));
    assert!(engine.draft_fence().is_none());
}

#[test]
fn instructions_follow_state() {
    let mut engine = Engine::new();
    assert!(engine.instructions().starts_with("Select an item"));
    engine.set_mode(Mode::Fence);
    assert!(engine.instructions().contains("fence line"));
    engine.set_mode(Mode::Tree);
    assert!(engine.instructions().contains("tree"));
}
