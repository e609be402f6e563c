//! Gesture scripts: a line-per-event transcript replayed through the engine.
//!
//! ```text
//! # comments and blank lines are skipped
//! address 12 Elm St
//! mode fence
//! down 0 0
//! move 100 0
//! up
//! length 50
//! pick tree 2
//! rename fence 1 Back fence
//! ```

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use planner::doc::EntityId;
use planner::engine::{Action, Engine};
use planner::geometry::Point;
use planner::input::{EntityRef, Mode, PromptOutcome};

/// A script line that could not be understood.
#[derive(Debug, thiserror::Error)]
#[error("script line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

/// One scripted event.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Address(String),
    Notes(String),
    Mode(Mode),
    Down(Point),
    Move(Point),
    Up,
    Leave,
    /// Answer the length prompt with this text.
    Length(String),
    /// Dismiss the length prompt.
    Cancel,
    Pick(EntityRef),
    Unpick,
    Rename(EntityRef, String),
    FenceLength(EntityId, f64),
    Diameter(EntityId, f64),
    Delete(EntityRef),
    Clear,
}

/// What happened during a replay.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplayLog {
    pub committed: usize,
    pub discarded: usize,
    pub notices: Vec<String>,
}

/// Parse a whole script, numbering lines from 1.
///
/// # Errors
///
/// Returns the first line that is not a valid step.
pub fn parse(text: &str) -> Result<Vec<Step>, ScriptError> {
    let mut steps = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = parse_step(line).map_err(|message| ScriptError { line: index + 1, message })?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_step(line: &str) -> Result<Step, String> {
    let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let step = match keyword {
        "address" => Step::Address(rest.to_owned()),
        "notes" => Step::Notes(rest.replace("\\n", "\n")),
        "mode" => Step::Mode(parse_mode(rest)?),
        "down" => Step::Down(parse_point(rest)?),
        "move" => Step::Move(parse_point(rest)?),
        "up" => Step::Up,
        "leave" => Step::Leave,
        "length" => Step::Length(rest.to_owned()),
        "cancel" => Step::Cancel,
        "pick" => Step::Pick(parse_entity(rest)?.0),
        "unpick" => Step::Unpick,
        "rename" => {
            let (entity, name) = parse_entity(rest)?;
            Step::Rename(entity, name.to_owned())
        }
        "fence-length" => {
            let (id, value) = parse_id_and_number(rest)?;
            Step::FenceLength(id, value)
        }
        "diameter" => {
            let (id, value) = parse_id_and_number(rest)?;
            Step::Diameter(id, value)
        }
        "delete" => Step::Delete(parse_entity(rest)?.0),
        "clear" => Step::Clear,
        other => return Err(format!("unknown step {other:?}")),
    };
    Ok(step)
}

fn parse_mode(text: &str) -> Result<Mode, String> {
    match text {
        "view" => Ok(Mode::View),
        "fence" => Ok(Mode::Fence),
        "tree" => Ok(Mode::Tree),
        other => Err(format!("unknown mode {other:?}")),
    }
}

fn parse_number(text: &str) -> Result<f64, String> {
    text.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| format!("{text:?} is not a finite number"))
}

fn parse_point(text: &str) -> Result<Point, String> {
    let mut parts = text.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected `X Y`, got {text:?}"));
    };
    Ok(Point::new(parse_number(x)?, parse_number(y)?))
}

/// `fence 3 trailing text` → (`Fence(3)`, `"trailing text"`).
fn parse_entity(text: &str) -> Result<(EntityRef, &str), String> {
    let mut parts = text.splitn(3, char::is_whitespace);
    let kind = parts.next().unwrap_or_default();
    let id = parts.next().ok_or_else(|| format!("expected `fence|tree ID`, got {text:?}"))?;
    let id: EntityId = id.parse().map_err(|_| format!("{id:?} is not an id"))?;
    let rest = parts.next().unwrap_or_default().trim();
    match kind {
        "fence" => Ok((EntityRef::Fence(id), rest)),
        "tree" => Ok((EntityRef::Tree(id), rest)),
        other => Err(format!("unknown entity kind {other:?}")),
    }
}

fn parse_id_and_number(text: &str) -> Result<(EntityId, f64), String> {
    let (id, value) = text.split_once(char::is_whitespace).ok_or_else(|| format!("expected `ID VALUE`, got {text:?}"))?;
    let id: EntityId = id.parse().map_err(|_| format!("{id:?} is not an id"))?;
    Ok((id, parse_number(value.trim())?))
}

/// Feed every step to `engine`, tallying what the engine reported.
pub fn replay(engine: &mut Engine, steps: &[Step]) -> ReplayLog {
    let mut log = ReplayLog::default();
    for step in steps {
        let actions = apply(engine, step);
        tracing::debug!(?step, ?actions, "replayed step");
        for action in actions {
            match action {
                Action::FenceCommitted(_) | Action::TreeCommitted(_) => log.committed += 1,
                Action::DraftDiscarded(_) => log.discarded += 1,
                Action::Notice(text) => log.notices.push(text),
                _ => {}
            }
        }
    }
    if engine.draft_fence().is_some() {
        log.notices.push("script ended with a fence still waiting for its length".to_owned());
    }
    log
}

fn apply(engine: &mut Engine, step: &Step) -> Vec<Action> {
    match step {
        Step::Address(address) => {
            if !engine.load_map(address) {
                return vec![Action::Notice(format!("address {address:?} did not load a map"))];
            }
            Vec::new()
        }
        Step::Notes(notes) => {
            engine.set_notes(notes.clone());
            Vec::new()
        }
        Step::Mode(mode) => engine.set_mode(*mode),
        Step::Down(pt) => engine.on_pointer_down(*pt),
        Step::Move(pt) => engine.on_pointer_move(*pt),
        Step::Up => engine.on_pointer_up(),
        Step::Leave => engine.on_pointer_leave(),
        Step::Length(text) => engine.resolve_length(PromptOutcome::Confirmed(text.clone())),
        Step::Cancel => engine.resolve_length(PromptOutcome::Cancelled),
        Step::Pick(target) => engine.start_move(*target),
        Step::Unpick => engine.cancel_move(),
        Step::Rename(EntityRef::Fence(id), name) => engine.rename_fence(*id, name.clone()),
        Step::Rename(EntityRef::Tree(id), name) => engine.rename_tree(*id, name.clone()),
        Step::FenceLength(id, feet) => engine.set_fence_length(*id, *feet),
        Step::Diameter(id, feet) => engine.set_tree_diameter(*id, *feet),
        Step::Delete(EntityRef::Fence(id)) => engine.delete_fence(*id),
        Step::Delete(EntityRef::Tree(id)) => engine.delete_tree(*id),
        Step::Clear => engine.clear_all(),
    }
}
