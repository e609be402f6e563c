//! Error taxonomy for the planner.
//!
//! None of these are fatal. The engine turns each one into a no-op or a reset
//! to a safe default; the variants exist so callers and logs can say why.

use crate::doc::EntityId;

/// Error returned by fallible planner operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlannerError {
    /// A fence length (or tree diameter) entry was not a positive finite number,
    /// or no calibration exists to convert it.
    #[error("invalid calibration input: {0}")]
    InvalidCalibrationInput(String),
    /// A draft tree was released with a canopy too small to keep.
    #[error("tree radius {radius:.2}px is below the commit threshold")]
    DegenerateTree { radius: f64 },
    /// The share token is not base64-encoded JSON text.
    #[error("malformed share token: {0}")]
    MalformedToken(String),
    /// The share token decoded to JSON that is not a valid design.
    #[error("invalid design payload: {0}")]
    InvalidPayload(String),
    /// An update, delete, or move referenced an id the design does not hold.
    #[error("unknown entity id {0}")]
    UnknownEntityId(EntityId),
    /// A point landed on a NaN or infinite coordinate.
    #[error("non-finite point ({x}, {y})")]
    NonFinitePoint { x: f64, y: f64 },
    /// The id counter has nothing left to hand out.
    #[error("entity ids exhausted")]
    IdsExhausted,
}
