//! Drawing and calibration engine for the yard planner.
//!
//! The crate owns the full lifecycle of a yard design: translating raw pointer
//! events into fence and tree edits, keeping the pixel-to-foot calibration in
//! step with every measured fence, and encoding the whole design into a token
//! that fits in a share URL. The host (browser shell or CLI) is responsible
//! only for wiring events to the engine, answering the length prompt, and
//! handing a drawing surface to [`render::draw`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Interaction state machine and the owned application state |
//! | [`doc`] | Design aggregate, fence/tree types, drafts, and pure updaters |
//! | [`calibrate`] | Pixels-per-foot scale derivation and measurements |
//! | [`input`] | Modes, entity references, and gesture states |
//! | [`codec`] | Share token encoding, decoding, and URL helpers |
//! | [`geometry`] | Pixel-space points and distances |
//! | [`render`] | Drawing surface contract and scene projection |
//! | [`error`] | Error taxonomy shared by every module |
//! | [`consts`] | Shared numeric constants and palette |

pub mod calibrate;
pub mod codec;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod input;
pub mod render;
#[cfg(feature = "web")]
pub mod web;

pub use error::PlannerError;
