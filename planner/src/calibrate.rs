//! Scale calibration: deriving pixels-per-foot from measured fences.
//!
//! Every committed fence, and every later edit of a fence's length, is one
//! observation of the ratio between its drawn pixel length and its real
//! length. The design keeps a single global ratio that moves halfway toward
//! each new observation.

#[cfg(test)]
#[path = "calibrate_test.rs"]
mod calibrate_test;

use std::fmt;

use crate::doc::Scale;
use crate::error::PlannerError;

/// Check that a length in feet is usable as a measurement.
///
/// # Errors
///
/// [`PlannerError::InvalidCalibrationInput`] unless positive and finite.
pub fn validate_length(feet: f64) -> Result<f64, PlannerError> {
    if feet.is_finite() && feet > 0.0 {
        Ok(feet)
    } else {
        Err(PlannerError::InvalidCalibrationInput(format!("{feet} is not a positive length")))
    }
}

/// Parse the text a user typed into the length prompt.
///
/// # Errors
///
/// [`PlannerError::InvalidCalibrationInput`] for empty, non-numeric, or
/// non-positive input.
pub fn parse_length(text: &str) -> Result<f64, PlannerError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::InvalidCalibrationInput("no length entered".into()));
    }
    let feet: f64 = trimmed
        .parse()
        .map_err(|_| PlannerError::InvalidCalibrationInput(format!("{trimmed:?} is not a number")))?;
    validate_length(feet)
}

/// Pixels per foot implied by a fence drawn `pixels` long and measured `feet` long.
///
/// `None` when the fence has no drawn extent or the inputs are unusable.
#[must_use]
pub fn implied_ratio(pixels: f64, feet: f64) -> Option<Scale> {
    if feet <= 0.0 {
        return None;
    }
    Scale::new(pixels / feet)
}

/// Fold a new observation into the current scale.
///
/// The first observation becomes the scale. After that the result is the mean
/// of exactly two terms, the current scale and the observation.
#[must_use]
pub fn fold(current: Option<Scale>, observed: Scale) -> Scale {
    match current {
        None => observed,
        Some(scale) => {
            let mean = (scale.pixels_per_foot() + observed.pixels_per_foot()) / 2.0;
            Scale::new(mean).unwrap_or(observed)
        }
    }
}

/// Feet represented by one pixel, as shown in the scale label.
#[must_use]
pub fn feet_per_pixel(scale: Scale) -> f64 {
    1.0 / scale.pixels_per_foot()
}

/// Canopy radius in pixels for a diameter given in feet.
///
/// # Errors
///
/// [`PlannerError::InvalidCalibrationInput`] when the design is uncalibrated
/// or the diameter is not a positive finite number.
pub fn diameter_to_radius(diameter_feet: f64, scale: Option<Scale>) -> Result<f64, PlannerError> {
    let scale =
        scale.ok_or_else(|| PlannerError::InvalidCalibrationInput("no scale to convert feet to pixels".into()))?;
    let diameter = validate_length(diameter_feet)?;
    Ok(diameter * scale.pixels_per_foot() / 2.0)
}

/// A pixel magnitude converted to real-world units where possible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Calibrated value in feet.
    Feet(f64),
    /// Raw pixel value; no scale exists yet.
    Pixels(f64),
}

impl Measurement {
    #[must_use]
    pub fn is_calibrated(self) -> bool {
        matches!(self, Self::Feet(_))
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feet(feet) => write!(f, "{feet:.1} ft"),
            Self::Pixels(px) => write!(f, "{px:.0} px (uncalibrated)"),
        }
    }
}

/// Convert a pixel magnitude using `scale`, falling back to raw pixels.
#[must_use]
pub fn measure(pixels: f64, scale: Option<Scale>) -> Measurement {
    match scale {
        Some(scale) => Measurement::Feet(pixels / scale.pixels_per_foot()),
        None => Measurement::Pixels(pixels),
    }
}
