//! Share token codec.
//!
//! A token is the design serialized as JSON and then base64-encoded with the
//! URL-safe alphabet and no padding, so it can sit in a query string without
//! escaping. Older tokens used the standard alphabet with padding; `decode`
//! accepts those too.

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

use crate::consts::SHARE_QUERY_PARAM;
use crate::doc::Design;
use crate::error::PlannerError;

/// Encode a design into a share token.
///
/// Serializing a `Design` cannot fail (every field is plain data with string
/// keys), so an empty object is only a theoretical fallback.
#[must_use]
pub fn encode(design: &Design) -> String {
    let json = serde_json::to_vec(design).unwrap_or_else(|_| b"{}".to_vec());
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode a share token into a design.
///
/// # Errors
///
/// Returns [`PlannerError::MalformedToken`] when the token is not base64 text
/// holding UTF-8 JSON, and [`PlannerError::InvalidPayload`] when the JSON is
/// not a well-formed design.
pub fn decode(token: &str) -> Result<Design, PlannerError> {
    let bytes = decode_base64(token.trim())?;
    let text = std::str::from_utf8(&bytes).map_err(|e| PlannerError::MalformedToken(e.to_string()))?;
    parse_design(text)
}

/// Parse a design from its JSON form (the token payload before base64).
///
/// # Errors
///
/// [`PlannerError::MalformedToken`] for text that is not JSON,
/// [`PlannerError::InvalidPayload`] for JSON that is not a valid design.
pub fn parse_design(json: &str) -> Result<Design, PlannerError> {
    let mut value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| PlannerError::MalformedToken(format!("not JSON: {e}")))?;
    let Some(object) = value.as_object_mut() else {
        return Err(PlannerError::InvalidPayload("design must be a JSON object".into()));
    };
    repair_legacy(object);
    let mut design: Design =
        serde_json::from_value(value).map_err(|e| PlannerError::InvalidPayload(e.to_string()))?;
    design.validate()?;
    design.reserve_existing_ids();
    Ok(design)
}

/// Pretty-printed JSON form of a design, for inspection and hand editing.
#[must_use]
pub fn design_to_json(design: &Design) -> String {
    serde_json::to_string_pretty(design).unwrap_or_else(|_| "{}".to_owned())
}

/// Decode a token, falling back to the empty design on failure.
///
/// The error is handed back so the host can show a non-fatal notice.
#[must_use]
pub fn decode_or_default(token: &str) -> (Design, Option<PlannerError>) {
    match decode(token) {
        Ok(design) => (design, None),
        Err(err) => {
            tracing::warn!(%err, "share token rejected; starting with an empty design");
            (Design::default(), Some(err))
        }
    }
}

/// Full share URL for `design`: `base` with the token in the `data` parameter.
#[must_use]
pub fn share_url(base: &str, design: &Design) -> String {
    let token = encode(design);
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{SHARE_QUERY_PARAM}={}", urlencoding::encode(&token))
}

/// Extract the share token from a URL or query string, if present.
///
/// Accepts a full URL (`https://host/path?data=...`), a bare query
/// (`?data=...` or `data=...`), and ignores any `#fragment`.
#[must_use]
pub fn token_from_query(input: &str) -> Option<String> {
    let query = input.split_once('?').map_or(input, |(_, q)| q);
    let query = query.split_once('#').map_or(query, |(q, _)| q);
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != SHARE_QUERY_PARAM || value.is_empty() {
            return None;
        }
        match urlencoding::decode(value) {
            Ok(decoded) => Some(decoded.into_owned()),
            Err(err) => {
                tracing::warn!(%err, "share parameter is not valid percent-encoding");
                Some(value.to_owned())
            }
        }
    })
}

/// Design described by a page URL or query string.
///
/// No `data` parameter means a fresh empty design; a bad token also yields an
/// empty design, with the error returned for display.
#[must_use]
pub fn design_from_query(input: &str) -> (Design, Option<PlannerError>) {
    match token_from_query(input) {
        Some(token) => decode_or_default(&token),
        None => (Design::default(), None),
    }
}

/// Older planners wrote `0` or `null` for an uncalibrated scale, and `null`
/// for a fence length or tree radius computed from a blank side-panel entry.
/// The scale is dropped and those entities are skipped; everything else in
/// the design survives.
fn repair_legacy(object: &mut serde_json::Map<String, serde_json::Value>) {
    let unset = |v: &serde_json::Value| v.is_null() || v.as_f64().is_some_and(|n| n.abs() < f64::MIN_POSITIVE);
    if object.get("scale").is_some_and(unset) {
        tracing::warn!("unset scale in payload; design loads uncalibrated");
        object.remove("scale");
    }
    skip_null_field(object, "fenceLines", "length");
    skip_null_field(object, "trees", "radius");
}

fn skip_null_field(object: &mut serde_json::Map<String, serde_json::Value>, list: &str, field: &str) {
    let Some(serde_json::Value::Array(items)) = object.get_mut(list) else {
        return;
    };
    let before = items.len();
    items.retain(|item| !item.get(field).is_some_and(serde_json::Value::is_null));
    let skipped = before - items.len();
    if skipped > 0 {
        tracing::warn!(list, field, skipped, "entities with a null measurement skipped");
    }
}

fn decode_base64(token: &str) -> Result<Vec<u8>, PlannerError> {
    if token.is_empty() {
        return Err(PlannerError::MalformedToken("empty token".into()));
    }
    URL_SAFE_NO_PAD.decode(token).or_else(|url_err| {
        // Legacy tokens: standard alphabet, padded. A `+` that passed through a
        // query string unescaped arrives as a space.
        let legacy = token.replace(' ', "+");
        STANDARD.decode(legacy).map_err(|_| PlannerError::MalformedToken(url_err.to_string()))
    })
}
