//! Display formatting for scores, scenario ids and hazard types.
//! All functions here are total: every input has an output.

use serde::{Deserialize, Serialize};

/// How integer risk scores appear in decoded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRendering {
    /// Keep the engine's integer category.
    Raw,
    /// Category label, with `0` shown as `"No data"`.
    LabelWithNoData,
    /// Category label, with `0` left absent.
    #[default]
    LabelOrAbsent,
}

/// Map a score category (0-4) to its label. Unknown categories have no label.
pub fn score_to_label(score: i64, rendering: ScoreRendering) -> Option<&'static str> {
    match score {
        0 if rendering == ScoreRendering::LabelWithNoData => Some("No data"),
        1 => Some("Low"),
        2 => Some("Medium"),
        3 => Some("High"),
        4 => Some("Red flag"),
        _ => None,
    }
}

const SSP_PREFIX: &str = "ssp";
const SSP_COMPACT_LEN: usize = 6;

/// `"ssp126"` → `"SSP1-2.6"`. Anything else is returned unchanged, including
/// `ssp`-prefixed ids that are not exactly three ASCII digits after the prefix.
pub fn format_scenario_id(id: &str) -> String {
    match split_ssp(id) {
        Some([a, b, c]) => format!("SSP{a}-{b}.{c}"),
        None => id.to_string(),
    }
}

/// True when `id` carries the `ssp` prefix but not the compact `sspXYZ` form.
pub fn is_malformed_ssp(id: &str) -> bool {
    id.starts_with(SSP_PREFIX) && split_ssp(id).is_none()
}

fn split_ssp(id: &str) -> Option<[char; 3]> {
    let digits = id.strip_prefix(SSP_PREFIX)?;
    if id.len() != SSP_COMPACT_LEN || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut chars = digits.chars();
    Some([chars.next()?, chars.next()?, chars.next()?])
}

/// Split a PascalCase identifier at each uppercase letter:
/// `"ChronicHeat"` → `"Chronic Heat"`.
pub fn format_hazard_type(id: &str) -> String {
    let mut out = String::with_capacity(id.len() + 4);
    for ch in id.chars() {
        if ch.is_uppercase() && !out.is_empty() {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}
