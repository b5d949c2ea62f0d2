//! Display configuration for seat maps.
//!
//! The host merges event-level overrides onto defaults and hands the result
//! to the loader as a `MergedStyle`. Every field has a default so partial
//! JSON from the event settings is always accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Config ───────────────────────────────────────────────────────────────

/// Merged seat-map display options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergedStyle {
    /// Draw a number label on every circle seat. Default: **false**.
    pub show_seat_numbers: bool,

    pub seat_style: SeatStyle,

    pub seat_number_style: SeatNumberStyle,
}

impl Default for MergedStyle {
    fn default() -> Self {
        Self {
            show_seat_numbers: false,
            seat_style: SeatStyle::default(),
            seat_number_style: SeatNumberStyle::default(),
        }
    }
}

impl MergedStyle {
    /// Parse event settings JSON; anything missing falls back to defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Geometry defaults for seats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeatStyle {
    /// Radius used when a seat circle does not carry its own. Default: **10**.
    pub radius: f64,
}

impl Default for SeatStyle {
    fn default() -> Self {
        Self { radius: 10.0 }
    }
}

/// Text styling for seat-number labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeatNumberStyle {
    pub font_size: f64,
    pub fill: String,
    pub font_family: String,
    /// `"bold"`, `"normal"`, or a numeric weight.
    pub font_weight: Value,
}

impl Default for SeatNumberStyle {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            fill: "#000000".into(),
            font_family: "Arial".into(),
            font_weight: Value::String("normal".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_settings_use_defaults() {
        assert_eq!(MergedStyle::from_json("{}").unwrap(), MergedStyle::default());
    }

    #[test]
    fn partial_overrides_merge_onto_defaults() {
        let style = MergedStyle::from_json(
            r#"{ "showSeatNumbers": true, "seatNumberStyle": { "fontSize": 14, "fontWeight": 700 } }"#,
        )
        .unwrap();

        assert!(style.show_seat_numbers);
        assert_eq!(style.seat_style.radius, 10.0);
        assert_eq!(style.seat_number_style.font_size, 14.0);
        assert_eq!(style.seat_number_style.font_weight, Value::from(700));
        assert_eq!(style.seat_number_style.fill, "#000000");
    }
}
