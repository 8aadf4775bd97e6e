//! Token value normalization.
//!
//! Stored token values are heterogeneous: a color is usually a string,
//! spacing a number, a shadow a structured object, and imports may carry
//! arbitrary JSON. `TokenValue` is the closed union over those shapes;
//! normalization to CSS text lives here and nowhere else.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed union over the value shapes a token may carry. Serialized
/// untagged, so the wire and storage form is plain JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TokenValue {
    Text(String),
    // serde_json::Number rather than f64 so integers round-trip exactly
    Number(serde_json::Number),
    Structured(serde_json::Map<String, Value>),
    Opaque(Value),
}

impl TokenValue {
    /// The canonical scalar used in CSS emission.
    ///
    /// A structured object carrying a `value` sub-field yields that
    /// sub-field; plain text and numbers pass through; anything else
    /// degrades to its JSON string form. Never fails.
    pub fn css_value(&self) -> String {
        match self {
            TokenValue::Text(s) => s.clone(),
            TokenValue::Number(n) => n
                .as_f64()
                .map(format_number)
                .unwrap_or_else(|| n.to_string()),
            TokenValue::Structured(map) => match map.get("value") {
                Some(inner) => scalar_or_json(inner),
                None => json_text(&Value::Object(map.clone())),
            },
            TokenValue::Opaque(v) => scalar_or_json(v),
        }
    }
}

/// Emit a CSS custom-property declaration for a token:
/// `--{category}-{name with dots dashed, lowercased}: {value};`
pub fn css_variable(category: &str, name: &str, value: &TokenValue) -> String {
    let normalized = name.replace('.', "-").to_lowercase();
    format!("--{category}-{normalized}: {};", value.css_value())
}

fn scalar_or_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| n.to_string()),
        other => json_text(other),
    }
}

fn json_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Whole numbers print without a trailing `.0` so `spacing.md = 16`
/// emits `16`, not `16.0`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(v: serde_json::Value) -> TokenValue {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn scalar_text_passes_through() {
        let v = value(json!("#8cd5b4"));
        assert_eq!(v, TokenValue::Text("#8cd5b4".to_string()));
        assert_eq!(v.css_value(), "#8cd5b4");
    }

    #[test]
    fn whole_numbers_have_no_decimal_point() {
        assert_eq!(value(json!(16)).css_value(), "16");
        assert_eq!(value(json!(1.5)).css_value(), "1.5");
    }

    #[test]
    fn structured_value_subfield_wins() {
        let v = value(json!({"value": "12px", "unit": "px"}));
        assert_eq!(v.css_value(), "12px");

        let v = value(json!({"value": 8}));
        assert_eq!(v.css_value(), "8");
    }

    #[test]
    fn structured_without_value_subfield_serializes_whole_object() {
        let v = value(json!({"x": 0, "y": 4, "blur": 8, "spread": 0, "color": "rgba(0, 0, 0, 0.2)"}));
        let css = v.css_value();
        assert!(css.starts_with('{'));
        assert!(css.contains("\"blur\":8"));
        assert!(css.contains("rgba(0, 0, 0, 0.2)"));
    }

    #[test]
    fn opaque_shapes_degrade_to_json() {
        assert_eq!(value(json!([1, 2, 3])).css_value(), "[1,2,3]");
        assert_eq!(value(json!(true)).css_value(), "true");
        assert_eq!(value(json!(null)).css_value(), "null");
    }

    #[test]
    fn css_variable_normalizes_dotted_names() {
        let v = value(json!("#8cd5b4"));
        assert_eq!(
            css_variable("color", "primary-color", &v),
            "--color-primary-color: #8cd5b4;"
        );
        assert_eq!(
            css_variable("spacing", "Spacing.MD", &v),
            "--spacing-spacing-md: #8cd5b4;"
        );
    }

    #[test]
    fn round_trips_through_json_without_loss() {
        let original = json!({"x": 0, "y": 4, "color": "rgba(0,0,0,0.2)"});
        let v = value(original.clone());
        assert_eq!(serde_json::to_value(&v).unwrap(), original);

        // Integers stay integers in the export form
        assert_eq!(serde_json::to_value(value(json!(16))).unwrap(), json!(16));
    }
}
