//! Canonical display formatting for raw variable values.

use crate::variables::{RawValue, VariableType};

/// Convert a raw value plus its declared type into its canonical display
/// form: hex for colors, stringified otherwise. Pure; aliases that reach
/// this function fall through to the JSON fallback.
pub fn format_value(value: &RawValue, ty: VariableType) -> String {
    match (value, ty) {
        (RawValue::Color { r, g, b, a }, VariableType::Color) => rgba_to_hex(*r, *g, *b, *a),
        (RawValue::Number { value }, _) => format_float(*value),
        (RawValue::Text { value }, _) => value.clone(),
        (RawValue::Boolean { value }, _) => value.to_string(),
        // Type/value mismatch or an unresolved alias: JSON-stringify as a
        // fallback rather than failing the whole export.
        (other, _) => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Channel floats in [0, 1] scaled to 0-255 and rendered as `#rrggbb`,
/// with a trailing alpha byte appended only when alpha != 1.
pub fn rgba_to_hex(r: f64, g: f64, b: f64, a: f64) -> String {
    let hex = format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b));
    if a == 1.0 {
        hex
    } else {
        format!("{hex}{:02x}", channel(a))
    }
}

fn channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_color_has_no_alpha_suffix() {
        assert_eq!(rgba_to_hex(1.0, 1.0, 1.0, 1.0), "#ffffff");
        assert_eq!(rgba_to_hex(0.0, 0.0, 0.0, 1.0), "#000000");
    }

    #[test]
    fn translucent_color_appends_alpha_byte() {
        assert_eq!(rgba_to_hex(1.0, 0.0, 0.0, 0.5), "#ff000080");
        assert_eq!(rgba_to_hex(0.0, 0.0, 0.0, 0.0), "#00000000");
    }

    #[test]
    fn channels_are_clamped() {
        assert_eq!(rgba_to_hex(1.5, -0.2, 0.0, 1.0), "#ff0000");
    }

    #[test]
    fn color_round_trip_within_one_step() {
        // 1/255 granularity per channel survives formatting.
        for step in [0u8, 1, 17, 128, 254, 255] {
            let channel_in = step as f64 / 255.0;
            let hex = rgba_to_hex(channel_in, channel_in, channel_in, 1.0);
            let parsed = u8::from_str_radix(&hex[1..3], 16).expect("hex channel");
            assert_eq!(parsed, step);
        }
    }

    #[test]
    fn float_drops_trailing_zero() {
        assert_eq!(
            format_value(&RawValue::Number { value: 4.0 }, VariableType::Float),
            "4"
        );
        assert_eq!(
            format_value(&RawValue::Number { value: 2.5 }, VariableType::Float),
            "2.5"
        );
    }

    #[test]
    fn boolean_and_string_coerce_directly() {
        assert_eq!(
            format_value(&RawValue::Boolean { value: true }, VariableType::Boolean),
            "true"
        );
        assert_eq!(
            format_value(&RawValue::Boolean { value: false }, VariableType::Boolean),
            "false"
        );
        assert_eq!(
            format_value(
                &RawValue::Text {
                    value: "Inter".to_string()
                },
                VariableType::String
            ),
            "Inter"
        );
    }

    #[test]
    fn unresolved_alias_falls_back_to_json() {
        let formatted = format_value(
            &RawValue::Alias {
                target_id: "v9".to_string(),
            },
            VariableType::Color,
        );
        assert_eq!(formatted, r#"{"kind":"alias","targetId":"v9"}"#);
    }
}
