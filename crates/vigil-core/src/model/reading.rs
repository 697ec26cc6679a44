// ── Sensor readings ──
//
// Telemetry values arrive as numbers or as strings such as "20 C" or
// "21.5°C". Parsing is best-effort: a leading number and a trailing
// unit, or the raw text when that shape is not present.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static READING_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*([-+]?\d+(?:\.\d+)?)\s*([^\d\s.+-].*?)?\s*$").ok());

/// One value from a topic's fragment map, interpreted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Measured { value: f64, unit: Option<String> },
    Text(String),
    Json(Value),
}

impl Reading {
    /// Parse a string reading, falling back to [`Reading::Text`].
    pub fn parse(raw: &str) -> Self {
        let Some(caps) = READING_RE.as_ref().and_then(|re| re.captures(raw)) else {
            return Self::Text(raw.to_owned());
        };
        let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
            return Self::Text(raw.to_owned());
        };
        Self::Measured {
            value,
            unit: caps.get(2).map(|m| m.as_str().to_owned()),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map_or_else(
                || Self::Json(value.clone()),
                |value| Self::Measured { value, unit: None },
            ),
            Value::String(s) => Self::parse(s),
            other => Self::Json(other.clone()),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Measured { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            Self::Measured { unit, .. } => unit.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measured { value, unit: None } => write!(f, "{value}"),
            Self::Measured {
                value,
                unit: Some(unit),
            } => write!(f, "{value} {unit}"),
            Self::Text(s) => f.write_str(s),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn number_with_unit() {
        assert_eq!(
            Reading::parse("20 C"),
            Reading::Measured {
                value: 20.0,
                unit: Some("C".into())
            }
        );
        let r = Reading::parse("21.5°C");
        assert_eq!(r.value(), Some(21.5));
        assert_eq!(r.unit(), Some("°C"));
        assert_eq!(Reading::parse("-3.25 dBm").value(), Some(-3.25));
    }

    #[test]
    fn multi_word_unit_is_kept() {
        assert_eq!(Reading::parse("45 % RH").unit(), Some("% RH"));
    }

    #[test]
    fn bare_number_has_no_unit() {
        let r = Reading::parse(" 42 ");
        assert_eq!(r.value(), Some(42.0));
        assert_eq!(r.unit(), None);
    }

    #[test]
    fn unparseable_falls_back_to_text() {
        assert_eq!(Reading::parse("open"), Reading::Text("open".into()));
        assert_eq!(Reading::parse("1.2.3"), Reading::Text("1.2.3".into()));
        assert_eq!(Reading::parse(""), Reading::Text(String::new()));
    }

    #[test]
    fn from_json_values() {
        assert_eq!(Reading::from_value(&json!(5)).value(), Some(5.0));
        assert_eq!(Reading::from_value(&json!("20 C")).unit(), Some("C"));
        assert_eq!(
            Reading::from_value(&json!({"x": 1})),
            Reading::Json(json!({"x": 1}))
        );
    }

    #[test]
    fn display_forms() {
        assert_eq!(Reading::parse("20 C").to_string(), "20 C");
        assert_eq!(Reading::from_value(&json!(7)).to_string(), "7");
        assert_eq!(Reading::parse("armed").to_string(), "armed");
    }
}
