use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single form field value as captured from user input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

// Manual implementation to handle f64
impl Eq for FieldValue {}

// Manual implementation to handle f64 by hashing its bits
impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Number(n) => n.to_bits().hash(state),
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Text(s) => s.hash(state),
            FieldValue::Null => {}
        }
    }
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric coercion with the same rules a browser applies to `Number(x)`.
    ///
    /// Text is trimmed first; an empty string is `0`, unparsable text is `NaN`.
    pub fn to_number(&self) -> f64 {
        match self {
            FieldValue::Number(n) => *n,
            FieldValue::Bool(true) => 1.0,
            FieldValue::Bool(false) | FieldValue::Null => 0.0,
            FieldValue::Text(s) => parse_numeric_literal(s.trim()),
        }
    }

    /// The string form used by substring comparisons.
    pub fn to_comparable_string(&self) -> String {
        self.to_string()
    }
}

/// Coerces a possibly-missing field to a number. Missing fields are `NaN`.
pub fn coerce_number(value: Option<&FieldValue>) -> f64 {
    value.map_or(f64::NAN, FieldValue::to_number)
}

/// Stringifies a possibly-missing field. Missing fields read as `"undefined"`.
pub fn coerce_string(value: Option<&FieldValue>) -> String {
    value.map_or_else(|| "undefined".to_string(), FieldValue::to_comparable_string)
}

/// Parses already-trimmed text as a numeric literal.
///
/// Accepts decimal literals with an optional sign and exponent, unsigned
/// `0x`/`0o`/`0b` integers, and exactly `Infinity` with an optional sign.
/// Anything else is `NaN`.
fn parse_numeric_literal(text: &str) -> f64 {
    match text {
        "" => return 0.0,
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &text[2..];
        if digits.is_empty() {
            return f64::NAN;
        }
        return digits
            .chars()
            .try_fold(0.0_f64, |acc, c| {
                c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
            })
            .unwrap_or(f64::NAN);
    }

    if is_decimal_literal(text) {
        text.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn is_decimal_literal(text: &str) -> bool {
    const SIGNS: &[char] = &['+', '-'];
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    let unsigned = text.strip_prefix(SIGNS).unwrap_or(text);
    let (mantissa, exponent) = match unsigned.find(&['e', 'E'][..]) {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let mantissa_ok =
        !(int.is_empty() && frac.is_empty()) && all_digits(int) && all_digits(frac);
    let exponent_ok = exponent.is_none_or(|e| {
        let digits = e.strip_prefix(SIGNS).unwrap_or(e);
        !digits.is_empty() && all_digits(digits)
    });
    mantissa_ok && exponent_ok
}

/// Formats a number the way `String(n)` does: plain digits between `1e-6`
/// and `1e21`, exponent form (`1e+21`, `1.5e-7`) outside that range.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if (1e-6..1e21).contains(&n.abs()) {
        n.to_string()
    } else {
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", format_number(*n)),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(FieldValue::Null, FieldValue::Number),
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            // Arrays and objects are compared by their JSON text.
            other => FieldValue::Text(other.to_string()),
        }
    }
}
