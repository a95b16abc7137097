use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of a survey column. Tokens that parse as `f64` become
/// numbers; anything else (dummies such as `*`, timestamps) is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn parse(token: &str) -> Self {
        match token.parse::<f64>() {
            Ok(number) => Value::Number(number),
            Err(_) => Value::Text(token.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Number(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(number) => write!(f, "{}", number),
            Value::Text(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_tokens_parse_as_numbers() {
        assert_eq!(Value::parse("1600.5"), Value::Number(1600.5));
        assert_eq!(Value::parse("-1.2e-3"), Value::Number(-1.2e-3));
    }

    #[test]
    fn dummies_are_kept_as_text() {
        let value = Value::parse("*");
        assert_eq!(value, Value::Text("*".into()));
        assert_eq!(value.as_f64(), None);
        assert_eq!(value.to_string(), "*");
    }
}
