/// Argument coercion for tool calls
///
/// Tool arguments arrive as a loose JSON object. Each tool pulls out the
/// fields it needs with these helpers, which fail with a typed
/// `ArgumentError` instead of guessing.

use serde_json::{Map, Value};
use thiserror::Error;

/// Argument bag passed to a tool
pub type Arguments = Map<String, Value>;

/// A tool argument was missing or had the wrong shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("{name} is required")]
    Missing { name: String },

    #[error("{name} must be {expected}, got {actual}")]
    WrongType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{name} must be a whole number, got {value}")]
    NotInteger { name: String, value: String },
}

/// JSON type name used in error messages
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Required integer identifier
///
/// JSON numbers are accepted when they have no fractional part, so both
/// `3` and `3.0` become `3`.
pub fn required_id(args: &Arguments, name: &str) -> Result<i64, ArgumentError> {
    let value = args.get(name).ok_or_else(|| ArgumentError::Missing {
        name: name.to_string(),
    })?;

    let number = match value {
        Value::Number(n) => n,
        other => {
            return Err(ArgumentError::WrongType {
                name: name.to_string(),
                expected: "a number",
                actual: type_name(other),
            })
        }
    };

    if let Some(id) = number.as_i64() {
        return Ok(id);
    }

    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => Ok(f as i64),
        _ => Err(ArgumentError::NotInteger {
            name: name.to_string(),
            value: number.to_string(),
        }),
    }
}

/// Required string argument
pub fn required_str<'a>(args: &'a Arguments, name: &str) -> Result<&'a str, ArgumentError> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ArgumentError::WrongType {
            name: name.to_string(),
            expected: "a string",
            actual: type_name(other),
        }),
        None => Err(ArgumentError::Missing {
            name: name.to_string(),
        }),
    }
}

/// Optional object argument; anything that isn't an object becomes empty
pub fn lenient_object(args: &Arguments, name: &str) -> Map<String, Value> {
    match args.get(name) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}
