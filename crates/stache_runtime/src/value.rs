use serde_json::Value;

/// Truthiness for structural `if`/`unless` conditions: `false`, `0`, `""`,
/// `null` and missing values are falsy; everything else, negative numbers
/// and containers included, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text rendering of a resolved value. `null` renders as the empty string;
/// containers fall back to their JSON form.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// A numeric literal keeps its raw template spelling in the program; parse
/// it back into a JSON number, preferring the integer representation.
pub fn number_from_raw(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    match raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        Some(number) => Value::Number(number),
        None => Value::Null,
    }
}
