use std::collections::BTreeMap;

use serde_json::Value;

/// Wrap every string value in double quotes; other values pass through.
///
/// Constraints on String variables need a quoted right-hand side.
pub fn quote_string_constraints(constraints: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    constraints
        .iter()
        .map(|(key, value)| {
            let quoted = match value {
                Value::String(text) => Value::String(format!("\"{text}\"")),
                other => other.clone(),
            };
            (key.clone(), quoted)
        })
        .collect()
}

/// Accept both `ext` and `.ext` for a response type.
pub fn clean_response(response: &str) -> &str {
    response.trim_start_matches('.')
}
