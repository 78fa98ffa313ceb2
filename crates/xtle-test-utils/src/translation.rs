//! Translation file content in the JSON layout the sync crates read.
//!
//! ```json
//! {"units": [{"id": "hello", "source": "Hello", "target": "Bonjour"}]}
//! ```

use serde_json::{Value, json};

/// Render units as the JSON translation format.
pub fn json_units(units: &[(&str, &str, &str)]) -> String {
    let units: Vec<Value> = units
        .iter()
        .map(|(id, source, target)| json!({ "id": id, "source": source, "target": target }))
        .collect();
    let mut content = serde_json::to_string_pretty(&json!({ "units": units }))
        .unwrap_or_else(|e| panic!("json_units: failed to render units: {e}"));
    content.push('\n');
    content
}

/// Parse JSON translation content back into `(id, source, target)` triples.
///
/// # Panics
/// Panics if the content is not in the expected layout.
pub fn parse_json_units(content: &str) -> Vec<(String, String, String)> {
    let value: Value = serde_json::from_str(content)
        .unwrap_or_else(|e| panic!("parse_json_units: invalid JSON: {e}\n{content}"));
    let Some(units) = value.get("units").and_then(Value::as_array) else {
        return Vec::new();
    };
    units
        .iter()
        .map(|unit| {
            let field = |name: &str| {
                unit.get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            (field("id"), field("source"), field("target"))
        })
        .collect()
}
