use serde_json::Value;

/// Headline fields, in the order they are printed when present.
const HEADLINE_KEYS: [&str; 4] = ["sharpe_ratio", "cumulative_return", "trades", "beta"];

/// Print only the headline numbers of the result, one `key=value` pair per
/// field on a single line. Falls back to the first field of the result.
pub fn print_minimal(value: &Value) {
    println!("{}", render_minimal(value));
}

fn render_minimal(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result_obj else {
        return format_minimal(result_obj);
    };

    let headline: Vec<String> = HEADLINE_KEYS
        .iter()
        .filter_map(|key| {
            map.get(*key)
                .filter(|v| !v.is_null())
                .map(|v| format!("{}={}", key, format_minimal(v)))
        })
        .collect();
    if !headline.is_empty() {
        return headline.join(" ");
    }

    map.iter()
        .next()
        .map(|(key, val)| format!("{}={}", key, format_minimal(val)))
        .unwrap_or_default()
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
