use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go into one Field/Value table; every array of
/// objects inside the result (per-date series, events, trades) gets its own
/// table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => println!("{}", field_table(map)),
        },
        Value::Array(arr) => println!("{}", array_table(arr)),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    let scalars: Map<String, Value> = result
        .iter()
        .filter(|(_, v)| !is_object_array(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    println!("{}", field_table(&scalars));

    for (key, val) in result {
        if let Value::Array(rows) = val {
            if is_object_array(val) {
                println!("\n{}:", key);
                println!("{}", array_table(rows));
            }
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(|w| w.as_str()) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn is_object_array(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if arr.first().map_or(false, Value::is_object))
}

fn field_table(map: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    builder.build()
}

/// Headers come from the first row; missing cells are left blank.
fn array_table(arr: &[Value]) -> Table {
    let mut builder = Builder::default();
    match arr.first() {
        Some(Value::Object(first)) => {
            let headers: Vec<String> = first.keys().cloned().collect();
            builder.push_record(headers.clone());
            for item in arr {
                if let Value::Object(map) = item {
                    let row: Vec<String> = headers
                        .iter()
                        .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                        .collect();
                    builder.push_record(row);
                }
            }
        }
        Some(_) => {
            for item in arr {
                builder.push_record([format_value(item)]);
            }
        }
        None => builder.push_record(["(empty)"]),
    }
    builder.build()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
