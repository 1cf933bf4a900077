use serde_json::{Map, Value};
use std::io::{self, Write};

/// Write output as CSV to stdout.
///
/// A result carrying a per-date `series` is written as one row per date so
/// it can be loaded straight into a spreadsheet or dataframe. Otherwise the
/// scalar result fields become a two-column field/value CSV.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), value) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_csv<W: Write>(writer: W, value: &Value) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => match result.get("series") {
                Some(Value::Array(rows)) => write_rows(&mut wtr, rows)?,
                _ => write_fields(&mut wtr, result)?,
            },
            _ => write_fields(&mut wtr, map)?,
        },
        Value::Array(rows) => write_rows(&mut wtr, rows)?,
        _ => wtr.write_record([format_csv_value(value)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_fields<W: Write>(
    wtr: &mut csv::Writer<W>,
    map: &Map<String, Value>,
) -> Result<(), csv::Error> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map.iter().filter(|(_, v)| !v.is_array()) {
        wtr.write_record([key.as_str(), &format_csv_value(val)])?;
    }
    Ok(())
}

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> Result<(), csv::Error> {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            wtr.write_record([format_csv_value(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, value).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_series_written_per_date() {
        let value = json!({"result": {
            "beta": "0.9",
            "series": [
                {"date": "2024-01-02", "position": 0, "zscore": null},
                {"date": "2024-01-03", "position": -1, "zscore": "2.1"},
            ]
        }});
        assert_eq!(
            render(&value),
            "date,position,zscore\n2024-01-02,0,\n2024-01-03,-1,2.1\n"
        );
    }

    #[test]
    fn test_summary_written_as_fields() {
        let value = json!({"result": {"trades": 4, "sharpe_ratio": "1.1", "events": []}});
        assert_eq!(render(&value), "field,value\nsharpe_ratio,1.1\ntrades,4\n");
    }
}
