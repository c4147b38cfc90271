use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: [] }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Print a collection as JSON, or as a fixed-width table in text mode.
pub fn output_table(
    output_format: &OutputFormat,
    collection_name: &str,
    items: &[Value],
    headers: &[(&str, usize)],
    row: impl Fn(&Value) -> Vec<String>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: items }))?);
        }
        OutputFormat::Text => {
            let line = |cells: Vec<String>| {
                cells
                    .iter()
                    .zip(headers)
                    .map(|(cell, (_, width))| format!("{:<width$}", cell, width = *width))
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            println!("{}", line(headers.iter().map(|(h, _)| h.to_string()).collect()));
            println!("{}", "-".repeat(headers.iter().map(|(_, w)| w + 1).sum()));
            for item in items {
                println!("{}", line(row(item)));
            }
        }
    }
    Ok(())
}

/// String field of a JSON object, or "-".
pub fn field(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}
