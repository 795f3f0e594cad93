use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Print a success message, or the message merged into `data` as JSON.
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "ok": true, "message": message });
            if let (Some(target), Some(Value::Object(fields))) = (response.as_object_mut(), data) {
                for (key, value) in fields {
                    if key != "ok" {
                        target.insert(key, value);
                    }
                }
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Rows as pretty JSON in both formats; text mode adds a header line.
pub fn output_rows(output_format: OutputFormat, header: &str, rows: &Value) -> anyhow::Result<()> {
    if output_format == OutputFormat::Text {
        println!("{}", header);
    }
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

pub fn output_lines<I, S>(output_format: OutputFormat, key: &str, lines: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ key: lines }))?),
        OutputFormat::Text if lines.is_empty() => println!("(no {})", key),
        OutputFormat::Text => {
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
