use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;

/// Print a success message, merging `data` into the JSON object in JSON mode.
pub fn output_success(output_format: OutputFormat, message: &str, data: Map<String, Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = Map::new();
            response.insert("success".into(), json!(true));
            response.insert("message".into(), json!(message));
            response.extend(data);
            println!("{}", serde_json::to_string_pretty(&Value::Object(response))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}
