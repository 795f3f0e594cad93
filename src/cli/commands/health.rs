use serde_json::Value;

use crate::cli::client::PortalClient;
use crate::cli::output::output_success;
use crate::cli::OutputFormat;

pub async fn handle(client: &PortalClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let body = client.get("/health", &[]).await?;
    let database = body.get("database").and_then(Value::as_str).unwrap_or("unknown");
    output_success(output_format, &format!("Portal is up (database: {})", database), Some(body))
}
