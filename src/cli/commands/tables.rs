use anyhow::Context;
use clap::Subcommand;
use serde_json::Value;

use crate::cli::client::{segment, PortalClient};
use crate::cli::output::{output_lines, output_rows, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum TableCommands {
    #[command(about = "List tables in the exposed schema")]
    List,

    #[command(about = "Show a table's columns")]
    Meta {
        #[arg(help = "Table name")]
        table: String,
    },

    #[command(about = "Page through a table's rows")]
    Rows {
        #[arg(help = "Table name")]
        table: String,
        #[arg(long, help = "Page number, from 1")]
        page: Option<i64>,
        #[arg(long, help = "Rows per page, at most 1000")]
        page_size: Option<i64>,
    },

    #[command(about = "Insert one row from a JSON object")]
    Insert {
        #[arg(help = "Table name")]
        table: String,
        #[arg(help = "Row as a JSON object")]
        json: String,
    },

    #[command(about = "Update rows whose id matches")]
    Update {
        #[arg(help = "Table name")]
        table: String,
        #[arg(help = "Row id")]
        id: String,
        #[arg(help = "Changes as a JSON object")]
        json: String,
    },

    #[command(about = "Delete rows whose id matches")]
    Delete {
        #[arg(help = "Table name")]
        table: String,
        #[arg(help = "Row id")]
        id: String,
    },
}

fn parse_body(raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).context("row must be valid JSON")
}

fn count(body: &Value, key: &str) -> usize {
    body.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

pub async fn handle(cmd: TableCommands, client: &PortalClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TableCommands::List => {
            let body = client.get("/admin/tables", &[]).await?;
            let tables = body
                .get("tables")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).map(str::to_string).collect::<Vec<_>>())
                .unwrap_or_default();
            output_lines(output_format, "tables", tables)
        }
        TableCommands::Meta { table } => {
            let body = client.get(&format!("/admin/tables/{}/meta", segment(&table)), &[]).await?;
            let columns = body
                .get("columns")
                .and_then(Value::as_array)
                .map(|columns| {
                    columns
                        .iter()
                        .map(|c| {
                            format!(
                                "{}\t{}",
                                c.get("column_name").and_then(Value::as_str).unwrap_or("?"),
                                c.get("data_type").and_then(Value::as_str).unwrap_or("?")
                            )
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            output_lines(output_format, "columns", columns)
        }
        TableCommands::Rows { table, page, page_size } => {
            let mut query = Vec::new();
            if let Some(page) = page {
                query.push(("page", page.to_string()));
            }
            if let Some(page_size) = page_size {
                query.push(("pageSize", page_size.to_string()));
            }
            let body = client.get(&format!("/admin/tables/{}", segment(&table)), &query).await?;
            let header = format!(
                "{}: page {} of size {}, {} rows total",
                table,
                body.get("page").unwrap_or(&Value::Null),
                body.get("pageSize").unwrap_or(&Value::Null),
                body.get("total").unwrap_or(&Value::Null)
            );
            match output_format {
                OutputFormat::Json => output_rows(output_format, &header, &body),
                OutputFormat::Text => output_rows(output_format, &header, body.get("rows").unwrap_or(&Value::Null)),
            }
        }
        TableCommands::Insert { table, json } => {
            let body = client
                .post(&format!("/admin/tables/{}", segment(&table)), &parse_body(&json)?)
                .await?;
            let message = format!("Inserted {} row(s) into '{}'", count(&body, "inserted"), table);
            output_success(output_format, &message, Some(body))
        }
        TableCommands::Update { table, id, json } => {
            let path = format!("/admin/tables/{}/rows/{}", segment(&table), segment(&id));
            let body = client.put(&path, &parse_body(&json)?).await?;
            let message = format!("Updated {} row(s) in '{}'", count(&body, "updated"), table);
            output_success(output_format, &message, Some(body))
        }
        TableCommands::Delete { table, id } => {
            let path = format!("/admin/tables/{}/rows/{}", segment(&table), segment(&id));
            let body = client.delete(&path).await?;
            let message = format!("Deleted {} row(s) from '{}'", count(&body, "deleted"), table);
            output_success(output_format, &message, Some(body))
        }
    }
}
