// handlers/elevated/tables.rs - generic table administration

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::{ColumnInfo, JsonRow, RowId, TableName};
use crate::middleware::{AdminCaller, ApiResponse, ApiResult};
use crate::services::table_service::{Pagination, RowPage};
use crate::state::AppState;

#[derive(Serialize)]
pub struct TableList {
    pub tables: Vec<String>,
}

#[derive(Serialize)]
pub struct TableMeta {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Serialize)]
pub struct TablePage {
    pub table: String,
    #[serde(flatten)]
    pub page: RowPage,
}

#[derive(Serialize)]
pub struct Inserted {
    pub table: String,
    pub inserted: Vec<JsonRow>,
}

#[derive(Serialize)]
pub struct Updated {
    pub table: String,
    pub id: String,
    pub updated: Vec<JsonRow>,
}

#[derive(Serialize)]
pub struct Deleted {
    pub table: String,
    pub id: String,
    pub deleted: Vec<JsonRow>,
}

/// Raw strings so a bad number falls back to the default instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

/// GET /admin/tables
pub async fn list(State(state): State<AppState>) -> ApiResult<TableList> {
    let tables = state.table_service().list_tables().await?;
    Ok(ApiResponse::success(TableList { tables }))
}

/// GET /admin/tables/:table/meta
pub async fn get_meta(State(state): State<AppState>, Path(table): Path<String>) -> ApiResult<TableMeta> {
    let table = TableName::parse(&table)?;
    let columns = state.table_service().describe_table(table.as_str()).await?;
    Ok(ApiResponse::success(TableMeta {
        table: table.to_string(),
        columns,
    }))
}

/// GET /admin/tables/:table?page&pageSize
pub async fn get_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<TablePage> {
    let table = TableName::parse(&table)?;
    let pagination = Pagination::from_query(query.page.as_deref(), query.page_size.as_deref());
    let page = state.table_service().list_rows(table.as_str(), pagination).await?;
    Ok(ApiResponse::success(TablePage {
        table: table.to_string(),
        page,
    }))
}

/// POST /admin/tables/:table - insert one row
pub async fn post_row(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Extension(caller): Extension<AdminCaller>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Inserted> {
    let Json(body) = payload?;
    let table = TableName::parse(&table)?;
    let inserted = state.table_service().insert_row(table.as_str(), &body).await?;
    tracing::info!("{} inserted {} row(s) into '{}'", caller.caller_id, inserted.len(), table);
    Ok(ApiResponse::success(Inserted {
        table: table.to_string(),
        inserted,
    }))
}

/// PUT /admin/tables/:table/rows/:id
pub async fn put_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    Extension(caller): Extension<AdminCaller>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Updated> {
    let Json(body) = payload?;
    let (table, id) = (TableName::parse(&table)?, RowId::parse(&id)?);
    let updated = state.table_service().update_row(table.as_str(), id.as_str(), &body).await?;
    tracing::info!("{} updated {} row(s) in '{}'", caller.caller_id, updated.len(), table);
    Ok(ApiResponse::success(Updated {
        table: table.to_string(),
        id: id.to_string(),
        updated,
    }))
}

/// DELETE /admin/tables/:table/rows/:id
pub async fn delete_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    Extension(caller): Extension<AdminCaller>,
) -> ApiResult<Deleted> {
    let (table, id) = (TableName::parse(&table)?, RowId::parse(&id)?);
    let deleted = state.table_service().delete_row(table.as_str(), id.as_str()).await?;
    tracing::info!("{} deleted {} row(s) from '{}'", caller.caller_id, deleted.len(), table);
    Ok(ApiResponse::success(Deleted {
        table: table.to_string(),
        id: id.to_string(),
        deleted,
    }))
}
