//! Store seams used by the services. `PgStore` implements them against
//! Postgres, `testing::MemoryStore` in memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::identifier::{RowId, TableName};
use super::models::{Persona, Profile, ProfileUpdate};

/// A row as returned to admin callers: column name to JSON value.
pub type JsonRow = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("{0}")]
    Query(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Column name and declared data type, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Inclusive zero-based row range, `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub from: i64,
    pub to: i64,
}

impl RowRange {
    pub fn limit(&self) -> i64 {
        self.to - self.from + 1
    }

    pub fn offset(&self) -> i64 {
        self.from
    }
}

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Connectivity check backing `/health`.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Table names in the exposed schema.
    async fn list_tables(&self) -> Result<Vec<String>, StoreError>;

    /// Columns of `table` in ordinal order. Empty when nothing is reported.
    async fn describe_columns(&self, table: &TableName) -> Result<Vec<ColumnInfo>, StoreError>;

    /// One page of rows, ascending by `id` when `order_by_id` is set.
    async fn list_rows(
        &self,
        table: &TableName,
        range: RowRange,
        order_by_id: bool,
    ) -> Result<Vec<JsonRow>, StoreError>;

    async fn count_rows(&self, table: &TableName) -> Result<i64, StoreError>;

    async fn insert_row(&self, table: &TableName, row: &JsonRow) -> Result<Vec<JsonRow>, StoreError>;

    /// Rows whose `id` equals `id`, after applying `changes`. An empty
    /// change set returns the matching rows untouched.
    async fn update_rows(
        &self,
        table: &TableName,
        id: &RowId,
        changes: &JsonRow,
    ) -> Result<Vec<JsonRow>, StoreError>;

    async fn delete_rows(&self, table: &TableName, id: &RowId) -> Result<Vec<JsonRow>, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    async fn persona_by_id(&self, persona_id: &str) -> Result<Option<Persona>, StoreError>;

    /// All personas ordered by code.
    async fn list_personas(&self) -> Result<Vec<Persona>, StoreError>;

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), StoreError>;
}
