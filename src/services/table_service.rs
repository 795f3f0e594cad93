use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::ServiceError;
use crate::database::{ColumnInfo, ColumnName, JsonRow, RowId, RowRange, TableName, TableStore};

/// Page/pageSize after defaults and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Pagination {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_PAGE_SIZE: i64 = 25;
    pub const MAX_PAGE_SIZE: i64 = 1000;

    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(Self::DEFAULT_PAGE).max(1),
            page_size: page_size
                .unwrap_or(Self::DEFAULT_PAGE_SIZE)
                .clamp(1, Self::MAX_PAGE_SIZE),
        }
    }

    /// Unparseable values fall back to the defaults.
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Self {
        let parse = |v: Option<&str>| v.and_then(|s| s.trim().parse::<i64>().ok());
        Self::new(parse(page), parse(page_size))
    }

    /// `[(page-1)*pageSize, page*pageSize - 1]`
    pub fn range(&self) -> RowRange {
        let from = (self.page - 1).saturating_mul(self.page_size);
        RowRange {
            from,
            to: from.saturating_add(self.page_size - 1),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowPage {
    pub rows: Vec<JsonRow>,
    pub total: i64,
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
}

/// List/insert/update/delete/describe against any table in the exposed schema.
///
/// Every operation validates its table, id and body before touching the
/// store, so malformed requests fail as `InvalidArgument` and only store
/// failures surface as `ServiceError::Store`.
#[derive(Clone)]
pub struct TableService {
    store: Arc<dyn TableStore>,
}

impl TableService {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.store.list_tables().await?)
    }

    pub async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, ServiceError> {
        let table = TableName::parse(table)?;
        Ok(self.store.describe_columns(&table).await?)
    }

    /// Rows are ordered by `id` only when the table has such a column;
    /// otherwise page order is whatever the store returns.
    pub async fn list_rows(&self, table: &str, pagination: Pagination) -> Result<RowPage, ServiceError> {
        let table = TableName::parse(table)?;

        let columns = self.store.describe_columns(&table).await?;
        let has_id = columns.iter().any(|c| c.column_name == "id");

        let rows = self.store.list_rows(&table, pagination.range(), has_id).await?;
        let total = self.store.count_rows(&table).await?;

        tracing::debug!(
            "Listed {} of {} rows from '{}' (page {}, size {}, ordered by id: {})",
            rows.len(),
            total,
            table,
            pagination.page,
            pagination.page_size,
            has_id
        );

        Ok(RowPage {
            rows,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
        })
    }

    pub async fn insert_row(&self, table: &str, body: &Value) -> Result<Vec<JsonRow>, ServiceError> {
        let table = TableName::parse(table)?;
        let row = Self::row_body(body)?;
        Ok(self.store.insert_row(&table, row).await?)
    }

    /// Zero matching rows is a successful no-op, not an error.
    pub async fn update_row(&self, table: &str, id: &str, body: &Value) -> Result<Vec<JsonRow>, ServiceError> {
        let table = TableName::parse(table)?;
        let id = RowId::parse(id)?;
        let changes = Self::row_body(body)?;
        Ok(self.store.update_rows(&table, &id, changes).await?)
    }

    pub async fn delete_row(&self, table: &str, id: &str) -> Result<Vec<JsonRow>, ServiceError> {
        let table = TableName::parse(table)?;
        let id = RowId::parse(id)?;
        Ok(self.store.delete_rows(&table, &id).await?)
    }

    /// A single plain object whose keys are usable column names.
    fn row_body(body: &Value) -> Result<&JsonRow, ServiceError> {
        let row = body
            .as_object()
            .ok_or_else(|| ServiceError::InvalidArgument("Invalid JSON body".to_string()))?;
        for key in row.keys() {
            ColumnName::parse(key)?;
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use serde_json::json;

    fn service(store: &Arc<MemoryStore>) -> TableService {
        TableService::new(store.clone())
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default(), Pagination { page: 1, page_size: 25 });
        assert_eq!(Pagination::new(Some(0), Some(5000)), Pagination { page: 1, page_size: 1000 });
        assert_eq!(Pagination::new(Some(-3), Some(0)), Pagination { page: 1, page_size: 1 });
        assert_eq!(
            Pagination::from_query(Some("3"), Some("abc")),
            Pagination { page: 3, page_size: 25 }
        );
    }

    #[test]
    fn pagination_range_is_inclusive() {
        let range = Pagination::new(Some(3), Some(10)).range();
        assert_eq!((range.from, range.to), (20, 29));
        assert_eq!(range.limit(), 10);
        assert_eq!(range.offset(), 20);

        let first = Pagination::default().range();
        assert_eq!((first.from, first.to), (0, 24));
    }

    #[tokio::test]
    async fn blank_table_is_rejected_before_store() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        for table in ["", "   ", "\t"] {
            assert!(matches!(svc.describe_table(table).await, Err(ServiceError::InvalidArgument(_))));
            assert!(matches!(
                svc.list_rows(table, Pagination::default()).await,
                Err(ServiceError::InvalidArgument(_))
            ));
            assert!(matches!(
                svc.insert_row(table, &json!({"a": 1})).await,
                Err(ServiceError::InvalidArgument(_))
            ));
            assert!(matches!(
                svc.update_row(table, "1", &json!({"a": 1})).await,
                Err(ServiceError::InvalidArgument(_))
            ));
            assert!(matches!(svc.delete_row(table, "1").await, Err(ServiceError::InvalidArgument(_))));
        }
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn insert_rejects_non_object_bodies() {
        let store = Arc::new(MemoryStore::new().with_table("widgets", &["id", "title"]));
        let svc = service(&store);

        for body in [json!([{"title": "X"}]), json!("X"), json!(7), Value::Null] {
            let err = svc.insert_row("widgets", &body).await.unwrap_err();
            assert_eq!(err.to_string(), "Invalid JSON body");
        }
        let err = svc.insert_row("widgets", &json!({"bad key": 1})).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn list_orders_by_id_when_present() {
        let store = Arc::new(MemoryStore::new().with_table("widgets", &["id", "title"]));
        for (id, title) in [(3, "c"), (1, "a"), (2, "b")] {
            store.seed("widgets", json!({"id": id, "title": title}));
        }
        let svc = service(&store);

        let page = svc.list_rows("widgets", Pagination::new(Some(1), Some(2))).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.page_size, 2);
        let ids: Vec<_> = page.rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2)]);

        let page = svc.list_rows("widgets", Pagination::new(Some(2), Some(2))).await.unwrap();
        let ids: Vec<_> = page.rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3)]);
    }

    #[tokio::test]
    async fn list_without_id_column_still_paginates() {
        let store = Arc::new(MemoryStore::new().with_table("tags", &["label"]));
        for label in ["x", "y", "z"] {
            store.seed("tags", json!({ "label": label }));
        }
        let svc = service(&store);

        let page = svc.list_rows("tags", Pagination::new(Some(1), Some(2))).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.rows.len(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_are_idempotent() {
        let store = Arc::new(MemoryStore::new().with_table("widgets", &["id", "title"]));
        store.seed("widgets", json!({"id": 1, "title": "old"}));
        let svc = service(&store);

        let body = json!({"title": "new"});
        let first = svc.update_row("widgets", "1", &body).await.unwrap();
        let second = svc.update_row("widgets", "1", &body).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0]["title"], json!("new"));

        assert!(svc.update_row("widgets", "99", &body).await.unwrap().is_empty());

        assert_eq!(svc.delete_row("widgets", "1").await.unwrap().len(), 1);
        assert!(svc.delete_row("widgets", "1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_id_is_rejected() {
        let store = Arc::new(MemoryStore::new().with_table("widgets", &["id"]));
        let svc = service(&store);
        let err = svc.delete_row("widgets", "  ").await.unwrap_err();
        assert_eq!(err.to_string(), "Missing id");
    }
}
