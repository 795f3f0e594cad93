//! Postgres implementation of the store seams.
//!
//! Rows travel as JSON: reads go through `row_to_json`, writes through
//! `jsonb_populate_record` so the database coerces values to column types.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};

use super::identifier::{quote_identifier, ColumnName, RowId, TableName};
use super::models::{Persona, Profile, ProfileUpdate};
use super::store::{ColumnInfo, JsonRow, ProfileStore, RowRange, StoreError, TableStore};

pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    /// `schema` must already be a valid identifier (see `AppConfig::validate`).
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    fn qualified(&self, table: &TableName) -> String {
        format!("{}.{}", quote_identifier(&self.schema), table.quoted())
    }

    /// `"col_a", "col_b"` and the same list prefixed with `alias.`.
    fn column_lists(row: &JsonRow, alias: &str) -> Result<(Vec<String>, Vec<String>), StoreError> {
        let mut plain = Vec::with_capacity(row.len());
        let mut aliased = Vec::with_capacity(row.len());
        for key in row.keys() {
            let column = ColumnName::parse(key).map_err(|e| StoreError::Query(e.to_string()))?;
            aliased.push(format!("{}.{}", alias, column.quoted()));
            plain.push(column.quoted());
        }
        Ok((plain, aliased))
    }

    async fn fetch_json_rows(&self, sql: &str, binds: Binds<'_>) -> Result<Vec<JsonRow>, StoreError> {
        let mut q = sqlx::query(sql);
        if let Some(body) = binds.body {
            q = q.bind(Value::Object(body.clone()));
        }
        if let Some(id) = binds.id {
            q = q.bind(id.as_str());
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(row_object).collect()
    }
}

#[derive(Default, Clone, Copy)]
struct Binds<'a> {
    body: Option<&'a JsonRow>,
    id: Option<&'a RowId>,
}

/// Every relation in the schema, views included.
const LIST_TABLES_SQL: &str = "SELECT table_name::text FROM information_schema.tables
     WHERE table_schema = $1
     ORDER BY table_name";

fn row_object(row: &PgRow) -> Result<JsonRow, StoreError> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Query(format!("unexpected row format: {}", other))),
    }
}

#[async_trait]
impl TableStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        super::manager::DatabaseManager::health_check(&self.pool).await
    }

    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(LIST_TABLES_SQL)
            .bind(&self.schema)
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    async fn describe_columns(&self, table: &TableName) -> Result<Vec<ColumnInfo>, StoreError> {
        let rows = sqlx::query(
            "SELECT column_name::text AS column_name, data_type::text AS data_type
             FROM information_schema.columns
             WHERE table_schema = $1 AND table_name = $2
             ORDER BY ordinal_position",
        )
        .bind(&self.schema)
        .bind(table.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(ColumnInfo {
                    column_name: r.try_get("column_name")?,
                    data_type: r.try_get("data_type")?,
                })
            })
            .collect()
    }

    async fn list_rows(
        &self,
        table: &TableName,
        range: RowRange,
        order_by_id: bool,
    ) -> Result<Vec<JsonRow>, StoreError> {
        let order = if order_by_id { " ORDER BY t.\"id\" ASC" } else { "" };
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM {} AS t{} LIMIT $1 OFFSET $2",
            self.qualified(table),
            order
        );
        let rows = sqlx::query(&sql)
            .bind(range.limit())
            .bind(range.offset())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_object).collect()
    }

    async fn count_rows(&self, table: &TableName) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.qualified(table));
        let total = sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn insert_row(&self, table: &TableName, row: &JsonRow) -> Result<Vec<JsonRow>, StoreError> {
        let target = self.qualified(table);
        let (columns, sources) = Self::column_lists(row, "_body")?;

        let (sql, binds) = if columns.is_empty() {
            (
                format!(
                    "WITH affected AS (INSERT INTO {} DEFAULT VALUES RETURNING *)
                     SELECT row_to_json(affected) AS row FROM affected",
                    target
                ),
                Binds::default(),
            )
        } else {
            (
                format!(
                    "WITH affected AS (
                        INSERT INTO {target} ({columns})
                        SELECT {sources} FROM jsonb_populate_record(NULL::{target}, $1::jsonb) AS _body
                        RETURNING *
                     )
                     SELECT row_to_json(affected) AS row FROM affected",
                    target = target,
                    columns = columns.join(", "),
                    sources = sources.join(", "),
                ),
                Binds { body: Some(row), id: None },
            )
        };

        self.fetch_json_rows(&sql, binds).await
    }

    async fn update_rows(
        &self,
        table: &TableName,
        id: &RowId,
        changes: &JsonRow,
    ) -> Result<Vec<JsonRow>, StoreError> {
        let target = self.qualified(table);
        let (columns, sources) = Self::column_lists(changes, "_body")?;

        if columns.is_empty() {
            let sql = format!(
                "SELECT row_to_json(t) AS row FROM {} AS t WHERE t.\"id\"::text = $1",
                target
            );
            return self.fetch_json_rows(&sql, Binds { body: None, id: Some(id) }).await;
        }

        let assignments: Vec<String> = columns
            .iter()
            .zip(sources.iter())
            .map(|(column, source)| format!("{} = {}", column, source))
            .collect();

        let sql = format!(
            "WITH affected AS (
                UPDATE {target} AS t SET {assignments}
                FROM jsonb_populate_record(NULL::{target}, $1::jsonb) AS _body
                WHERE t.\"id\"::text = $2
                RETURNING t.*
             )
             SELECT row_to_json(affected) AS row FROM affected",
            target = target,
            assignments = assignments.join(", "),
        );

        self.fetch_json_rows(&sql, Binds { body: Some(changes), id: Some(id) }).await
    }

    async fn delete_rows(&self, table: &TableName, id: &RowId) -> Result<Vec<JsonRow>, StoreError> {
        let sql = format!(
            "WITH affected AS (DELETE FROM {} AS t WHERE t.\"id\"::text = $1 RETURNING t.*)
             SELECT row_to_json(affected) AS row FROM affected",
            self.qualified(table)
        );
        self.fetch_json_rows(&sql, Binds { body: None, id: Some(id) }).await
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id::text AS id, persona_id::text AS persona_id,
                    COALESCE(is_admin, false) AS is_admin, language_code::text AS language_code
             FROM profiles
             WHERE id::text = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn persona_by_id(&self, persona_id: &str) -> Result<Option<Persona>, StoreError> {
        let persona = sqlx::query_as::<_, Persona>(
            "SELECT id::text AS id, code::text AS code, name_it::text AS name_it,
                    name_en::text AS name_en, default_landing_path::text AS default_landing_path
             FROM personas
             WHERE id::text = $1",
        )
        .bind(persona_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(persona)
    }

    async fn list_personas(&self) -> Result<Vec<Persona>, StoreError> {
        let personas = sqlx::query_as::<_, Persona>(
            "SELECT id::text AS id, code::text AS code, name_it::text AS name_it,
                    name_en::text AS name_en, default_landing_path::text AS default_landing_path
             FROM personas
             ORDER BY code ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(personas)
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            return Ok(());
        }

        // persona_id is cast through the column's own type so uuid and integer keys both work
        let mut assignments = Vec::new();
        let mut changes = JsonRow::new();
        if let Some(language_code) = &update.language_code {
            assignments.push("language_code = _body.language_code");
            changes.insert("language_code".to_string(), Value::String(language_code.clone()));
        }
        if let Some(persona_id) = &update.persona_id {
            assignments.push("persona_id = _body.persona_id");
            changes.insert("persona_id".to_string(), Value::String(persona_id.clone()));
        }

        let sql = format!(
            "UPDATE profiles SET {}
             FROM jsonb_populate_record(NULL::profiles, $1::jsonb) AS _body
             WHERE profiles.id::text = $2",
            assignments.join(", ")
        );
        sqlx::query(&sql)
            .bind(Value::Object(changes))
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_lists_quote_and_alias_keys() {
        let row = json!({ "title": "X", "year_from": 1200 });
        let row = row.as_object().unwrap();
        let (plain, aliased) = PgStore::column_lists(row, "_body").unwrap();
        assert_eq!(plain, vec!["\"title\"", "\"year_from\""]);
        assert_eq!(aliased, vec!["_body.\"title\"", "_body.\"year_from\""]);
    }

    #[test]
    fn column_lists_reject_unsafe_keys() {
        let row = json!({ "title\"; DROP TABLE x; --": 1 });
        let err = PgStore::column_lists(row.as_object().unwrap(), "_body").unwrap_err();
        assert!(err.to_string().starts_with("Invalid column name"));
    }

    #[test]
    fn table_listing_only_filters_by_schema() {
        assert!(LIST_TABLES_SQL.contains("table_schema = $1"));
        assert!(!LIST_TABLES_SQL.contains("table_type"));
    }
}
