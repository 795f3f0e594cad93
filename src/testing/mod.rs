//! In-memory stand-ins for the backing store and identity provider, used by
//! unit and integration tests to drive the services without Postgres.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::{Identity, IdentityError, IdentityProvider};
use crate::database::models::{Persona, Profile, ProfileUpdate};
use crate::database::{ColumnInfo, JsonRow, ProfileStore, RowId, RowRange, StoreError, TableName, TableStore};

#[derive(Debug, Default, Clone)]
struct MemTable {
    columns: Vec<ColumnInfo>,
    rows: Vec<JsonRow>,
}

impl MemTable {
    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.column_name == name)
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: BTreeMap<String, MemTable>,
    profiles: BTreeMap<String, Profile>,
    personas: Vec<Persona>,
    profile_failure: Option<String>,
    offline: bool,
}

/// Tables, profiles and personas held in memory.
///
/// Tables behave like the Postgres store: unknown tables and columns are
/// store errors, `id` values are compared as text, and inserted rows without
/// an `id` get one past the largest integer id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table. `id` columns are declared `bigint`, the rest `text`.
    pub fn with_table(self, name: &str, columns: &[&str]) -> Self {
        let columns = columns
            .iter()
            .map(|c| ColumnInfo::new(*c, if *c == "id" { "bigint" } else { "text" }))
            .collect();
        self.lock().tables.insert(
            name.to_string(),
            MemTable {
                columns,
                rows: Vec::new(),
            },
        );
        self
    }

    /// Insert a row directly, bypassing column checks and call counting.
    pub fn seed(&self, table: &str, row: Value) {
        let mut inner = self.lock();
        if let (Some(t), Value::Object(row)) = (inner.tables.get_mut(table), row) {
            t.rows.push(row);
        }
    }

    pub fn rows(&self, table: &str) -> Vec<JsonRow> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn add_persona(&self, id: &str, code: &str, default_landing_path: Option<&str>) {
        self.lock().personas.push(Persona {
            id: id.to_string(),
            code: code.to_string(),
            name_it: Some(format!("{} (it)", code)),
            name_en: Some(format!("{} (en)", code)),
            default_landing_path: default_landing_path.map(str::to_string),
        });
    }

    pub fn add_profile(&self, id: &str, persona_id: Option<&str>, is_admin: bool) {
        self.lock().profiles.insert(
            id.to_string(),
            Profile {
                id: id.to_string(),
                persona_id: persona_id.map(str::to_string),
                is_admin,
                language_code: None,
            },
        );
    }

    pub fn profile_snapshot(&self, id: &str) -> Option<Profile> {
        self.lock().profiles.get(id).cloned()
    }

    /// Make every profile lookup fail with `message`.
    pub fn fail_profile_lookups(&self, message: &str) {
        self.lock().profile_failure = Some(message.to_string());
    }

    /// Make `ping` fail, as if the database were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Number of `TableStore` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn touch(&self) {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

fn missing_relation(table: &TableName) -> StoreError {
    StoreError::Query(format!("relation \"{}\" does not exist", table))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_ids(a: &JsonRow, b: &JsonRow) -> Ordering {
    match (a.get("id"), b.get("id")) {
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => value_text(x).cmp(&value_text(y)),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn matches_id(row: &JsonRow, id: &RowId) -> bool {
    row.get("id").is_some_and(|v| value_text(v) == id.as_str())
}

fn check_columns(table: &TableName, t: &MemTable, row: &JsonRow) -> Result<(), StoreError> {
    match row.keys().find(|k| !t.has_column(k)) {
        Some(k) => Err(StoreError::Query(format!(
            "column \"{}\" of relation \"{}\" does not exist",
            k, table
        ))),
        None => Ok(()),
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.lock().offline {
            return Err(StoreError::Query("connection refused".to_string()));
        }
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        self.touch();
        Ok(self.lock().tables.keys().cloned().collect())
    }

    async fn describe_columns(&self, table: &TableName) -> Result<Vec<ColumnInfo>, StoreError> {
        self.touch();
        Ok(self
            .lock()
            .tables
            .get(table.as_str())
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn list_rows(
        &self,
        table: &TableName,
        range: RowRange,
        order_by_id: bool,
    ) -> Result<Vec<JsonRow>, StoreError> {
        self.touch();
        let inner = self.lock();
        let t = inner.tables.get(table.as_str()).ok_or_else(|| missing_relation(table))?;

        let mut rows = t.rows.clone();
        if order_by_id {
            rows.sort_by(compare_ids);
        }
        let offset = usize::try_from(range.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(range.limit()).unwrap_or(0);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_rows(&self, table: &TableName) -> Result<i64, StoreError> {
        self.touch();
        let inner = self.lock();
        let t = inner.tables.get(table.as_str()).ok_or_else(|| missing_relation(table))?;
        Ok(t.rows.len() as i64)
    }

    async fn insert_row(&self, table: &TableName, row: &JsonRow) -> Result<Vec<JsonRow>, StoreError> {
        self.touch();
        let mut inner = self.lock();
        let t = inner.tables.get_mut(table.as_str()).ok_or_else(|| missing_relation(table))?;
        check_columns(table, t, row)?;

        let next_id = t
            .rows
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;

        let mut inserted = row.clone();
        if t.has_column("id") && !inserted.contains_key("id") {
            inserted.insert("id".to_string(), Value::from(next_id));
        }
        for column in &t.columns {
            inserted.entry(column.column_name.clone()).or_insert(Value::Null);
        }
        t.rows.push(inserted.clone());
        Ok(vec![inserted])
    }

    async fn update_rows(
        &self,
        table: &TableName,
        id: &RowId,
        changes: &JsonRow,
    ) -> Result<Vec<JsonRow>, StoreError> {
        self.touch();
        let mut inner = self.lock();
        let t = inner.tables.get_mut(table.as_str()).ok_or_else(|| missing_relation(table))?;
        check_columns(table, t, changes)?;

        let mut updated = Vec::new();
        for row in t.rows.iter_mut().filter(|r| matches_id(r, id)) {
            for (k, v) in changes {
                row.insert(k.clone(), v.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete_rows(&self, table: &TableName, id: &RowId) -> Result<Vec<JsonRow>, StoreError> {
        self.touch();
        let mut inner = self.lock();
        let t = inner.tables.get_mut(table.as_str()).ok_or_else(|| missing_relation(table))?;

        let (deleted, kept): (Vec<JsonRow>, Vec<JsonRow>) =
            t.rows.drain(..).partition(|r| matches_id(r, id));
        t.rows = kept;
        Ok(deleted)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let inner = self.lock();
        if let Some(message) = &inner.profile_failure {
            return Err(StoreError::Query(message.clone()));
        }
        Ok(inner.profiles.get(user_id).cloned())
    }

    async fn persona_by_id(&self, persona_id: &str) -> Result<Option<Persona>, StoreError> {
        Ok(self.lock().personas.iter().find(|p| p.id == persona_id).cloned())
    }

    async fn list_personas(&self) -> Result<Vec<Persona>, StoreError> {
        let mut personas = self.lock().personas.clone();
        personas.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(personas)
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(profile) = inner.profiles.get_mut(user_id) {
            if let Some(language_code) = &update.language_code {
                profile.language_code = Some(language_code.clone());
            }
            if let Some(persona_id) = &update.persona_id {
                profile.persona_id = Some(persona_id.clone());
            }
        }
        Ok(())
    }
}

/// Identity provider that knows a fixed set of tokens.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, Identity>,
    failing: Vec<String>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, user_id: &str) -> Self {
        self.users.insert(token.to_string(), Identity::new(user_id));
        self
    }

    /// `token` makes the provider itself fail rather than reject.
    pub fn with_failure(mut self, token: &str) -> Self {
        self.failing.push(token.to_string());
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn user_from_token(&self, token: &str) -> Result<Option<Identity>, IdentityError> {
        if self.failing.iter().any(|t| t == token) {
            return Err(IdentityError::Provider("invalid JWT: unable to parse or verify signature".to_string()));
        }
        Ok(self.users.get(token).cloned())
    }
}
