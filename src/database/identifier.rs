//! Validated names for dynamic table access.
//!
//! Table and column names arrive from request paths and bodies, so they are
//! parsed into these types before any SQL is built. Values are always
//! double-quoted when rendered, the character check keeps the quoting trivial.

use std::fmt;

use thiserror::Error;

/// Postgres truncates identifiers longer than this (NAMEDATALEN - 1).
const MAX_IDENTIFIER_LEN: usize = 63;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Missing table")]
    MissingTable,

    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Missing id")]
    MissingId,
}

/// `[A-Za-z_][A-Za-z0-9_]*`, at most 63 bytes.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= MAX_IDENTIFIER_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote SQL identifier to prevent injection
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(IdentifierError::MissingTable);
        }
        if !is_valid_identifier(name) {
            return Err(IdentifierError::InvalidTable(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        quote_identifier(&self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(String);

impl ColumnName {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        if !is_valid_identifier(raw) {
            return Err(IdentifierError::InvalidColumn(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        quote_identifier(&self.0)
    }
}

/// Primary key value matched against the `id` column. Kept as text, the
/// store compares it against `id::text` so any key type works.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowId(String);

impl RowId {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(IdentifierError::MissingId);
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
