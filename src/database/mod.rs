pub mod identifier;
pub mod manager;
pub mod models;
pub mod postgres;
pub mod store;

pub use identifier::{ColumnName, IdentifierError, RowId, TableName};
pub use manager::DatabaseManager;
pub use postgres::PgStore;
pub use store::{ColumnInfo, JsonRow, ProfileStore, RowRange, StoreError, TableStore};
