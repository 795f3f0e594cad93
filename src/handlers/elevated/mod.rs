// handlers/elevated/mod.rs - administrative handlers
//
// Security Level: admin guard (`middleware::require_admin`)
// Routes: /admin/*
//
// Handlers here can rely on an `AdminCaller` extension being present.

pub mod tables;

pub use tables::{
    delete_row as table_delete_row, get_meta as table_meta, get_rows as table_rows, list as tables_list,
    post_row as table_insert, put_row as table_update_row,
};
