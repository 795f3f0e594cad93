// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Routes: /, /health, /api/public/*

pub mod health;
pub mod personas;
pub mod root;

pub use health::get as health_get;
pub use personas::get as personas_get;
pub use root::get as root_get;
