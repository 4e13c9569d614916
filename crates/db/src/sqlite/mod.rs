//! SQLite-Backend fuer den Schluessel-Wert-Vertrag

pub mod kv;
pub mod pool;

pub use pool::{DatenbankConfig, SqliteSpeicher};
