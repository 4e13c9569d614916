//! Fehlertypen fuer das Datenbank-Crate

use ansager_core::AnsagerError;
use thiserror::Error;

/// Datenbank-Fehlertypen
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Ungueltiger Schluessel: {0:?}")]
    UngueltigerSchluessel(String),

    #[error("SQLx-Fehler: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migrationsfehler: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Interner DB-Fehler: {0}")]
    Intern(String),
}

impl DbError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

impl From<DbError> for AnsagerError {
    fn from(e: DbError) -> Self {
        AnsagerError::Persistenz(e.to_string())
    }
}

/// Result-Typ fuer Speicher-Operationen
pub type DbResult<T> = Result<T, DbError>;
