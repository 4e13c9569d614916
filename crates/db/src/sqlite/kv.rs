//! SQLite-Implementierung des SchluesselWertSpeicher

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::error::DbResult;
use crate::sqlite::pool::SqliteSpeicher;
use crate::store::{schluessel_pruefen, SchluesselWertSpeicher};

#[async_trait]
impl SchluesselWertSpeicher for SqliteSpeicher {
    async fn get(&self, schluessel: &str) -> DbResult<Option<String>> {
        let row = sqlx::query("SELECT wert FROM schluessel_werte WHERE schluessel = ?")
            .bind(schluessel)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<String, _>("wert"))
            .transpose()
            .map_err(Into::into)
    }

    async fn set(&self, schluessel: &str, wert: &str) -> DbResult<()> {
        schluessel_pruefen(schluessel)?;
        let jetzt = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        sqlx::query(
            "REPLACE INTO schluessel_werte (schluessel, wert, aktualisiert_am)
             VALUES (?, ?, ?)",
        )
        .bind(schluessel)
        .bind(wert)
        .bind(&jetzt)
        .execute(&self.pool)
        .await?;

        tracing::trace!(schluessel, "Wert gespeichert");
        Ok(())
    }

    async fn delete(&self, schluessel: &str) -> DbResult<bool> {
        let ergebnis = sqlx::query("DELETE FROM schluessel_werte WHERE schluessel = ?")
            .bind(schluessel)
            .execute(&self.pool)
            .await?;
        Ok(ergebnis.rows_affected() > 0)
    }
}
