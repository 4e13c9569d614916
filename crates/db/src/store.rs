//! Schluessel-Wert-Vertrag und In-Memory-Backend
//!
//! Das Repository-Pattern entkoppelt die Einstellungen von der konkreten
//! Speicher-Engine. Schluessel sind undurchsichtige String-Pfade, die von
//! den Aufrufern via [`schluessel`] gebaut werden.

use async_trait::async_trait;
use dashmap::DashMap;

use ansager_core::GuildId;

use crate::error::{DbError, DbResult};

/// Persistenz-Vertrag: get/set/delete auf String-Schluesseln
#[async_trait]
pub trait SchluesselWertSpeicher: Send + Sync {
    /// Liest einen Wert (None wenn nicht vorhanden)
    async fn get(&self, schluessel: &str) -> DbResult<Option<String>>;

    /// Schreibt (oder ersetzt) einen Wert
    async fn set(&self, schluessel: &str, wert: &str) -> DbResult<()>;

    /// Loescht einen Wert; true wenn etwas geloescht wurde
    async fn delete(&self, schluessel: &str) -> DbResult<bool>;
}

/// Baut einen Schluessel der Form `{namensraum}/{guild_id}/{feld}`
pub fn schluessel(namensraum: &str, guild_id: GuildId, feld: &str) -> String {
    format!("{namensraum}/{}/{feld}", guild_id.inner())
}

/// Leere Schluessel werden von allen Backends abgelehnt
pub(crate) fn schluessel_pruefen(schluessel: &str) -> DbResult<()> {
    if schluessel.trim().is_empty() {
        return Err(DbError::UngueltigerSchluessel(schluessel.to_string()));
    }
    Ok(())
}

/// Fluechtiger Speicher (verliert alles beim Neustart)
#[derive(Debug, Default)]
pub struct SpeicherImRam {
    werte: DashMap<String, String>,
}

impl SpeicherImRam {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl gespeicherter Eintraege
    pub fn anzahl(&self) -> usize {
        self.werte.len()
    }
}

#[async_trait]
impl SchluesselWertSpeicher for SpeicherImRam {
    async fn get(&self, schluessel: &str) -> DbResult<Option<String>> {
        Ok(self.werte.get(schluessel).map(|w| w.value().clone()))
    }

    async fn set(&self, schluessel: &str, wert: &str) -> DbResult<()> {
        schluessel_pruefen(schluessel)?;
        self.werte.insert(schluessel.to_string(), wert.to_string());
        Ok(())
    }

    async fn delete(&self, schluessel: &str) -> DbResult<bool> {
        Ok(self.werte.remove(schluessel).is_some())
    }
}
