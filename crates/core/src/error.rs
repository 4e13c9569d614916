//! Fehlertypen fuer Ansager
//!
//! Zentraler Fehler-Enum der die Fehler-Taxonomie des Ansagers abdeckt.
//! Untermodule koennen eigene Fehler definieren und in diesen Enum
//! konvertieren (siehe `ansager_db::DbError`).

use thiserror::Error;

/// Globaler Result-Alias fuer Ansager
pub type Result<T> = std::result::Result<T, AnsagerError>;

/// Alle moeglichen Fehler im Ansager-System
#[derive(Debug, Error)]
pub enum AnsagerError {
    // --- Sprachverbindung ---
    /// Transport hat den Bereit-Zustand nicht rechtzeitig erreicht
    #[error("Sprachverbindung nicht rechtzeitig bereit ({millis} ms)")]
    Verbindungszeitlimit { millis: u64 },

    #[error("Sprachverbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    #[error("Ansager ist nicht (mehr) verbunden")]
    NichtVerbunden,

    #[error("Guild {0} wird nicht verfolgt")]
    NichtVerfolgt(u64),

    // --- TTS ---
    /// Upstream-TTS-Aufruf fehlgeschlagen oder keine verwertbaren Audiodaten
    #[error("TTS-Provider '{provider}' fehlgeschlagen: {grund}")]
    Provider { provider: String, grund: String },

    #[error("Transkodierung fehlgeschlagen: {0}")]
    Transkodierung(String),

    /// Nur von den Sprach-Settern zurueckgegeben; Phrasen fallen still
    /// auf Englisch zurueck
    #[error("Sprachcode nicht unterstuetzt: {0}")]
    UnbekannteSprache(String),

    // --- Einstellungen ---
    #[error("Alias zu lang: {laenge} Zeichen (maximal {max})")]
    AliasZuLang { laenge: usize, max: usize },

    #[error("Persistenzfehler: {0}")]
    Persistenz(String),

    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),
}

impl AnsagerError {
    /// Erstellt einen Provider-Fehler
    pub fn provider(provider: impl Into<String>, grund: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            grund: grund.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = AnsagerError::AliasZuLang { laenge: 70, max: 64 };
        assert_eq!(e.to_string(), "Alias zu lang: 70 Zeichen (maximal 64)");
    }

    #[test]
    fn provider_fehler_enthaelt_namen() {
        let e = AnsagerError::provider("Google Cloud", "HTTP 500");
        assert!(e.to_string().contains("Google Cloud"));
        assert!(e.to_string().contains("HTTP 500"));
    }
}
