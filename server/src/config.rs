//! Bot-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Bot ohne Konfigurationsdatei
//! lauffaehig ist (bis auf die eigene User-ID).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use ansager_audio::TranskodierConfig;
use ansager_core::Sprachcode;
use ansager_db::DatenbankConfig;
use ansager_voice::AnsagerOptionen;

/// Vollstaendige Bot-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnsagerConfig {
    pub bot: BotEinstellungen,
    pub sprache: SprachEinstellungen,
    pub tts: TtsEinstellungen,
    pub audio: AudioEinstellungen,
    pub alias: AliasEinstellungen,
    pub datenbank: DatenbankEinstellungen,
    pub logging: LoggingEinstellungen,
}

/// Identitaet und verfolgte Guilds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotEinstellungen {
    /// User-ID des eigenen Bot-Kontos
    pub eigene_user_id: u64,
    /// Guilds die beim Start abonniert werden
    pub guilds: Vec<u64>,
}

/// Standardsprachen fuer Guilds ohne eigene Einstellung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SprachEinstellungen {
    /// Sprache der Ansage-Texte
    pub standard_text: String,
    /// Sprache der Stimme
    pub standard_stimme: String,
}

impl Default for SprachEinstellungen {
    fn default() -> Self {
        Self {
            standard_text: Sprachcode::EN_US.into(),
            standard_stimme: Sprachcode::EN_US.into(),
        }
    }
}

/// Auswahl des TTS-Providers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsEinstellungen {
    /// Name eines registrierten Providers
    pub provider: String,
}

impl Default for TtsEinstellungen {
    fn default() -> Self {
        Self {
            provider: "google".into(),
        }
    }
}

/// Sprachverbindung und Transkodierung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioEinstellungen {
    /// Wartezeit bis die Sprachverbindung bereit sein muss
    pub verbindungs_timeout_ms: u64,
    pub ffmpeg_pfad: String,
    pub bitrate_kbps: u32,
    pub abtastrate: u32,
    pub kanaele: u8,
    /// Obergrenze fuer vorgelesene Bytes bei der Formaterkennung
    pub peek_grenze: usize,
}

impl Default for AudioEinstellungen {
    fn default() -> Self {
        Self {
            verbindungs_timeout_ms: 5000,
            ffmpeg_pfad: "ffmpeg".into(),
            bitrate_kbps: 128,
            abtastrate: 48_000,
            kanaele: 2,
            peek_grenze: ansager_audio::PEEK_GRENZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasEinstellungen {
    pub max_laenge: usize,
}

impl Default for AliasEinstellungen {
    fn default() -> Self {
        Self {
            max_laenge: ansager_db::ALIAS_MAX_LAENGE,
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    pub wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://ansager.db".into(),
            max_verbindungen: 5,
            wal: true,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl AnsagerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Pfad aus `ANSAGER_CONFIG`, sonst `config.toml`
    pub fn pfad_aus_umgebung() -> String {
        std::env::var("ANSAGER_CONFIG").unwrap_or_else(|_| "config.toml".into())
    }
}

impl SprachEinstellungen {
    pub fn text(&self) -> Sprachcode {
        Sprachcode::neu(self.standard_text.as_str())
    }

    pub fn stimme(&self) -> Sprachcode {
        Sprachcode::neu(self.standard_stimme.as_str())
    }
}

impl AudioEinstellungen {
    pub fn transkodier_config(&self) -> TranskodierConfig {
        TranskodierConfig {
            ffmpeg_pfad: self.ffmpeg_pfad.clone(),
            bitrate_kbps: self.bitrate_kbps,
            abtastrate: self.abtastrate,
            kanaele: self.kanaele,
        }
    }

    pub fn ansager_optionen(&self) -> AnsagerOptionen {
        AnsagerOptionen {
            verbindungs_timeout: Duration::from_millis(self.verbindungs_timeout_ms),
        }
    }
}

impl DatenbankEinstellungen {
    pub fn db_config(&self) -> DatenbankConfig {
        DatenbankConfig {
            url: self.url.clone(),
            max_verbindungen: self.max_verbindungen,
            wal: self.wal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = AnsagerConfig::default();
        assert_eq!(cfg.audio.verbindungs_timeout_ms, 5000);
        assert_eq!(cfg.audio.abtastrate, 48_000);
        assert_eq!(cfg.alias.max_laenge, 64);
        assert_eq!(cfg.sprache.text().als_str(), "en-US");
        assert_eq!(cfg.datenbank.url, "sqlite://ansager.db");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [bot]
            eigene_user_id = 4711
            guilds = [1, 2]

            [sprache]
            standard_stimme = "de-DE"

            [audio]
            verbindungs_timeout_ms = 2500
        "#;
        let cfg: AnsagerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.bot.eigene_user_id, 4711);
        assert_eq!(cfg.bot.guilds, vec![1, 2]);
        assert_eq!(cfg.sprache.stimme().als_str(), "de-DE");
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.sprache.text().als_str(), "en-US");
        assert_eq!(
            cfg.audio.ansager_optionen().verbindungs_timeout,
            Duration::from_millis(2500)
        );
        assert_eq!(cfg.audio.transkodier_config().bitrate_kbps, 128);
    }

    #[test]
    fn fehlende_datei_ergibt_standard() {
        let cfg = AnsagerConfig::laden("/nicht/vorhanden/ansager.toml").unwrap();
        assert_eq!(cfg.tts.provider, "google");
    }
}
