//! Sprach- und Kanaleinstellungen pro Guild
//!
//! Zwei logische Maps (Guild -> Textsprache, Guild -> Stimmsprache) plus der
//! vorgesehene Textkanal der Vorlese-Bruecke. Eintraege entstehen beim ersten
//! expliziten Setzen und werden nie implizit geloescht. Der persistierte Wert
//! ist beim Lesen massgeblich; fehlt er, gilt die fest eingestellte
//! Standardsprache.

use std::sync::Arc;

use ansager_core::{ChannelId, GuildId, Result, Sprachcode};

use crate::store::{schluessel, SchluesselWertSpeicher};

/// Namensraum aller TTS-Einstellungen
pub const NAMENSRAUM: &str = "tts";

const FELD_TEXTSPRACHE: &str = "text/lang";
const FELD_STIMMSPRACHE: &str = "voice/lang";
const FELD_TEXTKANAL: &str = "text/channel";

/// Zugriff auf die Einstellungen aller Guilds
#[derive(Clone)]
pub struct GuildEinstellungen {
    speicher: Arc<dyn SchluesselWertSpeicher>,
    standard_text: Sprachcode,
    standard_stimme: Sprachcode,
}

impl GuildEinstellungen {
    /// Erstellt den Zugriff mit "en-US" als Standard fuer beide Sprachen
    pub fn neu(speicher: Arc<dyn SchluesselWertSpeicher>) -> Self {
        Self {
            speicher,
            standard_text: Sprachcode::default(),
            standard_stimme: Sprachcode::default(),
        }
    }

    /// Ueberschreibt die Standardsprachen (Builder)
    pub fn mit_standards(mut self, text: Sprachcode, stimme: Sprachcode) -> Self {
        self.standard_text = text;
        self.standard_stimme = stimme;
        self
    }

    /// Sprache in der Ansage-Texte formuliert werden
    pub async fn textsprache(&self, guild_id: GuildId) -> Sprachcode {
        self.sprache_lesen(guild_id, FELD_TEXTSPRACHE, &self.standard_text)
            .await
    }

    /// Sprache mit der der Provider spricht
    pub async fn stimmsprache(&self, guild_id: GuildId) -> Sprachcode {
        self.sprache_lesen(guild_id, FELD_STIMMSPRACHE, &self.standard_stimme)
            .await
    }

    pub async fn textsprache_setzen(&self, guild_id: GuildId, code: &Sprachcode) -> Result<()> {
        let key = schluessel(NAMENSRAUM, guild_id, FELD_TEXTSPRACHE);
        self.speicher.set(&key, code.als_str()).await?;
        tracing::info!(guild_id = %guild_id, sprache = %code, "Textsprache gesetzt");
        Ok(())
    }

    pub async fn stimmsprache_setzen(&self, guild_id: GuildId, code: &Sprachcode) -> Result<()> {
        let key = schluessel(NAMENSRAUM, guild_id, FELD_STIMMSPRACHE);
        self.speicher.set(&key, code.als_str()).await?;
        tracing::info!(guild_id = %guild_id, sprache = %code, "Stimmsprache gesetzt");
        Ok(())
    }

    /// Vorgesehener Textkanal der Vorlese-Bruecke
    pub async fn textkanal(&self, guild_id: GuildId) -> Result<Option<ChannelId>> {
        let key = schluessel(NAMENSRAUM, guild_id, FELD_TEXTKANAL);
        let wert = self.speicher.get(&key).await?;
        Ok(wert.and_then(|w| match w.parse::<u64>() {
            Ok(id) => Some(ChannelId(id)),
            Err(_) => {
                tracing::warn!(guild_id = %guild_id, wert = %w, "Ungueltige Textkanal-ID gespeichert");
                None
            }
        }))
    }

    pub async fn textkanal_setzen(&self, guild_id: GuildId, kanal_id: ChannelId) -> Result<()> {
        let key = schluessel(NAMENSRAUM, guild_id, FELD_TEXTKANAL);
        self.speicher.set(&key, &kanal_id.inner().to_string()).await?;
        Ok(())
    }

    /// Liest eine Sprache; Lesefehler zaehlen wie "nicht gesetzt"
    async fn sprache_lesen(&self, guild_id: GuildId, feld: &str, standard: &Sprachcode) -> Sprachcode {
        let key = schluessel(NAMENSRAUM, guild_id, feld);
        match self.speicher.get(&key).await {
            Ok(Some(wert)) if !wert.trim().is_empty() => Sprachcode::neu(wert),
            Ok(_) => standard.clone(),
            Err(e) => {
                tracing::warn!(
                    guild_id = %guild_id,
                    feld,
                    fehler = %e,
                    "Sprache nicht lesbar, verwende Standard"
                );
                standard.clone()
            }
        }
    }
}
