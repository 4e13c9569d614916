//! Textkanal-Bruecke – Nachrichten aus einem festgelegten Kanal vorlesen
//!
//! Pro Guild gibt es genau einen festgelegten Textkanal. Der Kanal wird
//! persistiert und im Speicher gespiegelt. Keine Ratenbegrenzung und keine
//! Laengenbegrenzung.

use dashmap::DashMap;

use ansager_core::{ChannelId, GuildId, Result, TextNachricht, UserId};
use ansager_db::GuildEinstellungen;

use crate::registry::{SitzungsVerwaltung, SitzungsZustand};

pub struct TextKanalBruecke {
    verwaltung: SitzungsVerwaltung,
    einstellungen: GuildEinstellungen,
    eigene_id: UserId,
    /// Spiegel des persistierten Kanals; `None` = keiner festgelegt
    kanaele: DashMap<GuildId, Option<ChannelId>>,
}

impl TextKanalBruecke {
    pub fn neu(
        verwaltung: SitzungsVerwaltung,
        einstellungen: GuildEinstellungen,
        eigene_id: UserId,
    ) -> Self {
        Self {
            verwaltung,
            einstellungen,
            eigene_id,
            kanaele: DashMap::new(),
        }
    }

    /// Legt den vorzulesenden Kanal einer Guild fest
    pub async fn kanal_setzen(&self, guild_id: GuildId, kanal_id: ChannelId) -> Result<()> {
        self.einstellungen.textkanal_setzen(guild_id, kanal_id).await?;
        self.kanaele.insert(guild_id, Some(kanal_id));
        tracing::info!(guild_id = %guild_id, kanal_id = %kanal_id, "Textkanal festgelegt");
        Ok(())
    }

    /// Festgelegter Kanal einer Guild
    pub async fn kanal(&self, guild_id: GuildId) -> Option<ChannelId> {
        if let Some(kanal) = self.kanaele.get(&guild_id) {
            return *kanal;
        }
        match self.einstellungen.textkanal(guild_id).await {
            Ok(kanal) => {
                self.kanaele.insert(guild_id, kanal);
                kanal
            }
            Err(e) => {
                tracing::warn!(guild_id = %guild_id, fehler = %e, "Textkanal nicht lesbar");
                None
            }
        }
    }

    /// Leitet eine Nachricht an den Ansager weiter; true wenn weitergeleitet
    pub async fn nachricht_verarbeiten(&self, nachricht: &TextNachricht) -> bool {
        if nachricht.autor.user_id == self.eigene_id || nachricht.autor.ist_bot {
            return false;
        }
        if !self.verwaltung.ist_abonniert(nachricht.guild_id) {
            return false;
        }
        if self.kanal(nachricht.guild_id).await != Some(nachricht.kanal_id) {
            return false;
        }

        let SitzungsZustand::Aktiv(ansager) = self.verwaltung.get(nachricht.guild_id).await else {
            return false;
        };

        if let Err(e) = ansager.sprechen(&nachricht.inhalt).await {
            tracing::warn!(
                guild_id = %nachricht.guild_id,
                fehler = %e,
                "Nachricht konnte nicht vorgelesen werden"
            );
        }
        true
    }
}
