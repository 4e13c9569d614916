//! Presence-Automat – steuert Ansager anhand von Sprach-Presence-Wechseln
//!
//! Eingabe ist ein Paar (alt, neu) fuer ein Mitglied einer Guild:
//!
//! | alt    | neu    | Uebergang |
//! |--------|--------|-----------|
//! | -      | Kanal  | Beitritt  |
//! | Kanal  | -      | Austritt  |
//! | A      | B      | Wechsel = Austritt(A), dann Beitritt(B) |
//! | A      | A      | Unveraendert (Mute/Deaf) |
//!
//! Alles laeuft unter der Sperre der Guild-Sitzung. Fehler werden geloggt,
//! der betroffene Uebergang wird aufgegeben.

use std::sync::Arc;

use async_trait::async_trait;

use ansager_core::{ChannelId, GuildId, MitgliedInfo, Result, SprachPresence, UserId};
use ansager_db::{AliasSpeicher, GuildEinstellungen};
use ansager_voice::Ansager;

use crate::phrasen;
use crate::registry::{SitzungsSperre, SitzungsVerwaltung};

/// Abfrage der aktuellen Mitglieder eines Sprachkanals bei der Plattform
#[async_trait]
pub trait KanalAbfrage: Send + Sync {
    async fn mitglieder(&self, guild_id: GuildId, kanal_id: ChannelId) -> Result<Vec<MitgliedInfo>>;
}

/// Klassifizierung eines Presence-Wechsels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uebergang {
    /// Eigener Bot, fremder Bot oder nicht abonnierte Guild
    Ignoriert,
    Beitritt(ChannelId),
    Austritt(ChannelId),
    Wechsel { von: ChannelId, nach: ChannelId },
    Unveraendert,
}

impl Uebergang {
    /// Reine Klassifizierung nach Kanal alt/neu
    pub fn aus_kanaelen(alt: Option<ChannelId>, neu: Option<ChannelId>) -> Self {
        match (alt, neu) {
            (None, Some(nach)) => Self::Beitritt(nach),
            (Some(von), None) => Self::Austritt(von),
            (Some(von), Some(nach)) if von != nach => Self::Wechsel { von, nach },
            _ => Self::Unveraendert,
        }
    }
}

/// Presence-Automat aller Guilds
pub struct PresenceAutomat {
    verwaltung: SitzungsVerwaltung,
    einstellungen: GuildEinstellungen,
    aliase: Arc<AliasSpeicher>,
    kanaele: Arc<dyn KanalAbfrage>,
    eigene_id: UserId,
}

impl PresenceAutomat {
    pub fn neu(
        verwaltung: SitzungsVerwaltung,
        einstellungen: GuildEinstellungen,
        aliase: Arc<AliasSpeicher>,
        kanaele: Arc<dyn KanalAbfrage>,
        eigene_id: UserId,
    ) -> Self {
        Self {
            verwaltung,
            einstellungen,
            aliase,
            kanaele,
            eigene_id,
        }
    }

    /// Verarbeitet einen Presence-Wechsel und gibt seine Klassifizierung zurueck
    pub async fn verarbeiten(&self, alt: &SprachPresence, neu: &SprachPresence) -> Uebergang {
        let guild_id = neu.guild_id;
        let mitglied = &neu.mitglied;

        if mitglied.user_id == self.eigene_id || mitglied.ist_bot {
            return Uebergang::Ignoriert;
        }
        if !self.verwaltung.ist_abonniert(guild_id) {
            return Uebergang::Ignoriert;
        }

        let uebergang = Uebergang::aus_kanaelen(alt.kanal_id, neu.kanal_id);
        if uebergang == Uebergang::Unveraendert {
            return uebergang;
        }

        let Some(mut sperre) = self.verwaltung.sperren(guild_id).await else {
            return Uebergang::Ignoriert;
        };

        tracing::debug!(
            guild_id = %guild_id,
            user_id = %mitglied.user_id,
            uebergang = ?uebergang,
            "Presence-Wechsel"
        );

        match uebergang {
            Uebergang::Beitritt(kanal) => self.beitritt(&mut sperre, mitglied, kanal).await,
            Uebergang::Austritt(kanal) => self.austritt(&mut sperre, mitglied, kanal).await,
            Uebergang::Wechsel { von, nach } => {
                self.austritt(&mut sperre, mitglied, von).await;
                self.beitritt(&mut sperre, mitglied, nach).await;
            }
            Uebergang::Ignoriert | Uebergang::Unveraendert => {}
        }
        uebergang
    }

    async fn beitritt(&self, sperre: &mut SitzungsSperre, mitglied: &MitgliedInfo, kanal: ChannelId) {
        let guild_id = sperre.guild_id();
        let ansager = match sperre.ansager() {
            Some(a) => a,
            None => match sperre.ansager_starten(kanal).await {
                Ok(a) => a,
                Err(e) => {
                    tracing::warn!(
                        guild_id = %guild_id,
                        kanal_id = %kanal,
                        fehler = %e,
                        "Ansager konnte nicht gestartet werden"
                    );
                    return;
                }
            },
        };

        // Nur im eigenen Kanal ansagen, egal wer den Ansager gestartet hat
        if !ansager.ist_auf_kanal(kanal) {
            return;
        }

        let name = self.aliase.name_aufloesen(guild_id, mitglied).await;
        let textsprache = self.einstellungen.textsprache(guild_id).await;
        self.ansagen(&ansager, &phrasen::beigetreten(&textsprache, &name))
            .await;
    }

    async fn austritt(&self, sperre: &mut SitzungsSperre, mitglied: &MitgliedInfo, kanal: ChannelId) {
        let guild_id = sperre.guild_id();
        let Some(ansager) = sperre.ansager() else {
            return;
        };
        if !ansager.ist_auf_kanal(kanal) {
            return;
        }

        if !self.noch_besetzt(guild_id, kanal).await {
            tracing::info!(guild_id = %guild_id, kanal_id = %kanal, "Kanal leer, Ansager wird beendet");
            sperre.ansager_beenden();
        }

        if ansager.ist_zerstoert() {
            tracing::debug!(guild_id = %guild_id, "Kein Ansager mehr, Austritt wird nicht angesagt");
            return;
        }

        let name = self.aliase.name_aufloesen(guild_id, mitglied).await;
        let textsprache = self.einstellungen.textsprache(guild_id).await;
        self.ansagen(&ansager, &phrasen::verlassen(&textsprache, &name))
            .await;
    }

    /// true wenn noch ein Mensch (nicht der eigene Bot) im Kanal ist
    ///
    /// Kann die Belegung nicht ermittelt werden, gilt der Kanal als besetzt.
    async fn noch_besetzt(&self, guild_id: GuildId, kanal: ChannelId) -> bool {
        match self.kanaele.mitglieder(guild_id, kanal).await {
            Ok(mitglieder) => mitglieder
                .iter()
                .any(|m| !m.ist_bot && m.user_id != self.eigene_id),
            Err(e) => {
                tracing::warn!(
                    guild_id = %guild_id,
                    kanal_id = %kanal,
                    fehler = %e,
                    "Kanalbelegung unbekannt, Ansager bleibt"
                );
                true
            }
        }
    }

    /// Spricht `satz` in der Stimmsprache der Guild
    async fn ansagen(&self, ansager: &Ansager, satz: &str) {
        let guild_id = ansager.guild_id();
        ansager.sprache_setzen(self.einstellungen.stimmsprache(guild_id).await);
        if let Err(e) = ansager.sprechen(satz).await {
            tracing::warn!(guild_id = %guild_id, fehler = %e, "Ansage fehlgeschlagen");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn klassifizierung() {
        let a = Some(ChannelId(1));
        let b = Some(ChannelId(2));
        assert_eq!(Uebergang::aus_kanaelen(None, a), Uebergang::Beitritt(ChannelId(1)));
        assert_eq!(Uebergang::aus_kanaelen(a, None), Uebergang::Austritt(ChannelId(1)));
        assert_eq!(
            Uebergang::aus_kanaelen(a, b),
            Uebergang::Wechsel {
                von: ChannelId(1),
                nach: ChannelId(2)
            }
        );
        assert_eq!(Uebergang::aus_kanaelen(a, a), Uebergang::Unveraendert);
        assert_eq!(Uebergang::aus_kanaelen(None, None), Uebergang::Unveraendert);
    }
}
