//! Gesprochene Aliase pro Guild-Mitglied
//!
//! Schluessel: `alias/{guild_id}/{user_id}`. Der persistierte Wert gewinnt,
//! ein In-Memory-Spiegel wird bei jedem Lesen aufgefrischt und dient nur als
//! Rueckfall wenn das Backend nicht lesbar ist.

use std::sync::Arc;

use dashmap::DashMap;

use ansager_core::{AnsagerError, GuildId, MitgliedInfo, Result, UserId};

use crate::store::SchluesselWertSpeicher;

/// Standard-Obergrenze fuer Aliase (in Zeichen)
pub const ALIAS_MAX_LAENGE: usize = 64;

/// Letzter Rueckfall wenn kein Name bekannt ist
pub const UNBEKANNTER_NAME: &str = "User";

const NAMENSRAUM: &str = "alias";

/// Alias-Verwaltung
pub struct AliasSpeicher {
    speicher: Arc<dyn SchluesselWertSpeicher>,
    spiegel: DashMap<(GuildId, UserId), String>,
    max_laenge: usize,
}

impl AliasSpeicher {
    pub fn neu(speicher: Arc<dyn SchluesselWertSpeicher>) -> Self {
        Self::mit_max_laenge(speicher, ALIAS_MAX_LAENGE)
    }

    pub fn mit_max_laenge(speicher: Arc<dyn SchluesselWertSpeicher>, max_laenge: usize) -> Self {
        Self {
            speicher,
            spiegel: DashMap::new(),
            max_laenge,
        }
    }

    fn schluessel(guild_id: GuildId, user_id: UserId) -> String {
        format!("{NAMENSRAUM}/{}/{}", guild_id.inner(), user_id.inner())
    }

    /// Setzt einen Alias
    ///
    /// Aliase ueber der Obergrenze werden synchron mit
    /// [`AnsagerError::AliasZuLang`] abgelehnt.
    pub async fn setzen(&self, guild_id: GuildId, user_id: UserId, alias: &str) -> Result<()> {
        let laenge = alias.chars().count();
        if laenge > self.max_laenge {
            return Err(AnsagerError::AliasZuLang {
                laenge,
                max: self.max_laenge,
            });
        }

        self.speicher
            .set(&Self::schluessel(guild_id, user_id), alias)
            .await?;
        self.spiegel.insert((guild_id, user_id), alias.to_string());

        tracing::info!(guild_id = %guild_id, user_id = %user_id, alias, "Alias gesetzt");
        Ok(())
    }

    /// Entfernt einen Alias; true wenn einer gespeichert war
    pub async fn loeschen(&self, guild_id: GuildId, user_id: UserId) -> Result<bool> {
        self.spiegel.remove(&(guild_id, user_id));
        let geloescht = self
            .speicher
            .delete(&Self::schluessel(guild_id, user_id))
            .await?;
        Ok(geloescht)
    }

    /// Liest einen Alias; leere Werte zaehlen als nicht gesetzt
    pub async fn lesen(&self, guild_id: GuildId, user_id: UserId) -> Option<String> {
        let key = (guild_id, user_id);
        match self.speicher.get(&Self::schluessel(guild_id, user_id)).await {
            Ok(Some(alias)) if !alias.trim().is_empty() => {
                self.spiegel.insert(key, alias.clone());
                Some(alias)
            }
            Ok(_) => {
                self.spiegel.remove(&key);
                None
            }
            Err(e) => {
                tracing::warn!(
                    guild_id = %guild_id,
                    user_id = %user_id,
                    fehler = %e,
                    "Alias nicht lesbar, verwende Spiegel"
                );
                self.spiegel.get(&key).map(|a| a.value().clone())
            }
        }
    }

    /// Gesprochener Name: Alias -> Nickname -> Anzeigename -> "User"
    pub async fn name_aufloesen(&self, guild_id: GuildId, mitglied: &MitgliedInfo) -> String {
        if let Some(alias) = self.lesen(guild_id, mitglied.user_id).await {
            return alias;
        }
        [&mitglied.nickname, &mitglied.anzeigename]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| UNBEKANNTER_NAME.to_string())
    }
}
