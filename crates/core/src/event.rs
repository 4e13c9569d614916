//! Plattform-Ereignisse die der Ansager konsumiert
//!
//! Das Gateway der Chat-Plattform ist ein externer Kollaborateur. Es
//! uebersetzt seine eigenen Ereignisse in diese schlanken Strukturen.

use crate::types::{ChannelId, GuildId, UserId};
use serde::{Deserialize, Serialize};

/// Identitaet eines Guild-Mitglieds, soweit fuer Ansagen relevant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitgliedInfo {
    pub user_id: UserId,
    /// Bot-Konten werden weder angesagt noch als Anwesende gezaehlt
    pub ist_bot: bool,
    /// Guild-spezifischer Nickname
    pub nickname: Option<String>,
    /// Plattformweiter Anzeigename
    pub anzeigename: Option<String>,
}

impl MitgliedInfo {
    /// Erstellt ein menschliches Mitglied ohne Namen
    pub fn mensch(user_id: UserId) -> Self {
        Self {
            user_id,
            ist_bot: false,
            nickname: None,
            anzeigename: None,
        }
    }

    /// Erstellt ein Bot-Mitglied
    pub fn bot(user_id: UserId) -> Self {
        Self {
            ist_bot: true,
            ..Self::mensch(user_id)
        }
    }

    /// Setzt den Anzeigenamen (Builder)
    pub fn mit_anzeigename(mut self, name: impl Into<String>) -> Self {
        self.anzeigename = Some(name.into());
        self
    }

    /// Setzt den Nickname (Builder)
    pub fn mit_nickname(mut self, name: impl Into<String>) -> Self {
        self.nickname = Some(name.into());
        self
    }
}

/// Sprachkanal-Zustand eines Mitglieds zu einem Zeitpunkt
///
/// Ein Presence-Uebergang ist immer ein Paar (alt, neu) fuer dasselbe
/// Mitglied in derselben Guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprachPresence {
    pub guild_id: GuildId,
    pub mitglied: MitgliedInfo,
    /// Aktueller Sprachkanal (None wenn in keinem Kanal)
    pub kanal_id: Option<ChannelId>,
    pub selbst_stumm: bool,
    pub selbst_taub: bool,
}

impl SprachPresence {
    /// Zustand "in Kanal `kanal_id`"
    pub fn in_kanal(guild_id: GuildId, mitglied: MitgliedInfo, kanal_id: ChannelId) -> Self {
        Self {
            guild_id,
            mitglied,
            kanal_id: Some(kanal_id),
            selbst_stumm: false,
            selbst_taub: false,
        }
    }

    /// Zustand "in keinem Kanal"
    pub fn ohne_kanal(guild_id: GuildId, mitglied: MitgliedInfo) -> Self {
        Self {
            guild_id,
            mitglied,
            kanal_id: None,
            selbst_stumm: false,
            selbst_taub: false,
        }
    }
}

/// Neue Textnachricht in einem Guild-Kanal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNachricht {
    pub guild_id: GuildId,
    pub kanal_id: ChannelId,
    pub autor: MitgliedInfo,
    pub inhalt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_ist_serde_kompatibel() {
        let p = SprachPresence::in_kanal(
            GuildId(1),
            MitgliedInfo::mensch(UserId(2)).mit_nickname("Anna"),
            ChannelId(3),
        );
        let json = serde_json::to_string(&p).unwrap();
        let zurueck: SprachPresence = serde_json::from_str(&json).unwrap();
        assert_eq!(p, zurueck);
    }

    #[test]
    fn bot_builder_setzt_flag() {
        let m = MitgliedInfo::bot(UserId(9)).mit_anzeigename("Musikbot");
        assert!(m.ist_bot);
        assert_eq!(m.anzeigename.as_deref(), Some("Musikbot"));
    }
}
