//! Vertrag zur Sprachplattform
//!
//! Gateway, Sprach-UDP/RTP und der eigentliche Player liegen ausserhalb
//! dieses Projekts. Der Ansager spricht nur ueber diese Traits mit ihnen.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};

use ansager_audio::AudioRessource;
use ansager_core::{ChannelId, GuildId, Result};

/// Zustand einer Sprachverbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbindungsStatus {
    Signalisierung,
    Verbindet,
    Bereit,
    /// Von der Plattform getrennt (Kick, Kanal geloescht, Netzwerk)
    Getrennt,
    Zerstoert,
}

impl VerbindungsStatus {
    /// true fuer Zustaende aus denen keine Wiedergabe mehr moeglich ist
    pub fn ist_endgueltig(self) -> bool {
        matches!(self, Self::Getrennt | Self::Zerstoert)
    }
}

/// Wie eine Wiedergabe geendet hat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WiedergabeEnde {
    Fertig,
    Fehler(String),
}

/// Audio-Player einer Verbindung
pub trait AudioPlayer: Send + Sync {
    /// Startet die Wiedergabe
    ///
    /// Das Ende (oder ein Fehler) wird ueber `fertig` gemeldet. Wird der
    /// Sender ohne Meldung fallen gelassen, gilt die Wiedergabe als beendet.
    fn abspielen(&self, ressource: AudioRessource, fertig: oneshot::Sender<WiedergabeEnde>);

    /// Bricht die laufende Wiedergabe ab und gibt die Ressource frei
    fn stoppen(&self);
}

/// Eine (werdende) Sprachverbindung in einem Kanal
pub trait SprachVerbindung: Send + Sync {
    fn status(&self) -> watch::Receiver<VerbindungsStatus>;

    /// Bindet den Player an die Verbindung
    fn abonnieren(&self, player: Arc<dyn AudioPlayer>);

    fn abbestellen(&self);

    /// Baut die Verbindung ab; mehrfacher Aufruf ist erlaubt
    fn zerstoeren(&self);
}

/// Einstieg in die Sprachplattform
#[async_trait]
pub trait SprachTransport: Send + Sync {
    /// Beginnt den Beitritt in `kanal_id`
    ///
    /// Die Verbindung ist danach noch nicht zwingend bereit, siehe
    /// [`SprachVerbindung::status`].
    async fn beitreten(
        &self,
        guild_id: GuildId,
        kanal_id: ChannelId,
    ) -> Result<Arc<dyn SprachVerbindung>>;

    fn player_erstellen(&self) -> Arc<dyn AudioPlayer>;
}
