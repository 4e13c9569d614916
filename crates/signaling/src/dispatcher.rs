//! Ereignis-Verteiler – serialisiert Ereignisse pro Guild
//!
//! Jede Guild bekommt einen eigenen Worker-Task mit einer Warteschlange.
//! Ereignisse einer Guild werden strikt in Einreichungs-Reihenfolge
//! verarbeitet, verschiedene Guilds laufen parallel. Nur Guilds die der
//! Verarbeiter annimmt bekommen einen Worker.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use ansager_core::{GuildId, SprachPresence, TextNachricht};

use crate::presence::PresenceAutomat;
use crate::registry::SitzungsVerwaltung;
use crate::text_kanal::TextKanalBruecke;

/// Eingehendes Plattform-Ereignis
#[derive(Debug, Clone)]
pub enum Ereignis {
    Presence {
        alt: SprachPresence,
        neu: SprachPresence,
    },
    Nachricht(TextNachricht),
}

impl Ereignis {
    pub fn guild_id(&self) -> GuildId {
        match self {
            Self::Presence { neu, .. } => neu.guild_id,
            Self::Nachricht(n) => n.guild_id,
        }
    }
}

/// Verarbeitet ein einzelnes Ereignis
#[async_trait]
pub trait EreignisVerarbeiter: Send + Sync + 'static {
    /// Ob Ereignisse dieser Guild ueberhaupt verarbeitet werden
    fn nimmt_an(&self, guild_id: GuildId) -> bool;

    async fn verarbeiten(&self, ereignis: Ereignis);
}

/// Standard-Verarbeitung: Presence-Automat und Textkanal-Bruecke
pub struct Verarbeitung {
    pub automat: PresenceAutomat,
    pub bruecke: TextKanalBruecke,
    pub verwaltung: SitzungsVerwaltung,
}

#[async_trait]
impl EreignisVerarbeiter for Verarbeitung {
    fn nimmt_an(&self, guild_id: GuildId) -> bool {
        self.verwaltung.ist_abonniert(guild_id)
    }

    async fn verarbeiten(&self, ereignis: Ereignis) {
        match ereignis {
            Ereignis::Presence { alt, neu } => {
                self.automat.verarbeiten(&alt, &neu).await;
            }
            Ereignis::Nachricht(nachricht) => {
                self.bruecke.nachricht_verarbeiten(&nachricht).await;
            }
        }
    }
}

/// Verteilt Ereignisse auf Worker pro Guild
///
/// Clone teilt die Worker.
pub struct EreignisVerteiler<V: EreignisVerarbeiter> {
    verarbeiter: Arc<V>,
    worker: Arc<DashMap<GuildId, mpsc::UnboundedSender<Ereignis>>>,
}

impl<V: EreignisVerarbeiter> Clone for EreignisVerteiler<V> {
    fn clone(&self) -> Self {
        Self {
            verarbeiter: self.verarbeiter.clone(),
            worker: self.worker.clone(),
        }
    }
}

impl<V: EreignisVerarbeiter> EreignisVerteiler<V> {
    pub fn neu(verarbeiter: Arc<V>) -> Self {
        Self {
            verarbeiter,
            worker: Arc::new(DashMap::new()),
        }
    }

    pub fn verarbeiter(&self) -> &Arc<V> {
        &self.verarbeiter
    }

    /// Reicht ein Ereignis ein ohne auf die Verarbeitung zu warten
    ///
    /// Ereignisse nicht angenommener Guilds werden verworfen (`false`); ein
    /// noch vorhandener Worker dieser Guild wird dabei entfernt.
    pub fn einreichen(&self, ereignis: Ereignis) -> bool {
        let guild_id = ereignis.guild_id();
        if !self.verarbeiter.nimmt_an(guild_id) {
            if self.worker.remove(&guild_id).is_some() {
                tracing::debug!(guild_id = %guild_id, "Worker einer nicht verfolgten Guild entfernt");
            }
            tracing::debug!(guild_id = %guild_id, "Ereignis einer nicht verfolgten Guild verworfen");
            return false;
        }

        let tx = self
            .worker
            .entry(guild_id)
            .or_insert_with(|| self.worker_starten(guild_id))
            .clone();

        if let Err(mpsc::error::SendError(ereignis)) = tx.send(ereignis) {
            tracing::warn!(guild_id = %guild_id, "Guild-Worker war beendet, starte neu");
            let tx = self.worker_starten(guild_id);
            let _ = tx.send(ereignis);
            self.worker.insert(guild_id, tx);
        }
        true
    }

    /// Beendet den Worker einer Guild nach Abarbeitung seiner Warteschlange
    pub fn worker_beenden(&self, guild_id: GuildId) {
        self.worker.remove(&guild_id);
    }

    /// Beendet alle Worker
    pub fn alle_beenden(&self) {
        self.worker.clear();
    }

    pub fn anzahl_worker(&self) -> usize {
        self.worker.len()
    }

    fn worker_starten(&self, guild_id: GuildId) -> mpsc::UnboundedSender<Ereignis> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let verarbeiter = self.verarbeiter.clone();
        tokio::spawn(async move {
            tracing::debug!(guild_id = %guild_id, "Guild-Worker gestartet");
            while let Some(ereignis) = rx.recv().await {
                verarbeiter.verarbeiten(ereignis).await;
            }
            tracing::debug!(guild_id = %guild_id, "Guild-Worker beendet");
        });
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ansager_core::{ChannelId, MitgliedInfo, UserId};
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Protokoll {
        eintraege: Mutex<Vec<(u64, u64)>>,
        angenommen: Mutex<HashSet<u64>>,
    }

    impl Protokoll {
        fn fuer(guilds: &[u64]) -> Arc<Self> {
            let p = Self::default();
            p.angenommen.lock().unwrap().extend(guilds);
            Arc::new(p)
        }
    }

    #[async_trait]
    impl EreignisVerarbeiter for Protokoll {
        fn nimmt_an(&self, guild_id: GuildId) -> bool {
            self.angenommen.lock().unwrap().contains(&guild_id.inner())
        }

        async fn verarbeiten(&self, ereignis: Ereignis) {
            let Ereignis::Nachricht(n) = ereignis else {
                return;
            };
            let nr: u64 = n.inhalt.parse().unwrap();
            // Fruehe Ereignisse brauchen laenger
            tokio::time::sleep(Duration::from_millis(50 - nr * 10)).await;
            self.eintraege.lock().unwrap().push((n.guild_id.inner(), nr));
        }
    }

    fn nachricht(guild: u64, nr: u64) -> Ereignis {
        Ereignis::Nachricht(TextNachricht {
            guild_id: GuildId(guild),
            kanal_id: ChannelId(1),
            autor: MitgliedInfo::mensch(UserId(9)),
            inhalt: nr.to_string(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn reihenfolge_pro_guild() {
        let protokoll = Protokoll::fuer(&[1, 2]);
        let verteiler = EreignisVerteiler::neu(protokoll.clone());

        for nr in 0..4 {
            verteiler.einreichen(nachricht(1, nr));
            verteiler.einreichen(nachricht(2, nr));
        }
        assert_eq!(verteiler.anzahl_worker(), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let eintraege = protokoll.eintraege.lock().unwrap().clone();
        for guild in [1, 2] {
            let folge: Vec<u64> = eintraege
                .iter()
                .filter(|(g, _)| *g == guild)
                .map(|(_, nr)| *nr)
                .collect();
            assert_eq!(folge, vec![0, 1, 2, 3]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn worker_wird_nach_beenden_neu_gestartet() {
        let protokoll = Protokoll::fuer(&[1]);
        let verteiler = EreignisVerteiler::neu(protokoll.clone());

        verteiler.einreichen(nachricht(1, 0));
        verteiler.worker_beenden(GuildId(1));
        assert_eq!(verteiler.anzahl_worker(), 0);

        verteiler.einreichen(nachricht(1, 1));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(protokoll.eintraege.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fremde_guilds_bekommen_keinen_worker() {
        let protokoll = Protokoll::fuer(&[1]);
        let verteiler = EreignisVerteiler::neu(protokoll.clone());

        for guild in 100..1100 {
            assert!(!verteiler.einreichen(nachricht(guild, 0)));
        }
        assert_eq!(verteiler.anzahl_worker(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(protokoll.eintraege.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn worker_faellt_mit_der_guild_weg() {
        let protokoll = Protokoll::fuer(&[1, 2]);
        let verteiler = EreignisVerteiler::neu(protokoll.clone());

        assert!(verteiler.einreichen(nachricht(1, 0)));
        assert!(verteiler.einreichen(nachricht(2, 0)));
        assert_eq!(verteiler.anzahl_worker(), 2);

        protokoll.angenommen.lock().unwrap().remove(&1);
        assert!(!verteiler.einreichen(nachricht(1, 1)));
        assert_eq!(verteiler.anzahl_worker(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let eintraege = protokoll.eintraege.lock().unwrap().clone();
        assert!(!eintraege.contains(&(1, 1)));
        assert!(eintraege.contains(&(2, 0)));
    }
}
