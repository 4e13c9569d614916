//! Ansager: eine Sprachverbindung, ein Player, eine Warteschlange
//!
//! Zustandsautomat der Wiedergabe:
//! ```text
//! Leerlauf --(Eintrag entnommen)--> Spielt
//! Spielt --(Ende/Fehler, Queue leer)--> Leerlauf
//! Spielt --(Ende/Fehler, Queue nicht leer)--> Spielt (naechster Eintrag)
//! ```
//! Ein neues `sprechen` unterbricht nie eine laufende Wiedergabe.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;

use ansager_audio::{
    payloads_pruefen, AudioRessource, ProviderOptionen, StromAdapter, TranskodierAbbruch,
    TtsProvider,
};
use ansager_core::{AnsagerError, ChannelId, GuildId, Result, Sprachcode};

use crate::queue::WiedergabeQueue;
use crate::transport::{
    AudioPlayer, SprachTransport, SprachVerbindung, VerbindungsStatus, WiedergabeEnde,
};

/// Standard-Wartezeit bis die Verbindung bereit sein muss
pub const STANDARD_VERBINDUNGS_TIMEOUT: Duration = Duration::from_secs(5);

/// Laufzeit-Optionen fuer neue Ansager
#[derive(Debug, Clone)]
pub struct AnsagerOptionen {
    pub verbindungs_timeout: Duration,
}

impl Default for AnsagerOptionen {
    fn default() -> Self {
        Self {
            verbindungs_timeout: STANDARD_VERBINDUNGS_TIMEOUT,
        }
    }
}

/// Erzeugt verbundene Ansager mit gemeinsamem Transport und Provider
#[derive(Clone)]
pub struct AnsagerFabrik {
    transport: Arc<dyn SprachTransport>,
    provider: Arc<dyn TtsProvider>,
    adapter: StromAdapter,
    optionen: AnsagerOptionen,
}

impl AnsagerFabrik {
    pub fn neu(
        transport: Arc<dyn SprachTransport>,
        provider: Arc<dyn TtsProvider>,
        adapter: StromAdapter,
        optionen: AnsagerOptionen,
    ) -> Self {
        Self {
            transport,
            provider,
            adapter,
            optionen,
        }
    }

    /// Tritt `kanal_id` bei und wartet bis die Verbindung bereit ist
    ///
    /// Bei Zeitueberschreitung wird die halbfertige Verbindung abgebaut und
    /// `Verbindungszeitlimit` zurueckgegeben.
    pub async fn verbinden(
        &self,
        guild_id: GuildId,
        kanal_id: ChannelId,
        sprache: Sprachcode,
    ) -> Result<Arc<Ansager>> {
        let verbindung = self.transport.beitreten(guild_id, kanal_id).await?;
        let timeout = self.optionen.verbindungs_timeout;

        match tokio::time::timeout(timeout, bereit_abwarten(verbindung.as_ref())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                verbindung.zerstoeren();
                return Err(e);
            }
            Err(_) => {
                verbindung.zerstoeren();
                tracing::warn!(
                    guild_id = %guild_id,
                    kanal_id = %kanal_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Sprachverbindung nicht rechtzeitig bereit"
                );
                return Err(AnsagerError::Verbindungszeitlimit {
                    millis: timeout.as_millis() as u64,
                });
            }
        }

        let player = self.transport.player_erstellen();
        verbindung.abonnieren(player.clone());

        tracing::info!(
            guild_id = %guild_id,
            kanal_id = %kanal_id,
            sprache = %sprache,
            "Ansager verbunden"
        );

        Ok(Arc::new(Ansager {
            guild_id,
            kanal_id,
            verbindung,
            kern: Arc::new(Kern {
                guild_id,
                player,
                zustand: Mutex::new(Wiedergabe::default()),
            }),
            provider: self.provider.clone(),
            adapter: self.adapter.clone(),
            sprache: RwLock::new(sprache),
            reihenfolge: tokio::sync::Mutex::new(()),
        }))
    }
}

async fn bereit_abwarten(verbindung: &dyn SprachVerbindung) -> Result<()> {
    let mut status = verbindung.status();
    loop {
        let aktuell = *status.borrow_and_update();
        match aktuell {
            VerbindungsStatus::Bereit => return Ok(()),
            s if s.ist_endgueltig() => {
                return Err(AnsagerError::Verbindung(format!(
                    "Verbindung beim Aufbau beendet ({s:?})"
                )))
            }
            _ => {}
        }
        if status.changed().await.is_err() {
            return Err(AnsagerError::Verbindung("Statuskanal geschlossen".into()));
        }
    }
}

#[derive(Default)]
struct Wiedergabe {
    spielt: bool,
    zerstoert: bool,
    queue: WiedergabeQueue<AudioRessource>,
    /// Transkodierung der gerade laufenden Wiedergabe
    aktuell: Option<TranskodierAbbruch>,
}

/// Von Abschluss-Tasks geteilter Teil des Ansagers
struct Kern {
    guild_id: GuildId,
    player: Arc<dyn AudioPlayer>,
    zustand: Mutex<Wiedergabe>,
}

impl Kern {
    /// Uebergibt den naechsten Eintrag an den Player oder geht in Leerlauf
    fn naechstes_abspielen(self: &Arc<Self>) {
        let ressource = {
            let mut z = self.zustand.lock();
            if z.zerstoert {
                return;
            }
            match z.queue.entnehmen() {
                Some(r) => {
                    z.spielt = true;
                    z.aktuell = r.abbruch();
                    r
                }
                None => {
                    z.spielt = false;
                    z.aktuell = None;
                    return;
                }
            }
        };

        tracing::debug!(
            guild_id = %self.guild_id,
            satz = ressource.satz(),
            format = ressource.format().als_str(),
            "Wiedergabe startet"
        );

        let (tx, rx) = oneshot::channel();
        self.player.abspielen(ressource, tx);

        let kern = self.clone();
        tokio::spawn(async move {
            match rx.await {
                Ok(WiedergabeEnde::Fertig) => {}
                Ok(WiedergabeEnde::Fehler(grund)) => {
                    tracing::warn!(
                        guild_id = %kern.guild_id,
                        grund = %grund,
                        "Wiedergabe fehlgeschlagen, naechster Eintrag"
                    );
                }
                Err(_) => {
                    tracing::debug!(guild_id = %kern.guild_id, "Player hat Ende nicht gemeldet");
                }
            }
            kern.naechstes_abspielen();
        });
    }
}

/// Verbundener Ansager einer Guild
pub struct Ansager {
    guild_id: GuildId,
    kanal_id: ChannelId,
    verbindung: Arc<dyn SprachVerbindung>,
    kern: Arc<Kern>,
    provider: Arc<dyn TtsProvider>,
    adapter: StromAdapter,
    sprache: RwLock<Sprachcode>,
    /// Haelt Provider-Aufruf und Einreihen eines `sprechen` zusammen
    reihenfolge: tokio::sync::Mutex<()>,
}

impl Ansager {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Der einzige Kanal an den dieser Ansager gebunden ist
    pub fn kanal_id(&self) -> ChannelId {
        self.kanal_id
    }

    pub fn ist_auf_kanal(&self, kanal_id: ChannelId) -> bool {
        self.kanal_id == kanal_id
    }

    pub fn sprache(&self) -> Sprachcode {
        self.sprache.read().clone()
    }

    /// Setzt die Stimmsprache fuer folgende `sprechen`-Aufrufe
    pub fn sprache_setzen(&self, sprache: Sprachcode) {
        tracing::debug!(guild_id = %self.guild_id, sprache = %sprache, "Stimmsprache gesetzt");
        *self.sprache.write() = sprache;
    }

    pub fn spielt(&self) -> bool {
        self.kern.zustand.lock().spielt
    }

    pub fn warteschlange_laenge(&self) -> usize {
        self.kern.zustand.lock().queue.len()
    }

    pub fn ist_zerstoert(&self) -> bool {
        self.kern.zustand.lock().zerstoert
    }

    /// Synthetisiert `text` und spielt ihn nach allen frueheren Aufrufen ab
    ///
    /// Provider-Fehler werden zurueckgegeben; der Ansager bleibt benutzbar.
    pub async fn sprechen(&self, text: &str) -> Result<()> {
        if self.ist_zerstoert() {
            return Err(AnsagerError::NichtVerbunden);
        }
        let _reihenfolge = self.reihenfolge.lock().await;

        let optionen = ProviderOptionen::mit_sprache(&self.sprache());
        let payloads = self.provider.erstellen(text, &optionen).await.map_err(|e| {
            tracing::warn!(
                guild_id = %self.guild_id,
                provider = self.provider.name(),
                fehler = %e,
                "TTS-Provider fehlgeschlagen"
            );
            e
        })?;
        let payloads = payloads_pruefen(self.provider.name(), payloads)?;

        for payload in payloads {
            let ressource = self.adapter.aufbereiten(payload).await?;
            self.einreihen(ressource)?;
        }
        Ok(())
    }

    fn einreihen(&self, ressource: AudioRessource) -> Result<()> {
        let sofort = {
            let mut z = self.kern.zustand.lock();
            if z.zerstoert {
                return Err(AnsagerError::NichtVerbunden);
            }
            z.queue.einreihen(ressource);
            if z.spielt {
                false
            } else {
                z.spielt = true;
                true
            }
        };

        if sofort {
            self.kern.naechstes_abspielen();
        }
        Ok(())
    }

    /// Wartet bis die Verbindung von aussen beendet wird
    pub async fn auf_trennung_warten(&self) {
        let mut status = self.verbindung.status();
        loop {
            if status.borrow_and_update().ist_endgueltig() {
                return;
            }
            if status.changed().await.is_err() {
                return;
            }
        }
    }

    /// Baut Verbindung, Player und Warteschlange ab
    ///
    /// Idempotent. Laufende Transkodierungen werden abgebrochen, noch nicht
    /// gespielte Eintraege verworfen.
    pub fn zerstoeren(&self) {
        let (queue, aktuell) = {
            let mut z = self.kern.zustand.lock();
            if z.zerstoert {
                return;
            }
            z.zerstoert = true;
            z.spielt = false;
            (std::mem::take(&mut z.queue), z.aktuell.take())
        };

        self.verbindung.abbestellen();
        self.verbindung.zerstoeren();
        self.kern.player.stoppen();
        if let Some(abbruch) = aktuell {
            abbruch.abbrechen();
        }
        let verworfen = queue.len();
        // Wartende Ressourcen beenden ihre Prozesse beim Fallenlassen
        drop(queue);

        tracing::info!(
            guild_id = %self.guild_id,
            kanal_id = %self.kanal_id,
            verworfen,
            "Ansager zerstoert"
        );
    }
}

impl std::fmt::Debug for Ansager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ansager")
            .field("guild_id", &self.guild_id)
            .field("kanal_id", &self.kanal_id)
            .field("sprache", &*self.sprache.read())
            .finish()
    }
}
