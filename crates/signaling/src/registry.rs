//! Sitzungsverwaltung – welche Guild hat welchen Ansager
//!
//! Einzige Quelle der Wahrheit fuer die Zuordnung Guild -> Ansager. Jede
//! Guild hat eine eigene Sperre; wer den Ansager einer Guild anlegt oder
//! abbaut, haelt diese Sperre. Verschiedene Guilds blockieren sich nie.
//!
//! Drei Zustaende pro Guild:
//! - nicht verfolgt (nie abonniert oder abbestellt)
//! - verfolgt, kein Ansager
//! - verfolgt, Ansager aktiv (immer verbunden und lebendig)

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use ansager_core::{AnsagerError, ChannelId, GuildId, Result, Sprachcode};
use ansager_db::GuildEinstellungen;
use ansager_voice::{Ansager, AnsagerFabrik};

use crate::phrasen;

/// Ergebnis von [`SitzungsVerwaltung::get`]
#[derive(Debug, Clone)]
pub enum SitzungsZustand {
    /// Guild wird nicht verfolgt – nichts tun
    NichtVerfolgt,
    /// Guild wird verfolgt, aber es gibt keinen Ansager
    Abwesend,
    Aktiv(Arc<Ansager>),
}

impl SitzungsZustand {
    pub fn ansager(&self) -> Option<&Arc<Ansager>> {
        match self {
            Self::Aktiv(a) => Some(a),
            _ => None,
        }
    }

    pub fn ist_verfolgt(&self) -> bool {
        !matches!(self, Self::NichtVerfolgt)
    }
}

#[derive(Default)]
struct GuildSitzung {
    ansager: Option<Arc<Ansager>>,
    /// Gesetzt von `abbestellen`; wartende Sperrer sehen dann "nicht verfolgt"
    entfernt: bool,
}

struct Inner {
    sitzungen: DashMap<GuildId, Arc<Mutex<GuildSitzung>>>,
    fabrik: AnsagerFabrik,
    einstellungen: GuildEinstellungen,
}

/// Verwaltung aller Guild-Sitzungen
///
/// Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct SitzungsVerwaltung {
    inner: Arc<Inner>,
}

impl SitzungsVerwaltung {
    pub fn neu(fabrik: AnsagerFabrik, einstellungen: GuildEinstellungen) -> Self {
        Self {
            inner: Arc::new(Inner {
                sitzungen: DashMap::new(),
                fabrik,
                einstellungen,
            }),
        }
    }

    /// Beginnt die Verfolgung einer Guild (ohne Ansager)
    ///
    /// Mehrfaches Abonnieren aendert eine bestehende Sitzung nicht.
    pub fn abonnieren(&self, guild_id: GuildId) -> SitzungsZugriff {
        self.inner.sitzungen.entry(guild_id).or_insert_with(|| {
            tracing::info!(guild_id = %guild_id, "Guild abonniert");
            Arc::new(Mutex::new(GuildSitzung::default()))
        });
        SitzungsZugriff {
            guild_id,
            verwaltung: self.clone(),
        }
    }

    /// Beendet die Verfolgung und zerstoert einen eventuellen Ansager
    pub async fn abbestellen(&self, guild_id: GuildId) {
        let Some((_, sitzung)) = self.inner.sitzungen.remove(&guild_id) else {
            return;
        };
        let mut sitzung = sitzung.lock().await;
        sitzung.entfernt = true;
        if let Some(ansager) = sitzung.ansager.take() {
            ansager.zerstoeren();
        }
        tracing::info!(guild_id = %guild_id, "Guild abbestellt");
    }

    pub fn ist_abonniert(&self, guild_id: GuildId) -> bool {
        self.inner.sitzungen.contains_key(&guild_id)
    }

    /// Alle verfolgten Guilds
    pub fn guilds(&self) -> Vec<GuildId> {
        self.inner.sitzungen.iter().map(|e| *e.key()).collect()
    }

    /// Aktueller Zustand einer Guild
    pub async fn get(&self, guild_id: GuildId) -> SitzungsZustand {
        match self.sperren(guild_id).await {
            Some(sperre) => match sperre.ansager() {
                Some(a) => SitzungsZustand::Aktiv(a),
                None => SitzungsZustand::Abwesend,
            },
            None => SitzungsZustand::NichtVerfolgt,
        }
    }

    /// Sperrt die Sitzung einer Guild; `None` wenn nicht verfolgt
    pub async fn sperren(&self, guild_id: GuildId) -> Option<SitzungsSperre> {
        // DashMap-Referenz vor dem await freigeben
        let sitzung = self.inner.sitzungen.get(&guild_id).map(|e| e.value().clone())?;
        let sitzung = sitzung.lock_owned().await;
        if sitzung.entfernt {
            return None;
        }
        Some(SitzungsSperre {
            guild_id,
            sitzung,
            verwaltung: self.clone(),
        })
    }

    /// Manueller Beitritt in einen Kanal (ohne Presence-Ereignis)
    ///
    /// Ein bereits aktiver Ansager bleibt unveraendert und wird zurueckgegeben.
    pub async fn beitreten(&self, guild_id: GuildId, kanal_id: ChannelId) -> Result<Arc<Ansager>> {
        let mut sperre = self
            .sperren(guild_id)
            .await
            .ok_or(AnsagerError::NichtVerfolgt(guild_id.inner()))?;
        if let Some(ansager) = sperre.ansager() {
            tracing::debug!(
                guild_id = %guild_id,
                kanal_id = %ansager.kanal_id(),
                "Ansager bereits aktiv"
            );
            return Ok(ansager);
        }
        sperre.ansager_starten(kanal_id).await
    }

    /// Speichert die Stimmsprache und uebernimmt sie in einen aktiven Ansager
    ///
    /// Gibt den passenden Bot-Spitznamen zurueck.
    pub async fn stimmsprache_setzen(
        &self,
        guild_id: GuildId,
        sprache: Sprachcode,
    ) -> Result<&'static str> {
        sprache_pruefen(&sprache)?;
        self.inner
            .einstellungen
            .stimmsprache_setzen(guild_id, &sprache)
            .await?;
        if let SitzungsZustand::Aktiv(ansager) = self.get(guild_id).await {
            ansager.sprache_setzen(sprache.clone());
        }
        Ok(phrasen::bot_spitzname(&sprache))
    }

    /// Speichert die Sprache der Ansage-Texte
    pub async fn textsprache_setzen(&self, guild_id: GuildId, sprache: Sprachcode) -> Result<()> {
        sprache_pruefen(&sprache)?;
        self.inner
            .einstellungen
            .textsprache_setzen(guild_id, &sprache)
            .await
    }

    /// Zerstoert `ansager` nach einer Trennung durch die Plattform
    ///
    /// Die Sitzung wird nur zurueckgesetzt, wenn sie noch genau diesen
    /// Ansager haelt.
    fn trennung_ueberwachen(&self, guild_id: GuildId, ansager: Arc<Ansager>) {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            ansager.auf_trennung_warten().await;

            if let Some(inner) = inner.upgrade() {
                let verwaltung = SitzungsVerwaltung { inner };
                if let Some(mut sperre) = verwaltung.sperren(guild_id).await {
                    let gleich = sperre
                        .sitzung
                        .ansager
                        .as_ref()
                        .is_some_and(|a| Arc::ptr_eq(a, &ansager));
                    if gleich {
                        sperre.sitzung.ansager = None;
                        tracing::info!(
                            guild_id = %guild_id,
                            kanal_id = %ansager.kanal_id(),
                            "Sprachverbindung getrennt, Ansager entfernt"
                        );
                    }
                }
            }
            ansager.zerstoeren();
        });
    }
}

fn sprache_pruefen(sprache: &Sprachcode) -> Result<()> {
    if sprache.ist_unterstuetzt() {
        Ok(())
    } else {
        Err(AnsagerError::UnbekannteSprache(sprache.als_str().to_string()))
    }
}

/// Gesperrte Sitzung einer Guild
///
/// Solange die Sperre gehalten wird, kann niemand sonst den Ansager dieser
/// Guild anlegen oder abbauen.
pub struct SitzungsSperre {
    guild_id: GuildId,
    sitzung: OwnedMutexGuard<GuildSitzung>,
    verwaltung: SitzungsVerwaltung,
}

impl SitzungsSperre {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn ansager(&self) -> Option<Arc<Ansager>> {
        self.sitzung.ansager.clone()
    }

    /// Verbindet einen neuen Ansager in `kanal_id`
    ///
    /// Nur bei Erfolg wird er eingetragen; bei Fehlern bleibt die Sitzung
    /// ohne Ansager.
    pub async fn ansager_starten(&mut self, kanal_id: ChannelId) -> Result<Arc<Ansager>> {
        if let Some(ansager) = self.ansager() {
            return Ok(ansager);
        }
        let inner = &self.verwaltung.inner;
        let sprache = inner.einstellungen.stimmsprache(self.guild_id).await;
        let ansager = inner
            .fabrik
            .verbinden(self.guild_id, kanal_id, sprache)
            .await?;

        self.sitzung.ansager = Some(ansager.clone());
        self.verwaltung
            .trennung_ueberwachen(self.guild_id, ansager.clone());
        Ok(ansager)
    }

    /// Zerstoert den Ansager; true wenn einer da war
    pub fn ansager_beenden(&mut self) -> bool {
        match self.sitzung.ansager.take() {
            Some(ansager) => {
                ansager.zerstoeren();
                true
            }
            None => false,
        }
    }
}

/// Zugriff auf die Sitzung einer abonnierten Guild
#[derive(Clone)]
pub struct SitzungsZugriff {
    guild_id: GuildId,
    verwaltung: SitzungsVerwaltung,
}

impl SitzungsZugriff {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub async fn get(&self) -> SitzungsZustand {
        self.verwaltung.get(self.guild_id).await
    }
}
