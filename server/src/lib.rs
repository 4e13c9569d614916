//! ansager-server – Zusammenbau des Ansager-Bots
//!
//! Die Plattform-Anbindung (Gateway, Sprachtransport, Kanalabfrage) und die
//! konkreten TTS-Provider werden von aussen hineingereicht. Hier werden
//! Speicher, Einstellungen, Sitzungsverwaltung und Verteiler aus der
//! Konfiguration gebaut.

pub mod config;
pub mod logging;

use std::sync::Arc;

use anyhow::Result;

use ansager_audio::{FfmpegStarter, ProviderRegistry, StromAdapter};
use ansager_core::{GuildId, UserId};
use ansager_db::{AliasSpeicher, GuildEinstellungen, SchluesselWertSpeicher, SqliteSpeicher};
use ansager_signaling::{
    Ereignis, EreignisVerarbeiter, EreignisVerteiler, KanalAbfrage, PresenceAutomat,
    SitzungsVerwaltung, TextKanalBruecke, Verarbeitung,
};
use ansager_voice::{AnsagerFabrik, SprachTransport};

use config::AnsagerConfig;

/// Von der Plattform-Anbindung bereitgestellte Bausteine
pub struct Plattform {
    pub transport: Arc<dyn SprachTransport>,
    pub kanaele: Arc<dyn KanalAbfrage>,
    pub provider: ProviderRegistry,
}

/// Laufender Bot
pub struct Bot {
    verwaltung: SitzungsVerwaltung,
    einstellungen: GuildEinstellungen,
    aliase: Arc<AliasSpeicher>,
    verteiler: EreignisVerteiler<Verarbeitung>,
}

impl Bot {
    /// Oeffnet die SQLite-Datenbank und baut den Bot zusammen
    pub async fn starten(config: AnsagerConfig, plattform: Plattform) -> Result<Self> {
        let speicher = SqliteSpeicher::oeffnen(&config.datenbank.db_config())
            .await
            .map_err(|e| anyhow::anyhow!("Datenbank nicht verfuegbar: {e}"))?;
        Self::mit_speicher(config, plattform, Arc::new(speicher))
    }

    /// Baut den Bot auf einem beliebigen Schluessel-Wert-Speicher zusammen
    pub fn mit_speicher(
        config: AnsagerConfig,
        plattform: Plattform,
        speicher: Arc<dyn SchluesselWertSpeicher>,
    ) -> Result<Self> {
        let provider = plattform.provider.auswaehlen(&config.tts.provider)?;

        let einstellungen = GuildEinstellungen::neu(speicher.clone())
            .mit_standards(config.sprache.text(), config.sprache.stimme());
        let aliase = Arc::new(AliasSpeicher::mit_max_laenge(
            speicher,
            config.alias.max_laenge,
        ));

        let starter = Arc::new(FfmpegStarter::neu(config.audio.transkodier_config()));
        let adapter = StromAdapter::neu(starter).mit_peek_grenze(config.audio.peek_grenze);
        let fabrik = AnsagerFabrik::neu(
            plattform.transport,
            provider,
            adapter,
            config.audio.ansager_optionen(),
        );

        let verwaltung = SitzungsVerwaltung::neu(fabrik, einstellungen.clone());
        let eigene_id = UserId(config.bot.eigene_user_id);

        let automat = PresenceAutomat::neu(
            verwaltung.clone(),
            einstellungen.clone(),
            aliase.clone(),
            plattform.kanaele,
            eigene_id,
        );
        let bruecke = TextKanalBruecke::neu(verwaltung.clone(), einstellungen.clone(), eigene_id);
        let verteiler = EreignisVerteiler::neu(Arc::new(Verarbeitung {
            automat,
            bruecke,
            verwaltung: verwaltung.clone(),
        }));

        for guild in &config.bot.guilds {
            verwaltung.abonnieren(GuildId(*guild));
        }

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            provider = %config.tts.provider,
            guilds = config.bot.guilds.len(),
            eigene_user_id = config.bot.eigene_user_id,
            "Ansager-Bot bereit"
        );

        Ok(Self {
            verwaltung,
            einstellungen,
            aliase,
            verteiler,
        })
    }

    /// Reicht ein Plattform-Ereignis ein ohne zu warten
    ///
    /// `false` wenn die Guild nicht verfolgt wird und das Ereignis verworfen
    /// wurde.
    pub fn einreichen(&self, ereignis: Ereignis) -> bool {
        self.verteiler.einreichen(ereignis)
    }

    /// Beginnt die Verfolgung einer Guild (z.B. nach Beitritt des Bots)
    pub fn abonnieren(&self, guild_id: GuildId) {
        self.verwaltung.abonnieren(guild_id);
    }

    /// Beendet die Verfolgung einer Guild samt Worker und Ansager
    pub async fn abbestellen(&self, guild_id: GuildId) {
        self.verteiler.worker_beenden(guild_id);
        self.verwaltung.abbestellen(guild_id).await;
    }

    pub fn anzahl_worker(&self) -> usize {
        self.verteiler.anzahl_worker()
    }

    /// Verarbeitet ein Ereignis direkt und wartet auf das Ende
    ///
    /// Umgeht die Worker; der Aufrufer ist fuer die Reihenfolge pro Guild
    /// verantwortlich.
    pub async fn verarbeiten(&self, ereignis: Ereignis) {
        self.verteiler.verarbeiter().verarbeiten(ereignis).await;
    }

    pub fn verwaltung(&self) -> &SitzungsVerwaltung {
        &self.verwaltung
    }

    pub fn einstellungen(&self) -> &GuildEinstellungen {
        &self.einstellungen
    }

    pub fn aliase(&self) -> &AliasSpeicher {
        &self.aliase
    }

    pub fn textkanaele(&self) -> &TextKanalBruecke {
        &self.verteiler.verarbeiter().bruecke
    }

    /// Beendet alle Worker und baut alle Ansager ab
    pub async fn herunterfahren(&self) {
        self.verteiler.alle_beenden();
        for guild in self.verwaltung.guilds() {
            self.abbestellen(guild).await;
        }
        tracing::info!("Ansager-Bot heruntergefahren");
    }
}
