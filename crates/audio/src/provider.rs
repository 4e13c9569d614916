//! TTS-Provider-Vertrag und Payload-Modell
//!
//! Ein Provider macht aus `(satz, optionen)` eine geordnete Liste abspielbarer
//! Payloads. Konkrete Anbieter (Google Cloud, ElevenLabs, ...) sind externe
//! Implementierungen dieses Traits und werden per Konfiguration ueber die
//! [`ProviderRegistry`] ausgewaehlt.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};
use tokio::io::AsyncRead;

use ansager_core::{AnsagerError, Result, Sprachcode};

/// Boxed Byte-Strom wie ihn Provider und Transkodierer liefern
pub type ByteStrom = Box<dyn AsyncRead + Send + Unpin>;

/// Rohe Audioquelle eines Payloads
pub enum AudioQuelle {
    /// Vollstaendig gepufferte Antwort
    Puffer(Bytes),
    /// Strom der erst beim Abspielen gelesen wird
    Strom(ByteStrom),
}

impl AudioQuelle {
    /// Einheitliche Lese-Sicht auf beide Varianten
    pub fn in_leser(self) -> ByteStrom {
        match self {
            Self::Puffer(bytes) => Box::new(std::io::Cursor::new(bytes)),
            Self::Strom(strom) => strom,
        }
    }
}

impl std::fmt::Debug for AudioQuelle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Puffer(b) => write!(f, "Puffer({} Bytes)", b.len()),
            Self::Strom(_) => f.write_str("Strom"),
        }
    }
}

/// Offene Zusatzinformationen (Sprache, Voice-ID, Formathinweise)
///
/// Nur fuer Logging/Diagnose, nie fuer Steuerlogik.
pub type Extras = Map<String, Value>;

/// Eine Einheit synthetisierten Audios
#[derive(Debug)]
pub struct Payload {
    pub quelle: AudioQuelle,
    /// Der Satz der hier gesprochen wird
    pub satz: String,
    /// Name des erzeugenden Providers
    pub provider: String,
    pub extras: Extras,
}

impl Payload {
    pub fn neu(quelle: AudioQuelle, satz: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            quelle,
            satz: satz.into(),
            provider: provider.into(),
            extras: Extras::new(),
        }
    }

    /// Fuegt ein Extra hinzu (Builder)
    pub fn mit_extra(mut self, schluessel: &str, wert: impl Into<Value>) -> Self {
        self.extras.insert(schluessel.to_string(), wert.into());
        self
    }
}

/// Optionen eines Provider-Aufrufs
///
/// Enthaelt mindestens die Sprache. Unbekannte Schluessel muessen von
/// Providern ignoriert werden.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderOptionen {
    werte: Map<String, Value>,
}

impl ProviderOptionen {
    pub const SPRACHE: &'static str = "language";

    pub fn mit_sprache(sprache: &Sprachcode) -> Self {
        Self::default().mit(Self::SPRACHE, sprache.als_str())
    }

    /// Setzt eine beliebige Option (Builder)
    pub fn mit(mut self, schluessel: &str, wert: impl Into<Value>) -> Self {
        self.werte.insert(schluessel.to_string(), wert.into());
        self
    }

    pub fn get(&self, schluessel: &str) -> Option<&Value> {
        self.werte.get(schluessel)
    }

    pub fn sprache(&self) -> Option<Sprachcode> {
        self.get(Self::SPRACHE)
            .and_then(Value::as_str)
            .map(Sprachcode::neu)
    }
}

/// Vertrag eines TTS-Anbieters
#[async_trait]
pub trait TtsProvider: Send + Sync {
    /// Name fuer Logs und `Payload::provider`
    fn name(&self) -> &str;

    /// Synthetisiert `satz`; Payloads sind in Abspielreihenfolge
    ///
    /// Fehler des Upstreams oder leere/kaputte Audiodaten sind ein `Err`,
    /// nie eine leere Erfolgsliste.
    async fn erstellen(&self, satz: &str, optionen: &ProviderOptionen) -> Result<Vec<Payload>>;
}

/// Prueft das Ergebnis eines Providers gegen den Vertrag
///
/// Eine leere Liste oder ein leerer Puffer wird zu einem Provider-Fehler.
pub fn payloads_pruefen(provider: &str, payloads: Vec<Payload>) -> Result<Vec<Payload>> {
    if payloads.is_empty() {
        return Err(AnsagerError::provider(provider, "keine Payloads geliefert"));
    }
    if let Some(leer) = payloads
        .iter()
        .find(|p| matches!(&p.quelle, AudioQuelle::Puffer(b) if b.is_empty()))
    {
        return Err(AnsagerError::provider(
            provider,
            format!("leerer Audiopuffer fuer \"{}\"", leer.satz),
        ));
    }
    Ok(payloads)
}

/// Per Konfiguration auswaehlbare Provider
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    provider: HashMap<String, Arc<dyn TtsProvider>>,
}

impl ProviderRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert einen Provider unter seinem Namen
    pub fn registrieren(&mut self, provider: Arc<dyn TtsProvider>) {
        let name = provider.name().to_string();
        tracing::debug!(provider = %name, "TTS-Provider registriert");
        self.provider.insert(name, provider);
    }

    pub fn auswaehlen(&self, name: &str) -> Result<Arc<dyn TtsProvider>> {
        self.provider.get(name).cloned().ok_or_else(|| {
            let mut bekannt: Vec<&str> = self.provider.keys().map(String::as_str).collect();
            bekannt.sort_unstable();
            AnsagerError::Konfiguration(format!(
                "unbekannter TTS-Provider '{name}' (bekannt: {})",
                bekannt.join(", ")
            ))
        })
    }
}
