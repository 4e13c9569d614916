//! Stromadapter: Payload -> abspielbare Audio-Ressource
//!
//! Liest den Stromanfang vor, erkennt den Container und reicht Ogg/Opus
//! unveraendert durch. Alles andere laeuft durch den Transkodierer.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

use ansager_core::{AnsagerError, Result};

use crate::format::{Aufbereitung, Containerformat, SNIFF_BYTES};
use crate::peek::{PeekLeser, PEEK_GRENZE};
use crate::provider::{ByteStrom, Payload};
use crate::transcode::{
    transkodieren, ProzessStarter, Strategie, TranskodierAbbruch, TranskodierGriff,
};

/// Abspielbare Ressource (Ogg/Opus-Strom)
///
/// Haelt eine eventuell laufende Transkodierung am Leben. Wird die
/// Ressource fallen gelassen, wird der Transkodierprozess sofort beendet.
pub struct AudioRessource {
    strom: ByteStrom,
    format: Containerformat,
    satz: String,
    provider: String,
    griff: Option<TranskodierGriff>,
}

impl AudioRessource {
    /// Ressource aus einem bereits abspielbaren Strom
    pub fn direkt(strom: ByteStrom, satz: impl Into<String>) -> Self {
        Self {
            strom,
            format: Containerformat::OggOpus,
            satz: satz.into(),
            provider: String::new(),
            griff: None,
        }
    }

    /// Erkanntes Format des Eingangsstroms
    pub fn format(&self) -> Containerformat {
        self.format
    }

    pub fn satz(&self) -> &str {
        &self.satz
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn wird_transkodiert(&self) -> bool {
        self.griff.is_some()
    }

    /// Abbruch der Transkodierung samt Prozess, falls eine laeuft
    pub fn abbruch(&self) -> Option<TranskodierAbbruch> {
        self.griff.as_ref().map(TranskodierGriff::abbruch)
    }

    /// Nimmt den Transkodier-Griff heraus (z.B. um auf das Ergebnis zu warten)
    pub fn griff_nehmen(&mut self) -> Option<TranskodierGriff> {
        self.griff.take()
    }
}

impl AsyncRead for AudioRessource {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().strom).poll_read(cx, buf)
    }
}

impl std::fmt::Debug for AudioRessource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioRessource")
            .field("format", &self.format)
            .field("satz", &self.satz)
            .field("provider", &self.provider)
            .field("transkodiert", &self.griff.is_some())
            .finish()
    }
}

/// Bereitet Payloads fuer die Wiedergabe auf
#[derive(Clone)]
pub struct StromAdapter {
    starter: Arc<dyn ProzessStarter>,
    peek_grenze: usize,
}

impl StromAdapter {
    pub fn neu(starter: Arc<dyn ProzessStarter>) -> Self {
        Self {
            starter,
            peek_grenze: PEEK_GRENZE,
        }
    }

    pub fn mit_peek_grenze(mut self, grenze: usize) -> Self {
        self.peek_grenze = grenze.max(SNIFF_BYTES);
        self
    }

    /// Macht aus einem Payload eine abspielbare Ressource
    ///
    /// Ein leerer Strom ist ein Provider-Fehler. Ogg/Opus startet keinen
    /// Prozess, unbekannte Formate versuchen zuerst Remux.
    pub async fn aufbereiten(&self, payload: Payload) -> Result<AudioRessource> {
        let Payload {
            quelle,
            satz,
            provider,
            extras,
        } = payload;

        let mut leser = PeekLeser::neu(quelle.in_leser(), self.peek_grenze);
        let kopf = leser.peek(SNIFF_BYTES).await.map_err(|e| {
            AnsagerError::provider(&provider, format!("Audiostrom nicht lesbar: {e}"))
        })?;
        if kopf.is_empty() {
            return Err(AnsagerError::provider(&provider, "leerer Audiostrom"));
        }
        let format = Containerformat::erkennen(kopf);

        tracing::debug!(
            provider = %provider,
            format = format.als_str(),
            extras = ?extras,
            "Payload erkannt"
        );

        let strom: ByteStrom = Box::new(leser.in_leser());
        let (strom, griff) = match format.aufbereitung() {
            Aufbereitung::Durchreichen => (strom, None),
            Aufbereitung::Remux => self.transkodiert(strom, Strategie::Remux)?,
            Aufbereitung::NeuKodieren => self.transkodiert(strom, Strategie::NeuKodieren)?,
        };

        Ok(AudioRessource {
            strom,
            format,
            satz,
            provider,
            griff,
        })
    }

    fn transkodiert(
        &self,
        strom: ByteStrom,
        strategie: Strategie,
    ) -> Result<(ByteStrom, Option<TranskodierGriff>)> {
        let (ausgabe, griff) = transkodieren(strom, strategie, self.starter.clone())?;
        Ok((Box::new(ausgabe), Some(griff)))
    }
}
