//! Integration-Tests fuer den Stromadapter mit einem simulierten Transkodierer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::oneshot;
use tokio::task::{AbortHandle, JoinHandle};

use ansager_audio::transcode::EingabeStrom;
use ansager_audio::{
    AudioQuelle, ByteStrom, Containerformat, Payload, ProzessAbbruch, ProzessEnde,
    ProzessStarter, Strategie, StromAdapter, TranskodierProzess, EINGABE_PUFFER_GRENZE,
    ZURUECKHALTE_GRENZE,
};
use ansager_core::{AnsagerError, Result};

/// Verhalten eines simulierten Prozesses
#[derive(Debug, Clone, Copy, Default)]
enum Verhalten {
    /// Gibt die Eingabe unveraendert aus
    #[default]
    Echo,
    /// Scheitert nach dem ersten gelesenen Block ohne Ausgabe
    Scheitern,
    /// Gibt mindestens so viele Bytes aus und scheitert dann
    SchreibenDannScheitern(usize),
    /// Liest die ganze Eingabe und gibt sie erst am Ende aus
    Sammeln,
    /// Liest die ganze Eingabe und scheitert ohne Ausgabe
    SammelnDannScheitern,
    /// Verwirft die Eingabe und endet nie
    Haengen,
}

struct FakeAbbruch {
    aufgabe: AbortHandle,
    beendet: Arc<AtomicBool>,
}

impl ProzessAbbruch for FakeAbbruch {
    fn abbrechen(&self) {
        self.beendet.store(true, Ordering::SeqCst);
        self.aufgabe.abort();
    }
}

struct FakeProzess {
    eingabe: Option<EingabeStrom>,
    ausgabe: Option<ByteStrom>,
    ende: Option<oneshot::Receiver<ProzessEnde>>,
    aufgabe: JoinHandle<()>,
    beendet: Arc<AtomicBool>,
}

#[async_trait]
impl TranskodierProzess for FakeProzess {
    fn eingabe(&mut self) -> Option<EingabeStrom> {
        self.eingabe.take()
    }

    fn ausgabe(&mut self) -> Option<ByteStrom> {
        self.ausgabe.take()
    }

    fn abbruch(&self) -> Arc<dyn ProzessAbbruch> {
        Arc::new(FakeAbbruch {
            aufgabe: self.aufgabe.abort_handle(),
            beendet: self.beendet.clone(),
        })
    }

    async fn warten(&mut self) -> ProzessEnde {
        match self.ende.take() {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| ProzessEnde::Strukturfehler("Prozess verschwunden".into())),
            None => ProzessEnde::Erfolg,
        }
    }

    async fn beenden(&mut self) {
        self.abbruch().abbrechen();
    }
}

#[derive(Default)]
struct FakeStarter {
    /// Index des Starts -> Verhalten (danach Echo)
    verhalten: Vec<Verhalten>,
    strategien: Mutex<Vec<Strategie>>,
    /// Empfangene Bytes je Prozess (in Start-Reihenfolge beendet)
    empfangen: Arc<Mutex<Vec<usize>>>,
    /// Abbruch-Merker je gestartetem Prozess
    beendet: Mutex<Vec<Arc<AtomicBool>>>,
}

impl FakeStarter {
    fn mit(verhalten: Vec<Verhalten>) -> Self {
        Self {
            verhalten,
            ..Default::default()
        }
    }

    fn scheitert(scheitern: Vec<bool>) -> Self {
        Self::mit(
            scheitern
                .into_iter()
                .map(|s| if s { Verhalten::Scheitern } else { Verhalten::Echo })
                .collect(),
        )
    }

    fn beendet(&self, index: usize) -> bool {
        self.beendet.lock()[index].load(Ordering::SeqCst)
    }
}

const STRUKTURFEHLER: &str = "pipe:0: Invalid data found when processing input";

impl ProzessStarter for FakeStarter {
    fn starten(&self, strategie: Strategie) -> Result<Box<dyn TranskodierProzess>> {
        let mut strategien = self.strategien.lock();
        let verhalten = self
            .verhalten
            .get(strategien.len())
            .copied()
            .unwrap_or_default();
        strategien.push(strategie);

        let (stdin_w, mut stdin_r) = tokio::io::duplex(4096);
        let (mut stdout_w, stdout_r) = tokio::io::duplex(4096);
        let (tx, rx) = oneshot::channel();
        let empfangen = self.empfangen.clone();

        let aufgabe = tokio::spawn(async move {
            let mut gesamt = 0usize;
            let mut gesammelt = Vec::new();
            let mut block = [0u8; 1024];
            loop {
                let n = match stdin_r.read(&mut block).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                gesamt += n;
                match verhalten {
                    Verhalten::Scheitern => {
                        empfangen.lock().push(gesamt);
                        let _ = tx.send(ProzessEnde::Strukturfehler(STRUKTURFEHLER.into()));
                        return;
                    }
                    Verhalten::Sammeln | Verhalten::SammelnDannScheitern => {
                        gesammelt.extend_from_slice(&block[..n]);
                    }
                    Verhalten::Haengen => {}
                    Verhalten::Echo | Verhalten::SchreibenDannScheitern(_) => {
                        if stdout_w.write_all(&block[..n]).await.is_err() {
                            break;
                        }
                        if let Verhalten::SchreibenDannScheitern(grenze) = verhalten {
                            if gesamt >= grenze {
                                empfangen.lock().push(gesamt);
                                let _ =
                                    tx.send(ProzessEnde::Strukturfehler(STRUKTURFEHLER.into()));
                                return;
                            }
                        }
                    }
                }
            }
            empfangen.lock().push(gesamt);
            match verhalten {
                Verhalten::Haengen => {
                    let _tx = tx;
                    std::future::pending::<()>().await;
                }
                Verhalten::SammelnDannScheitern => {
                    let _ = tx.send(ProzessEnde::Strukturfehler(STRUKTURFEHLER.into()));
                }
                _ => {
                    if !gesammelt.is_empty() {
                        let _ = stdout_w.write_all(&gesammelt).await;
                    }
                    drop(stdout_w);
                    let _ = tx.send(ProzessEnde::Erfolg);
                }
            }
        });

        let beendet = Arc::new(AtomicBool::new(false));
        self.beendet.lock().push(beendet.clone());

        Ok(Box::new(FakeProzess {
            eingabe: Some(Box::new(stdin_w)),
            ausgabe: Some(Box::new(stdout_r)),
            ende: Some(rx),
            aufgabe,
            beendet,
        }))
    }
}

fn payload(daten: Vec<u8>) -> Payload {
    Payload::neu(AudioQuelle::Puffer(Bytes::from(daten)), "Anna joined the channel", "fake")
}

fn ogg_opus(laenge: usize) -> Vec<u8> {
    let mut v = b"OggS".to_vec();
    v.resize(28, 0);
    v.extend_from_slice(b"OpusHead");
    v.resize(laenge, 0x55);
    v
}

/// Unbekanntes Format (kein Ogg/MP3/WAV-Anfang)
fn unbekannt(laenge: usize) -> Vec<u8> {
    (0..laenge).map(|i| (i % 100 + 1) as u8).collect()
}

#[tokio::test]
async fn ogg_opus_startet_keinen_prozess() {
    let starter = Arc::new(FakeStarter::default());
    let adapter = StromAdapter::neu(starter.clone());
    let daten = ogg_opus(5000);

    let mut ressource = adapter.aufbereiten(payload(daten.clone())).await.unwrap();
    assert_eq!(ressource.format(), Containerformat::OggOpus);
    assert!(!ressource.wird_transkodiert());

    let mut gelesen = Vec::new();
    ressource.read_to_end(&mut gelesen).await.unwrap();
    assert_eq!(gelesen, daten);
    assert!(starter.strategien.lock().is_empty());
}

#[tokio::test]
async fn mp3_wird_direkt_neu_kodiert() {
    let starter = Arc::new(FakeStarter::default());
    let adapter = StromAdapter::neu(starter.clone());
    let mut daten = b"ID3\x04\0\0\0\0\0\0".to_vec();
    daten.resize(20_000, 0xAA);

    let mut ressource = adapter.aufbereiten(payload(daten.clone())).await.unwrap();
    assert_eq!(ressource.format(), Containerformat::Mp3);

    let mut gelesen = Vec::new();
    ressource.read_to_end(&mut gelesen).await.unwrap();
    assert_eq!(gelesen, daten);
    assert_eq!(*starter.strategien.lock(), vec![Strategie::NeuKodieren]);
}

#[tokio::test]
async fn unbekannt_remux_dann_genau_eine_wiederholung() {
    let starter = Arc::new(FakeStarter::scheitert(vec![true, false]));
    let adapter = StromAdapter::neu(starter.clone());
    let daten = unbekannt(100_000);

    let mut ressource = adapter.aufbereiten(payload(daten.clone())).await.unwrap();
    assert_eq!(ressource.format(), Containerformat::Unbekannt);
    let griff = ressource.griff_nehmen().unwrap();

    let mut gelesen = Vec::new();
    ressource.read_to_end(&mut gelesen).await.unwrap();
    griff.abwarten().await.unwrap();

    // Die Wiederholung bekommt den kompletten Strom, nichts geht verloren
    assert_eq!(gelesen, daten);
    assert_eq!(
        *starter.strategien.lock(),
        vec![Strategie::Remux, Strategie::NeuKodieren]
    );
    assert_eq!(starter.empfangen.lock().last().copied(), Some(daten.len()));
}

#[tokio::test]
async fn zweiter_fehlschlag_verwirft_payload() {
    let starter = Arc::new(FakeStarter::scheitert(vec![true, true, true]));
    let adapter = StromAdapter::neu(starter.clone());

    let mut ressource = adapter.aufbereiten(payload(unbekannt(30_000))).await.unwrap();
    let griff = ressource.griff_nehmen().unwrap();

    let mut gelesen = Vec::new();
    ressource.read_to_end(&mut gelesen).await.unwrap();
    assert!(gelesen.is_empty());

    let e = griff.abwarten().await.unwrap_err();
    assert!(matches!(e, AnsagerError::Transkodierung(_)));
    // Kein dritter Versuch
    assert_eq!(starter.strategien.lock().len(), 2);
}

#[tokio::test]
async fn leerer_strom_ist_providerfehler() {
    let starter = Arc::new(FakeStarter::default());
    let adapter = StromAdapter::neu(starter.clone());
    let leer = Payload::neu(
        AudioQuelle::Strom(Box::new(tokio::io::empty())),
        "Hallo",
        "fake",
    );

    let e = adapter.aufbereiten(leer).await.unwrap_err();
    assert!(matches!(e, AnsagerError::Provider { .. }));
    assert!(starter.strategien.lock().is_empty());
}

#[tokio::test]
async fn verworfene_teilausgabe_erreicht_den_player_nicht() {
    // Erster Versuch schreibt 1 KiB und scheitert dann
    let starter = Arc::new(FakeStarter::mit(vec![Verhalten::SchreibenDannScheitern(1024)]));
    let adapter = StromAdapter::neu(starter.clone());
    let daten = unbekannt(10_000);

    let mut ressource = adapter.aufbereiten(payload(daten.clone())).await.unwrap();
    let griff = ressource.griff_nehmen().unwrap();

    let mut gelesen = Vec::new();
    ressource.read_to_end(&mut gelesen).await.unwrap();
    griff.abwarten().await.unwrap();

    assert_eq!(gelesen.len(), daten.len());
    assert_eq!(gelesen, daten);
    assert_eq!(
        *starter.strategien.lock(),
        vec![Strategie::Remux, Strategie::NeuKodieren]
    );
}

#[tokio::test]
async fn nach_freigabe_keine_wiederholung_mehr() {
    let starter = Arc::new(FakeStarter::mit(vec![Verhalten::SchreibenDannScheitern(
        100_000,
    )]));
    let adapter = StromAdapter::neu(starter.clone());
    let daten = unbekannt(200_000);

    let mut ressource = adapter.aufbereiten(payload(daten.clone())).await.unwrap();
    let griff = ressource.griff_nehmen().unwrap();

    let mut gelesen = Vec::new();
    ressource.read_to_end(&mut gelesen).await.unwrap();
    let e = griff.abwarten().await.unwrap_err();
    assert!(matches!(e, AnsagerError::Transkodierung(_)));

    // Freigegebene Ausgabe bleibt gueltig, doppelt gespielt wird nichts
    assert_eq!(starter.strategien.lock().len(), 1);
    assert!(gelesen.len() >= 100_000);
    assert!(gelesen.len() > ZURUECKHALTE_GRENZE);
    assert_eq!(gelesen[..], daten[..gelesen.len()]);
}

#[tokio::test]
async fn grosser_strom_kommt_vollstaendig_an() {
    let starter = Arc::new(FakeStarter::default());
    let adapter = StromAdapter::neu(starter.clone());
    let daten = unbekannt(300 * 1024);

    let mut ressource = adapter.aufbereiten(payload(daten.clone())).await.unwrap();
    let griff = ressource.griff_nehmen().unwrap();

    let mut gelesen = Vec::new();
    ressource.read_to_end(&mut gelesen).await.unwrap();
    griff.abwarten().await.unwrap();

    assert_eq!(gelesen, daten);
    assert_eq!(*starter.strategien.lock(), vec![Strategie::Remux]);
}

#[tokio::test]
async fn strom_ueber_der_puffergrenze_kommt_vollstaendig_an() {
    // Keine Ausgabe bis zum Ende; der Eingabepuffer laeuft voll
    let starter = Arc::new(FakeStarter::mit(vec![Verhalten::Sammeln]));
    let adapter = StromAdapter::neu(starter.clone());
    let daten = unbekannt(EINGABE_PUFFER_GRENZE + 512 * 1024);

    let mut ressource = adapter.aufbereiten(payload(daten.clone())).await.unwrap();
    let griff = ressource.griff_nehmen().unwrap();

    let mut gelesen = Vec::new();
    ressource.read_to_end(&mut gelesen).await.unwrap();
    griff.abwarten().await.unwrap();
    assert_eq!(gelesen, daten);
}

#[tokio::test]
async fn voller_eingabepuffer_schliesst_wiederholung_aus() {
    let starter = Arc::new(FakeStarter::mit(vec![Verhalten::SammelnDannScheitern]));
    let adapter = StromAdapter::neu(starter.clone());
    let daten = unbekannt(EINGABE_PUFFER_GRENZE + 512 * 1024);

    let mut ressource = adapter.aufbereiten(payload(daten)).await.unwrap();
    let griff = ressource.griff_nehmen().unwrap();

    let mut gelesen = Vec::new();
    ressource.read_to_end(&mut gelesen).await.unwrap();
    assert!(gelesen.is_empty());

    let e = griff.abwarten().await.unwrap_err();
    assert!(matches!(e, AnsagerError::Transkodierung(_)));
    assert_eq!(*starter.strategien.lock(), vec![Strategie::Remux]);
}

#[tokio::test]
async fn fallengelassene_ressource_beendet_prozess_sofort() {
    let starter = Arc::new(FakeStarter::mit(vec![Verhalten::Haengen]));
    let adapter = StromAdapter::neu(starter.clone());

    let ressource = adapter.aufbereiten(payload(unbekannt(8_000))).await.unwrap();
    assert!(ressource.wird_transkodiert());
    assert!(!starter.beendet(0));

    drop(ressource);
    // Ohne einen einzigen await-Punkt
    assert!(starter.beendet(0));
}

#[tokio::test]
async fn abbruch_beendet_prozess_sofort() {
    let starter = Arc::new(FakeStarter::mit(vec![Verhalten::Haengen]));
    let adapter = StromAdapter::neu(starter.clone());

    let ressource = adapter.aufbereiten(payload(unbekannt(8_000))).await.unwrap();
    let abbruch = ressource.abbruch().unwrap();
    abbruch.abbrechen();
    assert!(starter.beendet(0));

    // Ein zweiter Abbruch schadet nicht
    abbruch.abbrechen();
    drop(ressource);
    assert_eq!(starter.strategien.lock().len(), 1);
}
