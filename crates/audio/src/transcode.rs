//! Transkodierung ueber einen externen Prozess (ffmpeg)
//!
//! Ablauf pro Payload:
//! ```text
//! Quelle --speisen--> stdin [Prozess] stdout --pumpen--> Duplex --> Player
//!    |                    ^
//!    +-- Puffer ----------+  (bei Strukturfehler: Neustart mit NeuKodieren,
//!                              gepufferte Bytes werden erneut eingespeist)
//! ```
//! Der erste Versuch haelt seine Ausgabe zurueck, bis `ZURUECKHALTE_GRENZE`
//! Bytes erzeugt sind oder der Prozess sauber endet. Erst ab dann erreicht
//! der Player etwas. Scheitert der Versuch vorher, wird die zurueckgehaltene
//! Ausgabe verworfen und die Neukodierung liefert den ganzen Strom. Danach
//! ist keine Wiederholung mehr moeglich; Eingabepuffer und Zurueckhaltung
//! entfallen und beide Richtungen laufen gestreamt.

use std::process::Stdio;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;
use tokio::io::{
    AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream,
};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

use ansager_core::{AnsagerError, Result};

use crate::provider::ByteStrom;

/// Boxed Eingabe-Seite eines Prozesses
pub type EingabeStrom = Box<dyn AsyncWrite + Send + Unpin>;

/// Groesse des Ausgabe-Puffers zwischen Prozess und Player
const AUSGABE_PUFFER: usize = 64 * 1024;
const SPEISE_BLOCK: usize = 16 * 1024;

/// Ausgabe des ersten Versuchs, ab der sie freigegeben wird
pub const ZURUECKHALTE_GRENZE: usize = 64 * 1024;

/// Eingabe die hoechstens fuer eine Wiederholung vorgehalten wird
pub const EINGABE_PUFFER_GRENZE: usize = 1024 * 1024;

/// Abfrageintervall fuer das Prozessende
const WARTE_INTERVALL: Duration = Duration::from_millis(10);

/// stderr-Fragmente die auf einen strukturellen Fehler hindeuten
const STRUKTURFEHLER: [&str; 6] = [
    "invalid data found",
    "could not find codec parameters",
    "error while decoding",
    "could not write header",
    "not currently supported in container",
    "error opening output",
];

/// Transkodier-Strategie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategie {
    /// Umverpacken in Ogg ohne Neukodierung
    Remux,
    /// Volle Neukodierung nach Opus
    NeuKodieren,
}

/// Wie ein Prozess geendet hat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProzessEnde {
    Erfolg,
    Strukturfehler(String),
}

/// Synchroner Abbruch eines laufenden Prozesses
pub trait ProzessAbbruch: Send + Sync {
    /// Schickt das Abbruchsignal ohne auf das Ende zu warten
    fn abbrechen(&self);
}

/// Ein laufender Transkodier-Prozess
#[async_trait]
pub trait TranskodierProzess: Send {
    /// Nimmt die Eingabe-Seite heraus (nur einmal moeglich)
    fn eingabe(&mut self) -> Option<EingabeStrom>;

    /// Nimmt die Ausgabe-Seite heraus (nur einmal moeglich)
    fn ausgabe(&mut self) -> Option<ByteStrom>;

    /// Griff mit dem der Prozess von aussen sofort beendet werden kann
    fn abbruch(&self) -> Arc<dyn ProzessAbbruch>;

    /// Wartet bis der Prozess endet oder einen Strukturfehler meldet
    async fn warten(&mut self) -> ProzessEnde;

    /// Beendet den Prozess und wartet auf sein Ende
    async fn beenden(&mut self);
}

/// Startet Transkodier-Prozesse
pub trait ProzessStarter: Send + Sync {
    fn starten(&self, strategie: Strategie) -> Result<Box<dyn TranskodierProzess>>;
}

/// Parameter des Zielformats
#[derive(Debug, Clone)]
pub struct TranskodierConfig {
    pub ffmpeg_pfad: String,
    pub bitrate_kbps: u32,
    pub abtastrate: u32,
    pub kanaele: u8,
}

impl Default for TranskodierConfig {
    fn default() -> Self {
        Self {
            ffmpeg_pfad: "ffmpeg".into(),
            bitrate_kbps: 128,
            abtastrate: 48_000,
            kanaele: 2,
        }
    }
}

impl TranskodierConfig {
    /// Kommandozeile fuer ffmpeg (Eingabe stdin, Ausgabe Ogg auf stdout)
    ///
    /// Remux kopiert den Audio-Codec und kann daher weder Abtastrate noch
    /// Kanalanzahl festlegen; das leistet erst die Neukodierung.
    pub fn argumente(&self, strategie: Strategie) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-i", "pipe:0", "-map", "0:a:0"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        match strategie {
            Strategie::Remux => {
                args.extend(["-c:a", "copy"].iter().map(|s| s.to_string()));
            }
            Strategie::NeuKodieren => {
                args.extend([
                    "-c:a".to_string(),
                    "libopus".to_string(),
                    "-b:a".to_string(),
                    format!("{}k", self.bitrate_kbps),
                    "-ar".to_string(),
                    self.abtastrate.to_string(),
                    "-ac".to_string(),
                    self.kanaele.to_string(),
                    "-application".to_string(),
                    "voip".to_string(),
                ]);
            }
        }

        args.extend(["-f", "ogg", "pipe:1"].iter().map(|s| s.to_string()));
        args
    }
}

/// Prueft eine stderr-Zeile auf bekannte Strukturfehler
pub fn ist_strukturfehler(zeile: &str) -> bool {
    let klein = zeile.to_lowercase();
    STRUKTURFEHLER.iter().any(|f| klein.contains(f))
}

// ---------------------------------------------------------------------------
// ffmpeg
// ---------------------------------------------------------------------------

/// Startet echte ffmpeg-Prozesse
#[derive(Debug, Clone, Default)]
pub struct FfmpegStarter {
    config: TranskodierConfig,
}

impl FfmpegStarter {
    pub fn neu(config: TranskodierConfig) -> Self {
        Self { config }
    }
}

impl ProzessStarter for FfmpegStarter {
    fn starten(&self, strategie: Strategie) -> Result<Box<dyn TranskodierProzess>> {
        let mut kind = Command::new(&self.config.ffmpeg_pfad)
            .args(self.config.argumente(strategie))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AnsagerError::Transkodierung(format!(
                    "'{}' nicht startbar: {e}",
                    self.config.ffmpeg_pfad
                ))
            })?;

        tracing::debug!(strategie = ?strategie, pid = ?kind.id(), "ffmpeg gestartet");

        let stdin = kind.stdin.take().map(|s| Box::new(s) as EingabeStrom);
        let stdout = kind.stdout.take().map(|s| Box::new(s) as ByteStrom);
        let stderr = kind.stderr.take();

        Ok(Box::new(FfmpegProzess {
            kind: Arc::new(Mutex::new(kind)),
            stdin,
            stdout,
            stderr,
            strategie,
        }))
    }
}

struct FfmpegProzess {
    /// Geteilt mit `FfmpegAbbruch`, damit ein Abbruch ohne await moeglich ist
    kind: Arc<Mutex<Child>>,
    stdin: Option<EingabeStrom>,
    stdout: Option<ByteStrom>,
    stderr: Option<ChildStderr>,
    strategie: Strategie,
}

struct FfmpegAbbruch(Arc<Mutex<Child>>);

impl ProzessAbbruch for FfmpegAbbruch {
    fn abbrechen(&self) {
        if let Err(e) = self.0.lock().start_kill() {
            tracing::debug!(fehler = %e, "ffmpeg war bereits beendet");
        }
    }
}

/// Prozessende per `try_wait`, da `wait` das Kind exklusiv braeuchte
async fn ende_abwarten(kind: Arc<Mutex<Child>>) -> std::io::Result<std::process::ExitStatus> {
    loop {
        let status = kind.lock().try_wait();
        match status? {
            Some(status) => return Ok(status),
            None => tokio::time::sleep(WARTE_INTERVALL).await,
        }
    }
}

#[async_trait]
impl TranskodierProzess for FfmpegProzess {
    fn eingabe(&mut self) -> Option<EingabeStrom> {
        self.stdin.take()
    }

    fn ausgabe(&mut self) -> Option<ByteStrom> {
        self.stdout.take()
    }

    fn abbruch(&self) -> Arc<dyn ProzessAbbruch> {
        Arc::new(FfmpegAbbruch(self.kind.clone()))
    }

    async fn warten(&mut self) -> ProzessEnde {
        if let Some(stderr) = self.stderr.take() {
            let mut zeilen = BufReader::new(stderr).lines();
            while let Ok(Some(zeile)) = zeilen.next_line().await {
                tracing::debug!(strategie = ?self.strategie, "[ffmpeg] {zeile}");
                if ist_strukturfehler(&zeile) {
                    return ProzessEnde::Strukturfehler(zeile);
                }
            }
        }

        match ende_abwarten(self.kind.clone()).await {
            Ok(status) if status.success() => ProzessEnde::Erfolg,
            Ok(status) => ProzessEnde::Strukturfehler(format!("ffmpeg beendet mit {status}")),
            Err(e) => ProzessEnde::Strukturfehler(e.to_string()),
        }
    }

    async fn beenden(&mut self) {
        self.abbruch().abbrechen();
        if let Err(e) = ende_abwarten(self.kind.clone()).await {
            tracing::debug!(fehler = %e, "ffmpeg-Ende nicht feststellbar");
        }
    }
}

// ---------------------------------------------------------------------------
// Ueberwachung
// ---------------------------------------------------------------------------

/// Bricht einen Task ab, sobald der Besitzer wegfaellt
struct AbbrechenBeiDrop<T>(JoinHandle<T>);

impl<T> Drop for AbbrechenBeiDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Default)]
struct Platz {
    abgebrochen: bool,
    aktuell: Option<Arc<dyn ProzessAbbruch>>,
}

/// Der gerade laufende Prozess einer Transkodierung
///
/// Nach einem Abbruch wird jeder neu eingetragene Prozess sofort beendet.
#[derive(Clone, Default)]
struct ProzessPlatz(Arc<Mutex<Platz>>);

impl ProzessPlatz {
    fn eintragen(&self, prozess: Arc<dyn ProzessAbbruch>) {
        let mut platz = self.0.lock();
        if platz.abgebrochen {
            drop(platz);
            prozess.abbrechen();
        } else {
            platz.aktuell = Some(prozess);
        }
    }

    fn austragen(&self) {
        self.0.lock().aktuell = None;
    }

    fn abbrechen(&self) {
        let prozess = {
            let mut platz = self.0.lock();
            platz.abgebrochen = true;
            platz.aktuell.take()
        };
        if let Some(prozess) = prozess {
            prozess.abbrechen();
        }
    }
}

/// Beendet eine Transkodierung samt Prozess ohne zu warten
///
/// Nach `abbrechen` laeuft kein Prozess dieser Transkodierung mehr weiter.
#[derive(Clone)]
pub struct TranskodierAbbruch {
    aufgabe: AbortHandle,
    platz: ProzessPlatz,
}

impl TranskodierAbbruch {
    pub fn abbrechen(&self) {
        self.platz.abbrechen();
        self.aufgabe.abort();
    }
}

impl std::fmt::Debug for TranskodierAbbruch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranskodierAbbruch").finish_non_exhaustive()
    }
}

/// Griff auf eine laufende Transkodierung
///
/// Wird der Griff fallen gelassen, wird der Prozess sofort beendet und die
/// Ueberwachung samt Hilfs-Tasks abgebrochen.
pub struct TranskodierGriff {
    aufgabe: JoinHandle<Result<()>>,
    platz: ProzessPlatz,
}

impl TranskodierGriff {
    /// Abbruch von aussen (z.B. beim Zerstoeren des Ansagers)
    pub fn abbruch(&self) -> TranskodierAbbruch {
        TranskodierAbbruch {
            aufgabe: self.aufgabe.abort_handle(),
            platz: self.platz.clone(),
        }
    }

    /// Wartet auf das Ende der Ueberwachung
    pub async fn abwarten(mut self) -> Result<()> {
        match (&mut self.aufgabe).await {
            Ok(ergebnis) => ergebnis,
            Err(e) => Err(AnsagerError::Transkodierung(format!(
                "Ueberwachung abgebrochen: {e}"
            ))),
        }
    }
}

impl Drop for TranskodierGriff {
    fn drop(&mut self) {
        self.abbruch().abbrechen();
    }
}

/// Startet die Transkodierung von `quelle`
///
/// Gibt sofort die Lese-Seite des Ergebnisses zurueck. Der erste Prozess
/// wird synchron gestartet, damit ein fehlendes ffmpeg direkt auffaellt.
pub fn transkodieren(
    quelle: ByteStrom,
    strategie: Strategie,
    starter: Arc<dyn ProzessStarter>,
) -> Result<(DuplexStream, TranskodierGriff)> {
    let mut prozess = starter.starten(strategie)?;
    let platz = ProzessPlatz::default();
    platz.eintragen(prozess.abbruch());
    let (eingabe, ausgabe) = prozess_enden(prozess.as_mut())?;
    let (leser, schreiber) = tokio::io::duplex(AUSGABE_PUFFER);

    let aufgabe = tokio::spawn(ueberwachen(
        quelle,
        prozess,
        eingabe,
        ausgabe,
        schreiber,
        strategie,
        starter,
        platz.clone(),
    ));

    Ok((leser, TranskodierGriff { aufgabe, platz }))
}

fn prozess_enden(prozess: &mut dyn TranskodierProzess) -> Result<(EingabeStrom, ByteStrom)> {
    let eingabe = prozess
        .eingabe()
        .ok_or_else(|| AnsagerError::Transkodierung("Prozess ohne Eingabe".into()))?;
    let ausgabe = prozess
        .ausgabe()
        .ok_or_else(|| AnsagerError::Transkodierung("Prozess ohne Ausgabe".into()))?;
    Ok((eingabe, ausgabe))
}

const OFFEN: u8 = 0;
const FEST: u8 = 1;
const WIEDERHOLUNG: u8 = 2;

/// Ob der erste Versuch noch wiederholt werden darf
///
/// `OFFEN -> FEST` sobald Ausgabe freigegeben wird oder der Eingabepuffer
/// voll ist, `OFFEN -> WIEDERHOLUNG` bei einem Strukturfehler. Beide
/// Uebergaenge schliessen sich aus.
#[derive(Clone)]
struct Festlegung(Arc<AtomicU8>);

impl Festlegung {
    fn offen() -> Self {
        Self(Arc::new(AtomicU8::new(OFFEN)))
    }

    fn fest() -> Self {
        Self(Arc::new(AtomicU8::new(FEST)))
    }

    fn ist_fest(&self) -> bool {
        self.0.load(Ordering::Acquire) == FEST
    }

    /// true wenn der Versuch jetzt festgelegt ist
    fn festlegen(&self) -> bool {
        match self
            .0
            .compare_exchange(OFFEN, FEST, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(stand) => stand == FEST,
        }
    }

    /// true wenn die Wiederholung beansprucht wurde
    fn wiederholung_beanspruchen(&self) -> bool {
        self.0
            .compare_exchange(OFFEN, WIEDERHOLUNG, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Was von einer Ausgabe-Pumpe uebrig bleibt
struct PumpenEnde {
    schreiber: DuplexStream,
    zurueckgehalten: BytesMut,
}

#[allow(clippy::too_many_arguments)]
async fn ueberwachen(
    quelle: ByteStrom,
    mut prozess: Box<dyn TranskodierProzess>,
    eingabe: EingabeStrom,
    ausgabe: ByteStrom,
    schreiber: DuplexStream,
    strategie: Strategie,
    starter: Arc<dyn ProzessStarter>,
    platz: ProzessPlatz,
) -> Result<()> {
    let festlegung = Festlegung::offen();
    let (wechsel_tx, wechsel_rx) = mpsc::channel(1);
    let _speiser = AbbrechenBeiDrop(tokio::spawn(speisen(
        quelle,
        eingabe,
        wechsel_rx,
        festlegung.clone(),
    )));
    let mut pumpe = AbbrechenBeiDrop(tokio::spawn(pumpen(ausgabe, schreiber, festlegung.clone())));
    let mut aktuell = strategie;

    loop {
        match prozess.warten().await {
            ProzessEnde::Erfolg => {
                let PumpenEnde {
                    mut schreiber,
                    zurueckgehalten,
                } = pumpe_abwarten(&mut pumpe).await?;
                platz.austragen();
                if !zurueckgehalten.is_empty() && schreiber.write_all(&zurueckgehalten).await.is_err() {
                    tracing::debug!("Player hat die Ausgabe vorzeitig geschlossen");
                }
                tracing::debug!(strategie = ?aktuell, "Transkodierung abgeschlossen");
                return Ok(());
            }
            ProzessEnde::Strukturfehler(grund) => {
                prozess.beenden().await;
                let ende = pumpe_abwarten(&mut pumpe).await?;

                if !festlegung.wiederholung_beanspruchen() {
                    platz.austragen();
                    tracing::error!(
                        strategie = ?aktuell,
                        grund = %grund,
                        "Transkodierung fehlgeschlagen, keine Wiederholung moeglich"
                    );
                    return Err(AnsagerError::Transkodierung(grund));
                }

                tracing::warn!(
                    strategie = ?aktuell,
                    grund = %grund,
                    verworfen = ende.zurueckgehalten.len(),
                    "Strukturfehler beim Transkodieren, Neustart mit Neukodierung"
                );

                prozess = starter.starten(Strategie::NeuKodieren)?;
                platz.eintragen(prozess.abbruch());
                let (eingabe, ausgabe) = prozess_enden(prozess.as_mut())?;
                if wechsel_tx.send(eingabe).await.is_err() {
                    return Err(AnsagerError::Transkodierung(
                        "Einspeisung vorzeitig beendet".into(),
                    ));
                }
                pumpe = AbbrechenBeiDrop(tokio::spawn(pumpen(
                    ausgabe,
                    ende.schreiber,
                    Festlegung::fest(),
                )));
                aktuell = Strategie::NeuKodieren;
            }
        }
    }
}

async fn pumpe_abwarten(pumpe: &mut AbbrechenBeiDrop<PumpenEnde>) -> Result<PumpenEnde> {
    (&mut pumpe.0)
        .await
        .map_err(|e| AnsagerError::Transkodierung(format!("Ausgabe-Pumpe verloren: {e}")))
}

/// Kopiert die Prozess-Ausgabe in den Duplex
///
/// Solange `festlegung` offen ist, wird die Ausgabe zurueckgehalten.
/// Erreicht sie `ZURUECKHALTE_GRENZE`, legt die Pumpe den Versuch fest.
async fn pumpen(mut von: ByteStrom, mut nach: DuplexStream, festlegung: Festlegung) -> PumpenEnde {
    let mut zurueck = BytesMut::new();
    let mut block = vec![0u8; SPEISE_BLOCK];

    loop {
        let n = match von.read(&mut block).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(fehler = %e, "Ausgabe-Pumpe beendet");
                break;
            }
        };
        zurueck.extend_from_slice(&block[..n]);

        let freigeben = festlegung.ist_fest()
            || (zurueck.len() >= ZURUECKHALTE_GRENZE && festlegung.festlegen());
        if freigeben {
            let teil = zurueck.split();
            if nach.write_all(&teil).await.is_err() {
                tracing::debug!("Player hat die Ausgabe vorzeitig geschlossen");
                break;
            }
        }
    }

    PumpenEnde {
        schreiber: nach,
        zurueckgehalten: zurueck,
    }
}

/// Speist die Quelle in den aktuellen Prozess ein
///
/// Kommt ueber `wechsel` ein neuer Prozess, erhaelt er zuerst alle bisher
/// gelesenen Bytes und danach den Rest der Quelle. Ist der erste Versuch
/// festgelegt, wird nicht mehr gepuffert. Gibt die Gesamtzahl der
/// gelesenen Quell-Bytes zurueck.
async fn speisen(
    mut quelle: ByteStrom,
    eingabe: EingabeStrom,
    mut wechsel: mpsc::Receiver<EingabeStrom>,
    festlegung: Festlegung,
) -> usize {
    let mut eingabe = Some(eingabe);
    let mut puffer = BytesMut::new();
    let mut puffern = true;
    let mut quelle_fertig = false;
    let mut gesamt = 0usize;
    let mut block = vec![0u8; SPEISE_BLOCK];

    loop {
        tokio::select! {
            neu = wechsel.recv() => {
                let Some(mut neu) = neu else { break };
                let ok = neu.write_all(&puffer).await.is_ok();
                tracing::debug!(bytes = puffer.len(), ok, "Gepufferte Bytes erneut eingespeist");
                // Es gibt hoechstens eine Wiederholung
                puffer = BytesMut::new();
                puffern = false;
                eingabe = Some(neu);
                if !ok {
                    eingabe = None;
                } else if quelle_fertig {
                    eingabe_schliessen(&mut eingabe).await;
                }
            }
            gelesen = quelle.read(&mut block), if !quelle_fertig => {
                match gelesen {
                    Ok(0) => {
                        quelle_fertig = true;
                        eingabe_schliessen(&mut eingabe).await;
                    }
                    Ok(n) => {
                        gesamt += n;
                        if puffern {
                            if festlegung.ist_fest()
                                || (puffer.len() + n > EINGABE_PUFFER_GRENZE && festlegung.festlegen())
                            {
                                tracing::debug!(bytes = puffer.len(), "Wiederholung ausgeschlossen, Eingabepuffer freigegeben");
                                puffer = BytesMut::new();
                                puffern = false;
                            } else {
                                puffer.extend_from_slice(&block[..n]);
                            }
                        }
                        if let Some(e) = eingabe.as_mut() {
                            if e.write_all(&block[..n]).await.is_err() {
                                // Prozess weg; auf Wechsel warten
                                eingabe = None;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(fehler = %e, "Quelle nicht lesbar, Eingabe wird geschlossen");
                        quelle_fertig = true;
                        eingabe_schliessen(&mut eingabe).await;
                    }
                }
            }
        }
    }

    gesamt
}

async fn eingabe_schliessen(eingabe: &mut Option<EingabeStrom>) {
    if let Some(mut e) = eingabe.take() {
        let _ = e.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remux_kopiert_codec() {
        let args = TranskodierConfig::default().argumente(Strategie::Remux);
        let zeile = args.join(" ");
        assert!(zeile.contains("-i pipe:0"));
        assert!(zeile.contains("-c:a copy"));
        assert!(zeile.ends_with("-f ogg pipe:1"));
        assert!(!zeile.contains("libopus"));
    }

    #[test]
    fn neukodierung_fixiert_rate_und_kanaele() {
        let cfg = TranskodierConfig {
            bitrate_kbps: 96,
            ..Default::default()
        };
        let zeile = cfg.argumente(Strategie::NeuKodieren).join(" ");
        assert!(zeile.contains("-c:a libopus"));
        assert!(zeile.contains("-b:a 96k"));
        assert!(zeile.contains("-ar 48000"));
        assert!(zeile.contains("-ac 2"));
    }

    #[test]
    fn strukturfehler_erkennung() {
        assert!(ist_strukturfehler(
            "pipe:0: Invalid data found when processing input"
        ));
        assert!(ist_strukturfehler(
            "[ogg @ 0x55] Could not write header for output file #0"
        ));
        assert!(!ist_strukturfehler("size=      12kB time=00:00:01.20"));
    }

    #[tokio::test]
    async fn fehlendes_programm_ist_transkodierfehler() {
        let starter = FfmpegStarter::neu(TranskodierConfig {
            ffmpeg_pfad: "/nicht/vorhanden/ffmpeg".into(),
            ..Default::default()
        });
        let e = starter.starten(Strategie::Remux).err().unwrap();
        assert!(matches!(e, AnsagerError::Transkodierung(_)));
    }

    #[test]
    fn festlegung_und_wiederholung_schliessen_sich_aus() {
        let f = Festlegung::offen();
        assert!(!f.ist_fest());
        assert!(f.wiederholung_beanspruchen());
        // Waehrend der Wiederholung darf nicht festgelegt werden
        assert!(!f.festlegen());
        assert!(!f.wiederholung_beanspruchen());

        let f = Festlegung::offen();
        assert!(f.festlegen());
        assert!(f.festlegen());
        assert!(f.ist_fest());
        assert!(!f.wiederholung_beanspruchen());
    }

    struct Merker(Arc<std::sync::atomic::AtomicBool>);

    impl ProzessAbbruch for Merker {
        fn abbrechen(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn platz_beendet_spaet_eingetragene_prozesse() {
        let platz = ProzessPlatz::default();
        let erster = Arc::new(std::sync::atomic::AtomicBool::new(false));
        platz.eintragen(Arc::new(Merker(erster.clone())));
        platz.abbrechen();
        assert!(erster.load(Ordering::SeqCst));

        let zweiter = Arc::new(std::sync::atomic::AtomicBool::new(false));
        platz.eintragen(Arc::new(Merker(zweiter.clone())));
        assert!(zweiter.load(Ordering::SeqCst));
    }
}
