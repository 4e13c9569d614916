//! Container-Erkennung anhand der ersten Bytes eines Audiostroms
//!
//! Zielformat der Sprachverbindung ist Ogg/Opus (48 kHz, Stereo). Nur
//! dieses Format wird ohne Kosten durchgereicht, alles andere laeuft durch
//! den Transkodierer.

/// Anzahl Bytes die fuer eine sichere Erkennung gelesen werden
///
/// Ogg-Seitenkopf (27 Bytes) + 1 Segment-Byte + "OpusHead" (8 Bytes).
pub const SNIFF_BYTES: usize = 36;

const OGG_MAGIC: &[u8; 4] = b"OggS";
const OPUS_HEAD: &[u8; 8] = b"OpusHead";
const OPUS_HEAD_OFFSET: usize = 28;

/// Erkanntes Containerformat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containerformat {
    /// Ogg mit Opus-Kopf – direkt abspielbar
    OggOpus,
    /// Ogg mit anderem Codec (Vorbis, FLAC, ...)
    OggAnders,
    /// MP3 (ID3-Tag oder Frame-Sync)
    Mp3,
    /// RIFF/WAVE (z.B. LINEAR16-Antworten)
    Wav,
    Unbekannt,
}

/// Wie ein Strom fuer die Wiedergabe aufbereitet wird
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aufbereitung {
    /// Unveraendert weiterreichen
    Durchreichen,
    /// Zuerst billiges Umverpacken versuchen
    Remux,
    /// Direkt neu kodieren
    NeuKodieren,
}

impl Containerformat {
    /// Klassifiziert einen Stromanfang
    ///
    /// Ein Ogg-Anfang der zu kurz fuer den Opus-Kopf ist gilt als Ogg/Opus.
    pub fn erkennen(kopf: &[u8]) -> Self {
        if kopf.starts_with(OGG_MAGIC) {
            let ende = OPUS_HEAD_OFFSET + OPUS_HEAD.len();
            return match kopf.get(OPUS_HEAD_OFFSET..ende) {
                Some(codec) if codec == OPUS_HEAD => Self::OggOpus,
                Some(_) => Self::OggAnders,
                None => Self::OggOpus,
            };
        }
        if kopf.starts_with(b"ID3") {
            return Self::Mp3;
        }
        if kopf.len() >= 2 && kopf[0] == 0xFF && (kopf[1] & 0xE0) == 0xE0 {
            return Self::Mp3;
        }
        if kopf.len() >= 12 && &kopf[0..4] == b"RIFF" && &kopf[8..12] == b"WAVE" {
            return Self::Wav;
        }
        Self::Unbekannt
    }

    pub fn aufbereitung(self) -> Aufbereitung {
        match self {
            Self::OggOpus => Aufbereitung::Durchreichen,
            Self::Unbekannt => Aufbereitung::Remux,
            Self::OggAnders | Self::Mp3 | Self::Wav => Aufbereitung::NeuKodieren,
        }
    }

    pub fn als_str(self) -> &'static str {
        match self {
            Self::OggOpus => "ogg/opus",
            Self::OggAnders => "ogg",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Unbekannt => "unbekannt",
        }
    }
}
