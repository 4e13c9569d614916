//! ansager-audio – Audio-Aufbereitung fuer Sprachansagen
//!
//! - TTS-Provider-Vertrag und Provider-Auswahl
//! - Container-Erkennung anhand der ersten Bytes
//! - Vorlesen ohne Datenverlust (Peek)
//! - Transkodierung ueber ffmpeg mit einmaliger Wiederholung

pub mod adapter;
pub mod format;
pub mod peek;
pub mod provider;
pub mod transcode;

pub use adapter::{AudioRessource, StromAdapter};
pub use format::{Aufbereitung, Containerformat, SNIFF_BYTES};
pub use peek::{PeekLeser, PEEK_GRENZE};
pub use provider::{
    payloads_pruefen, AudioQuelle, ByteStrom, Extras, Payload, ProviderOptionen,
    ProviderRegistry, TtsProvider,
};
pub use transcode::{
    FfmpegStarter, ProzessAbbruch, ProzessEnde, ProzessStarter, Strategie, TranskodierAbbruch,
    TranskodierConfig, TranskodierGriff, TranskodierProzess, EINGABE_PUFFER_GRENZE,
    ZURUECKHALTE_GRENZE,
};
