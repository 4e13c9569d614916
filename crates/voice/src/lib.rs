//! ansager-voice – Ansager und Wiedergabe
//!
//! Ein [`Ansager`] besitzt genau eine Sprachverbindung, einen Player und eine
//! Warteschlange. Texte werden ueber den TTS-Provider synthetisiert und in
//! strikter Reihenfolge abgespielt.
//!
//! ## Module
//! - [`transport`] – Vertrag fuer Sprachverbindung und Player (extern implementiert)
//! - [`queue`] – FIFO-Warteschlange der Wiedergabe
//! - [`announcer`] – Verbinden, Sprechen, Zerstoeren

pub mod announcer;
pub mod queue;
pub mod transport;

pub use announcer::{Ansager, AnsagerFabrik, AnsagerOptionen, STANDARD_VERBINDUNGS_TIMEOUT};
pub use queue::WiedergabeQueue;
pub use transport::{AudioPlayer, SprachTransport, SprachVerbindung, VerbindungsStatus, WiedergabeEnde};
