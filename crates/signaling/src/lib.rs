//! ansager-signaling – Steuerung der Ansager
//!
//! ## Module
//! - [`registry`] – Sitzungsverwaltung (Guild -> Ansager, Sperre pro Guild)
//! - [`presence`] – Presence-Automat (Beitritt, Austritt, Wechsel)
//! - [`text_kanal`] – Vorlesen eines festgelegten Textkanals
//! - [`phrasen`] – Ansage-Texte und Bot-Spitznamen
//! - [`dispatcher`] – Worker pro Guild fuer geordnete Verarbeitung

pub mod dispatcher;
pub mod phrasen;
pub mod presence;
pub mod registry;
pub mod text_kanal;

pub use dispatcher::{Ereignis, EreignisVerarbeiter, EreignisVerteiler, Verarbeitung};
pub use presence::{KanalAbfrage, PresenceAutomat, Uebergang};
pub use registry::{SitzungsSperre, SitzungsVerwaltung, SitzungsZugriff, SitzungsZustand};
pub use text_kanal::TextKanalBruecke;
