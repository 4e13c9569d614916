//! ansager-db – Persistenz-Vertrag und darauf aufbauende Einstellungen
//!
//! Der Kern konsumiert nur einen schlanken Schluessel-Wert-Vertrag
//! (`get`/`set`/`delete` auf String-Pfaden der Form
//! `{namensraum}/{guild_id}/{feld}`). Darauf setzen auf:
//!
//! - [`praeferenzen`] – Text-/Stimmsprache und Textkanal pro Guild
//! - [`alias`] – gesprochene Aliase pro Mitglied
//!
//! Backends: [`SpeicherImRam`] (Tests, Fallback) und [`SqliteSpeicher`].

pub mod alias;
pub mod error;
pub mod praeferenzen;
pub mod sqlite;
pub mod store;

pub use alias::{AliasSpeicher, ALIAS_MAX_LAENGE};
pub use error::{DbError, DbResult};
pub use praeferenzen::GuildEinstellungen;
pub use sqlite::{DatenbankConfig, SqliteSpeicher};
pub use store::{SchluesselWertSpeicher, SpeicherImRam};
