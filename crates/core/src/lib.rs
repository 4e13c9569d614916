//! ansager-core – Gemeinsame Typen, Ereignisse und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Ansager-Crates gemeinsam genutzt werden: Snowflake-IDs der
//! Chat-Plattform, die konsumierten Plattform-Ereignisse und die zentrale
//! Fehler-Taxonomie.

pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{AnsagerError, Result};
pub use event::{MitgliedInfo, SprachPresence, TextNachricht};
pub use types::{ChannelId, GuildId, Sprachcode, UserId};
