//! Gemeinsame Identifikationstypen fuer Ansager
//!
//! Die Chat-Plattform vergibt 64-Bit-Snowflakes. Alle IDs verwenden das
//! Newtype-Pattern um Verwechslungen zwischen Guild-, Kanal- und
//! Benutzer-IDs zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};

/// Eindeutige Guild-ID (eine Community)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GuildId(pub u64);

impl GuildId {
    /// Gibt den rohen Snowflake zurueck
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl From<u64> for GuildId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for GuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "guild:{}", self.0)
    }
}

/// Eindeutige Kanal-ID (Sprach- oder Textkanal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// Gibt den rohen Snowflake zurueck
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ChannelId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "channel:{}", self.0)
    }
}

/// Eindeutige Benutzer-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl UserId {
    /// Gibt den rohen Snowflake zurueck
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Sprachcode im BCP-47-Stil ("en-US", "de-DE", ...)
///
/// Bewusst kein geschlossener Enum: persistierte Werte und Provider-Optionen
/// koennen beliebige Codes enthalten. Unbekannte Codes werden erst bei der
/// Phrasen-Erzeugung auf die Standardsprache abgebildet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sprachcode(String);

impl Sprachcode {
    pub const EN_US: &'static str = "en-US";
    pub const VI_VN: &'static str = "vi-VN";
    pub const DE_DE: &'static str = "de-DE";
    pub const JA_JP: &'static str = "ja-JP";
    pub const KO_KR: &'static str = "ko-KR";
    pub const DE_CH: &'static str = "de-CH";
    /// Englisch ohne Region
    pub const EN: &'static str = "en";

    /// Alle Codes mit eigener Phrasen-Tabelle bzw. Bot-Spitznamen
    pub const UNTERSTUETZT: [&'static str; 6] = [
        Self::EN_US,
        Self::VI_VN,
        Self::DE_DE,
        Self::JA_JP,
        Self::KO_KR,
        Self::DE_CH,
    ];

    /// Erstellt einen Sprachcode (Leerraum wird entfernt)
    pub fn neu(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    /// Gibt den Code als String-Slice zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }

    /// Prueft ob der Code unterstuetzt wird; "en" ohne Region gilt als Englisch
    pub fn ist_unterstuetzt(&self) -> bool {
        self.0 == Self::EN || Self::UNTERSTUETZT.contains(&self.0.as_str())
    }
}

impl Default for Sprachcode {
    fn default() -> Self {
        Self::neu(Self::EN_US)
    }
}

impl From<&str> for Sprachcode {
    fn from(code: &str) -> Self {
        Self::neu(code)
    }
}

impl std::fmt::Display for Sprachcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
