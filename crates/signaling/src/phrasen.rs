//! Ansage-Texte und Bot-Spitznamen je Sprache
//!
//! Unbekannte Sprachcodes fallen auf Englisch zurueck. Eine Ansage darf nie
//! an einem fehlenden Text scheitern.

use ansager_core::Sprachcode;

struct Phrasen {
    beigetreten: &'static str,
    verlassen: &'static str,
}

const ENGLISCH: Phrasen = Phrasen {
    beigetreten: "{name} joined your channel.",
    verlassen: "{name} left your channel.",
};

const DEUTSCH: Phrasen = Phrasen {
    beigetreten: "{name} ist dem Channel beigetreten.",
    verlassen: "{name} hat den Channel verlassen.",
};

const VIETNAMESISCH: Phrasen = Phrasen {
    beigetreten: "{name} đã tham gia channel của bạn.",
    verlassen: "{name} đã rời khỏi Channel của bạn.",
};

const JAPANISCH: Phrasen = Phrasen {
    beigetreten: "{name} チャンネルに参加しました。",
    verlassen: "{name} チャンネルを離れました。",
};

const KOREANISCH: Phrasen = Phrasen {
    beigetreten: "{name}님이 채널에 들어왔습니다.",
    verlassen: "{name}님이 채널을 나갔습니다.",
};

fn phrasen(sprache: &Sprachcode) -> &'static Phrasen {
    match sprache.als_str() {
        Sprachcode::EN | Sprachcode::EN_US => &ENGLISCH,
        Sprachcode::DE_DE | Sprachcode::DE_CH => &DEUTSCH,
        Sprachcode::VI_VN => &VIETNAMESISCH,
        Sprachcode::JA_JP => &JAPANISCH,
        Sprachcode::KO_KR => &KOREANISCH,
        andere => {
            tracing::warn!(sprache = andere, "Keine Ansage-Texte fuer Sprache, nutze Englisch");
            &ENGLISCH
        }
    }
}

/// "{name} ist beigetreten" in `sprache`
pub fn beigetreten(sprache: &Sprachcode, name: &str) -> String {
    phrasen(sprache).beigetreten.replace("{name}", name)
}

/// "{name} hat verlassen" in `sprache`
pub fn verlassen(sprache: &Sprachcode, name: &str) -> String {
    phrasen(sprache).verlassen.replace("{name}", name)
}

/// Spitzname des Bots passend zur Stimmsprache
pub fn bot_spitzname(sprache: &Sprachcode) -> &'static str {
    match sprache.als_str() {
        Sprachcode::VI_VN => "VTV4 Announcer",
        Sprachcode::DE_DE => "BRD Sprecher",
        Sprachcode::JA_JP => "日本語アナウンサー",
        Sprachcode::KO_KR => "아나운서",
        Sprachcode::DE_CH => "Ballerina Cappuccina",
        _ => "Announcer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texte_je_sprache() {
        assert_eq!(
            beigetreten(&"en-US".into(), "Anna"),
            "Anna joined your channel."
        );
        assert_eq!(
            verlassen(&"de-DE".into(), "Anna"),
            "Anna hat den Channel verlassen."
        );
        assert_eq!(
            beigetreten(&"de-CH".into(), "Anna"),
            "Anna ist dem Channel beigetreten."
        );
        assert_eq!(
            verlassen(&"ko-KR".into(), "민수"),
            "민수님이 채널을 나갔습니다."
        );
        assert_eq!(beigetreten(&"en".into(), "Bo"), "Bo joined your channel.");
    }

    #[test]
    fn unbekannte_sprache_faellt_auf_englisch() {
        assert_eq!(verlassen(&"xx-YY".into(), "Anna"), "Anna left your channel.");
        assert_eq!(beigetreten(&"".into(), "Anna"), "Anna joined your channel.");
    }

    #[test]
    fn spitznamen() {
        assert_eq!(bot_spitzname(&"de-DE".into()), "BRD Sprecher");
        assert_eq!(bot_spitzname(&"de-CH".into()), "Ballerina Cappuccina");
        assert_eq!(bot_spitzname(&"fr-FR".into()), "Announcer");
    }
}
