//! Locale-indexed data the core needs for its own decisions: distress
//! keywords, fake-call scenarios and caller labels, and the name fragments
//! used to pick a synthesizer voice.
//!
//! Each locale only lists what differs from English; [`Locale::pack`]
//! resolves the gaps. [`validate_catalog`] runs once at start-up.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Hi,
    Ta,
    Kn,
    Te,
    Ml,
    Pa,
    Gu,
    Mr,
    Fr,
    Es,
    De,
    Ja,
    Ko,
    Zh,
    It,
}

impl Locale {
    pub const ALL: [Locale; 16] = [
        Self::En,
        Self::Hi,
        Self::Ta,
        Self::Kn,
        Self::Te,
        Self::Ml,
        Self::Pa,
        Self::Gu,
        Self::Mr,
        Self::Fr,
        Self::Es,
        Self::De,
        Self::Ja,
        Self::Ko,
        Self::Zh,
        Self::It,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Ta => "ta",
            Self::Kn => "kn",
            Self::Te => "te",
            Self::Ml => "ml",
            Self::Pa => "pa",
            Self::Gu => "gu",
            Self::Mr => "mr",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::De => "de",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Zh => "zh",
            Self::It => "it",
        }
    }

    /// Native name for the language switcher.
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "हिन्दी",
            Self::Ta => "தமிழ்",
            Self::Kn => "ಕನ್ನಡ",
            Self::Te => "తెలుగు",
            Self::Ml => "മലയാളം",
            Self::Pa => "ਪੰਜਾਬੀ",
            Self::Gu => "ગુજરાતી",
            Self::Mr => "मराठी",
            Self::Fr => "Français",
            Self::Es => "Español",
            Self::De => "Deutsch",
            Self::Ja => "日本語",
            Self::Ko => "한국어",
            Self::Zh => "中文",
            Self::It => "Italiano",
        }
    }

    /// Accepts BCP 47 tags (`hi-IN`, `pt_BR`); unknown languages yield `None`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = primary_subtag(tag);
        Self::ALL.into_iter().find(|l| l.code() == primary)
    }

    /// Like [`Locale::from_tag`] but falls back to English.
    #[must_use]
    pub fn from_tag_or_default(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_default()
    }

    #[must_use]
    pub fn pack(self) -> LocalePack {
        let base = overrides(Self::En);
        let own = overrides(self);
        LocalePack {
            locale: self,
            distress_keywords: own.distress_keywords.unwrap_or(base.distress_keywords.unwrap_or(&[])),
            scenarios: own.scenarios.unwrap_or(base.scenarios.unwrap_or(&[])),
            caller_name: own.caller_name.unwrap_or(base.caller_name.unwrap_or("")),
            caller_type: own.caller_type.unwrap_or(base.caller_type.unwrap_or("")),
            female_voice_hints: own.female_voice_hints,
            male_voice_hints: own.male_voice_hints,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Lower-cased primary language subtag: `hi-IN` -> `hi`.
#[must_use]
pub fn primary_subtag(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Fully resolved data for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalePack {
    pub locale: Locale,
    pub distress_keywords: &'static [&'static str],
    pub scenarios: &'static [&'static str],
    pub caller_name: &'static str,
    pub caller_type: &'static str,
    /// Locale-specific additions to the English voice-name hints.
    pub female_voice_hints: &'static [&'static str],
    pub male_voice_hints: &'static [&'static str],
}

impl LocalePack {
    /// Case-insensitive substring match of a finalized transcript.
    #[must_use]
    pub fn matches_distress(&self, transcript: &str) -> Option<&'static str> {
        let transcript = transcript.trim().to_lowercase();
        if transcript.is_empty() {
            return None;
        }
        self.distress_keywords
            .iter()
            .copied()
            .find(|kw| transcript.contains(kw))
    }
}

pub const ENGLISH_FEMALE_VOICE_HINTS: &[&str] = &["female", "zira", "samantha", "susan"];
pub const ENGLISH_MALE_VOICE_HINTS: &[&str] = &["male", "david", "mark", "tom"];

struct Overrides {
    distress_keywords: Option<&'static [&'static str]>,
    scenarios: Option<&'static [&'static str]>,
    caller_name: Option<&'static str>,
    caller_type: Option<&'static str>,
    female_voice_hints: &'static [&'static str],
    male_voice_hints: &'static [&'static str],
}

const NONE: Overrides = Overrides {
    distress_keywords: None,
    scenarios: None,
    caller_name: None,
    caller_type: None,
    female_voice_hints: &[],
    male_voice_hints: &[],
};

fn overrides(locale: Locale) -> Overrides {
    match locale {
        Locale::En => Overrides {
            distress_keywords: Some(&["help", "stop", "leave me"]),
            scenarios: Some(&[
                "I'm waiting outside, come fast.",
                "Your cab is nearby, please come down now.",
                "Hey, are you done? I'm getting late and need to leave.",
                "The movie is about to start, where are you?",
            ]),
            caller_name: Some("Mom"),
            caller_type: Some("Mobile"),
            ..NONE
        },
        Locale::Hi => Overrides {
            distress_keywords: Some(&["मदद", "रुको", "मुझे छोड़ दो"]),
            caller_name: Some("माँ"),
            female_voice_hints: &["महिला"],
            male_voice_hints: &["पुरुष"],
            ..NONE
        },
        Locale::Es => Overrides {
            distress_keywords: Some(&["ayuda", "para", "déjame"]),
            caller_name: Some("Mamá"),
            caller_type: Some("Móvil"),
            female_voice_hints: &["mujer"],
            male_voice_hints: &["hombre"],
            ..NONE
        },
        Locale::Fr => Overrides {
            distress_keywords: Some(&["aide", "arrêtez", "laissez-moi"]),
            caller_name: Some("Maman"),
            female_voice_hints: &["femme"],
            male_voice_hints: &["homme"],
            ..NONE
        },
        Locale::De => Overrides {
            distress_keywords: Some(&["hilfe", "stopp", "lass mich"]),
            ..NONE
        },
        Locale::It => Overrides {
            distress_keywords: Some(&["aiuto", "fermati", "lasciami"]),
            ..NONE
        },
        Locale::Ja => Overrides {
            distress_keywords: Some(&["助けて", "やめて", "離して"]),
            ..NONE
        },
        Locale::Ko => Overrides {
            distress_keywords: Some(&["도와주세요", "멈춰", "나를 내버려 둬"]),
            ..NONE
        },
        Locale::Zh => Overrides {
            distress_keywords: Some(&["救命", "停止", "放开我"]),
            ..NONE
        },
        Locale::Ta
        | Locale::Kn
        | Locale::Te
        | Locale::Ml
        | Locale::Pa
        | Locale::Gu
        | Locale::Mr => NONE,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error("{locale}: {field} is empty")]
    Empty { locale: Locale, field: &'static str },
    #[error("{locale}: {field} entry '{entry}' is blank or padded")]
    BlankEntry {
        locale: Locale,
        field: &'static str,
        entry: String,
    },
    #[error("{locale}: keyword '{keyword}' is not lower-case and can never match")]
    NotLowercase { locale: Locale, keyword: String },
    #[error("{locale}: duplicate {field} entry '{entry}'")]
    Duplicate {
        locale: Locale,
        field: &'static str,
        entry: String,
    },
}

/// Checks every resolved locale pack for completeness.
pub fn validate_catalog() -> Result<(), LocaleError> {
    for locale in Locale::ALL {
        validate_pack(&locale.pack())?;
    }
    Ok(())
}

fn validate_pack(pack: &LocalePack) -> Result<(), LocaleError> {
    let locale = pack.locale;
    check_list(locale, "distressKeywords", pack.distress_keywords)?;
    check_list(locale, "scenarios", pack.scenarios)?;
    if pack.caller_name.trim().is_empty() {
        return Err(LocaleError::Empty {
            locale,
            field: "callerName",
        });
    }
    for keyword in pack.distress_keywords {
        if keyword.to_lowercase() != *keyword {
            return Err(LocaleError::NotLowercase {
                locale,
                keyword: (*keyword).to_string(),
            });
        }
    }
    Ok(())
}

fn check_list(locale: Locale, field: &'static str, entries: &[&str]) -> Result<(), LocaleError> {
    if entries.is_empty() {
        return Err(LocaleError::Empty { locale, field });
    }
    let mut seen = HashSet::new();
    for entry in entries {
        if entry.is_empty() || entry.trim() != *entry {
            return Err(LocaleError::BlankEntry {
                locale,
                field,
                entry: (*entry).to_string(),
            });
        }
        if !seen.insert(*entry) {
            return Err(LocaleError::Duplicate {
                locale,
                field,
                entry: (*entry).to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_valid() {
        assert_eq!(validate_catalog(), Ok(()));
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(Locale::from_tag("hi-IN"), Some(Locale::Hi));
        assert_eq!(Locale::from_tag("FR"), Some(Locale::Fr));
        assert_eq!(Locale::from_tag("zh_CN"), Some(Locale::Zh));
        assert_eq!(Locale::from_tag("pt-BR"), None);
        assert_eq!(Locale::from_tag_or_default("pt-BR"), Locale::En);
    }

    #[test]
    fn test_missing_lists_fall_back_to_english() {
        let ta = Locale::Ta.pack();
        assert_eq!(ta.distress_keywords, Locale::En.pack().distress_keywords);
        assert_eq!(ta.scenarios.len(), 4);
        assert_eq!(ta.caller_name, "Mom");

        let es = Locale::Es.pack();
        assert_eq!(es.caller_name, "Mamá");
        assert_eq!(es.caller_type, "Móvil");
        assert_eq!(es.scenarios[0], "I'm waiting outside, come fast.");
    }

    #[test]
    fn test_distress_matching_is_case_insensitive_substring() {
        let en = Locale::En.pack();
        assert_eq!(en.matches_distress("  Please HELP me "), Some("help"));
        assert_eq!(en.matches_distress("just LEAVE ME alone"), Some("leave me"));
        assert_eq!(en.matches_distress("nice weather"), None);
        assert_eq!(en.matches_distress("   "), None);

        let hi = Locale::Hi.pack();
        assert_eq!(hi.matches_distress("कृपया मदद करो"), Some("मदद"));
        assert_eq!(hi.matches_distress("help"), None);
    }

    #[test]
    fn test_validation_rejects_uppercase_keyword() {
        let pack = LocalePack {
            distress_keywords: &["Help"],
            ..Locale::En.pack()
        };
        assert!(matches!(
            validate_pack(&pack),
            Err(LocaleError::NotLowercase { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_duplicates_and_empty() {
        let dup = LocalePack {
            scenarios: &["a", "a"],
            ..Locale::En.pack()
        };
        assert!(matches!(validate_pack(&dup), Err(LocaleError::Duplicate { .. })));

        let empty = LocalePack {
            distress_keywords: &[],
            ..Locale::De.pack()
        };
        assert_eq!(
            validate_pack(&empty),
            Err(LocaleError::Empty {
                locale: Locale::De,
                field: "distressKeywords"
            })
        );
    }
}
