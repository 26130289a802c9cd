//! Language codes and automatic detection
//!
//! Requests carry a short code (`fr`, `en`, ...) or `auto`. The model expects
//! the full English language name, so every code is mapped through
//! [`Language::name`] before reaching the backend.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::core::error::{Result, TtsError};

/// Sentinel code requesting detection
pub const AUTO: &str = "auto";

/// Languages supported by the Qwen3-TTS checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    French,
    English,
    Chinese,
    Japanese,
    Korean,
    German,
    Russian,
    Portuguese,
    Spanish,
    Italian,
}

/// Listing order for `/languages`
pub const LANGUAGES: [Language; 10] = [
    Language::French,
    Language::English,
    Language::Chinese,
    Language::Japanese,
    Language::Korean,
    Language::German,
    Language::Russian,
    Language::Portuguese,
    Language::Spanish,
    Language::Italian,
];

impl Language {
    /// Request code
    pub fn code(&self) -> &'static str {
        match self {
            Language::French => "fr",
            Language::English => "en",
            Language::Chinese => "zh",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::German => "de",
            Language::Russian => "ru",
            Language::Portuguese => "pt",
            Language::Spanish => "es",
            Language::Italian => "it",
        }
    }

    /// Name understood by the model
    pub fn name(&self) -> &'static str {
        match self {
            Language::French => "French",
            Language::English => "English",
            Language::Chinese => "Chinese",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::German => "German",
            Language::Russian => "Russian",
            Language::Portuguese => "Portuguese",
            Language::Spanish => "Spanish",
            Language::Italian => "Italian",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        LANGUAGES.iter().copied().find(|l| l.code() == code)
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::French
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = TtsError;

    fn from_str(code: &str) -> Result<Self> {
        Language::from_code(code).ok_or_else(|| {
            TtsError::validation(
                "language",
                format!(
                    "unsupported language '{}', expected one of: {}, {}",
                    code,
                    supported_codes().join(", "),
                    AUTO
                ),
            )
        })
    }
}

/// Entry of the `/languages` table
#[derive(Debug, Clone, Serialize)]
pub struct LanguageEntry {
    pub code: &'static str,
    pub name: &'static str,
}

pub fn language_table() -> Vec<LanguageEntry> {
    LANGUAGES
        .iter()
        .map(|l| LanguageEntry {
            code: l.code(),
            name: l.name(),
        })
        .collect()
}

pub fn supported_codes() -> Vec<&'static str> {
    LANGUAGES.iter().map(|l| l.code()).collect()
}

/// Resolve a request code, running detection on `text` for `auto`
pub fn resolve_language(code: &str, text: &str) -> Result<Language> {
    let code = code.trim();
    if code.eq_ignore_ascii_case(AUTO) {
        let detection = LanguageDetection::detect(text);
        debug!(
            "Detected language {} (script {:?}, confidence {:.2})",
            detection.language.code(),
            detection.script,
            detection.confidence
        );
        return Ok(detection.language);
    }
    code.to_ascii_lowercase().parse()
}

/// Language detection result
#[derive(Debug, Clone)]
pub struct LanguageDetection {
    pub language: Language,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Script detected
    pub script: Option<&'static str>,
}

const STOP_WORDS: &[(Language, &[&str])] = &[
    (
        Language::French,
        &["le", "la", "les", "des", "est", "et", "une", "un", "je", "vous", "nous", "pas", "que", "qui", "dans", "pour", "avec", "sur", "ce", "c'est", "bonjour"],
    ),
    (
        Language::English,
        &["the", "and", "is", "are", "you", "this", "that", "with", "for", "of", "to", "it", "was", "hello", "what", "have"],
    ),
    (
        Language::German,
        &["der", "die", "das", "und", "ist", "nicht", "ich", "sie", "mit", "ein", "eine", "zu", "auf", "für", "guten", "hallo"],
    ),
    (
        Language::Spanish,
        &["el", "los", "las", "es", "y", "que", "una", "por", "para", "con", "está", "hola", "muy", "pero", "del"],
    ),
    (
        Language::Portuguese,
        &["o", "os", "as", "é", "e", "que", "um", "uma", "não", "com", "para", "você", "olá", "obrigado", "muito", "do", "da"],
    ),
    (
        Language::Italian,
        &["il", "lo", "gli", "è", "e", "che", "una", "non", "per", "con", "sono", "ciao", "grazie", "della", "questo"],
    ),
];

impl LanguageDetection {
    /// Detect language from text (script counts, then stop words for Latin)
    ///
    /// Falls back to French when nothing identifies the text.
    pub fn detect(text: &str) -> Self {
        let mut total = 0f32;
        let mut hanzi = 0f32;
        let mut kana = 0f32;
        let mut hangul = 0f32;
        let mut cyrillic = 0f32;
        let mut latin = 0f32;

        for c in text.chars().filter(|c| c.is_alphabetic()) {
            total += 1.0;
            match c {
                '\u{4e00}'..='\u{9fff}' | '\u{3400}'..='\u{4dbf}' => hanzi += 1.0,
                '\u{3040}'..='\u{30ff}' => kana += 1.0,
                '\u{ac00}'..='\u{d7af}' | '\u{1100}'..='\u{11ff}' => hangul += 1.0,
                '\u{0400}'..='\u{04ff}' => cyrillic += 1.0,
                'a'..='z' | 'A'..='Z' | '\u{00c0}'..='\u{024f}' => latin += 1.0,
                _ => {}
            }
        }

        if total == 0.0 {
            return Self::fallback();
        }

        // Japanese mixes kanji with kana; any kana decides
        if kana > 0.0 && kana + hanzi >= latin {
            return Self::found(Language::Japanese, "Kana", (kana + hanzi) / total);
        }

        let counts = [hanzi, hangul, cyrillic, latin];
        let max_count = counts.iter().cloned().fold(0.0f32, f32::max);

        if hanzi == max_count && hanzi > 0.0 {
            Self::found(Language::Chinese, "Hanzi", hanzi / total)
        } else if hangul == max_count && hangul > 0.0 {
            Self::found(Language::Korean, "Hangul", hangul / total)
        } else if cyrillic == max_count && cyrillic > 0.0 {
            Self::found(Language::Russian, "Cyrillic", cyrillic / total)
        } else {
            Self::detect_latin(text)
        }
    }

    fn found(language: Language, script: &'static str, confidence: f32) -> Self {
        Self {
            language,
            confidence,
            script: Some(script),
        }
    }

    fn fallback() -> Self {
        Self {
            language: Language::default(),
            confidence: 0.0,
            script: None,
        }
    }

    fn detect_latin(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphabetic() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Self::fallback();
        }

        let mut best: Option<(Language, usize)> = None;
        for (language, stop_words) in STOP_WORDS {
            let hits = words.iter().filter(|w| stop_words.contains(w)).count();
            // Ties keep the earlier entry, French first
            if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
                best = Some((*language, hits));
            }
        }

        match best {
            Some((language, hits)) => {
                Self::found(language, "Latin", hits as f32 / words.len() as f32)
            }
            None => Self {
                language: Language::default(),
                confidence: 0.0,
                script: Some("Latin"),
            },
        }
    }
}
