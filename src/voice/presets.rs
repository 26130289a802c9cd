//! Native speakers shipped with the CustomVoice checkpoints

use serde::{Deserialize, Serialize};

/// Gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Built-in speaker identity
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NativeVoice {
    pub name: &'static str,
    pub gender: Gender,
    pub native_language: &'static str,
    pub description: &'static str,
}

pub const NATIVE_VOICES: [NativeVoice; 9] = [
    NativeVoice {
        name: "Vivian",
        gender: Gender::Female,
        native_language: "Chinese",
        description: "Young female voice, bright and slightly sharp",
    },
    NativeVoice {
        name: "Serena",
        gender: Gender::Female,
        native_language: "Chinese",
        description: "Young female voice, warm and gentle",
    },
    NativeVoice {
        name: "Uncle_Fu",
        gender: Gender::Male,
        native_language: "Chinese",
        description: "Mature male voice with a deep, velvety timbre",
    },
    NativeVoice {
        name: "Dylan",
        gender: Gender::Male,
        native_language: "Chinese (Beijing)",
        description: "Young Beijing male voice, clear and natural",
    },
    NativeVoice {
        name: "Eric",
        gender: Gender::Male,
        native_language: "Chinese (Sichuan)",
        description: "Cheerful Chengdu male voice, slightly husky",
    },
    NativeVoice {
        name: "Ryan",
        gender: Gender::Male,
        native_language: "English",
        description: "Dynamic male voice with a brisk rhythm",
    },
    NativeVoice {
        name: "Aiden",
        gender: Gender::Male,
        native_language: "English",
        description: "Sunny American male voice with clear mids",
    },
    NativeVoice {
        name: "Ono_Anna",
        gender: Gender::Female,
        native_language: "Japanese",
        description: "Playful female voice with a light, agile timbre",
    },
    NativeVoice {
        name: "Sohee",
        gender: Gender::Female,
        native_language: "Korean",
        description: "Warm female voice with rich emotion",
    },
];

/// Default speaker for preset routes
pub const DEFAULT_VOICE: &str = "Serena";

/// Exact, case-sensitive lookup
pub fn native_voice(name: &str) -> Option<&'static NativeVoice> {
    NATIVE_VOICES.iter().find(|v| v.name == name)
}

pub fn is_native(name: &str) -> bool {
    native_voice(name).is_some()
}

/// Native names in table order
pub fn native_names() -> Vec<&'static str> {
    NATIVE_VOICES.iter().map(|v| v.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_native_voices() {
        assert_eq!(NATIVE_VOICES.len(), 9);
        assert!(is_native("Serena"));
        assert!(is_native("Ono_Anna"));
        assert!(!is_native("serena"));
        assert!(is_native(DEFAULT_VOICE));
    }

    #[test]
    fn test_gender_serializes_lowercase() {
        let json = serde_json::to_value(native_voice("Ryan").unwrap()).unwrap();
        assert_eq!(json["gender"], "male");
        assert_eq!(json["native_language"], "English");
    }
}
