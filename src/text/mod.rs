//! Text processing modules
//!
//! - Language codes and auto-detection
//! - BPE tokenization

pub mod language;
mod tokenizer;

pub use language::{
    language_table, resolve_language, supported_codes, Language, LanguageDetection, LanguageEntry,
    AUTO, LANGUAGES,
};
pub use tokenizer::TextTokenizer;
