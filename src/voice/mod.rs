//! Voice Module
//!
//! - Native speaker registry
//! - Volatile clone prompt cache
//! - Persistent custom voices (cloned or designed)
//! - Resolution of a voice name to a generation call

pub mod custom_store;
pub mod presets;
pub mod prompt_cache;
pub mod resolver;

pub use custom_store::{
    check_name, truncate_chars, validate_name, CreateVoice, CustomVoiceStore, VoiceDetails, VoiceEmbedding,
    VoiceMeta, VoiceOrigin, VoiceSource,
};
pub use presets::{is_native, native_names, native_voice, Gender, NativeVoice, DEFAULT_VOICE, NATIVE_VOICES};
pub use prompt_cache::{PromptCache, PromptEntry, PromptSummary};
pub use resolver::{known_voice_names, resolve_voice, GenerationPlan, RequestPath};
