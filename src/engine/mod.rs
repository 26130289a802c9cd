//! Model backend layer
//!
//! The Qwen3-TTS checkpoints run outside this process. Handlers reach them
//! through the [`SpeechBackend`] trait only.
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │              Request Handlers              │
//! ├────────────────────────────────────────────┤
//! │          SpeechBackend (trait)             │
//! │  generate()   create_voice_clone_prompt()  │
//! │  preload()    loaded_models()              │
//! ├─────────────────────┬──────────────────────┤
//! │   RemoteBackend     │   OfflineBackend     │
//! │ (HTTP model worker) │ (deterministic tone) │
//! └─────────────────────┴──────────────────────┘
//! ```

pub mod config;
pub mod offline;
pub mod remote;
pub mod traits;

pub use config::{BackendConfig, BackendKind};
pub use offline::{OfflineBackend, OFFLINE_SAMPLE_RATE};
pub use remote::RemoteBackend;
pub use traits::{
    GeneratedAudio, GenerationMode, GenerationRequest, ModelKind, ModelVariant, SpeechBackend,
    VoicePrompt,
};
