//! Audio handling
//!
//! - Reference clip uploads and duration probing (WAV, MP3, FLAC, OGG)
//! - WAV encoding of generated speech
//! - ZIP packaging for batch responses

mod loader;
mod output;

pub use loader::{probe_duration, ReferenceAudio};
pub use output::{encode_generated, encode_wav, AudioArchive};
