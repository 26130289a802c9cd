//! Core abstractions
//!
//! - `error`: crate-wide error type and `Result` alias

pub mod error;

pub use error::{AudioOperation, BackendOperation, ResourceKind, Result, ResultExt, TtsError};
