//! Reference audio uploads
//!
//! Uploaded clips are spooled to a temporary file carrying the original
//! extension so the model worker and the decoders can sniff the container.
//! The file is removed when the [`ReferenceAudio`] is dropped, whatever path
//! the request took.
//!
//! Duration probing:
//! - WAV via hound (header only)
//! - MP3, FLAC, OGG/Vorbis via symphonia

use std::fs::File;
use std::io::Write;
use std::path::Path;

use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::error::{AudioOperation, Result, TtsError};

fn loading_error(message: impl Into<String>) -> TtsError {
    TtsError::Audio {
        message: message.into(),
        operation: AudioOperation::Loading,
    }
}

/// Reference clip spooled to disk for the lifetime of a request
#[derive(Debug)]
pub struct ReferenceAudio {
    file: NamedTempFile,
    extension: String,
    duration_secs: f64,
}

impl ReferenceAudio {
    /// Spool an upload and probe its duration
    ///
    /// The extension is taken from the client file name, defaulting to `wav`.
    pub fn from_upload(bytes: &[u8], filename: Option<&str>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(TtsError::validation("reference_audio", "reference audio file is empty"));
        }

        let extension = filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "wav".to_string());

        let mut file = tempfile::Builder::new()
            .prefix("ref-audio-")
            .suffix(&format!(".{}", extension))
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        let duration_secs = probe_duration(file.path(), &extension)?;
        debug!(
            "Reference audio spooled to {:?} ({} bytes, {:.2}s)",
            file.path(),
            bytes.len(),
            duration_secs
        );

        Ok(Self {
            file,
            extension,
            duration_secs,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Lowercase extension without the dot
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Read the spooled bytes back
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.file.path())?)
    }

    /// Reject clips outside `[min_secs, max_secs]`
    pub fn ensure_duration(&self, min_secs: f64, max_secs: f64) -> Result<()> {
        if self.duration_secs < min_secs {
            return Err(TtsError::validation(
                "reference_audio",
                format!("audio too short: {:.1}s (min: {}s)", self.duration_secs, min_secs),
            ));
        }
        if self.duration_secs > max_secs {
            return Err(TtsError::validation(
                "reference_audio",
                format!("audio too long: {:.1}s (max: {}s)", self.duration_secs, max_secs),
            ));
        }
        Ok(())
    }
}

/// Duration in seconds of an audio file
pub fn probe_duration(path: &Path, extension: &str) -> Result<f64> {
    if extension.eq_ignore_ascii_case("wav") {
        // Fall through to symphonia for WAV flavours hound rejects
        if let Ok(duration) = wav_duration(path) {
            return Ok(duration);
        }
    }
    symphonia_duration(path, extension)
}

fn wav_duration(path: &Path) -> Result<f64> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| loading_error(format!("invalid WAV file: {}", e)))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(loading_error("WAV header reports a zero sample rate"));
    }
    // duration() counts frames, independent of channel count
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

fn symphonia_duration(path: &Path, extension: &str) -> Result<f64> {
    let src = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| loading_error(format!("unsupported audio format '{}': {}", extension, e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| loading_error("no supported audio track found"))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .filter(|&sr| sr > 0)
        .ok_or_else(|| loading_error("unknown sample rate"))?;

    if let Some(frames) = track.codec_params.n_frames {
        return Ok(frames as f64 / sample_rate as f64);
    }

    // No frame count in the container header: decode and count
    let track_id = track.id;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| loading_error(format!("unsupported codec: {}", e)))?;

    let mut frames: u64 = 0;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(loading_error(format!("error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => frames += decoded.frames() as u64,
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(loading_error(format!("decode error: {}", e))),
        }
    }

    Ok(frames as f64 / sample_rate as f64)
}
