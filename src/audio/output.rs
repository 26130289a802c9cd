//! Audio output
//!
//! Provides:
//! - 16-bit PCM WAV encoding into memory
//! - ZIP archives of numbered WAV files for batch requests

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::error::{AudioOperation, Result, TtsError};
use crate::engine::GeneratedAudio;

fn encoding_error(message: impl Into<String>) -> TtsError {
    TtsError::Audio {
        message: message.into(),
        operation: AudioOperation::Encoding,
    }
}

fn archiving_error(message: impl Into<String>) -> TtsError {
    TtsError::Audio {
        message: message.into(),
        operation: AudioOperation::Archiving,
    }
}

/// Encode mono samples as a 16-bit PCM WAV file
///
/// # Arguments
/// * `samples` - Audio samples (f32, normalized to [-1, 1])
/// * `sample_rate` - Sample rate in Hz
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    if sample_rate == 0 {
        return Err(encoding_error("sample rate must be positive"));
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| encoding_error(format!("failed to start WAV stream: {}", e)))?;

        for &sample in samples {
            let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(scaled)
                .map_err(|e| encoding_error(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| encoding_error(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Encode a generation result as WAV
pub fn encode_generated(audio: &GeneratedAudio) -> Result<Vec<u8>> {
    encode_wav(&audio.samples, audio.sample_rate)
}

/// In-memory ZIP of `001.wav`, `002.wav`, ...
pub struct AudioArchive {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    count: usize,
}

impl AudioArchive {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            count: 0,
        }
    }

    /// Append the next numbered WAV entry and return its file name
    pub fn push_wav(&mut self, wav: &[u8]) -> Result<String> {
        let name = format!("{:03}.wav", self.count + 1);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        self.writer
            .start_file(name.as_str(), options)
            .map_err(|e| archiving_error(e.to_string()))?;
        self.writer
            .write_all(wav)
            .map_err(|e| archiving_error(e.to_string()))?;

        self.count += 1;
        Ok(name)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Close the central directory and return the archive bytes
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| archiving_error(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

impl Default for AudioArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_encode_wav_header() {
        let samples: Vec<f32> = (0..2400).map(|i| (i as f32 * 0.01).sin()).collect();
        let wav = encode_wav(&samples, 24000).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 24000);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.len(), 2400);
    }

    #[test]
    fn test_encode_wav_clamps() {
        let wav = encode_wav(&[2.0, -2.0], 8000).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![32767, -32768]);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        assert!(encode_wav(&[0.0], 0).is_err());
    }

    #[test]
    fn test_archive_numbering() {
        let wav = encode_wav(&[0.0; 100], 8000).unwrap();
        let mut archive = AudioArchive::new();
        assert!(archive.is_empty());
        assert_eq!(archive.push_wav(&wav).unwrap(), "001.wav");
        assert_eq!(archive.push_wav(&wav).unwrap(), "002.wav");
        assert_eq!(archive.len(), 2);

        let bytes = archive.finish().unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 2);

        let mut entry = zip.by_name("002.wav").unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, wav);
    }
}
