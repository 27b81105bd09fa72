//! WAV capture of the pulled stream
//!
//! Records every word the mixer pulls from the stream callback, so a
//! headless run can be listened to afterwards.

use crate::streaming::StreamParams;
use crate::{Result, WhackError};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Writer for captured sample words
pub struct WavCapture {
    path: PathBuf,
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    words: u64,
}

impl WavCapture {
    /// Capture into `path`; the file is created on the first usable stream
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        WavCapture {
            path: path.as_ref().to_path_buf(),
            writer: None,
            words: 0,
        }
    }

    /// Start writing with the layout of `params`.
    ///
    /// The first session with a non-zero sample rate fixes the file layout;
    /// later sessions append to it unchanged.
    pub fn begin(&mut self, params: &StreamParams) -> Result<()> {
        if self.writer.is_some() || params.sample_rate == 0 {
            return Ok(());
        }

        let spec = hound::WavSpec {
            channels: params.format.channels(),
            sample_rate: params.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&self.path, spec).map_err(|e| {
            WhackError::AudioDeviceError(format!(
                "Failed to create capture file '{}': {e}",
                self.path.display()
            ))
        })?;
        tracing::info!("capturing stream to {}", self.path.display());
        self.writer = Some(writer);
        Ok(())
    }

    /// Append pulled words
    pub fn write(&mut self, words: &[u16]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        for &word in words {
            writer
                .write_sample(word as i16)
                .map_err(|e| format!("Failed to write sample: {e}"))?;
        }
        self.words += words.len() as u64;
        Ok(())
    }

    /// Words written so far
    pub fn words_written(&self) -> u64 {
        self.words
    }

    /// Flush the header and close the file
    pub fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| format!("Failed to finalize WAV file: {e}"))?;
        }
        Ok(())
    }
}

impl Drop for WavCapture {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::{StreamFormat, StreamTimer};

    fn params(sample_rate: u32) -> StreamParams {
        StreamParams {
            sample_rate,
            format: StreamFormat::Stereo16,
            buffer_length: 800,
            timer: StreamTimer::Timer0,
        }
    }

    #[test]
    fn test_capture_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.wav");

        let mut capture = WavCapture::new(&path);
        capture.begin(&params(22050)).unwrap();
        capture.write(&[1, 2, 0xFFFF, 4]).unwrap();
        capture.finish().unwrap();
        assert_eq!(capture.words_written(), 4);

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 22050);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2, -1, 4]);
    }

    #[test]
    fn test_zero_rate_defers_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.wav");

        let mut capture = WavCapture::new(&path);
        capture.begin(&params(0)).unwrap();
        capture.write(&[1, 2]).unwrap();
        assert_eq!(capture.words_written(), 0);
        assert!(!path.exists());
    }
}
