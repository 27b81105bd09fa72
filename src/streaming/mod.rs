//! Pull-based audio streaming
//!
//! The platform mixer asks for N sample words on its own schedule; the
//! stream supplies up to N from the current file position and loops back to
//! the first sample at end of file. A shortfall is retried by the mixer on
//! its next pull.
//!
//! The file cursor lives behind a single mutex ([`SharedStream`]) so a
//! stream switch on the main loop always completes before the next fill
//! observes the new file. Pulled words travel to the output device through
//! a [`RingBuffer`].

pub mod ring_buffer;
pub mod shared;
pub mod stream;

pub use ring_buffer::{RingBuffer, RingBufferError};
pub use shared::{SharedStream, StreamHandle};
pub use stream::{AssetReader, WavStream};

/// Buffer length (in words) used for the music stream opened at startup
pub const STARTUP_BUFFER_LENGTH: usize = 800;

/// Buffer length (in words) used by the in-loop stream switches
pub const SWITCH_BUFFER_LENGTH: usize = 16000;

/// PCM layout handed to the mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamFormat {
    /// 8-bit mono
    #[default]
    Mono8,
    /// 16-bit mono
    Mono16,
    /// 8-bit stereo
    Stereo8,
    /// 16-bit stereo
    Stereo16,
}

impl StreamFormat {
    /// Derive the format from a header's channel count and bit depth.
    ///
    /// Any bit depth other than 8 selects the 16-bit variant. A channel
    /// count that is neither 1 nor 2 falls back to [`StreamFormat::Mono8`].
    pub fn from_channels(num_channels: u16, bits_per_sample: u16) -> Self {
        match (num_channels, bits_per_sample) {
            (1, 8) => StreamFormat::Mono8,
            (1, _) => StreamFormat::Mono16,
            (2, 8) => StreamFormat::Stereo8,
            (2, _) => StreamFormat::Stereo16,
            _ => StreamFormat::Mono8,
        }
    }

    /// Number of interleaved channels
    pub fn channels(self) -> u16 {
        match self {
            StreamFormat::Mono8 | StreamFormat::Mono16 => 1,
            StreamFormat::Stereo8 | StreamFormat::Stereo16 => 2,
        }
    }

    /// Bytes per sample frame
    pub fn bytes_per_frame(self) -> usize {
        match self {
            StreamFormat::Mono8 => 1,
            StreamFormat::Mono16 | StreamFormat::Stereo8 => 2,
            StreamFormat::Stereo16 => 4,
        }
    }
}

/// Hardware timer channel driving the stream; every session runs on timer 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamTimer {
    /// Timer 0
    #[default]
    Timer0,
}

/// Parameters of one stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    /// Sample rate in Hz (0 for the legacy stream switch)
    pub sample_rate: u32,
    /// PCM layout
    pub format: StreamFormat,
    /// Mixer-side buffer length in words
    pub buffer_length: usize,
    /// Timer channel
    pub timer: StreamTimer,
}

impl StreamParams {
    /// Session parameters derived from a header
    pub fn from_header(header: &crate::wav_parser::WavHeader, buffer_length: usize) -> Self {
        StreamParams {
            sample_rate: header.sample_rate,
            format: header.stream_format(),
            buffer_length,
            timer: StreamTimer::Timer0,
        }
    }

    /// Sample words the mixer consumes per second
    ///
    /// A word is 16 bits, so 8-bit formats pack two frames per word.
    pub fn words_per_second(&self) -> usize {
        let bytes = self.sample_rate as usize * self.format.bytes_per_frame();
        bytes.div_ceil(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav_parser::WavHeader;

    #[test]
    fn test_format_derivation() {
        assert_eq!(StreamFormat::from_channels(1, 8), StreamFormat::Mono8);
        assert_eq!(StreamFormat::from_channels(1, 16), StreamFormat::Mono16);
        assert_eq!(StreamFormat::from_channels(2, 8), StreamFormat::Stereo8);
        assert_eq!(StreamFormat::from_channels(2, 16), StreamFormat::Stereo16);
    }

    #[test]
    fn test_format_fallback() {
        assert_eq!(StreamFormat::from_channels(0, 0), StreamFormat::Mono8);
        assert_eq!(StreamFormat::from_channels(6, 16), StreamFormat::Mono8);
    }

    #[test]
    fn test_zero_header_params() {
        let params = StreamParams::from_header(&WavHeader::default(), SWITCH_BUFFER_LENGTH);
        assert_eq!(params.sample_rate, 0);
        assert_eq!(params.format, StreamFormat::Mono8);
        assert_eq!(params.buffer_length, 16000);
        assert_eq!(params.timer, StreamTimer::Timer0);
        assert_eq!(params.words_per_second(), 0);
    }

    #[test]
    fn test_words_per_second() {
        let params = StreamParams {
            sample_rate: 22050,
            format: StreamFormat::Stereo16,
            buffer_length: STARTUP_BUFFER_LENGTH,
            timer: StreamTimer::Timer0,
        };
        assert_eq!(params.words_per_second(), 44100);
    }
}
