//! WAV header record
//!
//! Layout (little-endian, 44 bytes):
//! - `RIFF` chunk: id, size, `WAVE` format
//! - `fmt ` sub-chunk: id, size, audio format, channels, sample rate,
//!   byte rate, block align, bits per sample
//! - `data` sub-chunk: id, size
//!
//! Only the four tags are validated. The remaining fields are trusted as-is
//! and the declared data size is informational; streams loop at end of file.

use super::{DATA_ID, FMT_ID, RIFF_ID, WAVE_ID};
use crate::streaming::StreamFormat;
use crate::{Result, WhackError};
use nom::number::complete::{le_u16, le_u32};
use nom::sequence::tuple;
use nom::IResult;
use std::fmt;

/// Size of the on-disk header; the first sample starts right after it
pub const WAV_HEADER_LEN: usize = 44;

/// One of the four chunk tags a header must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicTag {
    /// `RIFF` chunk descriptor
    Riff,
    /// `WAVE` format marker
    Wave,
    /// `fmt ` sub-chunk id
    Fmt,
    /// `data` sub-chunk id
    Data,
}

impl MagicTag {
    /// Value the tag must hold
    pub fn expected(self) -> u32 {
        match self {
            MagicTag::Riff => RIFF_ID,
            MagicTag::Wave => WAVE_ID,
            MagicTag::Fmt => FMT_ID,
            MagicTag::Data => DATA_ID,
        }
    }
}

impl fmt::Display for MagicTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MagicTag::Riff => "RIFF",
            MagicTag::Wave => "WAVE",
            MagicTag::Fmt => "fmt",
            MagicTag::Data => "data",
        })
    }
}

/// Parsed 44-byte WAV header
///
/// `Default` is the all-zero header; the legacy stream switch derives its
/// parameters from exactly that value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WavHeader {
    /// `RIFF` tag
    pub chunk_id: u32,
    /// Size of the rest of the file
    pub chunk_size: u32,
    /// `WAVE` tag
    pub format: u32,
    /// `fmt ` tag
    pub subchunk1_id: u32,
    /// Size of the fmt sub-chunk
    pub subchunk1_size: u32,
    /// 1 for integer PCM
    pub audio_format: u16,
    /// Channel count
    pub num_channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bytes per second
    pub byte_rate: u32,
    /// Bytes per sample frame
    pub block_align: u16,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// `data` tag
    pub subchunk2_id: u32,
    /// Declared PCM data size in bytes
    pub subchunk2_size: u32,
}

impl WavHeader {
    /// Parse a header from the first 44 bytes of `data`.
    ///
    /// Does not validate the tags; see [`WavHeader::check`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < WAV_HEADER_LEN {
            return Err(WhackError::HeaderUnreadable(format!(
                "need {} bytes, got {}",
                WAV_HEADER_LEN,
                data.len()
            )));
        }

        parse_fields(data)
            .map(|(_, header)| header)
            .map_err(|e| WhackError::HeaderUnreadable(e.to_string()))
    }

    /// Validate the four tags, reporting the first that does not match.
    pub fn check(&self) -> Result<()> {
        let tags = [
            (MagicTag::Riff, self.chunk_id),
            (MagicTag::Wave, self.format),
            (MagicTag::Fmt, self.subchunk1_id),
            (MagicTag::Data, self.subchunk2_id),
        ];

        for (tag, found) in tags {
            if found != tag.expected() {
                return Err(WhackError::CorruptHeader { tag, found });
            }
        }

        Ok(())
    }

    /// Stream format implied by channel count and bit depth
    pub fn stream_format(&self) -> StreamFormat {
        StreamFormat::from_channels(self.num_channels, self.bits_per_sample)
    }
}

/// Free-function form of [`WavHeader::check`]
pub fn check_header(header: &WavHeader) -> Result<()> {
    header.check()
}

fn parse_fields(input: &[u8]) -> IResult<&[u8], WavHeader> {
    let (input, (chunk_id, chunk_size, format)) = tuple((le_u32, le_u32, le_u32))(input)?;
    let (input, (subchunk1_id, subchunk1_size, audio_format, num_channels)) =
        tuple((le_u32, le_u32, le_u16, le_u16))(input)?;
    let (input, (sample_rate, byte_rate, block_align, bits_per_sample)) =
        tuple((le_u32, le_u32, le_u16, le_u16))(input)?;
    let (input, (subchunk2_id, subchunk2_size)) = tuple((le_u32, le_u32))(input)?;

    Ok((
        input,
        WavHeader {
            chunk_id,
            chunk_size,
            format,
            subchunk1_id,
            subchunk1_size,
            audio_format,
            num_channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            subchunk2_id,
            subchunk2_size,
        },
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Canonical 16-bit PCM header for `data_len` bytes of samples
    pub(crate) fn header_bytes(channels: u16, sample_rate: u32, bits: u16, data_len: u32) -> Vec<u8> {
        let block_align = channels * bits / 8;
        let mut out = Vec::with_capacity(WAV_HEADER_LEN);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out
    }

    #[test]
    fn test_parse_fields() {
        let bytes = header_bytes(2, 22050, 16, 400);
        let header = WavHeader::parse(&bytes).unwrap();
        assert_eq!(header.chunk_id, RIFF_ID);
        assert_eq!(header.num_channels, 2);
        assert_eq!(header.sample_rate, 22050);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.block_align, 4);
        assert_eq!(header.subchunk2_size, 400);
        assert!(header.check().is_ok());
        assert_eq!(header.stream_format(), StreamFormat::Stereo16);
    }

    #[test]
    fn test_parse_short_input() {
        let bytes = header_bytes(1, 8000, 8, 0);
        let result = WavHeader::parse(&bytes[..30]);
        assert!(matches!(result, Err(WhackError::HeaderUnreadable(_))));
    }

    #[test]
    fn test_each_corrupt_tag_is_reported() {
        // Byte offsets of the four tags inside the header
        let cases = [
            (0, MagicTag::Riff),
            (8, MagicTag::Wave),
            (12, MagicTag::Fmt),
            (36, MagicTag::Data),
        ];

        for (offset, expected_tag) in cases {
            let mut bytes = header_bytes(1, 16000, 16, 100);
            bytes[offset] ^= 0xFF;
            let header = WavHeader::parse(&bytes).unwrap();
            match header.check() {
                Err(WhackError::CorruptHeader { tag, found }) => {
                    assert_eq!(tag, expected_tag);
                    assert_ne!(found, expected_tag.expected());
                }
                other => panic!("expected corrupt {expected_tag}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_first_failing_tag_wins() {
        let mut bytes = header_bytes(1, 16000, 16, 100);
        bytes[8] = 0;
        bytes[36] = 0;
        let err = check_header(&WavHeader::parse(&bytes).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            WhackError::CorruptHeader {
                tag: MagicTag::Wave,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_header_fails_on_riff() {
        let err = WavHeader::default().check().unwrap_err();
        assert!(matches!(
            err,
            WhackError::CorruptHeader {
                tag: MagicTag::Riff,
                found: 0
            }
        ));
    }
}
