//! WAV Parser Domain
//!
//! Parses the fixed 44-byte RIFF/WAVE header that precedes the raw PCM data
//! of every streamed music asset, and validates its four chunk tags.

pub mod header;

pub use header::{check_header, MagicTag, WavHeader, WAV_HEADER_LEN};

/// `"RIFF"` read as a little-endian u32
pub const RIFF_ID: u32 = 0x4646_4952;
/// `"WAVE"` read as a little-endian u32
pub const WAVE_ID: u32 = 0x4556_4157;
/// `"fmt "` read as a little-endian u32
pub const FMT_ID: u32 = 0x2074_6d66;
/// `"data"` read as a little-endian u32
pub const DATA_ID: u32 = 0x6174_6164;
