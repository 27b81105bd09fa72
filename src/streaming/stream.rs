//! Looping WAV stream reader
//!
//! Serves 16-bit little-endian sample words from a WAV file and wraps back
//! to the first sample (byte 44) when the file runs out, inside the same
//! fill call.

use crate::wav_parser::{WavHeader, WAV_HEADER_LEN};
use crate::{Result, WhackError};
use std::io::{self, Read, Seek, SeekFrom};

/// Byte source an asset filesystem hands out
pub trait AssetReader: Read + Seek + Send {}

impl<T: Read + Seek + Send> AssetReader for T {}

/// An open stream session's file cursor
pub struct WavStream<R = Box<dyn AssetReader>> {
    reader: R,
    header: WavHeader,
    /// Scratch space reused across fills
    scratch: Vec<u8>,
    loops: u64,
}

impl<R: Read + Seek> WavStream<R> {
    /// Read and validate the header, leaving the cursor on the first sample.
    pub fn open(mut reader: R) -> Result<Self> {
        let mut bytes = [0u8; WAV_HEADER_LEN];
        read_header_bytes(&mut reader, &mut bytes)?;

        let header = WavHeader::parse(&bytes)?;
        header.check()?;

        Ok(WavStream {
            reader,
            header,
            scratch: Vec::new(),
            loops: 0,
        })
    }

    /// Wrap a reader without reading its header.
    ///
    /// The cursor is left where it is and the header is all zeros, matching
    /// the legacy in-loop stream switch: the first fill streams the header
    /// bytes themselves as audio.
    pub fn unchecked(reader: R) -> Self {
        WavStream {
            reader,
            header: WavHeader::default(),
            scratch: Vec::new(),
            loops: 0,
        }
    }

    /// Header the stream was opened with
    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    /// How many times the stream has wrapped back to the first sample
    pub fn loop_count(&self) -> u64 {
        self.loops
    }

    /// Fill `dest` with up to `dest.len()` sample words.
    ///
    /// At end of file the cursor seeks to the first sample once and the
    /// remainder is read from there. Returns the number of words written;
    /// a short count means the file had no more data even after the wrap.
    pub fn fill_buffer(&mut self, dest: &mut [u16]) -> io::Result<usize> {
        let want = dest.len() * 2;
        self.scratch.resize(want, 0);

        let mut filled = 0;
        let mut wrapped = false;

        while filled < want {
            let n = match self.reader.read(&mut self.scratch[filled..want]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if n > 0 {
                filled += n;
                continue;
            }

            if wrapped {
                break;
            }

            // End of file: drop a dangling odd byte, then loop
            filled -= filled % 2;
            self.reader
                .seek(SeekFrom::Start(WAV_HEADER_LEN as u64))?;
            self.loops += 1;
            wrapped = true;
        }

        let words = filled / 2;
        for (word, bytes) in dest
            .iter_mut()
            .zip(self.scratch[..words * 2].chunks_exact(2))
        {
            *word = u16::from_le_bytes([bytes[0], bytes[1]]);
        }

        Ok(words)
    }

    /// Give back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl WavStream {
    /// Box a concrete reader into the type-erased stream the mixer uses
    pub fn open_boxed<T: AssetReader + 'static>(reader: T) -> Result<Self> {
        WavStream::open(Box::new(reader) as Box<dyn AssetReader>)
    }
}

fn read_header_bytes<R: Read>(reader: &mut R, bytes: &mut [u8]) -> Result<()> {
    reader.read_exact(bytes).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => WhackError::HeaderUnreadable(format!(
            "file shorter than the {WAV_HEADER_LEN}-byte header"
        )),
        _ => WhackError::HeaderUnreadable(e.to_string()),
    })
}
