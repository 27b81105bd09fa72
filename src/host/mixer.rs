//! Pumped host mixer
//!
//! On the handheld the mixer pulls stream words from an interrupt. Here the
//! pull happens once per frame in [`Mixer::frame`]: the frame's share of the
//! stream's word rate is requested through the [`StreamHandle`] in chunks of
//! at most `buffer_length` words, pushed into a [`RingBuffer`] and optionally
//! captured to a WAV file. A short pull is retried within the same frame;
//! only a pull that delivers nothing carries the remainder to the next frame.

use super::capture::WavCapture;
#[cfg(feature = "streaming")]
use super::device::AudioDevice;
use super::vbl::{TimingConfig, VblSync};
use crate::platform::{Mixer, SoundEffect};
use crate::streaming::{RingBuffer, StreamHandle, StreamParams};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Ring buffer capacity in words
pub const RING_CAPACITY: usize = 65536;

/// Counters exposed for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MixerStats {
    /// Stream sessions opened
    pub sessions_opened: u64,
    /// Fill requests issued
    pub pulls: u64,
    /// Fill requests answered with fewer words than asked for
    pub short_pulls: u64,
    /// Words delivered by the stream
    pub words_pulled: u64,
}

struct StreamSession {
    params: StreamParams,
    source: StreamHandle,
    /// Words requested but not yet delivered
    owed: usize,
}

/// Host implementation of [`Mixer`]
pub struct HostMixer {
    session: Option<StreamSession>,
    ring: Arc<RingBuffer>,
    clock: VblSync,
    scratch: Vec<u16>,
    soundbank_len: usize,
    effects: HashMap<SoundEffect, u8>,
    played: Vec<SoundEffect>,
    capture: Option<WavCapture>,
    audible: bool,
    #[cfg(feature = "streaming")]
    device: Option<AudioDevice>,
    stats: MixerStats,
}

impl HostMixer {
    /// Silent mixer
    pub fn new() -> Result<Self> {
        Ok(HostMixer {
            session: None,
            ring: Arc::new(RingBuffer::new(RING_CAPACITY)?),
            clock: VblSync::new(TimingConfig::default()),
            scratch: Vec::new(),
            soundbank_len: 0,
            effects: HashMap::new(),
            played: Vec::new(),
            capture: None,
            audible: false,
            #[cfg(feature = "streaming")]
            device: None,
            stats: MixerStats::default(),
        })
    }

    /// Record pulled words into `capture`
    pub fn with_capture(mut self, capture: WavCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Send 16-bit sessions to the default output device (needs the
    /// `streaming` feature; ignored otherwise)
    pub fn with_audio(mut self, audible: bool) -> Self {
        self.audible = audible;
        self
    }

    /// Parameters of the open session
    pub fn stream_params(&self) -> Option<StreamParams> {
        self.session.as_ref().map(|s| s.params)
    }

    /// Whether a session is open
    pub fn is_streaming(&self) -> bool {
        self.session.is_some()
    }

    /// Size of the sound bank handed to [`Mixer::init`]
    pub fn soundbank_len(&self) -> usize {
        self.soundbank_len
    }

    /// Volume `effect` was loaded at
    pub fn effect_volume(&self, effect: SoundEffect) -> Option<u8> {
        self.effects.get(&effect).copied()
    }

    /// Effects started so far, in order
    pub fn played(&self) -> &[SoundEffect] {
        &self.played
    }

    /// Times `effect` was started
    pub fn play_count(&self, effect: SoundEffect) -> usize {
        self.played.iter().filter(|&&e| e == effect).count()
    }

    /// Counters
    pub fn stats(&self) -> MixerStats {
        self.stats
    }

    /// Ring buffer between the pump and the output device
    pub fn ring(&self) -> &Arc<RingBuffer> {
        &self.ring
    }

    /// Capture sink, if any
    pub fn capture(&self) -> Option<&WavCapture> {
        self.capture.as_ref()
    }

    /// Finish the capture file
    pub fn finish_capture(&mut self) -> Result<()> {
        match self.capture.as_mut() {
            Some(capture) => capture.finish(),
            None => Ok(()),
        }
    }

    /// Pull `words` from the open session right now
    pub fn pump(&mut self, words: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let chunk_len = session.params.buffer_length.max(1);
        if self.scratch.len() < chunk_len {
            self.scratch.resize(chunk_len, 0);
        }

        let mut remaining = words;
        while remaining > 0 {
            let want = remaining.min(chunk_len);
            let got = session.source.fill(&mut self.scratch[..want]);
            self.stats.pulls += 1;
            self.stats.words_pulled += got as u64;

            let pulled = &self.scratch[..got];
            let written = self.ring.write(pulled);
            if written < got {
                tracing::trace!("ring buffer full, dropped {} words", got - written);
            }
            if let Some(capture) = self.capture.as_mut() {
                if let Err(e) = capture.write(pulled) {
                    tracing::warn!("{e}");
                    self.capture = None;
                }
            }

            remaining -= got;
            if got < want {
                self.stats.short_pulls += 1;
            }
            if got == 0 {
                break;
            }
        }
        session.owed = remaining.min(chunk_len);

        #[cfg(feature = "streaming")]
        let drained_by_device = self.device.is_some();
        #[cfg(not(feature = "streaming"))]
        let drained_by_device = false;
        if !drained_by_device {
            self.ring.flush();
        }
    }

    #[cfg(feature = "streaming")]
    fn attach_device(&mut self, params: &StreamParams) {
        use crate::streaming::StreamFormat;

        if let Some(device) = self.device.take() {
            device.finish();
        }
        let sixteen_bit = matches!(params.format, StreamFormat::Mono16 | StreamFormat::Stereo16);
        if !self.audible || !sixteen_bit || params.sample_rate == 0 {
            return;
        }
        match AudioDevice::new(
            params.sample_rate,
            params.format.channels(),
            Arc::clone(&self.ring),
        ) {
            Ok(device) => self.device = Some(device),
            Err(e) => tracing::warn!("audio output unavailable: {e}"),
        }
    }

    #[cfg(not(feature = "streaming"))]
    fn attach_device(&mut self, _params: &StreamParams) {
        if self.audible {
            tracing::debug!("built without the streaming feature, staying silent");
        }
    }
}

impl Mixer for HostMixer {
    fn init(&mut self, soundbank: Vec<u8>) {
        self.soundbank_len = soundbank.len();
        tracing::debug!(bytes = self.soundbank_len, "mixer initialised");
    }

    fn open_stream(&mut self, params: StreamParams, source: StreamHandle) {
        self.ring.flush();
        self.clock.reset();
        if let Some(capture) = self.capture.as_mut() {
            if let Err(e) = capture.begin(&params) {
                tracing::warn!("{e}");
                self.capture = None;
            }
        }
        self.attach_device(&params);
        self.session = Some(StreamSession {
            params,
            source,
            owed: 0,
        });
        self.stats.sessions_opened += 1;
    }

    fn close_stream(&mut self) {
        self.session = None;
        #[cfg(feature = "streaming")]
        if let Some(device) = self.device.take() {
            device.finish();
        }
    }

    fn load_effect(&mut self, effect: SoundEffect, volume: u8) {
        if self.soundbank_len == 0 {
            tracing::warn!(?effect, "no sound bank loaded, effect unavailable");
            return;
        }
        self.effects.insert(effect, volume);
    }

    fn play_effect(&mut self, effect: SoundEffect) {
        if self.effects.contains_key(&effect) {
            self.played.push(effect);
        } else {
            tracing::debug!(?effect, "effect not loaded");
        }
    }

    fn frame(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let due = self.clock.words_for_frame(session.params.words_per_second()) + session.owed;
        self.pump(due);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::{SharedStream, StreamFormat, StreamTimer, WavStream};
    use crate::wav_parser::header::tests::header_bytes;
    use std::io::Cursor;

    fn params(sample_rate: u32, buffer_length: usize) -> StreamParams {
        StreamParams {
            sample_rate,
            format: StreamFormat::Mono16,
            buffer_length,
            timer: StreamTimer::Timer0,
        }
    }

    fn stream_of(samples: &[u16]) -> SharedStream {
        let mut bytes = header_bytes(1, 22050, 16, samples.len() as u32 * 2);
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        let shared = SharedStream::new();
        shared.replace(Some(WavStream::open_boxed(Cursor::new(bytes)).unwrap()));
        shared
    }

    #[test]
    fn test_pump_chunks_by_buffer_length() {
        let shared = stream_of(&[1, 2, 3, 4, 5]);
        let mut mixer = HostMixer::new().unwrap();
        mixer.open_stream(params(22050, 4), shared.handle());

        mixer.pump(10);
        let stats = mixer.stats();
        assert_eq!(stats.words_pulled, 10);
        assert_eq!(stats.pulls, 3);
        assert_eq!(stats.short_pulls, 0);
        assert_eq!(shared.loop_count(), Some(1));
    }

    #[test]
    fn test_missing_stream_is_short() {
        let shared = SharedStream::new();
        let mut mixer = HostMixer::new().unwrap();
        mixer.open_stream(params(22050, 16), shared.handle());

        mixer.pump(8);
        assert_eq!(mixer.stats().words_pulled, 0);
        assert_eq!(mixer.stats().short_pulls, 1);
    }

    #[test]
    fn test_frame_pulls_rate_share() {
        let shared = stream_of(&[7; 64]);
        let mut mixer = HostMixer::new().unwrap();
        mixer.open_stream(params(22050, 800), shared.handle());

        for _ in 0..60 {
            mixer.frame();
        }
        let pulled = mixer.stats().words_pulled;
        // 22050 words/s at ~59.83 Hz
        assert!((22100..=22120).contains(&pulled), "pulled {pulled}");
    }

    #[test]
    fn test_short_pull_is_retried_in_same_frame() {
        let shared = stream_of(&[1, 2, 3]);
        let mut mixer = HostMixer::new().unwrap();
        mixer.open_stream(params(22050, 16), shared.handle());

        // Each fill wraps at most once, so 10 words off a 3-word file take two pulls
        mixer.pump(10);
        let stats = mixer.stats();
        assert_eq!(stats.words_pulled, 10);
        assert_eq!(stats.pulls, 2);
        assert_eq!(stats.short_pulls, 1);
        assert_eq!(shared.loop_count(), Some(2));
    }

    #[test]
    fn test_zero_rate_session_pulls_nothing() {
        let shared = stream_of(&[7; 64]);
        let mut mixer = HostMixer::new().unwrap();
        mixer.open_stream(params(0, 16000), shared.handle());
        mixer.frame();
        assert_eq!(mixer.stats().pulls, 0);
    }

    #[test]
    fn test_effects_need_soundbank() {
        let mut mixer = HostMixer::new().unwrap();
        mixer.init(Vec::new());
        mixer.load_effect(SoundEffect::Hit, 255);
        mixer.play_effect(SoundEffect::Hit);
        assert!(mixer.played().is_empty());

        mixer.init(vec![0u8; 16]);
        mixer.load_effect(SoundEffect::Hit, 255);
        mixer.play_effect(SoundEffect::Hit);
        mixer.play_effect(SoundEffect::Congrat);
        assert_eq!(mixer.play_count(SoundEffect::Hit), 1);
        assert_eq!(mixer.play_count(SoundEffect::Congrat), 0);
        assert_eq!(mixer.effect_volume(SoundEffect::Hit), Some(255));
    }

    #[test]
    fn test_close_stops_pulling() {
        let shared = stream_of(&[1, 2]);
        let mut mixer = HostMixer::new().unwrap();
        mixer.open_stream(params(22050, 4), shared.handle());
        mixer.close_stream();
        assert!(!mixer.is_streaming());
        mixer.frame();
        mixer.pump(4);
        assert_eq!(mixer.stats().pulls, 0);
    }

    #[test]
    fn test_capture_records_pulled_words() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let shared = stream_of(&[1, 2, 3]);

        let mut mixer = HostMixer::new()
            .unwrap()
            .with_capture(WavCapture::new(&path));
        mixer.open_stream(params(22050, 8), shared.handle());
        mixer.pump(5);
        mixer.finish_capture().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2, 3, 1, 2]);
    }
}
