//! Session lifecycle: boot, per-frame step, run loop, fatal halt

use super::{FrameOutcome, GameState};
use crate::config::{GameConfig, StreamSwitchPolicy};
use crate::platform::{
    AssetFs, Display, Input, Keys, Mixer, Platform, ScreenImage, Services, SoundEffect,
};
use crate::streaming::{SharedStream, StreamParams, WavStream};
use crate::targets::{resolve_hit, TargetSet};
use crate::wav_parser::WavHeader;
use crate::{Result, WhackError};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::io::Read;

/// Volume the hit and victory effects are loaded at
const EFFECT_VOLUME: u8 = 255;

/// Totals reported when a run ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    /// Frames stepped
    pub frames: u64,
    /// Targets eliminated
    pub hits: usize,
    /// Whether the win transition ran
    pub won: bool,
}

/// All mutable game state
pub struct GameSession {
    config: GameConfig,
    targets: TargetSet,
    state: GameState,
    stream: SharedStream,
    rng: Pcg32,
    frames: u64,
    hits: usize,
}

impl GameSession {
    /// Bring the game up on `platform`.
    ///
    /// Shows the splash image, mounts the asset filesystem, opens and checks
    /// the music stream, loads the effects and places every target. Any
    /// failure here is startup-fatal (see [`WhackError::is_startup_fatal`]).
    pub fn boot<P: Platform>(config: GameConfig, platform: &mut P) -> Result<Self> {
        config.validate()?;

        let Services {
            display,
            mixer,
            assets,
            ..
        } = platform.split();

        display.show_image(ScreenImage::Splash);

        if let Err(e) = assets.mount() {
            tracing::error!("asset filesystem mount failed: {e}");
            return Err(WhackError::MountFailed(e.to_string()));
        }

        mixer.init(load_soundbank(&*assets, &config.soundbank_asset));

        let reader = assets.open(&config.music_asset).map_err(|source| {
            tracing::error!("fopen({}) failed!", config.music_asset);
            WhackError::AssetOpen {
                name: config.music_asset.clone(),
                source,
            }
        })?;

        let music = WavStream::open(reader).inspect_err(|e| {
            tracing::error!("{}: {e}", config.music_asset);
        })?;

        let params = StreamParams::from_header(music.header(), config.stream_buffer_length);
        tracing::info!(
            asset = %config.music_asset,
            sample_rate = params.sample_rate,
            format = ?params.format,
            "opening music stream"
        );

        let stream = SharedStream::new();
        stream.replace(Some(music));
        mixer.open_stream(params, stream.handle());

        mixer.load_effect(SoundEffect::Hit, EFFECT_VOLUME);
        mixer.load_effect(SoundEffect::Congrat, EFFECT_VOLUME);

        let seed = config.resolved_seed();
        let mut rng = Pcg32::seed_from_u64(seed);
        let targets = TargetSet::spawn(config.target_count, &mut rng)?;
        for (index, slot) in targets.iter().enumerate() {
            if let Some(pos) = slot.position() {
                display.set_sprite(index, pos.x, pos.y);
            }
        }

        tracing::info!(
            targets = targets.len(),
            damage_mode = %config.damage_mode,
            seed,
            "session ready"
        );

        Ok(GameSession {
            state: GameState::new(config.damage_mode),
            config,
            targets,
            stream,
            rng,
            frames: 0,
            hits: 0,
        })
    }

    /// Run one frame.
    ///
    /// Order: vblank, mixer tick, background, input, sprite commit, target
    /// advance, START, A/B stream switches, touch, win check.
    pub fn step<P: Platform>(&mut self, platform: &mut P) -> FrameOutcome {
        let Services {
            display,
            input,
            mixer,
            assets,
        } = platform.split();

        display.wait_for_vblank();
        mixer.frame();
        display.update_background();
        let frame_input = input.scan();
        display.commit_sprites();

        self.targets
            .advance(&mut self.rng, |index, pos| display.set_sprite(index, pos.x, pos.y));
        self.frames += 1;

        if frame_input.pressed(Keys::START) {
            return FrameOutcome::Exit;
        }

        if frame_input.pressed(Keys::A) {
            let name = self.config.alt_music_asset.clone();
            self.switch_stream(&name, mixer, &*assets);
        }
        if frame_input.pressed(Keys::B) {
            let name = self.config.music_asset.clone();
            self.switch_stream(&name, mixer, &*assets);
        }

        if frame_input.pressed(Keys::TOUCH) {
            let touch = frame_input.touch.unwrap_or_default();
            for index in resolve_hit(&mut self.targets, touch, self.state.damage_mode()) {
                display.clear_sprite(index);
                mixer.play_effect(SoundEffect::Hit);
                self.hits += 1;
            }
        }

        if self.state.check_win(self.targets.live_count()) {
            tracing::info!(frames = self.frames, "You're winner!");
            display.show_image(ScreenImage::Congrat);
            self.stream.close();
            mixer.close_stream();
            mixer.play_effect(SoundEffect::Congrat);
            return FrameOutcome::Won;
        }

        FrameOutcome::Continue
    }

    /// Step until START (or `max_frames`), then shut the stream down
    pub fn run<P: Platform>(
        &mut self,
        platform: &mut P,
        max_frames: Option<u64>,
    ) -> Result<SessionSummary> {
        let start = self.frames;
        loop {
            if max_frames.is_some_and(|limit| self.frames - start >= limit) {
                tracing::info!("frame limit reached");
                break;
            }
            if self.step(platform) == FrameOutcome::Exit {
                tracing::info!("exit requested");
                break;
            }
        }

        let Services { mixer, .. } = platform.split();
        mixer.close_stream();
        self.stream.close();

        Ok(self.summary())
    }

    /// Idle on the display tick forever (startup-fatal errors end here)
    pub fn halt<D: Display + ?Sized>(display: &mut D) -> ! {
        loop {
            display.wait_for_vblank();
        }
    }

    /// Open a new stream session on `name` from inside the loop
    fn switch_stream<M, A>(&mut self, name: &str, mixer: &mut M, assets: &A)
    where
        M: Mixer + ?Sized,
        A: AssetFs + ?Sized,
    {
        match self.config.stream_switch {
            StreamSwitchPolicy::Legacy => {
                // The header stays zeroed: rate 0, 8-bit mono, cursor at byte 0.
                match assets.open(name) {
                    Ok(reader) => self.stream.replace(Some(WavStream::unchecked(reader))),
                    Err(e) => {
                        tracing::debug!("stream switch to {name} ignored open failure: {e}");
                        self.stream.replace(None);
                    }
                }
                let params = StreamParams::from_header(
                    &WavHeader::default(),
                    self.config.switch_buffer_length,
                );
                tracing::debug!(asset = name, ?params, "stream switched");
                mixer.open_stream(params, self.stream.handle());
            }
            StreamSwitchPolicy::ReadHeader => {
                let opened = assets
                    .open(name)
                    .map_err(WhackError::from)
                    .and_then(WavStream::open);
                match opened {
                    Ok(stream) => {
                        let params = StreamParams::from_header(
                            stream.header(),
                            self.config.switch_buffer_length,
                        );
                        self.stream.replace(Some(stream));
                        tracing::debug!(asset = name, ?params, "stream switched");
                        mixer.open_stream(params, self.stream.handle());
                    }
                    Err(e) => tracing::warn!("stream switch to {name} failed: {e}"),
                }
            }
        }
    }

    /// Target arena
    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    /// Replace the arena (scripted setups and tests)
    pub fn set_targets(&mut self, targets: TargetSet) {
        self.targets = targets;
    }

    /// Win flag and damage mode
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Active stream slot
    pub fn stream(&self) -> &SharedStream {
        &self.stream
    }

    /// Configuration the session was booted with
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Totals so far
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            frames: self.frames,
            hits: self.hits,
            won: self.state.is_won(),
        }
    }
}

/// Read the sound bank blob; a missing bank leaves the mixer with no effects
fn load_soundbank<A: AssetFs + ?Sized>(assets: &A, name: &str) -> Vec<u8> {
    let mut bank = Vec::new();
    match assets.open(name) {
        Ok(mut reader) => {
            if let Err(e) = reader.read_to_end(&mut bank) {
                tracing::warn!("failed to read sound bank {name}: {e}");
                bank.clear();
            }
        }
        Err(e) => tracing::warn!("sound bank {name} unavailable: {e}"),
    }
    bank
}
