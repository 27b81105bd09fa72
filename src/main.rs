#[cfg(not(feature = "host"))]
fn main() {
    eprintln!(
        "The touch-whack CLI requires the \"host\" feature. Rebuild with `--features host` to run sessions."
    );
}

#[cfg(feature = "host")]
mod cli {
    use std::path::PathBuf;

    use anyhow::Context;
    use clap::Parser;
    use tracing_subscriber::EnvFilter;

    use touch_whack::host::{HostMixer, HostPlatform, ScriptedInput, TimingConfig, WavCapture};
    use touch_whack::{DamageMode, GameConfig, GameSession, SoundEffect, WhackError};

    #[derive(Parser)]
    #[command(name = "touch-whack")]
    #[command(about = "Touch-screen whack-a-mole with a looping WAV soundtrack")]
    struct Args {
        /// Directory holding the packaged assets
        #[arg(short, long, default_value = "assets")]
        assets: PathBuf,

        /// JSON game configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// JSON input script
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Stop after this many frames
        #[arg(short, long)]
        frames: Option<u64>,

        /// Damage mode: nearest or area
        #[arg(short, long)]
        damage_mode: Option<DamageMode>,

        /// Seed for spawn positions and movement
        #[arg(long)]
        seed: Option<u64>,

        /// Pace frames at the handheld refresh rate (implied by --audible)
        #[arg(long)]
        realtime: bool,

        /// Write every pulled stream word to a WAV file
        #[arg(long)]
        capture: Option<PathBuf>,

        /// Play 16-bit streams on the default output device
        #[arg(long)]
        audible: bool,

        /// Exit instead of idling after a startup failure
        #[arg(long)]
        no_halt: bool,
    }

    fn load_config(args: &Args) -> anyhow::Result<GameConfig> {
        let mut config = match &args.config {
            Some(path) => GameConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GameConfig::default(),
        };
        if let Some(mode) = args.damage_mode {
            config.damage_mode = mode;
        }
        if args.seed.is_some() {
            config.seed = args.seed;
        }
        if args.no_halt {
            config.halt_on_fatal = false;
        }
        Ok(config)
    }

    pub fn run() -> anyhow::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();

        let args = Args::parse();
        let config = load_config(&args)?;

        let input = match &args.script {
            Some(path) => ScriptedInput::from_file(path)
                .with_context(|| format!("loading script {}", path.display()))?,
            None => ScriptedInput::new(),
        };

        let mut mixer = HostMixer::new()?.with_audio(args.audible);
        if let Some(path) = &args.capture {
            mixer = mixer.with_capture(WavCapture::new(path));
        }

        let timing = TimingConfig::for_output(args.realtime, args.audible);

        let mut platform = HostPlatform::from_dir(&args.assets)?
            .with_input(input)
            .with_mixer(mixer)
            .with_timing(timing);

        // Mount failures exit with status 1; the other startup failures idle
        let halt_on_fatal = config.halt_on_fatal;
        let mut session = match GameSession::boot(config, &mut platform) {
            Ok(session) => session,
            Err(e)
                if halt_on_fatal
                    && e.is_startup_fatal()
                    && !matches!(e, WhackError::MountFailed(_)) =>
            {
                eprintln!("{e}");
                let display = platform.display_mut();
                display.set_timing(TimingConfig::realtime());
                GameSession::halt(display)
            }
            Err(e) => return Err(e.into()),
        };

        let summary = session.run(&mut platform, args.frames)?;
        platform.mixer_mut().finish_capture()?;

        let mixer = platform.mixer();
        let stats = mixer.stats();
        println!("\n=== Session Statistics ===");
        println!("Frames:            {}", summary.frames);
        println!("Targets hit:       {}", summary.hits);
        println!("Targets left:      {}", session.targets().live_count());
        println!("Won:               {}", summary.won);
        println!("Hit effects:       {}", mixer.play_count(SoundEffect::Hit));
        println!("Stream sessions:   {}", stats.sessions_opened);
        println!("Words pulled:      {}", stats.words_pulled);
        println!("Short pulls:       {}", stats.short_pulls);
        if let Some(capture) = mixer.capture() {
            println!("Words captured:    {}", capture.words_written());
        }

        Ok(())
    }

    /// Exit code for a failed run
    pub fn exit_code(error: &anyhow::Error) -> i32 {
        error
            .downcast_ref::<WhackError>()
            .map_or(2, WhackError::exit_code)
    }

}

#[cfg(feature = "host")]
fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(cli::exit_code(&e));
    }
}
