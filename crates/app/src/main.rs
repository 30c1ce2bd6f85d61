use std::path::PathBuf;

use avatar_studio_core::{
    AnimationClock, AppConfig, AudioAsset, CaptureCoordinator, Exporter, FfmpegMuxer,
    ParameterMapper, SoftwareSurface, SpectralAnalyzer, StaticEnvironment, TakeStore,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> avatar_studio_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Perform {
            audio,
            name,
            out_dir,
            config,
            seed,
        } => run_perform(&audio, &name, out_dir, config, seed),
        Commands::Analyze {
            input,
            config,
            seed,
        } => run_analyze(&input, config, seed),
    }
}

fn run_perform(
    audio: &PathBuf,
    name: &str,
    out_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    seed: Option<u64>,
) -> avatar_studio_core::Result<()> {
    tracing::info!(?audio, name, "starting performance export");

    let config = load_config(config)?;
    let mut takes = TakeStore::new();
    let take = takes.replace(AudioAsset::from_wav_bytes(std::fs::read(audio)?)?);

    let mut clock = build_clock(&config, seed);
    let mut surface = SoftwareSurface::new(config.capture.fps);
    let exporter = Exporter::new(
        Box::new(FfmpegMuxer::new()),
        out_dir.unwrap_or_else(|| PathBuf::from(".")),
    );

    let coordinator = CaptureCoordinator::new();
    let mut session = coordinator.begin(
        &mut clock,
        Some(&mut surface),
        Some(take),
        &StaticEnvironment::full(),
        &config.capture,
    )?;
    let deliverable = session.run(&exporter, name)?;

    println!("{}", deliverable.path.display());
    Ok(())
}

fn run_analyze(
    input: &PathBuf,
    config: Option<PathBuf>,
    seed: Option<u64>,
) -> avatar_studio_core::Result<()> {
    tracing::info!(?input, "dumping per-tick animation parameters");

    let config = load_config(config)?;
    let asset = AudioAsset::from_wav_bytes(std::fs::read(input)?)?;

    let mut clock = build_clock(&config, seed);
    clock.start(asset.decode()?);

    while !clock.track_ended() {
        let Some(params) = clock.tick()? else { break };
        println!("{}", serde_json::to_string(&params)?);
    }
    clock.stop();
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> avatar_studio_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(&path),
        None => Ok(AppConfig::default()),
    }
}

fn build_clock(config: &AppConfig, seed: Option<u64>) -> AnimationClock {
    let analyzer = SpectralAnalyzer::new(config.analysis.clone());
    let mapper = match seed {
        Some(seed) => ParameterMapper::with_seed(config.mapping.clone(), seed),
        None => ParameterMapper::new(config.mapping.clone()),
    };
    AnimationClock::with_parts(analyzer, mapper, config.capture.fps)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-driven avatar performance studio", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a full performance from a WAV take and export the muxed
    /// deliverable.
    Perform {
        /// Path to the WAV take that drives the performance.
        audio: PathBuf,
        /// Base name of the deliverable file.
        #[arg(short, long, default_value = "performance")]
        name: String,
        /// Directory the deliverable is written to.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Optional JSON configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for the gesture impulses, for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play a WAV take through the animation engine and print one JSON
    /// parameter set per tick.
    Analyze {
        /// Path to the WAV file to analyse.
        input: PathBuf,
        /// Optional JSON configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for the gesture impulses, for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },
}
