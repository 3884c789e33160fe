// Cumbia Arrangement Generator: CLI entry point.
//
// Plans a song, composes the four voices and writes a MIDI file.
// The pipeline: config → plan → motif/drum sequences → voices → MIDI.
//
// Usage:
//   cargo run -p cumbia_music -- [--seed N] [--config FILE.json]
//     [--motifs FILE.json] [--output-dir DIR] [--output FILE.mid]
//
// Without `--output`, files are numbered inside the output directory
// (cumbia_song_001.mid, cumbia_song_002.mid, ...). The seed is always logged
// so any run can be reproduced.

use clap::Parser;
use cumbia_music::arrangement::compose;
use cumbia_music::config::ComposerConfig;
use cumbia_music::midi::write_midi;
use cumbia_music::motif::MotifLibrary;
use cumbia_music::output::{DEFAULT_OUTPUT_DIR, next_output_path};
use cumbia_music::plan::SongPlan;
use cumbia_prng::SongRng;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Procedural cumbia arrangement generator", long_about = None)]
struct Cli {
    /// Seed for the random generator; omitted means a fresh seed per run.
    #[arg(long)]
    seed: Option<u64>,
    /// JSON config overriding the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON motif library replacing the config's motifs.
    #[arg(long)]
    motifs: Option<PathBuf>,
    /// Directory for auto-numbered output files.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    /// Explicit output file; bypasses numbering.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> cumbia_music::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            ComposerConfig::load(path)?
        }
        None => ComposerConfig::default(),
    };
    if let Some(path) = &cli.motifs {
        tracing::info!(path = %path.display(), "loading motif library");
        config.motifs = MotifLibrary::load(path)?;
    }

    let seed = cli.seed.unwrap_or_else(clock_seed);
    let mut rng = SongRng::new(seed);

    let plan = SongPlan::random(&config, &mut rng);
    tracing::info!(
        seed,
        key = %plan.key.name(),
        tempo_bpm = plan.tempo_bpm,
        measures = plan.total_measures,
        duration_secs = plan.duration_secs().round() as u64,
        "planned song"
    );
    tracing::info!(
        lead = plan.instruments.lead,
        support = plan.instruments.support,
        bass = plan.instruments.bass,
        "instruments"
    );

    let song = compose(&plan, &config, &mut rng);

    let path = match cli.output {
        Some(path) => path,
        None => next_output_path(&cli.output_dir)?,
    };
    write_midi(&song, &path)?;

    println!("MIDI saved: {}", path.display());
    Ok(())
}

/// Seed from the wall clock when the user didn't pin one.
fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
