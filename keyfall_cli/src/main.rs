mod simulate;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use keyfall_core::chart::generator::{self, GeneratorSettings};
use keyfall_core::chart::loader::{self, LoadOptions, LoadedChart, UnmappedLanePolicy};
use keyfall_core::chart::NoteKind;
use keyfall_core::config::{self, Difficulty, GameSettings};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::simulate::SimulationOptions;

#[derive(Debug, Parser)]
#[command(name = "keyfall")]
#[command(about = "Keyfall chart tools", long_about = None)]
struct Cli {
    /// JSON file with game settings (windows, points, scroll, generator)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Easy,
    Normal,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Normal => Difficulty::Normal,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a random practice chart
    Generate {
        #[arg(short, long)]
        lanes: Option<usize>,
        #[arg(short = 'n', long)]
        count: Option<usize>,
        #[arg(short, long, value_enum)]
        difficulty: Option<DifficultyArg>,
        #[arg(long)]
        seed: Option<u64>,
        /// Probability of a single note being a decoy
        #[arg(long)]
        decoy: Option<f64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a chart for a lane count and print what the run would contain
    Inspect {
        input: PathBuf,
        #[arg(short, long)]
        lanes: Option<usize>,
        #[arg(long)]
        skip_unmapped: bool,
    },
    /// Autoplay a chart headlessly and print the judgements
    Simulate {
        /// Chart to play; a seeded random chart when omitted
        input: Option<PathBuf>,
        #[arg(short, long)]
        lanes: Option<usize>,
        #[arg(long)]
        skip_unmapped: bool,
        /// Constant timing error added to every input (positive is late)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset_ms: f64,
        /// Uniform random timing error in +/- this many ms
        #[arg(long, default_value_t = 0.0)]
        jitter_ms: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Pause once song time reaches this point
        #[arg(long)]
        pause_at: Option<f64>,
        #[arg(long, default_value_t = 2000.0)]
        pause_for: f64,
        /// Print the run summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("keyfall=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            lanes,
            count,
            difficulty,
            seed,
            decoy,
            output,
        } => {
            let mut settings = base_settings(cli.settings.as_deref(), difficulty)?;
            if let Some(lanes) = lanes {
                settings.lanes = lanes;
            }
            if let Some(count) = count {
                settings.note_count = count;
            }
            if let Some(decoy) = decoy {
                settings.decoy_probability = decoy;
            }
            settings.validate().context("invalid generator settings")?;

            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let chart = generator::generate(&GeneratorSettings::from_settings(&settings), &mut rng)
                .context("chart generation failed")?;
            let doc = loader::export_document(&chart).context("failed to export chart")?;
            let json = serde_json::to_string_pretty(&doc).context("failed to serialize chart")?;

            match output {
                Some(path) => {
                    fs::write(&path, json).with_context(|| format!("failed to write: {}", path.display()))?;
                    info!(path = %path.display(), notes = chart.notes.len(), "chart written");
                }
                None => println!("{json}"),
            }
        }
        Command::Inspect {
            input,
            lanes,
            skip_unmapped,
        } => {
            let settings = base_settings(cli.settings.as_deref(), None)?;
            let loaded = load(&input, lanes, skip_unmapped, &settings)
                .with_context(|| format!("inspect failed: {}", input.display()))?;
            print_inspection(&loaded);
        }
        Command::Simulate {
            input,
            lanes,
            skip_unmapped,
            offset_ms,
            jitter_ms,
            seed,
            pause_at,
            pause_for,
            json,
        } => {
            let mut settings = base_settings(cli.settings.as_deref(), None)?;
            let chart = match &input {
                Some(path) => {
                    let loaded = load(path, lanes, skip_unmapped, &settings)
                        .with_context(|| format!("simulate failed: {}", path.display()))?;
                    settings.scroll.note_speed = config::note_speed_for_bpm(loaded.chart.bpm);
                    loaded.chart
                }
                None => {
                    if let Some(lanes) = lanes {
                        settings.lanes = lanes;
                    }
                    settings.validate().context("invalid generator settings")?;
                    let mut rng = StdRng::seed_from_u64(seed);
                    generator::generate(&GeneratorSettings::from_settings(&settings), &mut rng)
                        .context("chart generation failed")?
                }
            };

            let options = SimulationOptions {
                offset_ms,
                jitter_ms,
                seed,
                pause_at_ms: pause_at,
                pause_for_ms: pause_for,
                quiet: json,
                ..SimulationOptions::default()
            };
            let summary = simulate::run_simulation(&chart, &settings, &options)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).context("failed to serialize summary")?
                );
            } else {
                simulate::print_summary(&summary);
            }
        }
    }

    Ok(())
}

fn base_settings(path: Option<&Path>, difficulty: Option<DifficultyArg>) -> anyhow::Result<GameSettings> {
    match path {
        Some(path) => GameSettings::load_json(path)
            .with_context(|| format!("failed to load settings: {}", path.display())),
        None => Ok(GameSettings::for_difficulty(difficulty.map(Difficulty::from).unwrap_or_default())),
    }
}

/// Lane count precedence: flag, then the chart's own `lanes`, then settings.
fn load(
    path: &Path,
    lanes: Option<usize>,
    skip_unmapped: bool,
    settings: &GameSettings,
) -> Result<LoadedChart, keyfall_core::ChartError> {
    let doc = loader::read_document(path)?;
    let options = LoadOptions {
        lane_count: lanes.or(doc.lanes).unwrap_or(settings.lanes),
        unmapped: if skip_unmapped {
            UnmappedLanePolicy::Skip
        } else {
            UnmappedLanePolicy::Reject
        },
    };
    loader::load_chart(&doc, &options).map_err(|e| e.with_file(path.display().to_string()))
}

fn print_inspection(loaded: &LoadedChart) {
    let chart = &loaded.chart;
    println!("Song: {}", chart.song_name.as_deref().unwrap_or("<untitled>"));
    println!("BPM: {} (note speed {})", chart.bpm, config::note_speed_for_bpm(chart.bpm));
    println!("Start offset: {} ms", chart.start_offset_ms);
    println!("Lanes: {}", chart.lane_count);
    println!(
        "Notes: {} (tap {}, hold {}, decoy {})",
        chart.judgeable_count(),
        chart.count_of(NoteKind::Tap),
        chart.count_of(NoteKind::HoldHead),
        chart.count_of(NoteKind::Decoy),
    );
    println!("Last note: {} ms", chart.last_time());
    if !loaded.skipped.is_empty() {
        println!("Skipped: {}", loaded.skipped.len());
        for skipped in &loaded.skipped {
            println!("  #{} lane {} at {} ms", skipped.source_index, skipped.lane, skipped.time);
        }
    }
}
