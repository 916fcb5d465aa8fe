//! CLI for the dvkit storage and slicing library.
//!
//! Provides commands for generating synthetic event streams, exporting them,
//! and running slicing plans over them.

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use dvkit::container::EVENTS;
use dvkit::export::{ExportFormat, write_store};
use dvkit::simulation::generate_sample_events;
use dvkit::{CameraData, DataSlicer, JobConfig, Resolution, SliceInterval, SlicerPlan, TimeWindow};
use tracing_subscriber::EnvFilter;

/// dvkit: event-camera stream storage and slicing CLI.
#[derive(Parser)]
#[command(name = "dvkit", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that synthesize events.
#[derive(clap::Args)]
struct SourceArgs {
    /// Number of events to generate.
    #[arg(long, default_value = "10000")]
    count: usize,

    /// Sensor width in pixels.
    #[arg(long, default_value = "346")]
    width: u16,

    /// Sensor height in pixels.
    #[arg(long, default_value = "260")]
    height: u16,

    /// Microseconds between consecutive events.
    #[arg(long, default_value = "10")]
    step: i64,

    /// Seed for the random generator.
    #[arg(long, default_value = "0")]
    seed: u64,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic events and write them to stdout.
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format ("csv" or "jsonl").
        #[arg(long, default_value = "csv")]
        format: String,
    },

    /// Generate synthetic events and slice them, printing one line per window.
    Slice {
        #[command(flatten)]
        source: SourceArgs,

        /// JSON slicing plan; overrides --every-elements and --every-us.
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Emit a slice every N events.
        #[arg(long, conflicts_with = "every_us")]
        every_elements: Option<usize>,

        /// Emit a slice every N microseconds.
        #[arg(long)]
        every_us: Option<i64>,

        /// Number of events fed to the slicer per call.
        #[arg(long, default_value = "1000")]
        batch: usize,

        /// Output format.
        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },
}

/// Output format for slice reports.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// One human-readable line per window.
    Text,
    /// One JSON object per window.
    Json,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { source, format } => cmd_generate(&source, &format),
        Commands::Slice {
            source,
            plan,
            every_elements,
            every_us,
            batch,
            output,
        } => cmd_slice(&source, plan, every_elements, every_us, batch, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Implements `dvkit generate`.
fn cmd_generate(source: &SourceArgs, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let format: ExportFormat = format.parse()?;
    let store = generate(source);
    tracing::info!(events = store.len(), %format, "exporting generated events");

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    write_store(&store, format, &mut out)?;
    Ok(())
}

/// Implements `dvkit slice`.
fn cmd_slice(
    source: &SourceArgs,
    plan_path: Option<PathBuf>,
    every_elements: Option<usize>,
    every_us: Option<i64>,
    batch: usize,
    output: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let plan = match plan_path {
        Some(path) => SlicerPlan::from_json_str(&std::fs::read_to_string(&path)?)?,
        None => {
            let every = match (every_elements, every_us) {
                (Some(n), _) => SliceInterval::Elements(n),
                (None, Some(us)) => SliceInterval::Micros(us),
                (None, None) => SliceInterval::Elements(1000),
            };
            SlicerPlan {
                jobs: vec![JobConfig {
                    stream: EVENTS.to_string(),
                    every,
                }],
            }
        }
    };

    let store = generate(source);
    let resolution = Resolution::new(source.width, source.height);

    let emitted = Rc::new(RefCell::new(0usize));
    let mut slicer = DataSlicer::new();
    for job in &plan.jobs {
        let id = slicer.register(job, report(job.clone(), output.clone(), Rc::clone(&emitted)))?;
        tracing::debug!(job = %id, stream = %job.stream, "registered job from plan");
    }

    let start = Instant::now();
    let batch = batch.max(1);
    let mut offset = 0;
    while offset < store.len() {
        let length = batch.min(store.len() - offset);
        let mut snapshot = CameraData::mono();
        snapshot.set_resolution(EVENTS, resolution);
        snapshot.insert(EVENTS, store.slice(offset, length)?);
        slicer.accept(&snapshot)?;
        offset += length;
    }
    let elapsed = start.elapsed();

    eprintln!(
        "Sliced {} events into {} windows in {:.2?}",
        store.len(),
        emitted.borrow(),
        elapsed
    );
    Ok(())
}

fn generate(source: &SourceArgs) -> dvkit::EventStore {
    generate_sample_events(
        Resolution::new(source.width, source.height),
        source.count,
        0,
        source.step,
        source.seed,
    )
}

/// Builds the callback that prints one report line per emitted window.
fn report(
    job: JobConfig,
    output: OutputFormat,
    emitted: Rc<RefCell<usize>>,
) -> impl FnMut(&TimeWindow, &CameraData) + 'static {
    move |window, data| {
        *emitted.borrow_mut() += 1;
        let size = data.size(&job.stream).unwrap_or(0);
        let line = match output {
            OutputFormat::Text => format!("{}: {window} {size} element(s)", job.stream),
            OutputFormat::Json => serde_json::json!({
                "stream": job.stream,
                "start_time": window.start_time,
                "end_time": window.end_time,
                "elements": size,
            })
            .to_string(),
        };
        if let Err(e) = writeln!(io::stdout(), "{line}") {
            tracing::warn!("failed to write slice report: {e}");
        }
    }
}
