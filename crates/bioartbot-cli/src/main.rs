//! bioartbot-plan: turn a print-job file into an ordered dispense plan.
//!
//! Reads a JSON print-job request (plate geometry, labware, artworks,
//! color names and optional planner tuning), plans every artwork and
//! writes the assembled print job as JSON. Optionally renders an SVG
//! preview per artwork and prints per-color tour diagnostics.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin bioartbot-plan -- [OPTIONS] <JOB_PATH>
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr
//! so stdout stays valid JSON.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use bioartbot_export::SvgMetadata;
use bioartbot_pipeline::diagnostics::{
    Clock, PlanDiagnostics, assemble_print_job_with_diagnostics,
};
use bioartbot_pipeline::{PlanConfig, PrintJob, PrintJobRequest};
use clap::Parser;

/// Plan the dispense order of a bioartbot print run.
///
/// Maps every artwork's pixels onto the plate and orders each color so
/// consecutive drops keep their distance while still wet.
#[derive(Parser)]
#[command(name = "bioartbot-plan", version)]
struct Cli {
    /// Path to the print-job request (JSON).
    job_path: PathBuf,

    /// Write the print job to this file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Write one SVG preview per artwork into this directory.
    #[arg(long)]
    svg_dir: Option<PathBuf>,

    /// Minimum distance between consecutive drops, in millimetres.
    ///
    /// Overrides the value in the job file.
    #[arg(long)]
    min_gap_mm: Option<f64>,

    /// Print per-color tour diagnostics to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long, requires = "diagnostics")]
    json: bool,

    /// Full planner config as a JSON string.
    ///
    /// Replaces the config in the job file; `--min-gap-mm` still
    /// applies on top. The JSON must be a valid `PlanConfig`
    /// serialization; missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Install a `tracing` subscriber writing to stderr.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Read the job file and apply config overrides from the command line.
fn request_from_cli(cli: &Cli) -> Result<PrintJobRequest, String> {
    let text = std::fs::read_to_string(&cli.job_path)
        .map_err(|e| format!("Error reading {}: {e}", cli.job_path.display()))?;
    let mut request: PrintJobRequest = serde_json::from_str(&text)
        .map_err(|e| format!("Error parsing {}: {e}", cli.job_path.display()))?;

    if let Some(ref json) = cli.config_json {
        request.config = serde_json::from_str::<PlanConfig>(json)
            .map_err(|e| format!("Error parsing --config-json: {e}"))?;
    }
    if let Some(gap) = cli.min_gap_mm {
        request.config.min_gap_mm = gap;
    }
    Ok(request)
}

/// File path of the preview for `slug` inside `dir`.
///
/// The slug must be a single plain file name so previews stay inside
/// `dir`.
fn preview_path(dir: &Path, slug: &str) -> Result<PathBuf, String> {
    let invalid = || format!("Artwork slug {slug:?} cannot be used as a preview file name");
    if slug.is_empty() {
        return Err(invalid());
    }
    let file_name = format!("{slug}.svg");
    let mut components = Path::new(&file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == file_name.as_str() => {
            Ok(dir.join(&file_name))
        }
        _ => Err(invalid()),
    }
}

/// Render and write one preview per artwork.
fn write_previews(request: &PrintJobRequest, job: &PrintJob, dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("Error creating {}: {e}", dir.display()))?;

    let description = format!(
        "{} on {} (min gap {} mm)",
        job.labware.pipette, job.labware.canvas, request.config.min_gap_mm
    );
    for artwork in &request.artworks {
        let metadata = SvgMetadata {
            title: Some(&artwork.slug),
            description: Some(&description),
            color_labels: Some(&job.colors),
        };
        let svg = bioartbot_export::to_svg(&job.pixels, &artwork.slug, &request.plate, &metadata);
        let path = preview_path(dir, &artwork.slug)?;
        std::fs::write(&path, &svg)
            .map_err(|e| format!("Error writing SVG to {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = svg.len(), "wrote preview");
    }
    Ok(())
}

/// Print diagnostics to stderr as a report or JSON.
fn print_diagnostics(diagnostics: &PlanDiagnostics, json: bool) -> Result<(), String> {
    if json {
        let text = serde_json::to_string_pretty(diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
        eprintln!("{text}");
    } else {
        eprintln!("{}", diagnostics.report());
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), String> {
    let request = request_from_cli(cli)?;
    tracing::info!(
        job = %cli.job_path.display(),
        artworks = request.artworks.len(),
        min_gap_mm = request.config.min_gap_mm,
        "loaded print job"
    );

    let (job, diagnostics) = if cli.diagnostics {
        let (job, diagnostics) = assemble_print_job_with_diagnostics(&request, &StdClock)
            .map_err(|e| format!("Planning error: {e}"))?;
        (job, Some(diagnostics))
    } else {
        let job = bioartbot_pipeline::assemble_print_job(&request)
            .map_err(|e| format!("Planning error: {e}"))?;
        (job, None)
    };

    let text = serde_json::to_string_pretty(&job)
        .map_err(|e| format!("Error serializing print job: {e}"))?;
    match cli.output {
        Some(ref path) => {
            std::fs::write(path, format!("{text}\n"))
                .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote print job");
        }
        None => println!("{text}"),
    }

    if let Some(ref dir) = cli.svg_dir {
        write_previews(&request, &job, dir)?;
    }
    if let Some(ref diagnostics) = diagnostics {
        print_diagnostics(diagnostics, cli.json)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
