//! tone-iir-table — fit the tone-control coefficient table from the command line.
//!
//! Runs the two-stage sweep fit with the reference tuning (overridable by
//! flags) and writes the table as text (`b0, b1, b2, a1, a2,` per line) or
//! JSON. Progress and diagnostics go to stderr through `env_logger`; set
//! `RUST_LOG=debug` to see every seed fit.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::path::{Path, PathBuf};
use tone_iir_fit::{
    circuit::{FrequencyGrid, GridOptions, SweepPoints, ToneStack},
    fitting::{
        CoefficientTable, ProgressCallback, SeedPolicy, SweepOptions, SweepProgress, fit_sweep,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Fit a continuity-constrained biquad table to the tone-control network
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Comma-separated control values in [0, 1] (default: 21-point reference sweep)
    #[arg(long, value_delimiter = ',')]
    sweep: Option<Vec<f64>>,

    /// Number of log-spaced frequency bins
    #[arg(long, default_value_t = 2048)]
    bins: usize,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 192_000.0)]
    sample_rate: f64,

    /// Weight of the adjacent-entry continuity term
    #[arg(long, default_value_t = 100.0)]
    continuity_weight: f64,

    /// Iteration cap of the joint run
    #[arg(long)]
    max_iter: Option<usize>,

    /// Iterations between progress reports
    #[arg(long, default_value_t = 100)]
    progress_interval: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Output file (stdout when absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Warm-start the joint run from a JSON table written with --format json
    #[arg(long)]
    seed_from: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    let sweep = match args.sweep {
        Some(points) => SweepPoints::new(points).context("Invalid --sweep")?,
        None => SweepPoints::default(),
    };
    let grid_opts = GridOptions::default()
        .with_sample_rate(args.sample_rate)
        .and_then(|opts| opts.with_bins(args.bins))
        .context("Invalid grid settings")?;
    let grid = FrequencyGrid::new(&grid_opts).context("Failed to build frequency grid")?;

    let mut opts = SweepOptions::default()
        .with_continuity_weight(args.continuity_weight)
        .and_then(|opts| opts.with_progress_interval(args.progress_interval))
        .context("Invalid sweep options")?;
    if let Some(max_iter) = args.max_iter {
        let sweep_opts =
            opts.sweep_opts.clone().with_max_iter(max_iter).context("Invalid --max-iter")?;
        opts = opts.with_sweep_opts(sweep_opts);
    }
    if let Some(path) = &args.seed_from {
        let seed = load_seed(path)?;
        if seed.controls() != sweep.as_slice() {
            warn!("seed table controls differ from the sweep; using its coefficients as given");
        }
        opts = opts.with_seed(SeedPolicy::Table(seed.filters()));
    }

    info!(
        "fitting {} sweep points on {} bins ({} Hz .. {} Hz, fs = {} Hz)",
        sweep.len(),
        grid.len(),
        grid_opts.f_min_hz,
        grid_opts.upper_bound_hz(),
        grid.sample_rate_hz()
    );
    let progress: ProgressCallback = Box::new(|p: &SweepProgress| {
        info!(
            "iter {:>6} | total {:.6e} | fidelity {:.6e} | barrier {:.6e} | continuity {:.6e}",
            p.iteration, p.total, p.fidelity, p.barrier, p.continuity
        );
    });
    let fit = fit_sweep(&grid, &ToneStack::default(), &sweep, &opts, Some(progress))
        .context("Sweep fit failed")?;

    let unstable = fit.table.unstable_indices();
    if !unstable.is_empty() {
        warn!(
            "{} of {} entries are not stable (indices {:?}); check before deployment",
            unstable.len(),
            fit.table.len(),
            unstable
        );
    }

    let rendered = match args.format {
        Format::Text => fit.table.to_text(),
        Format::Json => fit.table.to_json().context("Failed to serialize table")?,
    };
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write table to {:?}", path))?;
            info!("wrote {} entries to {:?}", fit.table.len(), path);
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn load_seed(path: &Path) -> Result<CoefficientTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed table: {:?}", path))?;
    let table = CoefficientTable::from_json(&text)
        .with_context(|| format!("Failed to parse seed table: {:?}", path))?;
    if table.filters().iter().any(|f| !f.is_finite()) {
        bail!("Seed table {:?} contains non-finite coefficients", path);
    }
    Ok(table)
}
