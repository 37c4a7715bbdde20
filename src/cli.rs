use crate::dataset::{self, Dataset};
use crate::model::{AnalysisContext, AnalysisKind, ViewStatus};
use crate::orchestrator::{build_report, export_report};
use crate::view::RiskView;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "risk-analysis-cli",
    version,
    about = "Re-identification risk analysis with optional TUI"
)]
pub struct Cli {
    /// JSON dataset ({"attributes": [..], "rows": [[..], ..]}); a synthetic one is generated when omitted
    #[arg(long, env = "RISK_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Rows of the synthetic dataset
    #[arg(long, default_value_t = 2_000)]
    pub rows: usize,

    /// Seed of the synthetic dataset
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Comma separated quasi-identifiers (default: every attribute)
    #[arg(long, value_delimiter = ',', env = "RISK_QUASI_IDENTIFIERS")]
    pub quasi_identifiers: Vec<String>,

    /// Analysis to run in text/JSON mode
    #[arg(long, value_enum, default_value_t = AnalysisKind::Msu)]
    pub analysis: AnalysisKind,

    /// Largest attribute combination searched for MSUs
    #[arg(long, default_value_t = 3)]
    pub max_msu_size: usize,

    /// Keep the progress indicator visible for at least this long
    #[arg(long, default_value = "500ms", env = "RISK_MINIMUM_WORKING_TIME")]
    pub minimum_working_time: humantime::Duration,

    /// Print JSON result and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Export the finished result as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Directory the TUI writes exported reports to
    #[arg(long, default_value = ".")]
    pub export_dir: PathBuf,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "RISK_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

pub async fn run(args: Cli) -> Result<()> {
    let interactive = !args.json && !args.text && cfg!(feature = "tui");
    init_tracing(&args, interactive)?;

    let dataset = Arc::new(load_dataset(&args)?);
    tracing::info!(
        records = dataset.len(),
        attributes = dataset.attributes.len(),
        "dataset ready"
    );

    if interactive {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args, dataset).await;
        }
    }

    run_single(args, dataset).await
}

/// Install the tracing subscriber. The TUI owns the terminal, so it only logs to a file.
fn init_tracing(args: &Cli, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = args.log_file.as_deref() {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false),
            )
            .try_init()
            .context("install tracing subscriber")?;
    } else if !interactive {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("install tracing subscriber")?;
    }
    Ok(())
}

fn load_dataset(args: &Cli) -> Result<Dataset> {
    match args.dataset.as_deref() {
        Some(path) => Dataset::load(path),
        None => Ok(dataset::synthetic(args.rows, args.seed)),
    }
}

/// Resolve the quasi-identifiers requested on the command line.
pub fn selected_quasi_identifiers(args: &Cli, dataset: &Dataset) -> Result<Vec<String>> {
    if args.quasi_identifiers.is_empty() {
        return Ok(dataset.attributes.clone());
    }
    for qi in &args.quasi_identifiers {
        if dataset.column_index(qi).is_none() {
            bail!(
                "unknown quasi-identifier {qi:?}; available: {}",
                dataset.attributes.join(", ")
            );
        }
    }
    Ok(args.quasi_identifiers.clone())
}

/// Build an `AnalysisContext` from CLI arguments.
pub fn build_context(args: &Cli, dataset: Arc<Dataset>) -> Result<AnalysisContext> {
    let quasi_identifiers = selected_quasi_identifiers(args, &dataset)?;
    Ok(AnalysisContext {
        dataset,
        quasi_identifiers,
        max_msu_size: args.max_msu_size,
        minimum_working_time: Duration::from(args.minimum_working_time),
    })
}

/// Run one analysis with this task as the interactive thread, then print the result.
async fn run_single(args: Cli, dataset: Arc<Dataset>) -> Result<()> {
    let context = build_context(&args, dataset)?;
    let (out_tx, out_handle) = spawn_output_writer();

    let (mut view, mut queue) = RiskView::new(args.analysis);
    view.update(context);
    if view.status() != ViewStatus::Working {
        bail!("nothing to analyse: select at least one quasi-identifier");
    }

    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut last_progress = None;
    while view.status() == ViewStatus::Working {
        tokio::select! {
            callback = queue.recv() => {
                match callback {
                    Some(callback) => callback(&mut view),
                    None => bail!("analysis manager went away"),
                }
            }
            _ = ticker.tick() => {
                let progress = view.progress();
                if !args.json && view.is_running() && last_progress != Some(progress) {
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "{}: {progress}%",
                        args.analysis.label()
                    )));
                    last_progress = Some(progress);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = out_tx.send(OutputLine::Stderr("Cancelling…".into()));
                view.reset();
            }
        }
    }

    let Some(report) = build_report(&view) else {
        let reason = view.last_error().unwrap_or("analysis interrupted").to_string();
        drop(out_tx);
        let _ = out_handle.await;
        bail!(reason);
    };

    if let Some(path) = args.export_json.as_deref() {
        export_report(path, &report)?;
        let _ = out_tx.send(OutputLine::Stderr(format!("Exported: {}", path.display())));
    }

    if args.json {
        let out = serde_json::to_string_pretty(&report)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let summary = crate::text_summary::build_text_summary(&report);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
