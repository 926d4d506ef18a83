//! CLI binary for pitchdeck-insights.
//!
//! A thin shim over the library crate that maps CLI flags and `config.yaml`
//! to `AnalysisConfig`, runs the analysis and writes the report.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pitchdeck_insights::config::DEFAULT_MODEL;
use pitchdeck_insights::{
    analyze, extract_deck, output_filename, write_report, AnalysisConfig,
    EnrichmentProgressCallback, FileConfig, InsightsError, ProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the company is identified,
/// then one bar step per topic. Topics may finish out of order when
/// `--concurrency` is above 1.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-topic wall-clock start times, keyed by catalog index.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_enrichment_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading deck and identifying company…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} topics  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Enriching");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl EnrichmentProgressCallback for CliProgressCallback {
    fn on_enrichment_start(&self, company_name: &str, total_topics: usize) {
        self.activate_bar(total_topics);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Analysing {company_name} across {total_topics} topics…"))
        ));
    }

    fn on_topic_start(&self, index: usize, _total: usize, label: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(label.to_string());
    }

    fn on_topic_complete(&self, index: usize, total: usize, label: &str, content_len: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>2}/{:<2}  {:<36}  {}  {}",
            green("✓"),
            index + 1,
            total,
            label,
            dim(&format!("{content_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_topic_error(&self, index: usize, total: usize, label: &str, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep the log line on one terminal row.
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>2}/{:<2}  {}  {}  {}",
            red("✗"),
            index + 1,
            total,
            label,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_enrichment_complete(&self, total_topics: usize) {
        self.bar.finish_and_clear();
        if self.errors.load(Ordering::SeqCst) == 0 {
            eprintln!(
                "{} {} topics analysed",
                green("✔"),
                bold(&total_topics.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a deck (report written to deck_<timestamp>.md)
  pitchdeck deck.pdf

  # Choose the report path
  pitchdeck deck.pptx -o reports/acme.md

  # Use another OpenRouter model
  pitchdeck --model anthropic/claude-3.5-sonnet deck.pdf

  # Four topics in flight at once
  pitchdeck --concurrency 4 deck.pdf

  # Print the extracted deck text (no API key needed)
  pitchdeck --extract-only deck.pdf

  # Structured JSON on stdout
  pitchdeck --json deck.pdf > report.json

CONFIG FILE (config.yaml, optional):
  llm_model: deepseek/deepseek-chat   # default model
  output_file: output.md              # only the extension is used

ENVIRONMENT VARIABLES (a .env file in the working directory is honoured):
  OPENROUTER_API_KEY   OpenRouter API key (required unless --extract-only)
  PITCHDECK_MODEL      Override the model ID
  PDFIUM_LIB_PATH      Path to libpdfium; otherwise ./ then the system library
  RUST_LOG             Override log filtering (e.g. pitchdeck_insights=debug)
"#;

/// Turn a pitch deck into an LLM-enriched investment-analysis report.
#[derive(Parser, Debug)]
#[command(
    name = "pitchdeck",
    version,
    about = "Turn a pitch deck (PDF/PPTX) into an LLM-enriched investment-analysis report",
    long_about = "Extracts the text of a pitch deck, identifies the company, looks it up on \
DuckDuckGo and asks an OpenRouter model for one analysis section per topic \
(executive summary, market, team, financials, risks, ...). The sections are written \
as a single markdown report.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Pitch deck: .pdf, .ppt or .pptx.
    input: PathBuf,

    /// Write the report here instead of <deck>_<timestamp>.md.
    #[arg(short, long, env = "PITCHDECK_OUTPUT")]
    output: Option<PathBuf>,

    /// YAML config file (llm_model, output_file). Default: ./config.yaml if present.
    #[arg(long, env = "PITCHDECK_CONFIG")]
    config: Option<PathBuf>,

    /// OpenRouter model ID. Beats `llm_model` from the config file.
    #[arg(long, env = "PITCHDECK_MODEL")]
    model: Option<String>,

    /// Topics completed concurrently (1 = one after another).
    #[arg(short, long, env = "PITCHDECK_CONCURRENCY", default_value_t = 1,
          value_parser = clap::value_parser!(u16).range(1..=16))]
    concurrency: u16,

    /// Per-completion timeout in seconds.
    #[arg(long, env = "PITCHDECK_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Search-result titles kept per web lookup.
    #[arg(long, env = "PITCHDECK_SNIPPETS", default_value_t = 2)]
    snippets: usize,

    /// Tidy each section: strip wrapper fences, collapse blank lines and drop
    /// invisible characters. Without it sections are only trimmed.
    #[arg(long)]
    clean_sections: bool,

    /// Print the report as JSON on stdout instead of writing markdown.
    #[arg(long)]
    json: bool,

    /// Print the extracted deck text only; no API key or network needed.
    #[arg(long)]
    extract_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PITCHDECK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PITCHDECK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PITCHDECK_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env before clap so env-backed flags see its values.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar is the user feedback; library INFO logs would tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.extract_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let input_error = e
                .downcast_ref::<InsightsError>()
                .is_some_and(InsightsError::is_input_error);
            eprintln!("{} {:#}", red("Error:"), e);
            if input_error {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let file_config = load_file_config(cli)?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let deck = extract_deck(&cli.input).await?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&deck).context("Failed to serialise deck text")?
            );
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(deck.raw_text.as_bytes())
                .context("Failed to write to stdout")?;
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn EnrichmentProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, &file_config, progress_cb)?;

    // ── Run analysis ─────────────────────────────────────────────────────
    let start = Instant::now();
    let report = analyze(&cli.input, &config).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }

    let output_path = cli.output.clone().unwrap_or_else(|| {
        PathBuf::from(output_filename(
            &cli.input,
            file_config.output_file.as_deref(),
        ))
    });
    write_report(&report, &output_path).await?;

    if !cli.quiet {
        eprintln!(
            "{}  {}  {} sections  {}ms  →  {}",
            green("✔"),
            bold(report.company_name()),
            report.len(),
            start.elapsed().as_millis(),
            bold(&output_path.display().to_string()),
        );
    }

    Ok(())
}

/// Load `config.yaml`: the default path is optional, an explicit one is not.
fn load_file_config(cli: &Cli) -> Result<FileConfig> {
    let (path, required) = match cli.config {
        Some(ref p) => (p.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let cfg = FileConfig::load(&path, required)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok(cfg)
}

/// Map CLI args and the config file to `AnalysisConfig`.
fn build_config(
    cli: &Cli,
    file_config: &FileConfig,
    progress: Option<ProgressCallback>,
) -> Result<AnalysisConfig> {
    let model = cli
        .model
        .clone()
        .or_else(|| file_config.llm_model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let mut builder = AnalysisConfig::builder()
        .model(model)
        .api_timeout_secs(cli.api_timeout)
        .snippet_limit(cli.snippets)
        .concurrency(cli.concurrency as usize)
        .clean_sections(cli.clean_sections);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
