//! CLI binary for bloodwork-advisor.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AdvisorConfig`, reads the report and prints the recommendations.
//! Failures are logged; the exit status is 0 either way.

use anyhow::{Context, Result};
use bloodwork_advisor::{
    process_blood_test_report, read_pdf, run_pipeline, AdvisorConfig, PipelineProgressCallback,
    ProgressCallback, Stage,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::error;
use tracing_subscriber::EnvFilter;

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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that prints one line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Instant>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Reading");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(Instant::now()),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .stage_started
            .lock()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }

    fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Extract => "Reading report…",
        Stage::Analyze => "Analyzing blood test…",
        Stage::Search => "Searching health articles…",
        Stage::Recommend => "Writing recommendations…",
        Stage::Done => "Done",
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_pipeline_start(&self, _total_stages: usize) {
        self.bar.set_prefix("Advising");
    }

    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut t) = self.stage_started.lock() {
            *t = Instant::now();
        }
        self.bar.set_message(stage_message(stage));
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let unit = if stage == Stage::Search { "hits" } else { "chars" };
        self.bar.println(format!(
            "  {} {:<10} {}  {}",
            green("✓"),
            stage.as_str(),
            dim(&format!("{output_len:>5} {unit}")),
            self.elapsed(),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<10} {}  {}",
            red("✗"),
            stage.as_str(),
            red(&msg),
            self.elapsed(),
        ));
    }

    fn on_pipeline_complete(&self, _success: bool) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyze a report with the defaults (gpt-4.1-nano, 3 articles)
  bloodwork blood_test.pdf

  # Send the whole report to the model instead of the first 1000 chars
  bloodwork --excerpt-chars 0 blood_test.pdf

  # Scanned report in German
  bloodwork --ocr-lang deu scan.pdf

  # Structured output with the intermediate stages
  bloodwork --json blood_test.pdf > advice.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  GOOGLE_API_KEY          Google Custom Search API key
  GOOGLE_CSE_ID           Google Custom Search engine ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides -v / -q

Scanned reports need the tesseract binary on PATH.
The output is generated by a language model and is not medical advice.
"#;

/// Analyze a blood test report PDF and suggest health recommendations.
#[derive(Parser, Debug)]
#[command(
    name = "bloodwork",
    version,
    about = "Analyze a blood test report PDF and suggest health recommendations",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the blood test report PDF.
    input: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Tesseract language code(s) for scanned reports, e.g. eng or eng+deu.
    #[arg(long, env = "BLOODWORK_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Report characters sent to the analyzer. 0 sends the whole report.
    #[arg(long, env = "BLOODWORK_EXCERPT_CHARS", default_value_t = 1000)]
    excerpt_chars: usize,

    /// Number of articles to fetch (1–10).
    #[arg(long, env = "BLOODWORK_NUM_RESULTS", default_value_t = 3,
          value_parser = clap::value_parser!(u8).range(1..=10))]
    num_results: u8,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "BLOODWORK_API_TIMEOUT", default_value_t = 300)]
    api_timeout: u64,

    /// End-to-end pipeline timeout in seconds.
    #[arg(long, env = "BLOODWORK_PIPELINE_TIMEOUT", default_value_t = 1800)]
    pipeline_timeout: u64,

    /// Output the full pipeline report as JSON.
    #[arg(long, env = "BLOODWORK_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "BLOODWORK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BLOODWORK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BLOODWORK_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the feedback; library INFO logs would tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    if let Err(e) = run(cli, show_progress).await {
        error!("{:#}", e);
    }
    Ok(())
}

async fn run(cli: Cli, show_progress: bool) -> Result<()> {
    let Some(ref input) = cli.input else {
        error!("Usage: bloodwork <path_to_pdf_file>");
        return Ok(());
    };

    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
    )?;

    let report = read_pdf(input, &config).await;
    if report.is_empty() {
        if let Some(ref cb) = progress {
            cb.clear();
        }
        error!("Could not extract text from the PDF. Please ensure it's a valid blood test report.");
        return Ok(());
    }

    if cli.json {
        let output = run_pipeline(&report, &config)
            .await
            .context("Could not process the blood test report")?;
        println!(
            "{}",
            output.to_json_pretty().context("Failed to serialise output")?
        );
        return Ok(());
    }

    match process_blood_test_report(&report, &config).await {
        Some(result) => {
            println!("Analysis Result:");
            println!("{result}");
        }
        None => error!("Could not process the blood test report"),
    }
    Ok(())
}

/// Map CLI args to `AdvisorConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AdvisorConfig> {
    let excerpt = (cli.excerpt_chars > 0).then_some(cli.excerpt_chars);

    let mut builder = AdvisorConfig::builder()
        .ocr_language(cli.ocr_lang.clone())
        .report_excerpt_chars(excerpt)
        .num_search_results(cli.num_results as usize)
        .api_timeout_secs(cli.api_timeout)
        .pipeline_timeout_secs(cli.pipeline_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
