//! CLI binary for resume2intern.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `MatchConfig` and prints the outcome as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use resume2intern::{
    process_document, write_outcome, DocumentSource, MatchConfig, PipelineMode, PipelineOutcome,
    PipelineProgressCallback, ProgressCallback, RemoteCatalog, Stage,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

/// Terminal progress callback: a spinner naming the running stage, plus one
/// log line per finished stage, retry and fallback.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Reading resume…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn stage_elapsed(&self) -> f64 {
        self.stage_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_pipeline_start(&self, total_stages: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Running {total_stages} agent stage(s)…"))
        ));
    }

    fn on_stage_start(&self, stage: Stage, index: usize, total_stages: usize) {
        if let Ok(mut started) = self.stage_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_prefix(format!("Stage {index}/{total_stages}"));
        self.bar.set_message(stage.to_string());
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        self.bar.println(format!(
            "  {} {:<18} {:<12} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{output_len:>6} chars")),
            dim(&format!("{:.1}s", self.stage_elapsed())),
        ));
    }

    fn on_stage_retry(&self, stage: Stage, attempt: u32, max_attempts: u32, delay: Duration) {
        self.bar.println(format!(
            "  {} {:<18} attempt {attempt}/{max_attempts} failed, retrying in {:.0}s",
            yellow("↻"),
            stage.to_string(),
            delay.as_secs_f64(),
        ));
    }

    fn on_fallback(&self, reason: &str) {
        // Keep very long upstream messages on one line.
        let msg: String = if reason.chars().count() > 80 {
            reason.chars().take(79).chain(['…']).collect()
        } else {
            reason.to_string()
        };
        self.bar.println(format!(
            "  {} local fallback: {}",
            yellow("⚠"),
            msg
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Match a PDF resume (JSON on stdout)
  resume2intern resume.pdf

  # Pretty JSON written to a file
  resume2intern resume.pdf --pretty -o matches.json

  # Raw text from stdin
  pdftotext resume.pdf - | resume2intern -

  # Resume text given inline
  resume2intern --text "Python backend developer, cloud and distributed systems"

  # No API key: keyword matching against the builtin catalog only
  resume2intern --local-only resume.pdf

  # One combined LLM call instead of three stages
  resume2intern --combined resume.pdf

  # Verify matches against a live opportunity feed
  resume2intern --web-scrape --catalog-url https://example.com/internships.json resume.pdf

OUTPUT:
  {"success": true, "internships": [{"id", "company", "position", "url"}, …],
   "fallback_used": false, "raw_output": "…", "source": "llm"}

  Fallback outcomes add "fallback_reason" and "keywords" and report
  "source": "local-fallback". Rejected documents print
  {"success": false, "error": "PDF_TOO_LARGE" | "PDF_TOO_LONG" | "FILE_TEXT_EMPTY", "message": "…"}
  and exit with status 2.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  GOOGLE_API_KEY          Accepted in place of GEMINI_API_KEY
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
"#;

/// Match a resume to internships.
#[derive(Parser, Debug)]
#[command(
    name = "resume2intern",
    version,
    about = "Match a resume (PDF or text) to internship opportunities",
    long_about = "Match a resume to up to three internships. The resume is validated, \
normalised and sent through a staged LLM pipeline (document analysis, summary, matching, \
optional web scrape). When the LLM is rate limited or returns nothing usable, a deterministic \
keyword recommender serves the result instead.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Resume file (.pdf, .txt, .md), `-` for text on stdin, or text with --text.
    input: String,

    /// Treat INPUT as resume text rather than a file path.
    #[arg(long)]
    text: bool,

    /// Write the outcome JSON to this file instead of stdout.
    #[arg(short, long, env = "RESUME2INTERN_OUTPUT")]
    output: Option<PathBuf>,

    /// Pretty-print the JSON.
    #[arg(long, env = "RESUME2INTERN_PRETTY")]
    pretty: bool,

    /// Skip the LLM and serve keyword matches from the catalog.
    #[arg(long, env = "RESUME2INTERN_LOCAL_ONLY")]
    local_only: bool,

    /// Run every stage in one LLM call.
    #[arg(long, env = "RESUME2INTERN_COMBINED")]
    combined: bool,

    /// Add the web-scrape stage after matching.
    #[arg(long, env = "RESUME2INTERN_WEB_SCRAPE")]
    web_scrape: bool,

    /// JSON opportunity catalog URL (array of {company, position, url, tags}).
    #[arg(long, env = "RESUME2INTERN_CATALOG_URL")]
    catalog_url: Option<String>,

    /// Catalog download timeout in seconds.
    #[arg(long, env = "RESUME2INTERN_CATALOG_TIMEOUT", default_value_t = 30)]
    catalog_timeout: u64,

    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: gemini, openai, anthropic, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Largest accepted document in bytes.
    #[arg(long, env = "RESUME2INTERN_MAX_BYTES", default_value_t = 5 * 1024 * 1024)]
    max_bytes: u64,

    /// Most pages accepted in a PDF.
    #[arg(long, env = "RESUME2INTERN_MAX_PAGES", default_value_t = 20)]
    max_pages: usize,

    /// Normaliser chunk size in characters.
    #[arg(long, env = "RESUME2INTERN_CHUNK_SIZE", default_value_t = 1000)]
    chunk_size: usize,

    /// Attempts per LLM stage on transient failure.
    #[arg(long, env = "RESUME2INTERN_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,

    /// Backoff unit in seconds; attempt n waits n × this.
    #[arg(long, env = "RESUME2INTERN_RETRY_DELAY", default_value_t = 3.0)]
    retry_delay: f64,

    /// Keywords used by the local fallback.
    #[arg(long, env = "RESUME2INTERN_KEYWORDS", default_value_t = 5)]
    keywords: usize,

    /// Max LLM output tokens per stage.
    #[arg(long, env = "RESUME2INTERN_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RESUME2INTERN_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// Per-stage LLM call timeout in seconds.
    #[arg(long, env = "RESUME2INTERN_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "RESUME2INTERN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RESUME2INTERN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the JSON.
    #[arg(short, long, env = "RESUME2INTERN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides all the feedback that matters; keep INFO logs
    // out of its way unless explicitly asked for.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    // ── Resolve input ────────────────────────────────────────────────────
    let source = resolve_source(&cli)?;

    if matches!(&source, DocumentSource::Path(p) if is_pdf(p)) {
        ensure_pdf_engine(cli.quiet)?;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
    )?;

    // ── Run pipeline ─────────────────────────────────────────────────────
    let start = Instant::now();
    let result = process_document(&source, &config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let outcome = result.context("Matching failed")?;

    if let Some(ref path) = cli.output {
        write_outcome(&outcome, path)
            .await
            .context("Failed to write output")?;
    } else {
        let json = if cli.pretty {
            serde_json::to_string_pretty(&outcome)
        } else {
            serde_json::to_string(&outcome)
        }
        .context("Failed to serialise outcome")?;
        println!("{json}");
    }

    if !cli.quiet {
        print_summary(&outcome, start.elapsed(), cli.output.as_deref());
    }

    if !outcome.is_success() {
        std::process::exit(2);
    }
    Ok(())
}

/// Turn the positional argument into a document source.
fn resolve_source(cli: &Cli) -> Result<DocumentSource> {
    if cli.text {
        return Ok(DocumentSource::Text(cli.input.clone()));
    }
    if cli.input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read resume text from stdin")?;
        return Ok(DocumentSource::Text(text));
    }

    let path = PathBuf::from(&cli.input);
    if !path.is_file() {
        anyhow::bail!(
            "File not found: {} (use --text to pass resume text directly)",
            path.display()
        );
    }
    Ok(DocumentSource::Path(path))
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Make sure a pdfium shared library is available before touching a PDF.
///
/// On first use the library (~30 MB) is downloaded and cached; later runs
/// only check the cache path.
fn ensure_pdf_engine(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }
    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    // block_in_place keeps the callback borrow valid without a 'static bound.
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Map CLI args to `MatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<MatchConfig> {
    if !cli.retry_delay.is_finite() || cli.retry_delay < 0.0 {
        anyhow::bail!("--retry-delay must be a non-negative number of seconds");
    }

    let mut builder = MatchConfig::builder()
        .max_document_bytes(cli.max_bytes)
        .max_pages(cli.max_pages)
        .chunk_size(cli.chunk_size)
        .max_attempts(cli.max_attempts)
        .retry_base_delay(Duration::from_secs_f64(cli.retry_delay))
        .keyword_limit(cli.keywords)
        .mode(if cli.combined {
            PipelineMode::Combined
        } else {
            PipelineMode::Staged
        })
        .web_scrape(cli.web_scrape)
        .local_only(cli.local_only)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref url) = cli.catalog_url {
        builder = builder.opportunity_source(Arc::new(RemoteCatalog::new(
            url,
            cli.catalog_timeout,
        )));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// One human-readable line on stderr; the JSON stays on stdout.
fn print_summary(outcome: &PipelineOutcome, elapsed: Duration, output: Option<&Path>) {
    let target = output
        .map(|p| format!("  →  {}", bold(&p.display().to_string())))
        .unwrap_or_default();

    match outcome {
        PipelineOutcome::Success { internships, .. } => eprintln!(
            "{} {} internship(s) matched by the LLM  {}{}",
            green("✔"),
            bold(&internships.len().to_string()),
            dim(&format!("{:.1}s", elapsed.as_secs_f64())),
            target,
        ),
        PipelineOutcome::Fallback {
            internships,
            keywords,
            ..
        } => eprintln!(
            "{} {} internship(s) from local fallback (keywords: {})  {}{}",
            yellow("⚠"),
            bold(&internships.len().to_string()),
            if keywords.is_empty() {
                "none".to_string()
            } else {
                keywords.join(", ")
            },
            dim(&format!("{:.1}s", elapsed.as_secs_f64())),
            target,
        ),
        PipelineOutcome::Rejected {
            error_code,
            message,
        } => eprintln!("{} {}: {}", red("✘"), bold(error_code.as_str()), message),
    }
}
