//! CLI binary for word2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use word2md::{
    classify_input, convert_directory, convert_document, BatchReport, ConversionConfig,
    ConversionProgressCallback, DocumentOutput, InputKind, ProgressCallback,
};

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

/// Terminal progress callback: a live progress bar plus one log line per
/// document and per warning, printed above the bar.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Spinner-only until the document count is known.
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.activate_bar(total_documents);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_documents} documents…"))
        ));
    }

    fn on_document_start(&self, file_name: &str, _index: usize, total: usize) {
        if self.bar.length().unwrap_or(0) == 0 {
            self.activate_bar(total);
        }
        self.bar.set_message(file_name.to_string());
    }

    fn on_warning(&self, file_name: &str, message: &str) {
        self.bar.println(format!(
            "  {} {}  {}",
            yellow("⚠"),
            dim(file_name),
            yellow(message)
        ));
    }

    fn on_document_complete(&self, file_name: &str, images: usize, warnings: usize) {
        self.bar.println(format!(
            "  {} {:<32}  {}",
            green("✓"),
            file_name,
            dim(&format!("{images} images, {warnings} warnings")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, file_name: &str, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(100) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} {:<32}  {}",
            red("✗"),
            file_name,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let failed = total_documents.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one document; report.md and images/ land next to it
  word2md report.docx

  # Convert one document into another directory
  word2md report.docx -o ./markdown

  # Convert every .docx directly inside a directory (output: ./docs/output)
  word2md ./docs

  # Batch into a chosen directory, machine-readable summary
  word2md ./docs -o ./site/content --json > report.json

OUTPUT LAYOUT:
  <output>/
    <name>.md
    images/
      image-<uuid>.<ext>

  Only files ending in .docx (lower case) are picked up in directory mode.
  A document that fails in directory mode is reported and skipped; the run
  still exits 0. A failing single document exits 1.

ENVIRONMENT VARIABLES:
  WORD2MD_OUTPUT          Default for --output
  RUST_LOG                Override log filtering (e.g. word2md=debug)
"#;

/// Convert Word documents (.docx) to Markdown, extracting embedded images.
#[derive(Parser, Debug)]
#[command(
    name = "word2md",
    about = "Convert Word documents (.docx) to Markdown, extracting embedded images",
    long_about = "Convert a .docx file, or every .docx file in a directory, to Markdown. \
Embedded images are written to an images/ directory beside the Markdown under unique \
names, and image references are rewritten to point at them.",
    disable_version_flag = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A .docx file or a directory containing .docx files.
    input: Option<PathBuf>,

    /// Output directory (default: beside the file, or <dir>/output for a directory).
    #[arg(short, long, env = "WORD2MD_OUTPUT")]
    output: Option<PathBuf>,

    /// Print version.
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Print a JSON summary (DocumentOutput or BatchReport) to stdout.
    #[arg(long, env = "WORD2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "WORD2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(long, env = "WORD2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "WORD2MD_QUIET")]
    quiet: bool,
}

fn version() -> &'static str {
    option_env!("CARGO_PKG_VERSION").unwrap_or("1.0.0")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors exit 1 like every other validation failure.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                std::process::exit(1);
            }
        },
    };

    // ── Help / version ───────────────────────────────────────────────────
    if cli.version {
        println!("{}", version());
        return Ok(());
    }
    let Some(ref input) = cli.input else {
        Cli::command()
            .print_help()
            .context("Failed to print help")?;
        println!();
        return Ok(());
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    // ── Build config ─────────────────────────────────────────────────────
    let cli_progress = show_progress.then(CliProgressCallback::new);
    let progress_cb: Option<ProgressCallback> = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);
    let config = build_config(&cli, progress_cb)?;
    let clear_bar = || {
        if let Some(ref cb) = cli_progress {
            cb.bar.finish_and_clear();
        }
    };

    // ── Run conversion ───────────────────────────────────────────────────
    let kind = classify_input(input).await;
    match kind {
        Err(e) => {
            clear_bar();
            return Err(e.into());
        }
        Ok(InputKind::Document(path)) => {
            let result = convert_document(&path, &config).await;
            clear_bar();
            let output =
                result.with_context(|| format!("Error converting {}", path.display()))?;
            report_document(&cli, &output)?;
        }
        Ok(InputKind::Directory(dir)) => {
            let result = convert_directory(&dir, &config).await;
            clear_bar();
            report_batch(&cli, show_progress, &result?)?;
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder();
    if let Some(ref dir) = cli.output {
        builder = builder.output_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

fn report_document(cli: &Cli, output: &DocumentOutput) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }
    eprintln!(
        "{} Converted: {} → {}  {}",
        green("✅"),
        output.source.display(),
        bold(&output.output_path.display().to_string()),
        dim(&format!(
            "{} images, {}ms",
            output.stats.images_written, output.stats.duration_ms
        )),
    );
    Ok(())
}

fn report_batch(cli: &Cli, show_progress: bool, report: &BatchReport) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }
    if report.is_empty() {
        eprintln!(
            "No .docx files found in {}",
            bold(&report.input_dir.display().to_string())
        );
        return Ok(());
    }
    // With the bar active the callback already printed a line per document.
    // Warnings reach stderr through the `warn!` log either way.
    if !show_progress {
        for doc in &report.converted {
            eprintln!(
                "{} Converted: {} → {}",
                green("✅"),
                doc.source.display(),
                doc.output_path.display()
            );
        }
        for err in &report.failed {
            eprintln!("{} {}", red("❌"), err);
        }
    }
    eprintln!(
        "   {} converted, {} failed  →  {}",
        report.converted.len(),
        report.failed.len(),
        bold(&report.output_dir.display().to_string()),
    );
    Ok(())
}
