//! CLI binary for badgesheet.
//!
//! A thin shim over the library crate that maps CLI flags to `BadgeConfig`,
//! drives one badge run (or all four) and prints the results.

use anyhow::{Context, Result};
use badgesheet::{
    default_output_path, generate_all_from_records, generate_from_records, load_records,
    BadgeConfig, BadgeKind, BadgeProgressCallback, BadgeSelection, GenerationReport, LayoutConfig,
    PdfOutcome, ProgressCallback, Record,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
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
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per badge run, with a log line for
/// every badge whose QR code could not be fetched.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref bar) = *guard {
                f(bar);
            }
        }
    }
}

impl BadgeProgressCallback for CliProgressCallback {
    fn on_run_start(&self, kind: BadgeKind, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} badges  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(total as u64);
        bar.set_style(style);
        bar.set_prefix(kind.title());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{}: {total} badges", kind.title()))
        ));

        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_badge_complete(&self, _index: usize, _total: usize) {
        self.with_bar(|bar| bar.inc(1));
    }

    fn on_badge_error(&self, index: usize, total: usize, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.with_bar(|bar| {
            bar.println(format!(
                "  {} Badge {:>3}/{:<3}  {}",
                red("✗"),
                index,
                total,
                red(&msg),
            ));
            bar.inc(1);
        });
    }

    fn on_run_complete(&self, kind: BadgeKind, total: usize, failures: usize) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }

        if failures == 0 {
            eprintln!(
                "{} {} {} laid out",
                green("✔"),
                bold(&total.to_string()),
                kind.title()
            );
        } else {
            eprintln!(
                "{} {} {} laid out  ({} without QR code)",
                cyan("⚠"),
                bold(&total.to_string()),
                kind.title(),
                red(&failures.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # QR check-in badges (Avery 5395), saved as DOCX and converted to PDF
  badgesheet -i attendees.csv -o out/QRBadges.docx

  # Student name badges (Avery 5392)
  badgesheet -i attendees.csv -o out/names.docx --badge student

  # All four sheets into one directory (created if missing), default file names
  badgesheet -i attendees.csv -o out/ --badge all

  # Landscape QR sheet, custom label layout, no PDF / viewer
  badgesheet -i attendees.csv -o qr.docx --landscape -c layout.yaml --no-pdf --no-open

  # Machine-readable run report
  badgesheet -i attendees.csv -o out/ --badge all --json --no-open > report.json

BADGE TYPES:
  qr       Name, shirt size, QR check-in code; "Total Count" line at the end
  student  Student name, major, home town, group and pronouns
  guest1   First guest of every student with at least one guest
  guest2   Second guest of every student with at least two guests
  all      All of the above; guest sheets with no guests are skipped

DEFAULT FILE NAMES:
  <session>_QRBadges.docx  <session>_StudentNameBadges.docx
  <session>_Guest1Badge.docx  <session>_Guest2Badge.docx
  <session> is the first row's FASET Session Date ("Aug 1/2025" → "Aug_1-2025"),
  or the CSV file name when that is blank.

PDF CONVERSION:
  Uses LibreOffice (soffice / libreoffice) in headless mode. When it is not
  installed the DOCX is still saved and a warning is printed. Point
  --pdf-converter at another soffice-compatible program to override.
"#;

/// Generate printable badge sheets from an attendee CSV export.
#[derive(Parser, Debug)]
#[command(
    name = "badgesheet",
    version,
    about = "Generate printable QR and name badge sheets (DOCX + PDF) from an attendee CSV",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Attendee CSV export.
    #[arg(short, long, env = "BADGESHEET_INPUT")]
    input: Option<PathBuf>,

    /// Output .docx path (in `all` mode: the QR document, or a directory,
    /// created if missing, for any path not ending in .docx).
    #[arg(short, long, env = "BADGESHEET_OUTPUT")]
    output: Option<PathBuf>,

    /// JSON (.json) or YAML (.yaml/.yml) label layout override.
    #[arg(short, long, env = "BADGESHEET_CONFIG")]
    config: Option<PathBuf>,

    /// Print the QR sheet in landscape orientation.
    #[arg(long, env = "BADGESHEET_LANDSCAPE")]
    landscape: bool,

    /// Which badge sheet to generate.
    #[arg(short, long, env = "BADGESHEET_BADGE", value_enum, default_value = "qr")]
    badge: BadgeArg,

    /// Per-image QR download timeout in seconds.
    #[arg(long, env = "BADGESHEET_QR_TIMEOUT", default_value_t = 15,
          value_parser = clap::value_parser!(u64).range(1..))]
    qr_timeout: u64,

    /// Skip PDF conversion.
    #[arg(long, env = "BADGESHEET_NO_PDF")]
    no_pdf: bool,

    /// Do not open the generated files.
    #[arg(long, env = "BADGESHEET_NO_OPEN")]
    no_open: bool,

    /// Converter program used instead of LibreOffice.
    #[arg(long, env = "BADGESHEET_PDF_CONVERTER")]
    pdf_converter: Option<PathBuf>,

    /// Print run reports as JSON on stdout.
    #[arg(long, env = "BADGESHEET_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "BADGESHEET_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BADGESHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BADGESHEET_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BadgeArg {
    Qr,
    Student,
    Guest1,
    Guest2,
    All,
}

impl From<BadgeArg> for BadgeSelection {
    fn from(v: BadgeArg) -> Self {
        match v {
            BadgeArg::Qr => BadgeSelection::One(BadgeKind::Qr),
            BadgeArg::Student => BadgeSelection::One(BadgeKind::Student),
            BadgeArg::Guest1 => BadgeSelection::One(BadgeKind::Guest1),
            BadgeArg::Guest2 => BadgeSelection::One(BadgeKind::Guest2),
            BadgeArg::All => BadgeSelection::All,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

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

    if let Err(e) = run(cli, show_progress).await {
        // Shown whatever the log filter is.
        eprintln!("{} {e:#}", red("✗"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, show_progress: bool) -> Result<()> {
    let selection = BadgeSelection::from(cli.badge);

    // ── Resolve paths ────────────────────────────────────────────────────
    let Some(input) = resolve_input(&cli)? else {
        if !cli.quiet {
            eprintln!("{}", dim("No input selected, nothing to do."));
        }
        return Ok(());
    };
    let records = load_records(&input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    let Some(output) = resolve_output(&cli, &input, &records, selection)? else {
        if !cli.quiet {
            eprintln!("{}", dim("No output selected, nothing to do."));
        }
        return Ok(());
    };

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BadgeProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    match selection {
        BadgeSelection::One(kind) => {
            let report = generate_from_records(&records, &input, &output, kind, &config)
                .await
                .with_context(|| format!("Failed to generate {}", kind.title()))?;

            if cli.json {
                let json = serde_json::to_string_pretty(&report)
                    .context("Failed to serialise report")?;
                println!("{json}");
            }
            if !cli.quiet {
                match report {
                    Some(ref r) => print_summary(r),
                    None => print_skipped(kind),
                }
            }
        }
        BadgeSelection::All => {
            let batch = generate_all_from_records(&records, &input, &output, &config)
                .await
                .context("Failed to generate badge sheets")?;

            if cli.json {
                let json = serde_json::to_string_pretty(&batch)
                    .context("Failed to serialise report")?;
                println!("{json}");
            }
            if !cli.quiet {
                for report in &batch.reports {
                    print_summary(report);
                }
                for kind in &batch.skipped {
                    print_skipped(*kind);
                }
            }
        }
    }

    Ok(())
}

/// Map CLI args to `BadgeConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BadgeConfig> {
    let layout = match cli.config {
        Some(ref path) => LayoutConfig::from_file(path)
            .with_context(|| format!("Failed to load layout from {}", path.display()))?,
        None => LayoutConfig::default(),
    };

    let mut builder = BadgeConfig::builder()
        .layout(layout)
        .landscape(cli.landscape)
        .qr_timeout_secs(cli.qr_timeout)
        .convert_pdf(!cli.no_pdf)
        .open_outputs(!cli.no_open);

    if let Some(ref program) = cli.pdf_converter {
        builder = builder.pdf_converter(program);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

// ── Path resolution ──────────────────────────────────────────────────────────

/// The input CSV: `--input`, or a file picker. `None` when the picker was
/// cancelled.
fn resolve_input(cli: &Cli) -> Result<Option<PathBuf>> {
    match cli.input {
        Some(ref path) => Ok(Some(path.clone())),
        None => pick_input(),
    }
}

/// The output path: `--output`, or a save dialog pre-filled with the default
/// file name (a folder picker in `all` mode).
fn resolve_output(
    cli: &Cli,
    input: &Path,
    records: &[Record],
    selection: BadgeSelection,
) -> Result<Option<PathBuf>> {
    if let Some(ref path) = cli.output {
        return Ok(Some(path.clone()));
    }
    match selection {
        BadgeSelection::One(kind) => {
            pick_output(&default_output_path(input, records, kind))
        }
        BadgeSelection::All => pick_output_dir(input),
    }
}

#[cfg(feature = "dialogs")]
fn pick_input() -> Result<Option<PathBuf>> {
    Ok(rfd::FileDialog::new()
        .set_title("Select the attendee CSV")
        .add_filter("CSV files", &["csv", "CSV"])
        .pick_file())
}

#[cfg(feature = "dialogs")]
fn pick_output(suggested: &Path) -> Result<Option<PathBuf>> {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Save badges as")
        .add_filter("Word document", &["docx"]);
    if let Some(dir) = suggested.parent().filter(|d| !d.as_os_str().is_empty()) {
        dialog = dialog.set_directory(dir);
    }
    if let Some(name) = suggested.file_name() {
        dialog = dialog.set_file_name(name.to_string_lossy());
    }
    Ok(dialog.save_file())
}

#[cfg(feature = "dialogs")]
fn pick_output_dir(input: &Path) -> Result<Option<PathBuf>> {
    let mut dialog = rfd::FileDialog::new().set_title("Choose a folder for the badge sheets");
    if let Some(dir) = input.parent().filter(|d| !d.as_os_str().is_empty()) {
        dialog = dialog.set_directory(dir);
    }
    Ok(dialog.pick_folder())
}

#[cfg(not(feature = "dialogs"))]
fn pick_input() -> Result<Option<PathBuf>> {
    anyhow::bail!("No input CSV given. Usage: badgesheet --input <CSV> --output <DOCX>")
}

#[cfg(not(feature = "dialogs"))]
fn pick_output(suggested: &Path) -> Result<Option<PathBuf>> {
    anyhow::bail!(
        "No output path given. Usage: badgesheet --input <CSV> --output <DOCX> \
         (for example --output {})",
        suggested.display()
    )
}

#[cfg(not(feature = "dialogs"))]
fn pick_output_dir(_input: &Path) -> Result<Option<PathBuf>> {
    anyhow::bail!("No output given. Usage: badgesheet --badge all --input <CSV> --output <DIR>")
}

// ── Summary ──────────────────────────────────────────────────────────────────

fn print_summary(report: &GenerationReport) {
    eprintln!(
        "{}  {}  {} badges on {} pages  {}ms  →  {}",
        if report.is_clean() {
            green("✔")
        } else {
            cyan("⚠")
        },
        report.badge.title(),
        report.records,
        report.pages,
        report.duration_ms,
        bold(&report.docx_path.display().to_string()),
    );

    match report.pdf {
        PdfOutcome::Converted(ref path) => {
            eprintln!("   {}", dim(&format!("PDF: {}", path.display())));
        }
        PdfOutcome::Failed(ref reason) => {
            eprintln!(
                "   {} PDF conversion failed: {}",
                cyan("⚠"),
                reason
            );
        }
        PdfOutcome::Skipped => {}
    }

    for failure in &report.qr_failures {
        eprintln!("   {} {}", red("✗"), failure);
    }
}

fn print_skipped(kind: BadgeKind) {
    let min = kind.guest_threshold().unwrap_or(0);
    eprintln!(
        "{}  No attendees with at least {} guest{}; {} not generated",
        cyan("⚠"),
        min,
        if min == 1 { "" } else { "s" },
        kind.title()
    );
}
