//! Badge run entry points.
//!
//! A run is strictly sequential: load → select → compose → fetch QR → lay out
//! → save → convert → open. QR downloads are awaited one at a time in sheet
//! order, so progress events and report entries come out in the same order as
//! the printed badges.

use crate::badge::{default_stem, BadgeKind};
use crate::config::BadgeConfig;
use crate::error::{BadgeError, RecordError};
use crate::output::{BatchReport, GenerationReport};
use crate::pipeline::compose::{compose_cell, total_count_line, BadgeCell};
use crate::pipeline::input::{load_records, Record};
use crate::pipeline::paginate::Grid;
use crate::pipeline::qr::QrFetcher;
use crate::pipeline::{docx, export, select};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// A packed document that has not been written anywhere yet.
#[derive(Debug, Clone)]
pub struct RenderedSheet {
    pub kind: BadgeKind,
    /// `.docx` bytes.
    pub bytes: Vec<u8>,
    pub records: usize,
    pub pages: usize,
    pub qr_failures: Vec<RecordError>,
}

/// Generate one badge document from a CSV file.
///
/// Returns `Ok(None)` when `kind` is a guest badge and no record has enough
/// guests; no file is written in that case. QR download failures do not fail
/// the run: they are listed in [`GenerationReport::qr_failures`].
///
/// # Errors
/// Any [`BadgeError`]: unreadable input, missing columns, invalid layout or an
/// unwritable output path. Nothing is written when loading fails.
pub async fn generate(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    kind: BadgeKind,
    config: &BadgeConfig,
) -> Result<Option<GenerationReport>, BadgeError> {
    let records = load_records(input.as_ref())?;
    generate_from_records(&records, input, output, kind, config).await
}

/// [`generate`] for records the caller has already loaded.
///
/// `input` is only recorded in the report.
pub async fn generate_from_records(
    records: &[Record],
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    kind: BadgeKind,
    config: &BadgeConfig,
) -> Result<Option<GenerationReport>, BadgeError> {
    run(records, input.as_ref(), output.as_ref(), kind, config).await
}

/// Generate all four badge documents from one CSV file.
///
/// `output` is either a directory, which receives all four default names and
/// is created when missing, or the path of the QR document, with the other
/// three saved beside it under their default names. An existing directory, a
/// path ending in a separator and a path without a `.docx` extension all
/// count as a directory.
pub async fn generate_all(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &BadgeConfig,
) -> Result<BatchReport, BadgeError> {
    let records = load_records(input.as_ref())?;
    generate_all_from_records(&records, input, output, config).await
}

/// [`generate_all`] for records the caller has already loaded.
pub async fn generate_all_from_records(
    records: &[Record],
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &BadgeConfig,
) -> Result<BatchReport, BadgeError> {
    let input = input.as_ref();
    let stem = default_stem(records, input);

    let mut batch = BatchReport::default();
    for kind in BadgeKind::ALL {
        let path = all_mode_path(output.as_ref(), kind, &stem);
        match run(records, input, &path, kind, config).await? {
            Some(report) => batch.reports.push(report),
            None => batch.skipped.push(kind),
        }
    }

    info!(
        "Generated {} documents ({} skipped) from {}",
        batch.reports.len(),
        batch.skipped.len(),
        input.display()
    );
    Ok(batch)
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    kind: BadgeKind,
    config: &BadgeConfig,
) -> Result<Option<GenerationReport>, BadgeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BadgeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input, output, kind, config))
}

/// Default output path for `kind`: its default file name next to the input.
///
/// The name comes from the session date of the first loaded record.
pub fn default_output_path(input: impl AsRef<Path>, records: &[Record], kind: BadgeKind) -> PathBuf {
    let input = input.as_ref();
    let name = kind.default_file_name(&default_stem(records, input));
    match input.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Compose, fetch and lay out one badge type without touching the disk.
///
/// Returns `Ok(None)` for a guest type with no qualifying records.
pub async fn render_document(
    records: &[Record],
    kind: BadgeKind,
    config: &BadgeConfig,
) -> Result<Option<RenderedSheet>, BadgeError> {
    let selected = select::select_records(records, kind);
    if selected.is_empty() && kind.guest_threshold().is_some() {
        info!("No records qualify for {kind}; skipping");
        return Ok(None);
    }

    let profile = config.layout.profile(kind, config.landscape);
    let grid = Grid::new(profile.per_page, profile.columns)?;
    let total = selected.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(kind, total);
    }

    let fetcher = match kind {
        BadgeKind::Qr => Some(QrFetcher::new(config.qr_timeout_secs)?),
        _ => None,
    };

    let mut cells: Vec<BadgeCell> = Vec::with_capacity(total);
    let mut qr_failures = Vec::new();
    for (i, record) in selected.iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_badge_start(index, total);
        }

        let mut cell = compose_cell(kind, record, &config.layout);
        let failure = match fetcher {
            Some(ref f) => f.resolve_cell(&mut cell, index, config.layout.qr_size_in).await,
            None => None,
        };

        if let Some(ref cb) = config.progress_callback {
            match &failure {
                None => cb.on_badge_complete(index, total),
                Some(e) => cb.on_badge_error(index, total, &e.to_string()),
            }
        }
        if let Some(e) = failure {
            qr_failures.push(e);
        }
        cells.push(cell);
    }

    let footer = (kind == BadgeKind::Qr).then(|| total_count_line(total));
    let document = docx::build_document(&cells, &profile, footer.as_ref())?;
    let bytes = docx::pack(document)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(kind, total, qr_failures.len());
    }

    debug!("{kind}: {} badges, {} bytes packed", total, bytes.len());
    Ok(Some(RenderedSheet {
        kind,
        bytes,
        records: total,
        pages: grid.page_count(total),
        qr_failures,
    }))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(
    records: &[Record],
    input: &Path,
    output: &Path,
    kind: BadgeKind,
    config: &BadgeConfig,
) -> Result<Option<GenerationReport>, BadgeError> {
    let start = Instant::now();
    info!("Generating {kind} from {}", input.display());

    let Some(sheet) = render_document(records, kind, config).await? else {
        return Ok(None);
    };

    export::save_document(&sheet.bytes, output)?;

    let pdf = if config.convert_pdf {
        export::convert_to_pdf(output, config.pdf_converter.as_deref())
    } else {
        export::PdfOutcome::Skipped
    };

    if config.open_outputs {
        let background = kind.opens_in_background();
        export::open_in_viewer(output, background);
        if let Some(pdf_path) = pdf.path() {
            export::open_in_viewer(pdf_path, background);
        }
    }

    if !sheet.qr_failures.is_empty() {
        warn!(
            "{kind}: {} of {} QR codes could not be downloaded",
            sheet.qr_failures.len(),
            sheet.records
        );
    }

    let report = GenerationReport {
        badge: kind,
        input: input.to_path_buf(),
        docx_path: output.to_path_buf(),
        pdf,
        records: sheet.records,
        pages: sheet.pages,
        qr_failures: sheet.qr_failures,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "{kind}: {} badges on {} pages → {}",
        report.records,
        report.pages,
        output.display()
    );
    Ok(Some(report))
}

/// Where `kind` is saved in an `all` run. Missing directories are created by
/// the save.
fn all_mode_path(output: &Path, kind: BadgeKind, stem: &str) -> PathBuf {
    if names_directory(output) {
        return output.join(kind.default_file_name(stem));
    }
    if kind == BadgeKind::Qr {
        return output.to_path_buf();
    }
    match output.parent() {
        Some(dir) => dir.join(kind.default_file_name(stem)),
        None => PathBuf::from(kind.default_file_name(stem)),
    }
}

/// Whether an `all` mode output names a folder rather than the QR document.
fn names_directory(output: &Path) -> bool {
    if output.is_dir() {
        return true;
    }
    let raw = output.as_os_str().to_string_lossy();
    if raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR) {
        return true;
    }
    !output
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::columns;

    fn record(pref: &str, last: &str, guests: &str) -> Record {
        Record::from_pairs([
            (columns::PREFERRED, pref),
            (columns::LAST, last),
            (columns::GUEST_COUNT, guests),
            (columns::GUEST1_PREFERRED, "Pat"),
            (columns::GUEST1_LAST, last),
            (columns::GUEST2_PREFERRED, "Sam"),
            (columns::GUEST2_LAST, last),
        ])
    }

    fn quiet_config() -> BadgeConfig {
        BadgeConfig::builder()
            .convert_pdf(false)
            .open_outputs(false)
            .build()
            .unwrap()
    }

    #[test]
    fn all_mode_paths_beside_qr_document() {
        let out = Path::new("/nonexistent/out/Aug_QR.docx");
        assert_eq!(all_mode_path(out, BadgeKind::Qr, "Aug"), out);
        assert_eq!(
            all_mode_path(out, BadgeKind::Guest2, "Aug"),
            PathBuf::from("/nonexistent/out/Aug_Guest2Badge.docx")
        );
    }

    #[test]
    fn all_mode_paths_into_directory_not_yet_created() {
        assert_eq!(
            all_mode_path(Path::new("/nonexistent/out/"), BadgeKind::Student, "Aug"),
            PathBuf::from("/nonexistent/out/Aug_StudentNameBadges.docx")
        );
        assert_eq!(
            all_mode_path(Path::new("/nonexistent/sheets"), BadgeKind::Qr, "Aug"),
            PathBuf::from("/nonexistent/sheets/Aug_QRBadges.docx")
        );
        assert_eq!(
            all_mode_path(Path::new("/nonexistent/Badges.DOCX"), BadgeKind::Qr, "Aug"),
            PathBuf::from("/nonexistent/Badges.DOCX")
        );
    }

    #[test]
    fn default_output_path_sits_beside_input() {
        let records = vec![Record::from_pairs([(columns::SESSION_DATE, "Aug 1/2025")])];
        assert_eq!(
            default_output_path("/data/roster.csv", &records, BadgeKind::Guest1),
            PathBuf::from("/data/Aug_1-2025_Guest1Badge.docx")
        );
        assert_eq!(
            default_output_path("/data/roster.csv", &[], BadgeKind::Qr),
            PathBuf::from("/data/roster_QRBadges.docx")
        );
    }

    #[test]
    fn all_mode_paths_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            all_mode_path(dir.path(), BadgeKind::Qr, "Aug"),
            dir.path().join("Aug_QRBadges.docx")
        );
    }

    #[tokio::test]
    async fn guest_run_without_guests_renders_nothing() {
        let records = vec![record("Ada", "Byron", "0"), record("Alan", "Turing", "")];
        let out = render_document(&records, BadgeKind::Guest1, &quiet_config())
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn student_run_counts_pages() {
        let records: Vec<Record> = (0..7)
            .map(|i| record(&format!("P{i}"), "Same", "0"))
            .collect();
        let sheet = render_document(&records, BadgeKind::Student, &quiet_config())
            .await
            .unwrap()
            .unwrap();
        assert_eq!((sheet.records, sheet.pages), (7, 2));
        assert!(sheet.qr_failures.is_empty());
        assert!(sheet.bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn empty_qr_run_still_renders() {
        let sheet = render_document(&[], BadgeKind::Qr, &quiet_config())
            .await
            .unwrap()
            .unwrap();
        assert_eq!((sheet.records, sheet.pages), (0, 0));
    }

    #[tokio::test]
    async fn guest2_filters_by_count() {
        let records = vec![
            record("Ada", "Byron", "2"),
            record("Alan", "Turing", "1"),
            record("Grace", "Hopper", " 3 "),
        ];
        let sheet = render_document(&records, BadgeKind::Guest2, &quiet_config())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sheet.records, 2);
    }
}
