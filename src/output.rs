//! Result types returned by the generator.

use crate::badge::BadgeKind;
use crate::error::RecordError;
use crate::pipeline::export::PdfOutcome;
use serde::Serialize;
use std::path::PathBuf;

/// What one badge run produced.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Badge type of this run.
    pub badge: BadgeKind,

    /// The CSV the records came from.
    pub input: PathBuf,

    /// Where the `.docx` was saved.
    pub docx_path: PathBuf,

    /// PDF conversion result.
    pub pdf: PdfOutcome,

    /// Badges laid out (records after filtering).
    pub records: usize,

    /// Label sheets (tables) in the document.
    pub pages: usize,

    /// Badges printed with the QR error notice instead of a code.
    pub qr_failures: Vec<RecordError>,

    /// Wall-clock time for the run, including QR downloads and conversion.
    pub duration_ms: u64,
}

impl GenerationReport {
    /// True when every badge got its full content.
    pub fn is_clean(&self) -> bool {
        self.qr_failures.is_empty()
    }
}

/// The outcome of an `all` run: one entry per badge type, in generation order.
///
/// A guest type with no qualifying records has no document and no report; it
/// is listed in `skipped`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub reports: Vec<GenerationReport>,
    pub skipped: Vec<BadgeKind>,
}

impl BatchReport {
    pub fn total_records(&self) -> usize {
        self.reports.iter().map(|r| r.records).sum()
    }

    pub fn total_qr_failures(&self) -> usize {
        self.reports.iter().map(|r| r.qr_failures.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(kind: BadgeKind, records: usize, failures: usize) -> GenerationReport {
        GenerationReport {
            badge: kind,
            input: PathBuf::from("in.csv"),
            docx_path: PathBuf::from(kind.default_file_name("x")),
            pdf: PdfOutcome::Skipped,
            records,
            pages: 1,
            qr_failures: (1..=failures)
                .map(|record| RecordError::QrTimeout {
                    record,
                    url: "http://qr.test".into(),
                    secs: 15,
                })
                .collect(),
            duration_ms: 3,
        }
    }

    #[test]
    fn batch_totals() {
        let batch = BatchReport {
            reports: vec![report(BadgeKind::Qr, 5, 2), report(BadgeKind::Student, 5, 0)],
            skipped: vec![BadgeKind::Guest2],
        };
        assert_eq!(batch.total_records(), 10);
        assert_eq!(batch.total_qr_failures(), 2);
        assert!(!batch.reports[0].is_clean());
        assert!(batch.reports[1].is_clean());
    }

    #[test]
    fn report_serialises_badge_lowercase() {
        let json = serde_json::to_value(report(BadgeKind::Guest1, 1, 0)).unwrap();
        assert_eq!(json["badge"], "guest1");
        assert_eq!(json["pdf"]["status"], "skipped");
        assert_eq!(json["docx_path"], "x_Guest1Badge.docx");
    }
}
