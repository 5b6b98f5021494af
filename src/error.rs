//! Error types for the badgesheet library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BadgeError`] — **Fatal**: the badge run cannot proceed at all
//!   (unreadable CSV, missing columns, bad layout, unwritable output).
//!   Returned as `Err(BadgeError)` from the top-level `generate*` functions.
//!
//! * [`RecordError`] — **Non-fatal**: one attendee's QR image could not be
//!   fetched or decoded. The cell shows a placeholder line instead and the
//!   error is kept in [`crate::output::GenerationReport`] so the caller can
//!   tell the user which badges need a manual reprint.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the badgesheet library.
#[derive(Debug, Error)]
pub enum BadgeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("CSV file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Only `.csv` input is supported.
    #[error("Only CSV input is supported, got '{path}'")]
    NotCsv { path: PathBuf },

    /// The CSV could not be parsed (bad quoting, invalid UTF-8, I/O error).
    #[error("Failed to read CSV '{path}': {detail}")]
    CsvRead { path: PathBuf, detail: String },

    /// One or more required columns are absent from the header row.
    #[error("Missing required CSV columns: {}", missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The layout config file could not be read.
    #[error("Failed to read config file '{path}'")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The layout config file is not valid JSON / YAML for the layout schema.
    #[error("Failed to parse config file '{path}': {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    /// Builder or layout validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// docx-rs failed to pack the document.
    #[error("Failed to build document: {0}")]
    DocumentBuild(String),

    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}'")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single attendee's badge.
///
/// `record` is the 1-based position of the badge in the sorted run, which is
/// also the order in which badges appear on the printed sheets.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum RecordError {
    /// Connection failure or non-success HTTP status.
    #[error("Badge {record}: QR download from '{url}' failed: {reason}")]
    QrDownloadFailed {
        record: usize,
        url: String,
        reason: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("Badge {record}: QR download from '{url}' timed out after {secs}s")]
    QrTimeout {
        record: usize,
        url: String,
        secs: u64,
    },

    /// The response body was not a decodable image.
    #[error("Badge {record}: QR image from '{url}' could not be decoded: {detail}")]
    QrDecodeFailed {
        record: usize,
        url: String,
        detail: String,
    },
}

impl RecordError {
    /// Position of the affected badge in the sorted run (1-based).
    pub fn record(&self) -> usize {
        match self {
            RecordError::QrDownloadFailed { record, .. }
            | RecordError::QrTimeout { record, .. }
            | RecordError::QrDecodeFailed { record, .. } => *record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_every_column() {
        let e = BadgeError::MissingColumns {
            path: PathBuf::from("roster.csv"),
            missing: vec!["Last".into(), "Guest 2 Affiliations".into()],
        };
        assert_eq!(
            e.to_string(),
            "Missing required CSV columns: Last, Guest 2 Affiliations"
        );
    }

    #[test]
    fn io_cause_is_a_source_not_part_of_the_message() {
        let e = BadgeError::OutputWriteFailed {
            path: PathBuf::from("out/"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "Not a directory"),
        };
        assert_eq!(e.to_string(), "Failed to write output file 'out/'");
        let cause = std::error::Error::source(&e).map(|s| s.to_string());
        assert_eq!(cause.as_deref(), Some("Not a directory"));

        let e = BadgeError::ConfigRead {
            path: PathBuf::from("layout.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(!e.to_string().contains("missing"));
    }

    #[test]
    fn not_csv_display() {
        let e = BadgeError::NotCsv {
            path: PathBuf::from("roster.xlsx"),
        };
        assert!(e.to_string().contains("roster.xlsx"));
    }

    #[test]
    fn qr_timeout_display() {
        let e = RecordError::QrTimeout {
            record: 4,
            url: "https://example.com/qr.png".into(),
            secs: 15,
        };
        let msg = e.to_string();
        assert!(msg.contains("Badge 4"), "got: {msg}");
        assert!(msg.contains("15s"), "got: {msg}");
        assert_eq!(e.record(), 4);
    }

    #[test]
    fn record_error_serialises() {
        let e = RecordError::QrDownloadFailed {
            record: 2,
            url: "http://qr.test/a".into(),
            reason: "HTTP 404 Not Found".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("QrDownloadFailed"));
        let back: RecordError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
