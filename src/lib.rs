//! # badgesheet
//!
//! Turn an attendee CSV export into print-ready badge sheets: Word documents
//! laid out on label stock, plus a PDF rendering of each.
//!
//! ## Why DOCX?
//!
//! Orientation volunteers fix typos and reprint single badges by hand. A
//! `.docx` whose tables match the die-cut labels can be edited in any office
//! suite and still prints onto the right labels; the PDF is for the print
//! shop.
//!
//! ## Pipeline Overview
//!
//! ```text
//! CSV
//!  │
//!  ├─ 1. Input    read rows, enforce required columns
//!  ├─ 2. Select   guest-count filter, sort by (last, preferred)
//!  ├─ 3. Compose  per-badge content lines (QR / student / guest 1 / guest 2)
//!  ├─ 4. QR       download check-in codes (timeout, placeholder on failure)
//!  ├─ 5. Layout   one fixed-size table per label sheet
//!  └─ 6. Export   atomic save, LibreOffice PDF, open in viewer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use badgesheet::{generate, BadgeConfig, BadgeKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BadgeConfig::builder().open_outputs(false).build()?;
//!     if let Some(report) = generate("attendees.csv", "out/QRBadges.docx", BadgeKind::Qr, &config).await? {
//!         eprintln!("{} badges on {} pages", report.records, report.pages);
//!         for failure in &report.qr_failures {
//!             eprintln!("reprint: {failure}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `badgesheet` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `dialogs` | off     | Native file pickers when `--input` / `--output` are omitted (rfd) |
//!
//! ## Label Stock
//!
//! | Badge | Stock | Grid | Label |
//! |-------|-------|------|-------|
//! | QR      | Avery 5395 | 8 per page, 2 columns | 3.5 × 2.5 in |
//! | Student, guest | Avery 5392 | 6 per page, 2 columns | 4.0 × 3.0 in |
//!
//! Both are overridable through [`LayoutConfig`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod badge;
pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use badge::{BadgeKind, BadgeSelection};
pub use config::{BadgeConfig, BadgeConfigBuilder, Dimensions, LayoutConfig, Margins};
pub use error::{BadgeError, RecordError};
pub use generate::{
    default_output_path, generate, generate_all, generate_all_from_records, generate_from_records,
    generate_sync, render_document, RenderedSheet,
};
pub use output::{BatchReport, GenerationReport};
pub use pipeline::export::PdfOutcome;
pub use pipeline::input::{load_records, Record};
pub use progress::{BadgeProgressCallback, NoopProgressCallback, ProgressCallback};
