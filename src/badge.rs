//! Badge types and output naming.

use crate::pipeline::input::{columns, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One of the four badge sets the tool can print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeKind {
    /// Name, shirt size and check-in QR code on Avery 5395 stock.
    Qr,
    /// Student name badge on Avery 5392 stock.
    Student,
    /// Badge for the student's first guest.
    Guest1,
    /// Badge for the student's second guest.
    Guest2,
}

impl BadgeKind {
    /// All badge types in the order an `all` run generates them.
    pub const ALL: [BadgeKind; 4] = [
        BadgeKind::Qr,
        BadgeKind::Student,
        BadgeKind::Guest1,
        BadgeKind::Guest2,
    ];

    /// Human-readable name used in progress output and logs.
    pub fn title(self) -> &'static str {
        match self {
            BadgeKind::Qr => "QR Badges",
            BadgeKind::Student => "Student Name Badges",
            BadgeKind::Guest1 => "Guest 1 Name Badges",
            BadgeKind::Guest2 => "Guest 2 Name Badges",
        }
    }

    /// Suffix appended to the session stem for the default file name.
    pub fn file_suffix(self) -> &'static str {
        match self {
            BadgeKind::Qr => "QRBadges",
            BadgeKind::Student => "StudentNameBadges",
            BadgeKind::Guest1 => "Guest1Badge",
            BadgeKind::Guest2 => "Guest2Badge",
        }
    }

    /// Minimum `FASET Total Guest Count` a record needs to get this badge.
    ///
    /// `None` means every record gets one.
    pub fn guest_threshold(self) -> Option<i64> {
        match self {
            BadgeKind::Qr | BadgeKind::Student => None,
            BadgeKind::Guest1 => Some(1),
            BadgeKind::Guest2 => Some(2),
        }
    }

    /// Guest number (1 or 2) for guest badges.
    pub fn guest_number(self) -> Option<u8> {
        match self {
            BadgeKind::Guest1 => Some(1),
            BadgeKind::Guest2 => Some(2),
            _ => None,
        }
    }

    /// Whether the saved document should open behind the current window.
    ///
    /// The QR sheet is usually printed straight away, so it comes to the
    /// front; name badge sheets are opened quietly.
    pub fn opens_in_background(self) -> bool {
        self != BadgeKind::Qr
    }

    /// Default output file name, e.g. `2025-08-01_QRBadges.docx`.
    pub fn default_file_name(self, stem: &str) -> String {
        format!("{stem}_{}.docx", self.file_suffix())
    }
}

impl fmt::Display for BadgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// What the user asked to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeSelection {
    One(BadgeKind),
    All,
}

impl BadgeSelection {
    /// The badge types this selection expands to, in generation order.
    pub fn kinds(self) -> Vec<BadgeKind> {
        match self {
            BadgeSelection::One(kind) => vec![kind],
            BadgeSelection::All => BadgeKind::ALL.to_vec(),
        }
    }
}

/// Make a session date safe to use in a file name.
///
/// `"Aug 1/2025"` → `"Aug_1-2025"`.
pub fn sanitize_session_date(raw: &str) -> String {
    raw.trim().replace(' ', "_").replace('/', "-")
}

/// Stem shared by the default output names of one input file.
///
/// Uses the session date of the first row as it appears in the CSV; falls
/// back to the input file stem when that is blank or the file has no rows.
pub fn default_stem(records: &[Record], input: &Path) -> String {
    let session = records
        .first()
        .map(|r| r.trimmed(columns::SESSION_DATE))
        .unwrap_or("");

    if !session.is_empty() {
        return sanitize_session_date(session);
    }

    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "badges".to_string())
}
