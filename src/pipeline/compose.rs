//! Cell composition: the ordered content lines of one badge.
//!
//! Composing is separate from writing the document so the badge rules (which
//! fields, in which order, which are optional) can be tested as plain data.
//! The QR image is only a URL at this stage; [`crate::pipeline::qr`] swaps it
//! for the downloaded picture or the error notice before the document is
//! emitted.
//!
//! Every text line is dropped when its text is empty after trimming, so a
//! missing major or pronoun never leaves a blank gap on the badge.

use crate::badge::BadgeKind;
use crate::config::LayoutConfig;
use crate::pipeline::input::{columns, Record};
use crate::pipeline::qr::QrImage;

/// Text shown in place of a QR code that could not be fetched.
pub const QR_ERROR_TEXT: &str = "QR download error";

/// Blank lines above the name on name badges, clearing the pre-printed header.
const NAME_BADGE_TOP_PADDING: usize = 3;

/// One centred line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: String,
    pub bold: bool,
    /// Font size in points; `None` keeps the document default.
    pub size_pt: Option<usize>,
}

impl TextLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            size_pt: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn size(mut self, pt: usize) -> Self {
        self.size_pt = Some(pt);
        self
    }
}

/// One line of a badge cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellLine {
    /// Empty spacer paragraph.
    Blank,
    Text(TextLine),
    /// QR code still to be downloaded.
    QrPending { url: String },
    /// Downloaded QR code, printed `width_in` inches wide.
    QrImage { image: QrImage, width_in: f64 },
}

/// The composed content of one badge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BadgeCell {
    pub lines: Vec<CellLine>,
}

impl BadgeCell {
    fn push_text(&mut self, line: TextLine) {
        if !line.text.trim().is_empty() {
            self.lines.push(CellLine::Text(line));
        }
    }

    /// The text of every text line, in order. Handy for assertions and logs.
    pub fn texts(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                CellLine::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// URL of the QR code still waiting to be fetched, if any.
    pub fn pending_qr(&self) -> Option<&str> {
        self.lines.iter().find_map(|l| match l {
            CellLine::QrPending { url } => Some(url.as_str()),
            _ => None,
        })
    }
}

/// Compose the badge for one record.
pub fn compose_cell(kind: BadgeKind, record: &Record, layout: &LayoutConfig) -> BadgeCell {
    match kind {
        BadgeKind::Qr => compose_qr(record, layout),
        BadgeKind::Student => compose_student(record, layout),
        BadgeKind::Guest1 => compose_guest(record, layout, GuestColumns::FIRST),
        BadgeKind::Guest2 => compose_guest(record, layout, GuestColumns::SECOND),
    }
}

/// The closing `Total Count: n` line printed under the QR sheets.
pub fn total_count_line(total: usize) -> TextLine {
    TextLine::new(format!("Total Count: {total}")).bold()
}

/// Suffix shown after the name on a QR badge. A blank count prints as 1.
pub fn guest_count_display(record: &Record) -> &str {
    match record.trimmed(columns::GUEST_COUNT) {
        "" => "1",
        count => count,
    }
}

fn compose_qr(record: &Record, layout: &LayoutConfig) -> BadgeCell {
    let mut cell = BadgeCell::default();
    let size = layout.font_size_pt;

    let name = format!(
        "{} {} - {}",
        record.trimmed(columns::PREFERRED),
        record.trimmed(columns::LAST),
        guest_count_display(record)
    );
    cell.push_text(TextLine::new(name.trim()).bold().size(size));

    let shirt = record.trimmed(columns::SHIRT_SIZE);
    if !shirt.is_empty() {
        cell.push_text(TextLine::new(format!("Shirt Size: {shirt}")).size(size));
    }

    let url = record.trimmed(columns::QR_CODE);
    if !url.is_empty() {
        cell.lines.push(CellLine::QrPending {
            url: url.to_string(),
        });
    }

    cell
}

fn compose_student(record: &Record, layout: &LayoutConfig) -> BadgeCell {
    let mut cell = padded_cell();
    let detail = layout.detail_font_size_pt;

    cell.push_text(
        TextLine::new(full_name(
            record.trimmed(columns::PREFERRED),
            record.trimmed(columns::LAST),
        ))
        .bold()
        .size(layout.name_font_size_pt),
    );
    cell.push_text(TextLine::new(record.trimmed(columns::MAJOR)).size(detail));
    cell.push_text(TextLine::new(home_town(record)).size(detail));

    let group_pronouns = [
        record.trimmed(columns::GROUP_NUMBER),
        record.trimmed(columns::PRONOUNS),
    ]
    .iter()
    .filter(|s| !s.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" – ");
    cell.push_text(TextLine::new(group_pronouns).size(detail));

    cell.push_text(TextLine::new(record.trimmed(columns::SESSION_DATE)).size(detail));
    cell
}

struct GuestColumns {
    preferred: &'static str,
    last: &'static str,
    affiliations: &'static str,
}

impl GuestColumns {
    const FIRST: GuestColumns = GuestColumns {
        preferred: columns::GUEST1_PREFERRED,
        last: columns::GUEST1_LAST,
        affiliations: columns::GUEST1_AFFILIATIONS,
    };
    const SECOND: GuestColumns = GuestColumns {
        preferred: columns::GUEST2_PREFERRED,
        last: columns::GUEST2_LAST,
        affiliations: columns::GUEST2_AFFILIATIONS,
    };
}

fn compose_guest(record: &Record, layout: &LayoutConfig, guest: GuestColumns) -> BadgeCell {
    let mut cell = padded_cell();
    let detail = layout.detail_font_size_pt;

    cell.push_text(
        TextLine::new(full_name(
            record.trimmed(guest.preferred),
            record.trimmed(guest.last),
        ))
        .bold()
        .size(layout.name_font_size_pt),
    );

    let host = full_name(
        record.trimmed(columns::PREFERRED),
        record.trimmed(columns::LAST),
    );
    if !host.is_empty() {
        cell.push_text(TextLine::new(format!("Guest of: {host}")).size(detail));
    }

    cell.push_text(TextLine::new(record.trimmed(guest.affiliations)).size(detail));
    cell.push_text(TextLine::new(home_town(record)).size(detail));
    cell.push_text(TextLine::new(record.trimmed(columns::SESSION_DATE)).size(detail));
    cell
}

fn padded_cell() -> BadgeCell {
    BadgeCell {
        lines: vec![CellLine::Blank; NAME_BADGE_TOP_PADDING],
    }
}

fn full_name(preferred: &str, last: &str) -> String {
    format!("{preferred} {last}").trim().to_string()
}

/// `"City, State"`, without a dangling comma when one side is blank.
fn home_town(record: &Record) -> String {
    format!(
        "{}, {}",
        record.trimmed(columns::HOME_CITY),
        record.trimmed(columns::HOME_STATE)
    )
    .trim_matches(|c| c == ',' || c == ' ')
    .to_string()
}
