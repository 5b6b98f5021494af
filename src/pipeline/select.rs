//! Record selection: the guest-count filter and the printing order.
//!
//! Badges are sorted by surname then preferred name so volunteers can find a
//! badge on the check-in table alphabetically. The sort is stable, so two
//! attendees with the same name keep their CSV order and repeated runs on the
//! same file always print identical sheets.

use crate::badge::BadgeKind;
use crate::pipeline::input::{columns, Record};
use tracing::debug;

/// Parse a guest-count cell. Blank or non-numeric text counts as 0.
pub fn parse_guest_count(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

/// Sort records by `(last, preferred)`, case-insensitively and stably.
pub fn sort_records(records: &mut [&Record]) {
    records.sort_by_cached_key(|r| {
        (
            r.get(columns::LAST).to_lowercase(),
            r.get(columns::PREFERRED).to_lowercase(),
        )
    });
}

/// The records that get a badge of the given type, in printing order.
pub fn select_records(records: &[Record], kind: BadgeKind) -> Vec<&Record> {
    let mut selected: Vec<&Record> = match kind.guest_threshold() {
        None => records.iter().collect(),
        Some(min) => records
            .iter()
            .filter(|r| parse_guest_count(r.get(columns::GUEST_COUNT)) >= min)
            .collect(),
    };
    sort_records(&mut selected);

    debug!(
        "{}: {} of {} records selected",
        kind,
        selected.len(),
        records.len()
    );
    selected
}
