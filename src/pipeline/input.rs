//! Record loading: read the attendee CSV into ordered [`Record`]s.
//!
//! ## Why a string map with an empty default?
//!
//! Registration exports are ragged: optional columns come and go between
//! sessions, cells are blank, and spreadsheet tools write `NA`/`NaN` for
//! missing values. Every badge line is "print this field if it has text", so
//! the loader normalises all of those cases to `""` once and [`Record::get`]
//! never yields a null. Renderers only ever ask "is the trimmed text empty?".

use crate::error::BadgeError;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// CSV column names the badge renderers read.
pub mod columns {
    pub const PREFERRED: &str = "Preferred";
    pub const LAST: &str = "Last";
    pub const GUEST_COUNT: &str = "FASET Total Guest Count";
    pub const GUEST1_PREFERRED: &str = "Guest 1 Preferred Name";
    pub const GUEST1_LAST: &str = "Guest 1 Last Name";
    pub const GUEST1_AFFILIATIONS: &str = "Guest 1 Affiliations";
    pub const GUEST2_PREFERRED: &str = "Guest 2 Preferred Name";
    pub const GUEST2_LAST: &str = "Guest 2 Last Name";
    pub const GUEST2_AFFILIATIONS: &str = "Guest 2 Affiliations";
    pub const SHIRT_SIZE: &str = "FASET Shirt Size";
    pub const QR_CODE: &str = "Code";
    pub const MAJOR: &str = "Major";
    pub const HOME_CITY: &str = "Home City";
    pub const HOME_STATE: &str = "Home State/Region";
    pub const GROUP_NUMBER: &str = "Group Number";
    pub const PRONOUNS: &str = "Pronouns";
    pub const SESSION_DATE: &str = "FASET Session Date";

    /// Columns that must be present in the header or the load fails.
    ///
    /// The remaining columns above are optional and read as empty when absent.
    pub const REQUIRED: [&str; 9] = [
        PREFERRED,
        LAST,
        GUEST_COUNT,
        GUEST1_PREFERRED,
        GUEST1_LAST,
        GUEST1_AFFILIATIONS,
        GUEST2_PREFERRED,
        GUEST2_LAST,
        GUEST2_AFFILIATIONS,
    ];
}

/// Cell values spreadsheet exports use for "no value"; read as empty.
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One attendee row, keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    /// Build a record from `(column, value)` pairs. Mostly useful in tests.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw value of a column; `""` when the column or value is absent.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    /// Value of a column with surrounding whitespace removed.
    pub fn trimmed(&self, column: &str) -> &str {
        self.get(column).trim()
    }
}

/// Load every record from a CSV file, enforcing the required columns.
///
/// All-or-nothing: any read, parse, or schema problem fails the whole load.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>, BadgeError> {
    let path = path.as_ref().to_path_buf();
    let bytes = read_local(&path)?;

    // Excel's "CSV UTF-8" export prepends a byte-order mark.
    let body = bytes
        .strip_prefix(b"\xEF\xBB\xBF".as_slice())
        .unwrap_or(bytes.as_slice());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(&path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let missing: Vec<String> = columns::REQUIRED
        .iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(BadgeError::MissingColumns { path, missing });
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| csv_error(&path, e))?;
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), normalise_cell(row.get(i).unwrap_or(""))))
            .collect();
        records.push(Record { fields });
    }

    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Validate extension, existence and permissions, then read the whole file.
fn read_local(path: &Path) -> Result<Vec<u8>, BadgeError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(BadgeError::NotCsv { path: path.to_path_buf() });
    }

    if !path.exists() {
        return Err(BadgeError::InputNotFound { path: path.to_path_buf() });
    }

    match std::fs::read(path) {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(BadgeError::PermissionDenied { path: path.to_path_buf() })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(BadgeError::InputNotFound { path: path.to_path_buf() })
        }
        Err(e) => Err(BadgeError::CsvRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

fn normalise_cell(value: &str) -> String {
    if NA_MARKERS.contains(&value) {
        String::new()
    } else {
        value.to_string()
    }
}

fn csv_error(path: &Path, e: csv::Error) -> BadgeError {
    BadgeError::CsvRead {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Preferred,Last,FASET Total Guest Count,Guest 1 Preferred Name,\
Guest 1 Last Name,Guest 1 Affiliations,Guest 2 Preferred Name,Guest 2 Last Name,\
Guest 2 Affiliations,Major";

    fn write_csv(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(contents).unwrap();
        f
    }

    #[test]
    fn loads_rows_in_file_order() {
        let csv = format!("{HEADER}\nJohn,Doe,2,Jane,Doe,Friend,Mark,Doe,Colleague,CS\nAda,Byron,,,,,,,,\n");
        let f = write_csv(csv.as_bytes());

        let records = load_records(f.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(columns::PREFERRED), "John");
        assert_eq!(records[0].get(columns::GUEST2_AFFILIATIONS), "Colleague");
        assert_eq!(records[1].get(columns::LAST), "Byron");
        assert_eq!(records[1].get(columns::GUEST_COUNT), "");
    }

    #[test]
    fn strips_byte_order_mark() {
        let mut csv = b"\xEF\xBB\xBF".to_vec();
        csv.extend_from_slice(format!("{HEADER}\nJohn,Doe,0,,,,,,,\n").as_bytes());
        let f = write_csv(&csv);

        let records = load_records(f.path()).unwrap();
        assert_eq!(records[0].get(columns::PREFERRED), "John");
    }

    #[test]
    fn absent_optional_column_reads_empty() {
        let f = write_csv(format!("{HEADER}\nJohn,Doe,0,,,,,,,\n").as_bytes());
        let records = load_records(f.path()).unwrap();
        assert_eq!(records[0].get(columns::QR_CODE), "");
        assert_eq!(records[0].get(columns::SESSION_DATE), "");
    }

    #[test]
    fn na_markers_read_empty() {
        let f = write_csv(format!("{HEADER}\nJohn,Doe,NaN,N/A,,,,,,NA\n").as_bytes());
        let records = load_records(f.path()).unwrap();
        assert_eq!(records[0].get(columns::GUEST_COUNT), "");
        assert_eq!(records[0].get(columns::GUEST1_PREFERRED), "");
        assert_eq!(records[0].get(columns::MAJOR), "");
    }

    #[test]
    fn short_rows_are_padded() {
        let f = write_csv(format!("{HEADER}\nJohn,Doe\n").as_bytes());
        let records = load_records(f.path()).unwrap();
        assert_eq!(records[0].get(columns::LAST), "Doe");
        assert_eq!(records[0].get(columns::MAJOR), "");
    }

    #[test]
    fn missing_required_column_fails() {
        let f = write_csv(b"Preferred,Last\nJohn,Doe\n");
        match load_records(f.path()) {
            Err(BadgeError::MissingColumns { missing, .. }) => {
                assert_eq!(missing.len(), 7);
                assert_eq!(missing[0], columns::GUEST_COUNT);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_csv_extension() {
        let mut f = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        f.write_all(HEADER.as_bytes()).unwrap();
        assert!(matches!(
            load_records(f.path()),
            Err(BadgeError::NotCsv { .. })
        ));
    }

    #[test]
    fn missing_file_fails() {
        assert!(matches!(
            load_records("/definitely/not/a/roster.csv"),
            Err(BadgeError::InputNotFound { .. })
        ));
    }

    #[test]
    fn invalid_utf8_fails() {
        let mut csv = format!("{HEADER}\n").into_bytes();
        csv.extend_from_slice(b"J\xFFhn,Doe,0,,,,,,,\n");
        let f = write_csv(&csv);
        assert!(matches!(
            load_records(f.path()),
            Err(BadgeError::CsvRead { .. })
        ));
    }

    #[test]
    fn record_trimmed_and_default() {
        let r = Record::from_pairs([("Major", "  CS  ")]);
        assert_eq!(r.get("Major"), "  CS  ");
        assert_eq!(r.trimmed("Major"), "CS");
        assert_eq!(r.get("Nope"), "");
    }
}
