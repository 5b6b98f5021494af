//! Pipeline stages for badge sheet generation.
//!
//! Each submodule implements exactly one step, so badge rules, grid maths and
//! document emission can be tested without a CSV file or a network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ select ──▶ compose ──▶ qr ──▶ docx ──▶ export
//! (CSV)     (filter,   (cell      (HTTP)  (tables,  (save, PDF,
//!            sort)      lines)             paginate) open)
//! ```
//!
//! 1. [`input`]    — read the CSV, enforce the required columns
//! 2. [`select`]   — guest-count filter and `(last, preferred)` order
//! 3. [`compose`]  — the conditional content lines of one badge
//! 4. [`qr`]       — download QR images; the only stage with network I/O
//! 5. [`paginate`] and [`docx`] — place cells on fixed-size label tables
//! 6. [`export`]   — atomic save, external PDF conversion, open in viewer

pub mod compose;
pub mod docx;
pub mod export;
pub mod input;
pub mod paginate;
pub mod qr;
pub mod select;
