//! Delivering the finished sheet: save, convert to PDF, open.
//!
//! Only saving is allowed to fail the run. PDF conversion shells out to an
//! office suite that may not be installed, and opening a viewer depends on the
//! desktop session; both degrade to a warning and the `.docx` is still
//! delivered.

use crate::error::BadgeError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// What happened to the PDF rendering of a saved document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum PdfOutcome {
    /// The PDF was written to this path.
    Converted(PathBuf),
    /// Conversion was turned off for this run.
    Skipped,
    /// The converter could not be run or produced no file.
    Failed(String),
}

impl PdfOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            PdfOutcome::Converted(p) => Some(p),
            _ => None,
        }
    }
}

/// Write the document atomically: temp file in the target directory, then
/// rename over the destination. Parent directories are created.
pub fn save_document(bytes: &[u8], path: &Path) -> Result<(), BadgeError> {
    let write_err = |source: std::io::Error| BadgeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// The PDF path the converter writes for a given document.
pub fn pdf_sibling(docx: &Path) -> PathBuf {
    docx.with_extension("pdf")
}

/// Converter programs tried in order when none is configured.
fn converter_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if cfg!(target_os = "macos") {
        candidates.push(PathBuf::from(
            "/Applications/LibreOffice.app/Contents/MacOS/soffice",
        ));
    }
    if cfg!(target_os = "windows") {
        candidates.push(PathBuf::from(
            r"C:\Program Files\LibreOffice\program\soffice.exe",
        ));
    }
    candidates.push(PathBuf::from("soffice"));
    candidates.push(PathBuf::from("libreoffice"));
    candidates
}

/// Convert a saved `.docx` to PDF next to it. Never fails the run.
///
/// `converter` overrides the platform lookup; it is invoked as
/// `<program> --headless --convert-to pdf --outdir <dir> <docx>`.
pub fn convert_to_pdf(docx: &Path, converter: Option<&Path>) -> PdfOutcome {
    let outdir = match docx.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let expected = pdf_sibling(docx);

    let candidates = match converter {
        Some(program) => vec![program.to_path_buf()],
        None => converter_candidates(),
    };

    let mut last_error = String::from("no PDF converter found");
    for program in candidates {
        debug!("Trying PDF converter {}", program.display());
        let output = Command::new(&program)
            .args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(&outdir)
            .arg(docx)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        match output {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                last_error = format!("{}: not installed", program.display());
                continue;
            }
            Err(e) => {
                last_error = format!("{}: {e}", program.display());
                continue;
            }
            Ok(out) if !out.status.success() => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                last_error = format!(
                    "{} exited with {}: {}",
                    program.display(),
                    out.status.code().unwrap_or(-1),
                    stderr.trim()
                );
                continue;
            }
            Ok(_) if !expected.exists() => {
                last_error = format!(
                    "{} finished but {} was not created",
                    program.display(),
                    expected.display()
                );
                continue;
            }
            Ok(_) => {
                info!("Converted to PDF: {}", expected.display());
                return PdfOutcome::Converted(expected);
            }
        }
    }

    warn!("PDF conversion failed for {}: {}", docx.display(), last_error);
    PdfOutcome::Failed(last_error)
}

/// Open a file in the desktop's default application. Errors are only logged.
///
/// `background` keeps the viewer behind the current window where the platform
/// supports it (macOS `open -g`).
pub fn open_in_viewer(path: &Path, background: bool) {
    let mut cmd = if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        if background {
            c.arg("-g");
        }
        c.arg(path);
        c
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(path);
        c
    };

    match cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(_) => debug!("Opened {}", path.display()),
        Err(e) => warn!("Could not open {}: {}", path.display(), e),
    }
}
