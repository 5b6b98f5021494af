//! Configuration types for badge generation.
//!
//! Two layers:
//!
//! * [`LayoutConfig`] — the label-sheet geometry (margins, grid, cell size,
//!   font sizes). Plain serde data so it can be overridden from a JSON or YAML
//!   file at startup; every key is optional and missing keys keep the
//!   defaults for the Avery 5395 (QR) and Avery 5392 (name badge) sheets.
//!
//! * [`BadgeConfig`] — everything else a run needs (orientation, QR timeout,
//!   PDF/open toggles, progress callback), built via [`BadgeConfigBuilder`].
//!
//! # Design choice: builder over constructor
//! Callers set only the knobs they care about; `build()` validates the layout
//! once so the pipeline never has to re-check grid arithmetic.

use crate::badge::BadgeKind;
use crate::error::BadgeError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Twentieths of a point per inch (OOXML page and table measurements).
pub const TWIPS_PER_INCH: f64 = 1440.0;

/// English Metric Units per inch (OOXML drawing measurements).
pub const EMU_PER_INCH: f64 = 914_400.0;

// ── Layout ───────────────────────────────────────────────────────────────

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 0.5,
            bottom: 0.5,
            left: 0.25,
            right: 0.25,
        }
    }
}

impl Margins {
    fn name_badge() -> Self {
        Self {
            top: 1.0,
            bottom: 1.0,
            left: 0.25,
            right: 0.25,
        }
    }
}

/// Margin keys as written in an override file; absent sides stay `None`.
#[derive(Deserialize)]
struct MarginOverride {
    top: Option<f64>,
    bottom: Option<f64>,
    left: Option<f64>,
    right: Option<f64>,
}

impl MarginOverride {
    fn over(self, base: Margins) -> Margins {
        Margins {
            top: self.top.unwrap_or(base.top),
            bottom: self.bottom.unwrap_or(base.bottom),
            left: self.left.unwrap_or(base.left),
            right: self.right.unwrap_or(base.right),
        }
    }
}

/// `margins_name` falls back to the name badge margins side by side, not to
/// the QR ones `Margins::default()` would give.
fn name_badge_margins<'de, D>(deserializer: D) -> Result<Margins, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(MarginOverride::deserialize(deserializer)?.over(Margins::name_badge()))
}

/// A width × height pair in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Label-sheet geometry for both badge profiles.
///
/// Field names match the keys of the layout override file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// QR sheet margins.
    pub margins: Margins,
    /// Name badge sheet margins.
    #[serde(deserialize_with = "name_badge_margins")]
    pub margins_name: Margins,
    /// Portrait page size shared by both profiles. Default: US Letter.
    pub page_size_in: Dimensions,

    pub per_page_qr: usize,
    pub columns_qr: usize,
    pub label_dims_in_qr: Dimensions,
    /// Printed width of the QR image; height follows the image aspect ratio.
    pub qr_size_in: f64,
    /// Font size of the QR badge text lines.
    pub font_size_pt: usize,

    pub per_page_name: usize,
    pub columns_name: usize,
    pub label_dims_in_name: Dimensions,
    /// Font size of the bold name line on name badges.
    pub name_font_size_pt: usize,
    /// Font size of every other name badge line.
    pub detail_font_size_pt: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margins: Margins::default(),
            margins_name: Margins::name_badge(),
            page_size_in: Dimensions::new(8.5, 11.0),
            per_page_qr: 8,
            columns_qr: 2,
            label_dims_in_qr: Dimensions::new(3.5, 2.5),
            qr_size_in: 1.5,
            font_size_pt: 12,
            per_page_name: 6,
            columns_name: 2,
            label_dims_in_name: Dimensions::new(4.0, 3.0),
            name_font_size_pt: 15,
            detail_font_size_pt: 11,
        }
    }
}

impl LayoutConfig {
    /// Load a layout override from a `.json`, `.yaml` or `.yml` file.
    ///
    /// Keys absent from the file keep their default values. Any other
    /// extension is parsed as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BadgeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| BadgeError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        let layout: LayoutConfig = if is_yaml {
            serde_yml::from_str(&text).map_err(|e| BadgeError::ConfigParse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
        } else {
            serde_json::from_str(&text).map_err(|e| BadgeError::ConfigParse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
        };

        debug!("Loaded layout override from {}", path.display());
        layout.validate()?;
        Ok(layout)
    }

    /// Check that both grids are well-formed and every size is positive.
    pub fn validate(&self) -> Result<(), BadgeError> {
        check_grid("QR", self.per_page_qr, self.columns_qr)?;
        check_grid("name badge", self.per_page_name, self.columns_name)?;

        let lengths = [
            ("page_size_in.width", self.page_size_in.width),
            ("page_size_in.height", self.page_size_in.height),
            ("label_dims_in_qr.width", self.label_dims_in_qr.width),
            ("label_dims_in_qr.height", self.label_dims_in_qr.height),
            ("label_dims_in_name.width", self.label_dims_in_name.width),
            ("label_dims_in_name.height", self.label_dims_in_name.height),
            ("qr_size_in", self.qr_size_in),
        ];
        for (name, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(BadgeError::InvalidConfig(format!(
                    "{name} must be a positive length in inches, got {value}"
                )));
            }
        }

        for margins in [&self.margins, &self.margins_name] {
            for value in [margins.top, margins.bottom, margins.left, margins.right] {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(BadgeError::InvalidConfig(format!(
                        "margins must be non-negative inches, got {value}"
                    )));
                }
            }
        }

        for (name, value) in [
            ("font_size_pt", self.font_size_pt),
            ("name_font_size_pt", self.name_font_size_pt),
            ("detail_font_size_pt", self.detail_font_size_pt),
        ] {
            if value == 0 {
                return Err(BadgeError::InvalidConfig(format!("{name} must be ≥ 1")));
            }
        }

        Ok(())
    }

    /// The sheet geometry a given badge type prints on.
    pub fn profile(&self, kind: BadgeKind, landscape: bool) -> SheetProfile {
        let (margins, per_page, columns, label) = if kind == BadgeKind::Qr {
            (
                self.margins,
                self.per_page_qr,
                self.columns_qr,
                self.label_dims_in_qr,
            )
        } else {
            (
                self.margins_name,
                self.per_page_name,
                self.columns_name,
                self.label_dims_in_name,
            )
        };

        // Orientation only ever applies to the QR sheet; name badge stock is
        // portrait-only.
        let landscape = landscape && kind == BadgeKind::Qr;
        let page = if landscape {
            Dimensions::new(self.page_size_in.height, self.page_size_in.width)
        } else {
            self.page_size_in
        };

        SheetProfile {
            page,
            landscape,
            margins,
            per_page,
            columns,
            label,
        }
    }
}

fn check_grid(profile: &str, per_page: usize, columns: usize) -> Result<(), BadgeError> {
    if per_page == 0 || columns == 0 {
        return Err(BadgeError::InvalidConfig(format!(
            "{profile} grid needs at least one cell per page and one column \
             (per_page={per_page}, columns={columns})"
        )));
    }
    if per_page % columns != 0 {
        return Err(BadgeError::InvalidConfig(format!(
            "{profile} grid: per_page ({per_page}) must be a multiple of columns ({columns})"
        )));
    }
    Ok(())
}

/// Resolved sheet geometry for one badge type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetProfile {
    /// Page size in inches, already rotated when `landscape` is set.
    pub page: Dimensions,
    pub landscape: bool,
    pub margins: Margins,
    pub per_page: usize,
    pub columns: usize,
    /// Size of one label cell in inches.
    pub label: Dimensions,
}

/// Convert inches to twips, rounding to the nearest twip.
pub fn inches_to_twips(inches: f64) -> u32 {
    (inches * TWIPS_PER_INCH).round().max(0.0) as u32
}

/// Convert inches to EMU, rounding to the nearest unit.
pub fn inches_to_emu(inches: f64) -> u32 {
    (inches * EMU_PER_INCH).round().max(0.0) as u32
}

// ── Run configuration ────────────────────────────────────────────────────

/// Configuration for one or more badge runs.
///
/// Built via [`BadgeConfig::builder()`] or using [`BadgeConfig::default()`].
///
/// # Example
/// ```rust
/// use badgesheet::BadgeConfig;
///
/// let config = BadgeConfig::builder()
///     .landscape(true)
///     .qr_timeout_secs(30)
///     .convert_pdf(false)
///     .build()
///     .unwrap();
/// assert!(config.landscape);
/// ```
#[derive(Clone)]
pub struct BadgeConfig {
    /// Sheet geometry for both profiles.
    pub layout: LayoutConfig,

    /// Print the QR sheet in landscape orientation. Default: false.
    pub landscape: bool,

    /// Per-image HTTP timeout for QR downloads, in seconds. Default: 15.
    pub qr_timeout_secs: u64,

    /// Run the external PDF converter after saving. Default: true.
    pub convert_pdf: bool,

    /// Converter program to use instead of the platform's LibreOffice lookup.
    ///
    /// Invoked as `<program> --headless --convert-to pdf --outdir <dir> <docx>`.
    pub pdf_converter: Option<PathBuf>,

    /// Open the saved document (and PDF) in the default viewer. Default: true.
    pub open_outputs: bool,

    /// Receives per-badge progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            landscape: false,
            qr_timeout_secs: 15,
            convert_pdf: true,
            pdf_converter: None,
            open_outputs: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BadgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BadgeConfig")
            .field("layout", &self.layout)
            .field("landscape", &self.landscape)
            .field("qr_timeout_secs", &self.qr_timeout_secs)
            .field("convert_pdf", &self.convert_pdf)
            .field("pdf_converter", &self.pdf_converter)
            .field("open_outputs", &self.open_outputs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BadgeProgressCallback>"),
            )
            .finish()
    }
}

impl BadgeConfig {
    /// Create a new builder for `BadgeConfig`.
    pub fn builder() -> BadgeConfigBuilder {
        BadgeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BadgeConfig`].
#[derive(Debug)]
pub struct BadgeConfigBuilder {
    config: BadgeConfig,
}

impl BadgeConfigBuilder {
    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn landscape(mut self, v: bool) -> Self {
        self.config.landscape = v;
        self
    }

    pub fn qr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.qr_timeout_secs = secs.max(1);
        self
    }

    pub fn convert_pdf(mut self, v: bool) -> Self {
        self.config.convert_pdf = v;
        self
    }

    pub fn pdf_converter(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.pdf_converter = Some(program.into());
        self
    }

    pub fn open_outputs(mut self, v: bool) -> Self {
        self.config.open_outputs = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating the layout.
    pub fn build(self) -> Result<BadgeConfig, BadgeError> {
        self.config.layout.validate()?;
        Ok(self.config)
    }
}
