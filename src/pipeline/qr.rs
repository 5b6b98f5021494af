//! QR image download: fetch each attendee's check-in code for the QR sheet.
//!
//! ## Failure policy
//!
//! One unreachable image must not cost the whole sheet. Every failure mode
//! (connect error, timeout, non-2xx status, body that is not an image) turns
//! into a [`RecordError`] and the cell prints [`QR_ERROR_TEXT`] instead. There
//! are no retries: a volunteer reprints the handful of failed badges, which is
//! faster than stalling the run on a flaky registration server.
//!
//! ## Why re-encode to PNG?
//!
//! docx-rs embeds pictures as PNG parts. Registration systems serve QR codes
//! as PNG, JPEG, or occasionally mislabelled content types, so every
//! download is decoded and re-encoded, which also proves the bytes really are
//! an image before they go into the document.

use crate::error::{BadgeError, RecordError};
use crate::pipeline::compose::{BadgeCell, CellLine, TextLine, QR_ERROR_TEXT};
use image::DynamicImage;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, warn};

/// A downloaded QR code, re-encoded as PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl QrImage {
    /// Height-to-width ratio, used to keep the printed code square-true.
    pub fn aspect(&self) -> f64 {
        if self.width_px == 0 {
            1.0
        } else {
            f64::from(self.height_px) / f64::from(self.width_px)
        }
    }
}

/// Decode arbitrary image bytes and re-encode them as PNG.
pub fn encode_qr(bytes: &[u8]) -> Result<QrImage, image::ImageError> {
    let img: DynamicImage = image::load_from_memory(bytes)?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    debug!(
        "Encoded QR image → {}x{} px, {} bytes PNG",
        img.width(),
        img.height(),
        png.len()
    );
    Ok(QrImage {
        png,
        width_px: img.width(),
        height_px: img.height(),
    })
}

/// HTTP client for QR downloads, shared across one badge run.
#[derive(Debug, Clone)]
pub struct QrFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl QrFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, BadgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BadgeError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Download and decode the QR image for badge number `record`.
    pub async fn fetch(&self, record: usize, url: &str) -> Result<QrImage, RecordError> {
        debug!("Fetching QR #{record} from {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(record, url, e))?;

        if !response.status().is_success() {
            return Err(RecordError::QrDownloadFailed {
                record,
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.request_error(record, url, e))?;

        encode_qr(&bytes).map_err(|e| RecordError::QrDecodeFailed {
            record,
            url: url.to_string(),
            detail: e.to_string(),
        })
    }

    /// Replace the cell's pending QR line with the image, or with the error
    /// notice when the download fails.
    ///
    /// Cells without a QR line are left untouched and yield `None`.
    pub async fn resolve_cell(
        &self,
        cell: &mut BadgeCell,
        record: usize,
        width_in: f64,
    ) -> Option<RecordError> {
        let slot = cell
            .lines
            .iter()
            .position(|l| matches!(l, CellLine::QrPending { .. }))?;
        let url = match &cell.lines[slot] {
            CellLine::QrPending { url } => url.clone(),
            _ => return None,
        };

        match self.fetch(record, &url).await {
            Ok(image) => {
                cell.lines[slot] = CellLine::QrImage { image, width_in };
                None
            }
            Err(e) => {
                warn!("{e}");
                cell.lines[slot] = CellLine::Text(TextLine::new(QR_ERROR_TEXT));
                Some(e)
            }
        }
    }

    fn request_error(&self, record: usize, url: &str, e: reqwest::Error) -> RecordError {
        if e.is_timeout() {
            RecordError::QrTimeout {
                record,
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            RecordError::QrDownloadFailed {
                record,
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn encode_valid_image() {
        let qr = encode_qr(&png_bytes(20, 10)).expect("decodable");
        assert_eq!((qr.width_px, qr.height_px), (20, 10));
        assert!(qr.png.starts_with(b"\x89PNG"));
        assert!((qr.aspect() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn encode_rejects_non_image() {
        assert!(encode_qr(b"<html>not found</html>").is_err());
    }

    #[tokio::test]
    async fn refused_connection_degrades_to_notice() {
        let fetcher = QrFetcher::new(2).unwrap();
        let mut cell = BadgeCell {
            lines: vec![CellLine::QrPending {
                // Port 9 (discard) is closed on every sane test machine.
                url: "http://127.0.0.1:9/qr.png".into(),
            }],
        };

        let err = fetcher.resolve_cell(&mut cell, 3, 1.5).await;
        assert!(matches!(
            err,
            Some(RecordError::QrDownloadFailed { record: 3, .. })
                | Some(RecordError::QrTimeout { record: 3, .. })
        ));
        assert_eq!(cell.texts(), vec![QR_ERROR_TEXT]);
    }

    #[tokio::test]
    async fn malformed_url_degrades_to_notice() {
        let fetcher = QrFetcher::new(2).unwrap();
        let mut cell = BadgeCell {
            lines: vec![CellLine::QrPending {
                url: "not a url".into(),
            }],
        };
        assert!(fetcher.resolve_cell(&mut cell, 1, 1.5).await.is_some());
        assert_eq!(cell.texts(), vec![QR_ERROR_TEXT]);
    }

    #[tokio::test]
    async fn cell_without_qr_is_untouched() {
        let fetcher = QrFetcher::new(2).unwrap();
        let mut cell = BadgeCell {
            lines: vec![CellLine::Text(TextLine::new("Ada Byron - 1"))],
        };
        let before = cell.clone();
        assert!(fetcher.resolve_cell(&mut cell, 1, 1.5).await.is_none());
        assert_eq!(cell, before);
    }
}
