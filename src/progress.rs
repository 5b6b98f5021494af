//! Progress-callback trait for per-badge generation events.
//!
//! Inject an [`Arc<dyn BadgeProgressCallback>`] via
//! [`crate::config::BadgeConfigBuilder::progress_callback`] to receive events
//! as each badge is composed and its QR code fetched.
//!
//! # Why callbacks instead of channels?
//!
//! The library does not care whether progress ends up on a terminal bar, in a
//! log file or in a GUI; a callback is the smallest integration point for all
//! of them. The trait is `Send + Sync` so an implementation can be shared with
//! whatever task drives the run.
//!
//! # Example
//!
//! ```rust
//! use badgesheet::{BadgeConfig, BadgeProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Failures(AtomicUsize);
//!
//! impl BadgeProgressCallback for Failures {
//!     fn on_badge_error(&self, index: usize, total: usize, error: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("badge {index}/{total}: {error}");
//!     }
//! }
//!
//! let config = BadgeConfig::builder()
//!     .progress_callback(Arc::new(Failures(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::badge::BadgeKind;
use std::sync::Arc;

/// Called by the generator as it works through the selected records.
///
/// All methods default to no-ops so implementations only override what they
/// need. Indices are 1-based and refer to the sorted, filtered order.
pub trait BadgeProgressCallback: Send + Sync {
    /// Called once per badge run, after filtering, before the first badge.
    fn on_run_start(&self, kind: BadgeKind, total: usize) {
        let _ = (kind, total);
    }

    /// Called before a badge is composed (and its QR code fetched).
    fn on_badge_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a badge was laid out with all its content.
    fn on_badge_complete(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a badge was laid out with a degraded QR cell.
    fn on_badge_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once the document for this run has been built.
    ///
    /// # Arguments
    /// * `failures` — badges whose QR code could not be fetched
    fn on_run_complete(&self, kind: BadgeKind, total: usize, failures: usize) {
        let _ = (kind, total, failures);
    }
}

/// A callback that ignores every event. Used when none is configured.
pub struct NoopProgressCallback;

impl BadgeProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BadgeConfig`].
pub type ProgressCallback = Arc<dyn BadgeProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl BadgeProgressCallback for Recorder {
        fn on_run_start(&self, kind: BadgeKind, total: usize) {
            self.events.lock().unwrap().push(format!("start {kind} {total}"));
        }

        fn on_badge_complete(&self, index: usize, total: usize) {
            self.events.lock().unwrap().push(format!("ok {index}/{total}"));
        }

        fn on_badge_error(&self, index: usize, _total: usize, error: &str) {
            self.events.lock().unwrap().push(format!("err {index}: {error}"));
        }

        fn on_run_complete(&self, _kind: BadgeKind, total: usize, failures: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {total} ({failures} failed)"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(BadgeKind::Qr, 2);
        cb.on_badge_start(1, 2);
        cb.on_badge_complete(1, 2);
        cb.on_badge_error(2, 2, "timeout");
        cb.on_run_complete(BadgeKind::Qr, 2, 1);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_run_start(BadgeKind::Guest1, 2);
        rec.on_badge_start(1, 2);
        rec.on_badge_complete(1, 2);
        rec.on_badge_error(2, 2, "HTTP 404");
        rec.on_run_complete(BadgeKind::Guest1, 2, 1);

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                format!("start {} 2", BadgeKind::Guest1),
                "ok 1/2".to_string(),
                "err 2: HTTP 404".to_string(),
                "done 2 (1 failed)".to_string(),
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(BadgeKind::Student, 10);
        cb.on_badge_complete(1, 10);
    }
}
