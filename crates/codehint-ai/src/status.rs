//! Observable model status.
//!
//! The status record is published through a [`tokio::sync::watch`] channel:
//! every mutation replaces the value atomically and wakes subscribers, and
//! [`StatusBoard::snapshot`] always returns the latest value.

use serde::Serialize;
use tokio::sync::watch;

/// Status of the model as seen by a UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub loading: bool,
    pub ready: bool,
    /// Load progress in percent, 0..=100.
    pub progress: u8,
    /// Message of the last failed load.
    pub error: Option<String>,
}

/// Lifecycle state derived from a [`ModelStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Idle,
    Loading,
    Ready,
    Error,
}

impl ModelStatus {
    pub fn state(&self) -> ModelState {
        if self.loading {
            ModelState::Loading
        } else if self.ready {
            ModelState::Ready
        } else if self.error.is_some() {
            ModelState::Error
        } else {
            ModelState::Idle
        }
    }
}

/// Fractional progress as reported by a backend while loading.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    /// 0.0..=1.0
    pub progress: f64,
    pub text: String,
}

impl LoadReport {
    pub fn new(progress: f64, text: impl Into<String>) -> Self {
        Self {
            progress,
            text: text.into(),
        }
    }
}

/// Progress event in the units the status record uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProgress {
    pub percentage: u8,
    pub label: String,
}

impl From<&LoadReport> for LoadProgress {
    fn from(report: &LoadReport) -> Self {
        // NaN casts to 0.
        let percentage = (report.progress.clamp(0.0, 1.0) * 100.0).round() as u8;
        Self {
            percentage,
            label: report.text.clone(),
        }
    }
}

/// Owner of the status record. All transitions go through here.
#[derive(Debug)]
pub struct StatusBoard {
    tx: watch::Sender<ModelStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ModelStatus::default());
        Self { tx }
    }

    /// Latest status.
    pub fn snapshot(&self) -> ModelStatus {
        self.tx.borrow().clone()
    }

    /// Receiver woken on every status change.
    pub fn subscribe(&self) -> watch::Receiver<ModelStatus> {
        self.tx.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.tx.borrow().loading
    }

    pub fn is_ready(&self) -> bool {
        self.tx.borrow().ready
    }

    /// Claim the loading slot, resetting progress and error.
    ///
    /// Returns `false` without touching the status if a load already holds it.
    pub fn begin_load(&self) -> bool {
        self.tx.send_if_modified(|status| {
            if status.loading {
                return false;
            }
            status.loading = true;
            status.ready = false;
            status.progress = 0;
            status.error = None;
            true
        })
    }

    /// Raise progress during a load. Lower values are ignored.
    pub fn record_progress(&self, percentage: u8) {
        let percentage = percentage.min(100);
        self.tx.send_if_modified(|status| {
            if status.loading && percentage > status.progress {
                status.progress = percentage;
                true
            } else {
                false
            }
        });
    }

    pub fn mark_ready(&self) {
        self.tx.send_modify(|status| {
            status.loading = false;
            status.ready = true;
            status.progress = 100;
            status.error = None;
        });
    }

    pub fn mark_failed(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|status| {
            status.loading = false;
            status.ready = false;
            status.error = Some(message);
        });
    }

    /// Drop `ready` after the engine has been torn down.
    pub fn mark_unloaded(&self) {
        self.tx.send_if_modified(|status| {
            let was_ready = status.ready;
            status.ready = false;
            was_ready
        });
    }

    /// Back to the initial state, unless a load holds the slot.
    ///
    /// Returns whether the status was reset.
    pub fn reset(&self) -> bool {
        let mut reset = false;
        self.tx.send_if_modified(|status| {
            if status.loading || status.ready {
                return false;
            }
            reset = true;
            if *status == ModelStatus::default() {
                return false;
            }
            *status = ModelStatus::default();
            true
        });
        reset
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        let board = StatusBoard::new();
        assert_eq!(board.snapshot(), ModelStatus::default());
        assert_eq!(board.snapshot().state(), ModelState::Idle);
    }

    #[test]
    fn test_begin_load_is_exclusive() {
        let board = StatusBoard::new();
        assert!(board.begin_load());
        board.record_progress(40);
        let before = board.snapshot();

        assert!(!board.begin_load());
        assert_eq!(board.snapshot(), before);
    }

    #[test]
    fn test_begin_load_resets_previous_failure() {
        let board = StatusBoard::new();
        assert!(board.begin_load());
        board.record_progress(70);
        board.mark_failed("boom");
        assert_eq!(board.snapshot().state(), ModelState::Error);

        assert!(board.begin_load());
        let status = board.snapshot();
        assert_eq!(status.progress, 0);
        assert_eq!(status.error, None);
        assert_eq!(status.state(), ModelState::Loading);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let board = StatusBoard::new();
        board.begin_load();
        board.record_progress(30);
        board.record_progress(10);
        assert_eq!(board.snapshot().progress, 30);
        board.record_progress(250);
        assert_eq!(board.snapshot().progress, 100);
    }

    #[test]
    fn test_progress_ignored_outside_load() {
        let board = StatusBoard::new();
        board.record_progress(50);
        assert_eq!(board.snapshot().progress, 0);
    }

    #[test]
    fn test_ready_and_unload() {
        let board = StatusBoard::new();
        board.begin_load();
        board.mark_ready();
        assert_eq!(
            board.snapshot(),
            ModelStatus {
                loading: false,
                ready: true,
                progress: 100,
                error: None,
            }
        );

        board.mark_unloaded();
        assert!(!board.is_ready());
        assert!(!board.is_loading());
    }

    #[test]
    fn test_reset_leaves_claimed_slot_alone() {
        let board = StatusBoard::new();
        board.begin_load();
        board.mark_failed("boom");
        assert!(board.reset());
        assert_eq!(board.snapshot(), ModelStatus::default());

        board.begin_load();
        board.record_progress(20);
        let loading = board.snapshot();
        assert!(!board.reset());
        assert_eq!(board.snapshot(), loading);
    }

    #[tokio::test]
    async fn test_subscribers_see_each_change() {
        let board = StatusBoard::new();
        let mut rx = board.subscribe();

        board.begin_load();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().loading);

        board.mark_failed("no weights");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().error.as_deref(), Some("no weights"));
    }

    #[test]
    fn test_report_to_percentage() {
        let pct = |p| LoadProgress::from(&LoadReport::new(p, "x")).percentage;
        assert_eq!(pct(0.0), 0);
        assert_eq!(pct(0.336), 34);
        assert_eq!(pct(1.0), 100);
        assert_eq!(pct(1.7), 100);
        assert_eq!(pct(-0.2), 0);
        assert_eq!(pct(f64::NAN), 0);
    }
}
