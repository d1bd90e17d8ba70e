//! Progress UI (spinner) for check runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawns the progress spinner when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_spinner` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_spinner: bool,
    checked: Arc<AtomicUsize>,
    provider: String,
) -> (Option<JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_spinner {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_spinner_inner(checked, provider, Arc::clone(&stop));
    (Some(handle), stop)
}

/// Signals the spinner to stop and waits for it.
/// Returns false when the spinner task ended abnormally (panic or cancellation).
pub(crate) async fn stop_progress_ui(spinner: Option<JoinHandle<()>>, stop: &AtomicBool) -> bool {
    stop.store(true, Ordering::SeqCst);
    let Some(handle) = spinner else {
        return true;
    };
    match handle.await {
        Ok(()) => true,
        Err(error) => {
            debug!(%error, "Progress spinner task failed");
            false
        }
    }
}

fn spawn_spinner_inner(
    checked: Arc<AtomicUsize>,
    provider: String,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        while !stop.load(Ordering::SeqCst) {
            spinner.set_message(progress_message(&provider, checked.load(Ordering::SeqCst)));
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        spinner.finish_and_clear();
    })
}

fn progress_message(provider: &str, checked: usize) -> String {
    let noun = if checked == 1 { "row" } else { "rows" };
    format!("[{provider}] {checked} {noun} checked...")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_message_pluralizes() {
        assert_eq!(progress_message("doi", 1), "[doi] 1 row checked...");
        assert_eq!(progress_message("doi", 12), "[doi] 12 rows checked...");
    }

    #[tokio::test]
    async fn test_spawn_progress_ui_disabled_returns_stopped() {
        let (handle, stop) = spawn_progress_ui(false, Arc::new(AtomicUsize::new(0)), "doi".into());
        assert!(handle.is_none());
        assert!(stop.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_spawn_progress_ui_stops_on_signal() {
        let (handle, stop) = spawn_progress_ui(true, Arc::new(AtomicUsize::new(3)), "doi".into());
        assert!(stop_progress_ui(handle, &stop).await);
        assert!(stop.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_stop_progress_ui_reports_failed_task() {
        let handle: JoinHandle<()> = tokio::spawn(async { panic!("spinner draw failed") });
        let stop = AtomicBool::new(false);
        assert!(!stop_progress_ui(Some(handle), &stop).await);
    }

    #[tokio::test]
    async fn test_stop_progress_ui_without_spinner() {
        assert!(stop_progress_ui(None, &AtomicBool::new(true)).await);
    }
}
