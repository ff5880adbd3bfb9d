use super::state::{Page, SessionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Background colors cycled while the home page is visible
pub const DEFAULT_PALETTE: [&str; 4] = ["#e0f7fa", "#ffebee", "#c8e6c9", "#fff3e0"];

/// How often the home background rotates
pub const DEFAULT_THEME_INTERVAL: Duration = Duration::from_secs(5);

/// Periodic, best-effort visual tick tied to the home page lifetime.
///
/// Cosmetic by itself, but it carries the cancellation discipline every
/// page-scoped timer must follow: the task is aborted on every Home exit
/// and on teardown, and an in-flight tick that raced a page change refuses
/// to mutate state.
pub struct AmbientThemeTimer {
    interval: Duration,
    palette: Vec<String>,
    task: Option<JoinHandle<()>>,
}

impl AmbientThemeTimer {
    pub fn new(interval: Duration, palette: Vec<String>) -> Self {
        Self {
            interval,
            palette,
            task: None,
        }
    }

    /// Palette color for a given tick
    pub fn color_for(&self, tick: usize) -> &str {
        if self.palette.is_empty() {
            return DEFAULT_PALETTE[0];
        }
        &self.palette[tick % self.palette.len()]
    }

    /// Arm the timer against the session state.
    ///
    /// Any previously armed task is cancelled first, so re-entering Home
    /// always restarts the rotation from the current (reset) tick.
    pub fn arm(&mut self, state: Arc<Mutex<SessionState>>) {
        self.cancel();

        let interval = self.interval;
        let palette_len = self.palette.len().max(1);

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first interval tick completes immediately; swallow it so
            // the rotation advances one full period after arming.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let mut state = state.lock().await;
                if state.page != Page::Home {
                    // A tick that raced the page change must not mutate
                    // state; the rotation is over for this Home visit.
                    break;
                }
                state.theme_tick = (state.theme_tick + 1) % palette_len;
                debug!("theme tick -> {}", state.theme_tick);
            }
        }));
    }

    /// Cancel the rotation; no further ticks will mutate state
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for AmbientThemeTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
