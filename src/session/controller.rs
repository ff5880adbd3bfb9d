use super::state::{
    split_summary, AnalysisOutcome, CaptureStatus, Page, RequestStatus, SessionState, SessionStats,
};
use super::theme::{AmbientThemeTimer, DEFAULT_PALETTE, DEFAULT_THEME_INTERVAL};
use crate::analysis::EmotionAnalyzer;
use crate::audio::{
    AudioAsset, AudioCaptureSession, CaptureBackendFactory, CapturePhase, DEFAULT_CAPTURE_DEADLINE,
};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// User omitted a required input. Surfaced synchronously to the caller
/// before any async work starts; never alters request state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a file first!")]
    NoFileSelected,
}

/// Tunables for one session
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long a recording runs before stopping itself
    pub capture_deadline: Duration,
    /// Home background rotation period
    pub theme_interval: Duration,
    /// Home background palette
    pub palette: Vec<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            capture_deadline: DEFAULT_CAPTURE_DEADLINE,
            theme_interval: DEFAULT_THEME_INTERVAL,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// The session state machine.
///
/// Receives user intents (navigation, file selection, upload, record),
/// delegates the audio lifecycle to [`AudioCaptureSession`], submits
/// finished assets through the analyzer, and folds every outcome back into
/// [`SessionState`]. All intents serialize through the state mutex; clones
/// share the same session.
///
/// Lifecycle: created on view mount, torn down via [`shutdown`] (or drop)
/// on unmount. There is no terminal state in between — the machine is
/// cyclical and every failure leaves the user able to retry.
///
/// [`shutdown`]: SessionController::shutdown
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

struct Shared {
    state: Arc<Mutex<SessionState>>,
    analyzer: Arc<dyn EmotionAnalyzer>,
    devices: Arc<dyn CaptureBackendFactory>,
    capture: AudioCaptureSession,
    theme: StdMutex<AmbientThemeTimer>,
    capture_task: StdMutex<Option<JoinHandle<()>>>,
    analysis_task: StdMutex<Option<JoinHandle<()>>>,
    requests_dispatched: AtomicU64,
    session_id: String,
    started_at: DateTime<Utc>,
}

impl Shared {
    /// Single choke point for page transitions.
    ///
    /// Clearing rules: `theme_tick` resets when leaving Home,
    /// `selected_file` clears when leaving Upload, and the theme timer is
    /// re-armed (from index 0) only when entering Home. Background tasks
    /// never route through here — pages change on user intents only.
    fn set_page(&self, state: &mut SessionState, to: Page) {
        let from = state.page;
        if from == to {
            return;
        }

        let mut theme = self.theme.lock().unwrap_or_else(PoisonError::into_inner);

        if from == Page::Home {
            theme.cancel();
            state.theme_tick = 0;
        }
        if from == Page::Upload {
            state.selected_file = None;
        }

        state.page = to;

        if to == Page::Home {
            theme.arm(Arc::clone(&self.state));
        }

        info!("page: {:?} -> {:?}", from, to);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        // The theme timer aborts itself on drop; capture and analysis
        // tasks hold a state Arc and must not outlive the session.
        for slot in [&self.capture_task, &self.analysis_task] {
            let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
    }
}

impl SessionController {
    /// Mount a new session. The page starts on Home with the ambient theme
    /// rotation armed.
    pub fn new(
        config: ControllerConfig,
        analyzer: Arc<dyn EmotionAnalyzer>,
        devices: Arc<dyn CaptureBackendFactory>,
    ) -> Self {
        let state = Arc::new(Mutex::new(SessionState::new()));

        let mut theme = AmbientThemeTimer::new(config.theme_interval, config.palette);
        theme.arm(Arc::clone(&state));

        let session_id = format!("session-{}", uuid::Uuid::new_v4());
        info!("session mounted: {}", session_id);

        Self {
            shared: Arc::new(Shared {
                state,
                analyzer,
                devices,
                capture: AudioCaptureSession::new(config.capture_deadline),
                theme: StdMutex::new(theme),
                capture_task: StdMutex::new(None),
                analysis_task: StdMutex::new(None),
                requests_dispatched: AtomicU64::new(0),
                session_id,
                started_at: Utc::now(),
            }),
        }
    }

    /// Cloned snapshot of the current session state
    pub async fn snapshot(&self) -> SessionState {
        self.shared.state.lock().await.clone()
    }

    /// Point-in-time session statistics
    pub async fn stats(&self) -> SessionStats {
        let state = self.shared.state.lock().await;
        let uptime = Utc::now().signed_duration_since(self.shared.started_at);

        SessionStats {
            session_id: self.shared.session_id.clone(),
            page: state.page,
            is_recording: state.capture_status != CaptureStatus::Idle,
            request_in_flight: state.request_status == RequestStatus::InFlight,
            started_at: self.shared.started_at,
            uptime_secs: uptime.num_milliseconds() as f64 / 1000.0,
            requests_dispatched: self.shared.requests_dispatched.load(Ordering::SeqCst),
        }
    }

    /// Current ambient background color for the view layer
    pub async fn current_color(&self) -> String {
        let tick = self.shared.state.lock().await.theme_tick;
        let theme = self
            .shared
            .theme
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        theme.color_for(tick).to_string()
    }

    /// Navigate to the upload view
    pub async fn open_upload(&self) {
        let mut state = self.shared.state.lock().await;
        self.shared.set_page(&mut state, Page::Upload);
    }

    /// Navigate home.
    ///
    /// Deliberately does NOT cancel an active capture or in-flight request;
    /// a stale response is discarded by identity when it resolves, not
    /// aborted at the transport level.
    pub async fn go_home(&self) {
        let mut state = self.shared.state.lock().await;
        self.shared.set_page(&mut state, Page::Home);
    }

    /// Record the user's file pick (Upload flow)
    pub async fn select_file(&self, asset: AudioAsset) {
        let mut state = self.shared.state.lock().await;
        if state.page != Page::Upload {
            warn!("file selected outside the upload page; ignoring");
            return;
        }
        info!(
            "file selected: {} ({} bytes)",
            asset.file_name,
            asset.bytes.len()
        );
        state.selected_file = Some(asset);
    }

    /// Submit the selected file for analysis.
    ///
    /// Requires a selected file (else `ValidationError`, synchronous and
    /// non-fatal) and no request already in flight (else a logged no-op —
    /// the upload control is disabled while loading anyway).
    pub async fn trigger_upload(&self) -> Result<(), ValidationError> {
        let mut state = self.shared.state.lock().await;

        let Some(asset) = state.selected_file.clone() else {
            return Err(ValidationError::NoFileSelected);
        };

        if state.request_status == RequestStatus::InFlight {
            warn!("analysis request already in flight; upload intent ignored");
            return Ok(());
        }

        self.dispatch_analysis(&mut state, asset);
        Ok(())
    }

    /// Start a bounded microphone recording.
    ///
    /// A no-op while a capture is active (SessionBusy — state unchanged).
    /// Permission/device failures abort the flow back to Home without ever
    /// entering the Recording status; they are logged, not retried. On
    /// success the capture runs to its deadline and the finalized asset is
    /// auto-submitted for analysis — unlike upload, no further user intent
    /// is needed.
    pub async fn start_recording(&self) {
        let mut state = self.shared.state.lock().await;

        if state.capture_status != CaptureStatus::Idle {
            warn!("capture already active; record intent ignored");
            return;
        }

        let begun = match self.shared.devices.create() {
            Ok(backend) => self.shared.capture.begin(backend).await,
            Err(e) => Err(e),
        };

        let mut handle = match begun {
            Ok(handle) => handle,
            Err(e) => {
                error!("could not start recording: {}", e);
                self.shared.set_page(&mut state, Page::Home);
                return;
            }
        };

        self.shared.set_page(&mut state, Page::Record);
        state.capture_status = CaptureStatus::Recording;
        drop(state);

        // Supervisor mirrors the capture phases into session state and
        // chains the finalized asset straight into an analysis dispatch.
        let controller = self.clone();
        let supervisor = tokio::spawn(async move {
            let mut phases = handle.phases();
            if phases
                .wait_for(|p| !matches!(p, CapturePhase::Recording))
                .await
                .is_ok()
            {
                let mut state = controller.shared.state.lock().await;
                state.capture_status = CaptureStatus::Finalizing;
            }

            match handle.finished().await {
                Ok(asset) => {
                    let mut state = controller.shared.state.lock().await;
                    state.capture_status = CaptureStatus::Idle;
                    controller.dispatch_analysis(&mut state, asset);
                }
                Err(e) => {
                    error!("capture failed: {}", e);
                    let mut state = controller.shared.state.lock().await;
                    state.capture_status = CaptureStatus::Idle;
                }
            }
        });

        let mut slot = self
            .shared
            .capture_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(supervisor);
    }

    /// Tear the session down: cancel the theme rotation and abort
    /// background tasks. No state mutation may happen afterwards.
    pub async fn shutdown(&self) {
        info!("session torn down: {}", self.shared.session_id);

        self.shared
            .theme
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();

        for slot in [&self.shared.capture_task, &self.shared.analysis_task] {
            let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
    }

    /// Dispatch one analysis request, tagged with a fresh identity.
    ///
    /// The previous result is cleared here (on dispatch), never on
    /// failure. When the spawned request resolves it re-checks its
    /// identity against the latest dispatch and discards itself if
    /// superseded — a slow stale response must never clobber a newer one.
    fn dispatch_analysis(&self, state: &mut SessionState, asset: AudioAsset) {
        state.request_seq += 1;
        let request_id = state.request_seq;
        state.request_status = RequestStatus::InFlight;
        state.result = None;
        self.shared.requests_dispatched.fetch_add(1, Ordering::SeqCst);

        info!(
            "analysis request {} dispatched ({} bytes)",
            request_id,
            asset.bytes.len()
        );

        let controller = self.clone();
        let task = tokio::spawn(async move {
            let outcome = controller.shared.analyzer.submit(&asset).await;

            let mut state = controller.shared.state.lock().await;
            if state.request_seq != request_id {
                warn!("discarding stale response for request {}", request_id);
                return;
            }

            match outcome {
                Ok(result) => {
                    state.request_status = RequestStatus::Succeeded;
                    state.result = Some(AnalysisOutcome {
                        prediction: result.prediction_text,
                        transcript: result.transcript_text,
                        summary_sections: split_summary(&result.summary_raw),
                    });
                    info!("analysis request {} succeeded", request_id);
                }
                Err(e) => {
                    error!("analysis request {} failed: {}", request_id, e);
                    state.request_status = RequestStatus::Failed;
                    state.result = Some(AnalysisOutcome::error_sentinels());
                }
            }
        });

        let mut slot = self
            .shared
            .analysis_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // A superseded request keeps running (no transport-level cancel);
        // only its handle is replaced.
        *slot = Some(task);
    }
}
