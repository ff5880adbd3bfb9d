use super::backend::{CaptureBackend, CaptureError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{info, warn};

/// Container tag applied to recorded captures.
///
/// The inference endpoint expects recorded audio tagged as an MP4-family
/// container regardless of the actual encoding. Wire-compat contract, do
/// not change.
pub const CAPTURE_MIME: &str = "audio/mp4";
pub const CAPTURE_FILE_NAME: &str = "temp.mp4";

/// How long a recording runs before it stops itself
pub const DEFAULT_CAPTURE_DEADLINE: Duration = Duration::from_secs(5);

/// One finalized audio payload, ready for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    /// Contiguous encoded audio bytes
    pub bytes: Vec<u8>,
    /// Container/mime tag
    pub mime: String,
    /// File name presented to the inference endpoint
    pub file_name: String,
}

impl AudioAsset {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            file_name: file_name.into(),
        }
    }

    /// An asset produced by microphone capture, carrying the fixed
    /// container tag the endpoint expects.
    pub fn recorded(bytes: Vec<u8>) -> Self {
        Self::new(bytes, CAPTURE_MIME, CAPTURE_FILE_NAME)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Lifecycle of one capture attempt, published to observers.
///
/// The sequence is finite and non-restartable:
/// `Recording` -> `Finalizing` -> `Complete(asset)`.
#[derive(Debug, Clone)]
pub enum CapturePhase {
    /// Device acquired, chunks accumulating
    Recording,
    /// Deadline or stop fired; draining buffers and releasing the device
    Finalizing,
    /// Buffered chunks assembled into one asset, device released
    Complete(AudioAsset),
}

/// Serializes capture attempts: at most one device session at a time.
///
/// `begin` acquires the device through the supplied backend and spawns a
/// collector that buffers chunks until the fixed deadline elapses or the
/// caller stops it. The device is released on every exit path.
pub struct AudioCaptureSession {
    deadline: Duration,
    active: Arc<AtomicBool>,
}

impl AudioCaptureSession {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start one capture attempt.
    ///
    /// Fails with `SessionBusy` if a previous attempt has not finalized
    /// yet; permission and device failures propagate from the backend.
    pub async fn begin(
        &self,
        mut backend: Box<dyn CaptureBackend>,
    ) -> Result<CaptureHandle, CaptureError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::SessionBusy);
        }

        let mut chunk_rx = match backend.start().await {
            Ok(rx) => rx,
            Err(e) => {
                self.active.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        info!(
            "capture started on '{}' backend (deadline {:?})",
            backend.name(),
            self.deadline
        );

        let (phase_tx, phase_rx) = watch::channel(CapturePhase::Recording);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let active = Arc::clone(&self.active);
        let deadline = self.deadline;

        tokio::spawn(async move {
            let mut buffer: Vec<u8> = Vec::new();
            let timeout = tokio::time::sleep(deadline);
            tokio::pin!(timeout);

            loop {
                tokio::select! {
                    _ = &mut timeout => {
                        info!("capture deadline elapsed");
                        break;
                    }
                    _ = &mut stop_rx => {
                        info!("capture stopped by caller");
                        break;
                    }
                    chunk = chunk_rx.recv() => match chunk {
                        Some(chunk) => buffer.extend_from_slice(&chunk.data),
                        None => {
                            info!("capture chunk stream ended");
                            break;
                        }
                    },
                }
            }

            let _ = phase_tx.send(CapturePhase::Finalizing);

            // Device release is guaranteed on every exit path above.
            if let Err(e) = backend.stop().await {
                warn!("failed to release capture device: {}", e);
            }

            // Pick up chunks that were already queued when we stopped.
            while let Ok(chunk) = chunk_rx.try_recv() {
                buffer.extend_from_slice(&chunk.data);
            }

            active.store(false, Ordering::SeqCst);

            let asset = AudioAsset::recorded(buffer);
            info!("capture finalized: {} bytes", asset.bytes.len());
            let _ = phase_tx.send(CapturePhase::Complete(asset));
        });

        Ok(CaptureHandle {
            stop_tx: Some(stop_tx),
            phase_rx,
        })
    }
}

/// Handle to one in-flight capture attempt
pub struct CaptureHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    phase_rx: watch::Receiver<CapturePhase>,
}

impl CaptureHandle {
    /// Observer channel for phase transitions
    pub fn phases(&self) -> watch::Receiver<CapturePhase> {
        self.phase_rx.clone()
    }

    /// Stop the capture and wait for the finalized asset.
    ///
    /// Idempotent: if the deadline already fired (or `stop` was already
    /// called), this is a no-op returning the same finalized asset.
    pub async fn stop(&mut self) -> Result<AudioAsset, CaptureError> {
        if let Some(tx) = self.stop_tx.take() {
            // The collector may have exited already; that is fine.
            let _ = tx.send(());
        }
        self.finished().await
    }

    /// Wait for finalization without signalling a stop
    pub async fn finished(&mut self) -> Result<AudioAsset, CaptureError> {
        let phase = self
            .phase_rx
            .wait_for(|p| matches!(p, CapturePhase::Complete(_)))
            .await
            .map_err(|_| CaptureError::Device("capture ended before finalizing".into()))?;

        if let CapturePhase::Complete(asset) = &*phase {
            Ok(asset.clone())
        } else {
            Err(CaptureError::Device("capture ended before finalizing".into()))
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        // Losing the handle must not leak the device: ask the collector to
        // wind down now instead of at the deadline.
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}
