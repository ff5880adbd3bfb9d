// Integration tests for the audio capture session
//
// These tests verify the capture lifecycle: deadline-bounded buffering,
// idempotent stop, the busy guard, and guaranteed device release.

use anyhow::Result;
use async_trait::async_trait;
use mindsync::audio::{
    AudioCaptureSession, AudioChunk, CaptureBackend, CaptureError, FixtureBackend,
    CAPTURE_FILE_NAME, CAPTURE_MIME,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Backend that keeps its chunk stream open until stopped and records
/// whether the device was released. The test feeds chunks through the
/// handed-out sender.
struct ProbeBackend {
    stopped: Arc<AtomicBool>,
    handout: Arc<Mutex<Option<mpsc::Sender<AudioChunk>>>>,
    hold: Option<mpsc::Sender<AudioChunk>>,
}

impl ProbeBackend {
    fn new() -> (Self, Arc<AtomicBool>, Arc<Mutex<Option<mpsc::Sender<AudioChunk>>>>) {
        let stopped = Arc::new(AtomicBool::new(false));
        let handout = Arc::new(Mutex::new(None));
        (
            Self {
                stopped: Arc::clone(&stopped),
                handout: Arc::clone(&handout),
                hold: None,
            },
            stopped,
            handout,
        )
    }
}

#[async_trait]
impl CaptureBackend for ProbeBackend {
    async fn start(&mut self) -> std::result::Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        let (tx, rx) = mpsc::channel(8);
        *self.handout.lock().unwrap() = Some(tx.clone());
        self.hold = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> std::result::Result<(), CaptureError> {
        self.stopped.store(true, Ordering::SeqCst);
        self.hold = None;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.hold.is_some()
    }

    fn name(&self) -> &str {
        "probe"
    }
}

/// Backend whose permission request always fails
struct DeniedBackend;

#[async_trait]
impl CaptureBackend for DeniedBackend {
    async fn start(&mut self) -> std::result::Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        Err(CaptureError::PermissionDenied)
    }

    async fn stop(&mut self) -> std::result::Result<(), CaptureError> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "denied"
    }
}

fn chunk(data: &[u8]) -> AudioChunk {
    AudioChunk {
        data: data.to_vec(),
        timestamp_ms: 0,
    }
}

#[tokio::test]
async fn zero_chunk_capture_finalizes_within_deadline() -> Result<()> {
    let session = AudioCaptureSession::new(Duration::from_millis(100));
    let (backend, _stopped, _tx) = ProbeBackend::new();

    let mut handle = session.begin(Box::new(backend)).await?;

    // No chunks ever arrive; the deadline alone must finalize the capture.
    let asset = timeout(Duration::from_secs(2), handle.finished()).await??;
    assert!(asset.is_empty());
    assert_eq!(asset.mime, CAPTURE_MIME);
    assert_eq!(asset.file_name, CAPTURE_FILE_NAME);

    Ok(())
}

#[tokio::test]
async fn chunks_are_buffered_in_arrival_order() -> Result<()> {
    let session = AudioCaptureSession::new(Duration::from_secs(5));
    let (backend, _stopped, handout) = ProbeBackend::new();

    let mut handle = session.begin(Box::new(backend)).await?;

    let tx = handout.lock().unwrap().clone().expect("sender handed out");
    tx.send(chunk(b"ab")).await?;
    tx.send(chunk(b"cd")).await?;
    tx.send(chunk(b"ef")).await?;

    // Give the collector a moment to drain before stopping.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let asset = handle.stop().await?;
    assert_eq!(asset.bytes, b"abcdef");

    Ok(())
}

#[tokio::test]
async fn stop_is_idempotent_after_deadline() -> Result<()> {
    let session = AudioCaptureSession::new(Duration::from_millis(50));
    let (backend, _stopped, handout) = ProbeBackend::new();

    let mut handle = session.begin(Box::new(backend)).await?;

    let tx = handout.lock().unwrap().clone().expect("sender handed out");
    tx.send(chunk(b"data")).await?;

    // Let the deadline fire on its own first.
    tokio::time::sleep(Duration::from_millis(150)).await;

    let first = handle.stop().await?;
    let second = handle.stop().await?;
    assert_eq!(first, second);
    assert_eq!(first.bytes, b"data");

    Ok(())
}

#[tokio::test]
async fn concurrent_begin_fails_with_session_busy() -> Result<()> {
    let session = AudioCaptureSession::new(Duration::from_secs(5));
    let (first, _stopped, _tx) = ProbeBackend::new();
    let (second, _stopped2, _tx2) = ProbeBackend::new();

    let mut handle = session.begin(Box::new(first)).await?;

    let busy = session.begin(Box::new(second)).await;
    assert!(matches!(busy, Err(CaptureError::SessionBusy)));

    // After the active capture finalizes, a new one may begin.
    handle.stop().await?;
    let (third, _stopped3, _tx3) = ProbeBackend::new();
    let _handle = session.begin(Box::new(third)).await?;

    Ok(())
}

#[tokio::test]
async fn device_is_released_on_deadline_path() -> Result<()> {
    let session = AudioCaptureSession::new(Duration::from_millis(50));
    let (backend, stopped, _tx) = ProbeBackend::new();

    let mut handle = session.begin(Box::new(backend)).await?;
    handle.finished().await?;

    assert!(stopped.load(Ordering::SeqCst), "backend must be stopped");

    Ok(())
}

#[tokio::test]
async fn device_is_released_on_manual_stop_path() -> Result<()> {
    let session = AudioCaptureSession::new(Duration::from_secs(60));
    let (backend, stopped, _tx) = ProbeBackend::new();

    let mut handle = session.begin(Box::new(backend)).await?;
    handle.stop().await?;

    assert!(stopped.load(Ordering::SeqCst), "backend must be stopped");

    Ok(())
}

#[tokio::test]
async fn permission_denial_propagates_and_frees_the_gate() -> Result<()> {
    let session = AudioCaptureSession::new(Duration::from_millis(100));

    let denied = session.begin(Box::new(DeniedBackend)).await;
    assert!(matches!(denied, Err(CaptureError::PermissionDenied)));

    // A failed begin must not leave the gate latched.
    let (backend, _stopped, _tx) = ProbeBackend::new();
    let _handle = session.begin(Box::new(backend)).await?;

    Ok(())
}

#[tokio::test]
async fn fixture_backend_replays_its_buffer() -> Result<()> {
    let session = AudioCaptureSession::new(Duration::from_secs(2));
    let backend = FixtureBackend::new(b"hello world".to_vec(), 4, Duration::from_millis(5));

    let mut handle = session.begin(Box::new(backend)).await?;

    // The fixture stream is finite; finalization happens when it ends.
    let asset = timeout(Duration::from_secs(2), handle.finished()).await??;
    assert_eq!(asset.bytes, b"hello world");

    Ok(())
}
