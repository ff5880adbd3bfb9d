use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A single buffer of encoded audio delivered by a capture device.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Encoded audio bytes, in arrival order
    pub data: Vec<u8>,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Errors surfaced by the capture layer
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no capture device available")]
    DeviceUnavailable,

    #[error("a capture session is already active")]
    SessionBusy,

    #[error("capture device error: {0}")]
    Device(String),
}

/// Capture device trait
///
/// The physical microphone and its encoder live behind this seam.
/// Implementations:
/// - Fixture: replay a prepared byte buffer as timed chunks (testing/demo)
/// - Real device backends (cpal, browser bridge, ...) are external
///   collaborators plugged in behind the same contract
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that delivers chunks until the backend is
    /// stopped or runs out of data. The stream is finite: it terminates
    /// exactly once, by the channel closing.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, CaptureError>;

    /// Stop capturing and release the device
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Mints one backend per recording attempt
pub trait CaptureBackendFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn CaptureBackend>, CaptureError>;
}

/// Replays a prepared byte buffer as timed chunks.
///
/// Stands in for a real microphone where none is wired up; also the
/// workhorse of the capture tests.
pub struct FixtureBackend {
    bytes: Vec<u8>,
    chunk_size: usize,
    chunk_interval: Duration,
    capturing: bool,
    feeder: Option<JoinHandle<()>>,
}

impl FixtureBackend {
    pub fn new(bytes: Vec<u8>, chunk_size: usize, chunk_interval: Duration) -> Self {
        Self {
            bytes,
            chunk_size: chunk_size.max(1),
            chunk_interval,
            capturing: false,
            feeder: None,
        }
    }
}

#[async_trait]
impl CaptureBackend for FixtureBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        if self.capturing {
            return Err(CaptureError::SessionBusy);
        }
        self.capturing = true;

        let (tx, rx) = mpsc::channel(32);
        let bytes = self.bytes.clone();
        let chunk_size = self.chunk_size;
        let interval = self.chunk_interval;

        // Dropping the sender when the buffer is exhausted closes the
        // stream, which is how a finite capture terminates.
        self.feeder = Some(tokio::spawn(async move {
            let mut offset = 0;
            let mut elapsed_ms = 0u64;
            while offset < bytes.len() {
                tokio::time::sleep(interval).await;
                elapsed_ms += interval.as_millis() as u64;
                let end = (offset + chunk_size).min(bytes.len());
                let chunk = AudioChunk {
                    data: bytes[offset..end].to_vec(),
                    timestamp_ms: elapsed_ms,
                };
                if tx.send(chunk).await.is_err() {
                    break;
                }
                offset = end;
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

/// Factory producing a fresh [`FixtureBackend`] per recording attempt
pub struct FixtureBackendFactory {
    bytes: Vec<u8>,
    chunk_size: usize,
    chunk_interval: Duration,
}

impl FixtureBackendFactory {
    pub fn new(bytes: Vec<u8>, chunk_size: usize, chunk_interval: Duration) -> Self {
        Self {
            bytes,
            chunk_size: chunk_size.max(1),
            chunk_interval,
        }
    }

    /// Factory whose captures deliver no audio data at all
    pub fn silent() -> Self {
        Self::new(Vec::new(), 1, Duration::from_millis(100))
    }
}

impl CaptureBackendFactory for FixtureBackendFactory {
    fn create(&self) -> Result<Box<dyn CaptureBackend>, CaptureError> {
        Ok(Box::new(FixtureBackend::new(
            self.bytes.clone(),
            self.chunk_size,
            self.chunk_interval,
        )))
    }
}
