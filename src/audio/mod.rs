pub mod backend;
pub mod capture;

pub use backend::{
    AudioChunk, CaptureBackend, CaptureBackendFactory, CaptureError, FixtureBackend,
    FixtureBackendFactory,
};
pub use capture::{
    AudioAsset, AudioCaptureSession, CaptureHandle, CapturePhase, CAPTURE_FILE_NAME, CAPTURE_MIME,
    DEFAULT_CAPTURE_DEADLINE,
};
