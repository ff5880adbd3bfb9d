pub mod analysis;
pub mod audio;
pub mod config;
pub mod session;

pub use analysis::{
    AnalysisClient, AnalysisError, AnalysisResult, EmotionAnalyzer, PredictResponse,
};
pub use audio::{
    AudioAsset, AudioCaptureSession, AudioChunk, CaptureBackend, CaptureBackendFactory,
    CaptureError, CaptureHandle, CapturePhase, FixtureBackend, FixtureBackendFactory,
};
pub use config::Config;
pub use session::{
    split_summary, AmbientThemeTimer, AnalysisOutcome, CaptureStatus, ControllerConfig, Page,
    RequestStatus, SessionController, SessionState, SessionStats, ValidationError,
};
