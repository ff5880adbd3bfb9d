//! Session state machine
//!
//! This module provides the `SessionController` abstraction that manages:
//! - Page navigation (Home / Upload / Record)
//! - Microphone capture lifecycle and its fixed deadline
//! - Analysis dispatch with a stale-response identity guard
//! - The ambient home-page theme rotation
//! - Session statistics and state snapshots

mod controller;
mod state;
mod theme;

pub use controller::{ControllerConfig, SessionController, ValidationError};
pub use state::{
    split_summary, AnalysisOutcome, CaptureStatus, Page, RequestStatus, SessionState, SessionStats,
    ERROR_SENTINEL, WAITING_PLACEHOLDER,
};
pub use theme::{AmbientThemeTimer, DEFAULT_PALETTE, DEFAULT_THEME_INTERVAL};
