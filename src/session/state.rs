use crate::audio::AudioAsset;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Sentinel shown in every result field after a failed analysis
pub const ERROR_SENTINEL: &str = "Error occurred";

/// Shown when a summary has no usable sections yet
pub const WAITING_PLACEHOLDER: &str = "Waiting for response...";

/// Delimiter the summarizer uses between bullet sections
const SUMMARY_DELIMITER: &str = "* **";

/// Current navigation view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Upload,
    Record,
}

/// Mirrors the capture lifecycle; at most one capture exists at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    Idle,
    Recording,
    Finalizing,
}

/// Mirrors the (at most one) outstanding analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// Parsed analysis result as the view renders it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisOutcome {
    pub prediction: String,
    pub transcript: String,
    pub summary_sections: Vec<String>,
}

impl AnalysisOutcome {
    /// Every displayed field replaced with the failure sentinel
    pub fn error_sentinels() -> Self {
        Self {
            prediction: ERROR_SENTINEL.to_string(),
            transcript: ERROR_SENTINEL.to_string(),
            summary_sections: vec![ERROR_SENTINEL.to_string()],
        }
    }
}

/// Split a raw summary into ordered display sections.
///
/// Sections are delimited by the fixed `* **` pattern the summarizer
/// emits; empty and whitespace-only pieces are discarded. An input with no
/// usable sections yields a single waiting placeholder.
pub fn split_summary(raw: &str) -> Vec<String> {
    let sections: Vec<String> = raw
        .split(SUMMARY_DELIMITER)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect();

    if sections.is_empty() {
        vec![WAITING_PLACEHOLDER.to_string()]
    } else {
        sections
    }
}

/// All mutable session state, owned exclusively by the controller.
///
/// Readers get cloned snapshots; only the controller (and the tasks it
/// spawns) mutate the live copy.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Current navigation view
    pub page: Page,
    /// User-picked asset; present only in the Upload flow
    pub selected_file: Option<AudioAsset>,
    pub capture_status: CaptureStatus,
    pub request_status: RequestStatus,
    /// Last applied result; cleared on dispatch, overwritten with
    /// sentinels on failure
    pub result: Option<AnalysisOutcome>,
    /// Ambient palette index; reset whenever the page leaves Home
    pub theme_tick: usize,
    /// Identity of the most recently dispatched analysis request. A
    /// resolving request may only write state if its identity still
    /// matches.
    pub(crate) request_seq: u64,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            page: Page::Home,
            selected_file: None,
            capture_status: CaptureStatus::Idle,
            request_status: RequestStatus::Idle,
            result: None,
            theme_tick: 0,
            request_seq: 0,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time session statistics
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,
    pub page: Page,
    pub is_recording: bool,
    pub request_in_flight: bool,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: f64,
    pub requests_dispatched: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_splits_into_ordered_sections() {
        assert_eq!(
            split_summary("* **A\n* **B\n* **C"),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
    }

    #[test]
    fn summary_discards_blank_segments() {
        assert_eq!(
            split_summary("* **Tip one* **   * **Tip two"),
            vec!["Tip one".to_string(), "Tip two".to_string()]
        );
    }

    #[test]
    fn empty_summary_yields_waiting_placeholder() {
        assert_eq!(split_summary(""), vec![WAITING_PLACEHOLDER.to_string()]);
        assert_eq!(split_summary("   \n "), vec![WAITING_PLACEHOLDER.to_string()]);
    }

    #[test]
    fn summary_without_delimiter_is_one_section() {
        assert_eq!(split_summary("plain text"), vec!["plain text".to_string()]);
    }

    #[test]
    fn new_state_starts_on_home_and_idle() {
        let state = SessionState::new();
        assert_eq!(state.page, Page::Home);
        assert_eq!(state.capture_status, CaptureStatus::Idle);
        assert_eq!(state.request_status, RequestStatus::Idle);
        assert!(state.selected_file.is_none());
        assert!(state.result.is_none());
        assert_eq!(state.theme_tick, 0);
    }
}
