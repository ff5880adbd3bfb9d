//! Analysis client for the emotion-inference service
//!
//! One multipart HTTP round-trip per submission: the audio asset goes up
//! under the fixed `Speechfile` field, and the response JSON comes back as
//! `{prediction_text?, transcript?, gemini_response?}` with absent fields
//! normalized to fixed placeholder strings.

mod client;
mod response;

pub use client::{AnalysisClient, AnalysisError, EmotionAnalyzer, DEFAULT_ENDPOINT_URL};
pub use response::{
    AnalysisResult, PredictResponse, NO_PREDICTION_PLACEHOLDER, NO_SUMMARY_PLACEHOLDER,
    NO_TRANSCRIPT_PLACEHOLDER,
};
