use serde::Deserialize;

/// Placeholders substituted for fields the endpoint left out.
///
/// Missing fields are a leniency policy, not an error: the service may
/// legitimately return a prediction without a transcript, or vice versa.
pub const NO_PREDICTION_PLACEHOLDER: &str = "No prediction available";
pub const NO_TRANSCRIPT_PLACEHOLDER: &str = "No transcript available";
pub const NO_SUMMARY_PLACEHOLDER: &str = "No Gemini response available";

/// Raw JSON body returned by the inference endpoint
#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub prediction_text: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub gemini_response: Option<String>,
}

/// Normalized analysis result; absent fields already replaced with their
/// fixed placeholders. `summary_raw` is unsegmented — splitting it into
/// display sections is the session controller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub prediction_text: String,
    pub transcript_text: String,
    pub summary_raw: String,
}

impl From<PredictResponse> for AnalysisResult {
    fn from(body: PredictResponse) -> Self {
        Self {
            prediction_text: or_placeholder(body.prediction_text, NO_PREDICTION_PLACEHOLDER),
            transcript_text: or_placeholder(body.transcript, NO_TRANSCRIPT_PLACEHOLDER),
            summary_raw: or_placeholder(body.gemini_response, NO_SUMMARY_PLACEHOLDER),
        }
    }
}

// Empty strings count as absent, matching the endpoint's older clients.
fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => placeholder.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_fields_pass_through_verbatim() {
        let result: AnalysisResult = PredictResponse {
            prediction_text: Some("Happy".into()),
            transcript: Some("hello".into()),
            gemini_response: Some("* **Tip".into()),
        }
        .into();

        assert_eq!(result.prediction_text, "Happy");
        assert_eq!(result.transcript_text, "hello");
        assert_eq!(result.summary_raw, "* **Tip");
    }

    #[test]
    fn absent_fields_map_to_fixed_placeholders() {
        let result: AnalysisResult = PredictResponse {
            prediction_text: None,
            transcript: None,
            gemini_response: None,
        }
        .into();

        assert_eq!(result.prediction_text, NO_PREDICTION_PLACEHOLDER);
        assert_eq!(result.transcript_text, NO_TRANSCRIPT_PLACEHOLDER);
        assert_eq!(result.summary_raw, NO_SUMMARY_PLACEHOLDER);
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let result: AnalysisResult = PredictResponse {
            prediction_text: Some(String::new()),
            transcript: None,
            gemini_response: Some("x".into()),
        }
        .into();

        assert_eq!(result.prediction_text, NO_PREDICTION_PLACEHOLDER);
        assert_eq!(result.summary_raw, "x");
    }

    #[test]
    fn body_with_unknown_fields_still_parses() {
        let parsed: PredictResponse =
            serde_json::from_str(r#"{"prediction_text":"Calm","extra":42}"#).unwrap();
        assert_eq!(parsed.prediction_text.as_deref(), Some("Calm"));
        assert!(parsed.transcript.is_none());
    }
}
