//! Request and response types for the analysis API.

use serde::{Deserialize, Serialize};

use crate::models::{AdverseEventRecord, AnalysisReport, AnalysisSummary};

/// Body of `POST /api/analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub conversation: String,
}

/// Response of `POST /api/analyze`: the analysis report plus processing
/// metadata.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub extracted_medicines: Vec<String>,
    pub extracted_symptoms: Vec<String>,
    pub adverse_events: Vec<AdverseEventRecord>,
    pub summary: AnalysisSummary,
    /// Wall-clock processing time for this call, in milliseconds.
    pub processing_time_ms: u64,
    /// RFC 3339 timestamp of when the analysis completed.
    pub timestamp: String,
}

impl AnalyzeResponse {
    pub fn from_report(report: AnalysisReport, processing_time_ms: u64) -> Self {
        Self {
            extracted_medicines: report.extracted_medicines,
            extracted_symptoms: report.extracted_symptoms,
            adverse_events: report.adverse_events,
            summary: report.summary,
            processing_time_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response of `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub knowledge_base_ready: bool,
    pub drug_count: usize,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_request_defaults_missing_conversation() {
        let req: AnalyzeRequest = serde_json::from_str("{}").unwrap();
        assert!(req.conversation.is_empty());
    }

    #[test]
    fn analyze_response_carries_report_fields() {
        let response = AnalyzeResponse::from_report(AnalysisReport::empty(), 12);
        assert_eq!(response.processing_time_ms, 12);
        assert!(response.extracted_medicines.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("summary").is_some());
        assert!(json.get("timestamp").is_some());
    }
}
