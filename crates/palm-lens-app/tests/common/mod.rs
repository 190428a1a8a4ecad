//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};

use palm_lens_analysis_contract::AnalysisReport;
use palm_lens_client::{AnalysisError, AnalysisRequest, AnalysisTransport, HttpResponse};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Deterministic RNG for boundary generation in tests.
#[allow(dead_code)]
pub fn fixture_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

/// Analysis endpoint accepted by client endpoint policy.
#[allow(dead_code)]
pub const FIXTURE_ENDPOINT: &str = "https://palm.example.test/api/analyze";

/// Raw 2xx body with two categories and three interpretations (two in
/// `love_marriage`, one in `work_success`).
#[allow(dead_code)]
pub fn fixture_report_json() -> String {
    r#"{
        "success": true,
        "edges_image": "data:image/png;base64,RURHRVM=",
        "visualization": "data:image/png;base64,Vkla",
        "interpretations": [
            {"line": "heart line", "score": 72.0, "category": "love_marriage", "reading": "warm"},
            {"line": "fate line", "score": 55.0, "category": "work_success", "reading": "steady"},
            {"line": "marriage line", "score": 41.0, "category": "love_marriage", "reading": "patient"}
        ],
        "categories": [
            {"id": "love_marriage", "name": "Love & Marriage", "icon": "H"},
            {"id": "work_success", "name": "Work & Success", "icon": "W"}
        ],
        "analysis": {"heart_zone": 72.0, "fate_zone": 55.0, "marriage_zone": 41.0}
    }"#
    .to_string()
}

/// Parsed fixture report.
#[allow(dead_code)]
pub fn fixture_report() -> AnalysisReport {
    palm_lens_analysis_contract::parse_analysis_report(&fixture_report_json())
        .expect("fixture report should parse")
}

/// Transport stub returning a canned response and recording every request.
pub struct RecordingTransport {
    response: Result<HttpResponse, String>,
    requests: Mutex<Vec<AnalysisRequest>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    /// Responds with the given status and body.
    pub fn responding(status: u16, body: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(HttpResponse {
                status,
                body: body.into(),
            }),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Fails every request at the transport level.
    pub fn unreachable(detail: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            response: Err(detail.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Number of requests that reached the wire.
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request log lock").len()
    }

    /// Copy of the recorded requests.
    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().expect("request log lock").clone()
    }
}

impl AnalysisTransport for RecordingTransport {
    fn execute(&self, request: &AnalysisRequest) -> Result<HttpResponse, AnalysisError> {
        self.requests
            .lock()
            .expect("request log lock")
            .push(request.clone());
        match &self.response {
            Ok(response) => Ok(response.clone()),
            Err(detail) => Err(AnalysisError::Unreachable(detail.clone())),
        }
    }
}
