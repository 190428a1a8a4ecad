#![warn(missing_docs)]
//! # palm-lens-client
//!
//! ## Purpose
//! Issues the single outstanding request to the remote palm-analysis endpoint
//! and maps the response into a validated report or a typed failure.
//!
//! ## Responsibilities
//! - Validate endpoint policy (HTTPS, `/api/analyze` path).
//! - Serialize an [`palm_lens_core::ImagePayload`] as multipart/form-data:
//!   embedded strings as the `image_data` field, raw bytes as the `image`
//!   binary part.
//! - Classify failures into rejected (server said no) and unreachable
//!   (transport failed).
//! - Guarantee at most one request in flight, released unconditionally on
//!   completion.
//!
//! ## Data flow
//! `AnalysisClient::analyze` -> [`AnalysisTransport`] -> status/body mapping ->
//! [`palm_lens_analysis_contract::AnalysisReport`].
//!
//! ## Ownership and lifetimes
//! Requests own their body bytes so transports can retry-free execute without
//! borrowing the source payload.
//!
//! ## Error model
//! All failures surface as [`AnalysisError`]; callers return the UI to the
//! preview state with the payload retained so the user can retry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use palm_lens_analysis_contract::{
    AnalysisReport, parse_analysis_report, parse_rejection_message,
};
use palm_lens_core::{ImageData, ImagePayload};
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Required analysis path suffix for v1.
pub const ANALYSIS_API_PATH: &str = "/api/analyze";

/// Header carrying the request payload digest for traceability.
pub const REQUEST_DIGEST_HEADER: &str = "x-palm-lens-digest";

/// Multipart field name for embedded encoded-image strings.
pub const FIELD_IMAGE_DATA: &str = "image_data";

/// Multipart part name for raw binary image bytes.
pub const FIELD_IMAGE: &str = "image";

const FALLBACK_REJECTION_MESSAGE: &str = "analysis request was rejected";
const BOUNDARY_RANDOM_LEN: usize = 24;

/// One encoded analysis request ready for transport execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Absolute endpoint URL.
    pub url: String,
    /// `multipart/form-data` content type carrying the boundary.
    pub content_type: String,
    /// Hex sha-256 digest of the payload representation bytes.
    pub digest: String,
    /// Encoded multipart body.
    pub body: Vec<u8>,
}

/// Raw transport-level response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

/// Abstract wire transport used by the analysis client.
pub trait AnalysisTransport: Send + Sync {
    /// Executes one POST of the encoded request.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Unreachable`] on transport-level failure.
    fn execute(&self, request: &AnalysisRequest) -> Result<HttpResponse, AnalysisError>;
}

/// Client for the remote palm-analysis endpoint.
///
/// The in-flight flag is the idempotent re-entry guard: a second `analyze`
/// while one call is pending is rejected without touching the wire, and the
/// flag is released unconditionally when the call completes.
#[derive(Clone)]
pub struct AnalysisClient {
    endpoint: String,
    transport: Arc<dyn AnalysisTransport>,
    in_flight: Arc<AtomicBool>,
}

impl AnalysisClient {
    /// Creates a validated analysis client.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InvalidEndpoint`] when the URL is not HTTPS or
    /// does not end with `/api/analyze`.
    pub fn new(
        endpoint: impl Into<String>,
        transport: Arc<dyn AnalysisTransport>,
    ) -> Result<Self, AnalysisError> {
        let endpoint = endpoint.into();
        validate_analysis_endpoint(&endpoint)?;
        Ok(Self {
            endpoint,
            transport,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns the configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns `true` while a request is outstanding.
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Encodes one payload into a transport-ready multipart request.
    pub fn build_request(&self, payload: &ImagePayload, rng: &mut impl Rng) -> AnalysisRequest {
        let boundary = random_boundary(rng);
        let body = encode_multipart(payload, &boundary);

        AnalysisRequest {
            url: self.endpoint.clone(),
            content_type: format!("multipart/form-data; boundary={boundary}"),
            digest: request_digest(payload),
            body,
        }
    }

    /// Submits one payload and maps the outcome per the error taxonomy.
    ///
    /// # Errors
    /// - [`AnalysisError::AlreadyInFlight`] when a request is pending.
    /// - [`AnalysisError::Rejected`] for non-2xx statuses and malformed 2xx
    ///   bodies.
    /// - [`AnalysisError::Unreachable`] for transport failures.
    pub fn analyze(
        &self,
        payload: &ImagePayload,
        rng: &mut impl Rng,
    ) -> Result<AnalysisReport, AnalysisError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AnalysisError::AlreadyInFlight);
        }
        let _release = InFlightRelease {
            flag: &self.in_flight,
        };

        let request = self.build_request(payload, rng);
        let response = self.transport.execute(&request)?;

        if !(200..=299).contains(&response.status) {
            let message = parse_rejection_message(&response.body)
                .unwrap_or_else(|| FALLBACK_REJECTION_MESSAGE.to_string());
            return Err(AnalysisError::Rejected {
                status: response.status,
                message,
            });
        }

        let raw = String::from_utf8_lossy(&response.body);
        parse_analysis_report(&raw).map_err(|error| AnalysisError::Rejected {
            status: response.status,
            message: format!("malformed analysis response: {error}"),
        })
    }
}

/// Unconditional in-flight release on every exit path.
struct InFlightRelease<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightRelease<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Validates v1 analysis endpoint constraints.
///
/// # Errors
/// Returns [`AnalysisError::InvalidEndpoint`] for non-HTTPS or path mismatch.
pub fn validate_analysis_endpoint(endpoint: &str) -> Result<(), AnalysisError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| AnalysisError::InvalidEndpoint(format!("invalid url: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(AnalysisError::InvalidEndpoint(
            "analysis endpoint must use https".to_string(),
        ));
    }

    if !parsed.path().ends_with(ANALYSIS_API_PATH) {
        return Err(AnalysisError::InvalidEndpoint(format!(
            "analysis endpoint path must end with {ANALYSIS_API_PATH}"
        )));
    }

    Ok(())
}

/// Computes the hex sha-256 digest of the payload representation bytes.
pub fn request_digest(payload: &ImagePayload) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.raw_bytes());
    hex::encode(hasher.finalize())
}

/// Encodes one payload as a multipart/form-data body.
///
/// Serialization policy:
/// - Embedded encoded-image strings go into the `image_data` field.
/// - Raw binary bytes go into the `image` file part.
///
/// Exactly one of the two parts is present.
pub fn encode_multipart(payload: &ImagePayload, boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();

    match payload.data() {
        ImageData::EncodedText(text) => {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{FIELD_IMAGE_DATA}\"\r\n\r\n")
                    .as_bytes(),
            );
            body.extend_from_slice(text.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        ImageData::Binary(bytes) => {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{FIELD_IMAGE}\"; filename=\"palm.jpg\"\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// Generates a random alphanumeric multipart boundary.
pub fn random_boundary(rng: &mut impl Rng) -> String {
    let suffix: String = (0..BOUNDARY_RANDOM_LEN)
        .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
        .collect();
    format!("palm-lens-{suffix}")
}

/// Coarse retry classification for analysis failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Worth retrying without changing the payload.
    Retriable,
    /// Retrying the same request will not help.
    Permanent,
}

/// Classifies an analysis failure for retry messaging.
pub fn classify_analysis_error(error: &AnalysisError) -> FailureClass {
    match error {
        AnalysisError::Unreachable(_) => FailureClass::Retriable,
        AnalysisError::Rejected { status, .. } if (500..=599).contains(status) => {
            FailureClass::Retriable
        }
        AnalysisError::Rejected { .. }
        | AnalysisError::InvalidEndpoint(_)
        | AnalysisError::AlreadyInFlight => FailureClass::Permanent,
    }
}

/// Errors produced by the analysis client.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Endpoint violates security or contract requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Server returned an error status or an unusable body.
    #[error("analysis rejected (status {status}): {message}")]
    Rejected {
        /// HTTP status code of the rejection.
        status: u16,
        /// Message from the response body, or a generic fallback.
        message: String,
    },
    /// Transport-level failure before any server verdict.
    #[error("analysis endpoint unreachable: {0}")]
    Unreachable(String),
    /// A request is already outstanding.
    #[error("an analysis request is already in flight")]
    AlreadyInFlight,
}

#[cfg(test)]
mod tests {
    //! Unit tests for endpoint policy, serialization, and error mapping.

    use palm_lens_core::AcquisitionSource;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    struct CannedTransport {
        response: HttpResponse,
    }

    impl AnalysisTransport for CannedTransport {
        fn execute(&self, _request: &AnalysisRequest) -> Result<HttpResponse, AnalysisError> {
            Ok(self.response.clone())
        }
    }

    fn encoded_payload() -> ImagePayload {
        ImagePayload::from_camera_frame("data:image/jpeg;base64,AAAA".to_string())
            .expect("camera payload should build")
    }

    #[test]
    fn validates_expected_endpoint_policy() {
        validate_analysis_endpoint("https://palm.example.test/api/analyze")
            .expect("endpoint should pass");
        assert!(validate_analysis_endpoint("http://palm.example.test/api/analyze").is_err());
        assert!(validate_analysis_endpoint("https://palm.example.test/api/other").is_err());
    }

    #[test]
    fn encoded_payload_serializes_as_image_data_field() {
        let body = encode_multipart(&encoded_payload(), "B");
        let text = String::from_utf8(body).expect("multipart body should be utf8 here");
        assert!(text.contains("name=\"image_data\""));
        assert!(!text.contains("name=\"image\";"));
        assert!(text.ends_with("--B--\r\n"));
    }

    #[test]
    fn binary_payload_serializes_as_image_part() {
        let payload =
            ImagePayload::from_user_file(AcquisitionSource::FilePicker, "image/png", vec![1, 2])
                .expect("payload should build");
        let body = encode_multipart(&payload, "B");
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("name=\"image\"; filename=\"palm.jpg\""));
        assert!(!text.contains("image_data"));
    }

    #[test]
    fn rejection_uses_body_message_or_fallback() {
        let client = AnalysisClient::new(
            "https://palm.example.test/api/analyze",
            Arc::new(CannedTransport {
                response: HttpResponse {
                    status: 400,
                    body: br#"{"error": "no image supplied"}"#.to_vec(),
                },
            }),
        )
        .expect("client should build");

        let mut rng = StdRng::seed_from_u64(7);
        let error = client
            .analyze(&encoded_payload(), &mut rng)
            .expect_err("rejection expected");
        assert!(matches!(
            error,
            AnalysisError::Rejected { status: 400, ref message } if message == "no image supplied"
        ));
        assert!(!client.in_flight(), "in-flight flag must release on failure");
    }

    #[test]
    fn classification_distinguishes_transient_and_permanent() {
        assert_eq!(
            classify_analysis_error(&AnalysisError::Unreachable("dns".to_string())),
            FailureClass::Retriable
        );
        assert_eq!(
            classify_analysis_error(&AnalysisError::Rejected {
                status: 503,
                message: "busy".to_string()
            }),
            FailureClass::Retriable
        );
        assert_eq!(
            classify_analysis_error(&AnalysisError::Rejected {
                status: 400,
                message: "bad".to_string()
            }),
            FailureClass::Permanent
        );
    }
}
