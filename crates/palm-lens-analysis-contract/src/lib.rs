#![warn(missing_docs)]
//! # palm-lens-analysis-contract
//!
//! ## Purpose
//! Defines the remote analysis response schema and client-side validation
//! helpers.
//!
//! ## Responsibilities
//! - Parse the JSON body returned by the analysis endpoint into an explicit
//!   schema instead of propagating untyped fields.
//! - Validate mandatory fields, score ranges, and category-id uniqueness.
//! - Extract the optional `error` message from rejection bodies.
//!
//! ## Data flow
//! Raw JSON response -> [`parse_analysis_report`] -> results presentation and
//! category filtering.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs decoupled from transient network buffers;
//! a report is immutable once received and discarded on "new analysis".
//!
//! ## Error model
//! Invalid JSON or contract violations return [`AnalysisContractError`]; the
//! client maps both into a user-facing rejection.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parsed analysis response from the palm-reading endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Server-side success marker.
    #[serde(default = "default_success")]
    pub success: bool,
    /// Edge-detected rendering as an embedded data URL.
    pub edges_image: String,
    /// Visualization overlay as an embedded data URL.
    pub visualization: String,
    /// Ordered per-line interpretations.
    #[serde(default)]
    pub interpretations: Vec<LineInterpretation>,
    /// Ordered filter categories present in this report.
    #[serde(default)]
    pub categories: Vec<ReadingCategory>,
    /// Raw per-zone density scores kept for diagnostics.
    #[serde(default, rename = "analysis")]
    pub zone_densities: BTreeMap<String, f64>,
}

fn default_success() -> bool {
    true
}

/// One interpreted palm line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineInterpretation {
    /// Palm line name.
    pub line: String,
    /// Line clarity score in [0, 100].
    pub score: f64,
    /// Category id this interpretation belongs to.
    pub category: String,
    /// Reading text shown on the interpretation card.
    pub reading: String,
}

/// One filterable reading category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingCategory {
    /// Stable category id referenced by interpretations.
    pub id: String,
    /// Human-readable category name.
    pub name: String,
    /// Decorative icon shown on the filter control.
    pub icon: String,
}

/// Parses raw JSON into a validated analysis report.
///
/// # Errors
/// Returns [`AnalysisContractError::Decode`] for invalid JSON.
/// Returns [`AnalysisContractError::InvalidContract`] when mandatory fields
/// are blank, a score is outside [0, 100], or category ids collide.
pub fn parse_analysis_report(raw: &str) -> Result<AnalysisReport, AnalysisContractError> {
    let parsed: AnalysisReport =
        serde_json::from_str(raw).map_err(AnalysisContractError::Decode)?;

    if parsed.edges_image.trim().is_empty() {
        return Err(AnalysisContractError::InvalidContract(
            "edges_image is empty".to_string(),
        ));
    }

    if parsed.visualization.trim().is_empty() {
        return Err(AnalysisContractError::InvalidContract(
            "visualization is empty".to_string(),
        ));
    }

    for interpretation in &parsed.interpretations {
        if interpretation.line.trim().is_empty() || interpretation.category.trim().is_empty() {
            return Err(AnalysisContractError::InvalidContract(
                "interpretation line and category must be non-empty".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&interpretation.score) {
            return Err(AnalysisContractError::InvalidContract(format!(
                "score {} for '{}' is outside [0, 100]",
                interpretation.score, interpretation.line
            )));
        }
    }

    let mut seen_ids = BTreeSet::new();
    for category in &parsed.categories {
        if category.id.trim().is_empty() {
            return Err(AnalysisContractError::InvalidContract(
                "category id is empty".to_string(),
            ));
        }

        if !seen_ids.insert(category.id.as_str()) {
            return Err(AnalysisContractError::InvalidContract(format!(
                "duplicate category id '{}'",
                category.id
            )));
        }
    }

    Ok(parsed)
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default)]
    error: Option<String>,
}

/// Extracts the optional `error` message from a non-2xx response body.
///
/// Malformed bodies yield `None` so the caller can fall back to a generic
/// rejection message.
pub fn parse_rejection_message(raw: &[u8]) -> Option<String> {
    let body: RejectionBody = serde_json::from_slice(raw).ok()?;
    body.error.filter(|message| !message.trim().is_empty())
}

/// Analysis contract errors.
#[derive(Debug, Error)]
pub enum AnalysisContractError {
    /// JSON decode failure.
    #[error("analysis decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("analysis contract violation: {0}")]
    InvalidContract(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for report parsing and rejection-body extraction.

    use super::*;

    fn valid_raw() -> String {
        r#"{
            "success": true,
            "edges_image": "data:image/png;base64,AAA=",
            "visualization": "data:image/png;base64,BBB=",
            "interpretations": [
                {"line": "heart line", "score": 72.5, "category": "love_marriage", "reading": "rich"}
            ],
            "categories": [
                {"id": "love_marriage", "name": "Love & Marriage", "icon": "H"}
            ],
            "analysis": {"heart_zone": 72.5}
        }"#
        .to_string()
    }

    #[test]
    fn accepts_valid_report() {
        let report = parse_analysis_report(&valid_raw()).expect("report should parse");
        assert_eq!(report.interpretations.len(), 1);
        assert_eq!(report.categories[0].id, "love_marriage");
        assert_eq!(report.zone_densities.get("heart_zone"), Some(&72.5));
    }

    #[test]
    fn rejects_out_of_range_score() {
        let raw = valid_raw().replace("72.5", "140.0");
        assert!(matches!(
            parse_analysis_report(&raw),
            Err(AnalysisContractError::InvalidContract(_))
        ));
    }

    #[test]
    fn rejects_duplicate_category_ids() {
        let raw = valid_raw().replace(
            r#"{"id": "love_marriage", "name": "Love & Marriage", "icon": "H"}"#,
            r#"{"id": "love_marriage", "name": "A", "icon": "H"},
               {"id": "love_marriage", "name": "B", "icon": "H"}"#,
        );
        assert!(matches!(
            parse_analysis_report(&raw),
            Err(AnalysisContractError::InvalidContract(_))
        ));
    }

    #[test]
    fn rejects_blank_processed_images() {
        let raw = valid_raw().replace("data:image/png;base64,AAA=", "");
        assert!(parse_analysis_report(&raw).is_err());
    }

    #[test]
    fn rejection_message_falls_back_on_malformed_body() {
        assert_eq!(
            parse_rejection_message(br#"{"error": "no image supplied"}"#),
            Some("no image supplied".to_string())
        );
        assert_eq!(parse_rejection_message(b"not json"), None);
        assert_eq!(parse_rejection_message(br#"{"error": ""}"#), None);
    }
}
