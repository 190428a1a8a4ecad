//! Benchmark smoke test for the deterministic encode/digest/filter loop.

use std::time::Instant;

use palm_lens_analysis_contract::parse_analysis_report;
use palm_lens_client::{encode_multipart, random_boundary, request_digest};
use palm_lens_core::{AcquisitionSource, ImagePayload};
use palm_lens_ui::{ALL_FILTER_ID, ResultsPresenter};
use rand::SeedableRng;
use rand::rngs::StdRng;

const REPORT_JSON: &str = r#"{
    "edges_image": "data:image/png;base64,RURHRVM=",
    "visualization": "data:image/png;base64,Vkla",
    "interpretations": [
        {"line": "heart line", "score": 72.0, "category": "love_marriage", "reading": "warm"},
        {"line": "fate line", "score": 55.0, "category": "work_success", "reading": "steady"}
    ],
    "categories": [
        {"id": "love_marriage", "name": "Love & Marriage", "icon": "H"},
        {"id": "work_success", "name": "Work & Success", "icon": "W"}
    ]
}"#;

#[test]
fn benchmark_pipeline_smoke_prints_latency() {
    let payload = ImagePayload::from_user_file(
        AcquisitionSource::FilePicker,
        "image/jpeg",
        vec![0xAB; 64 * 1024],
    )
    .expect("payload should be valid");
    let report = parse_analysis_report(REPORT_JSON).expect("report should parse");

    let mut rng = StdRng::seed_from_u64(7);
    let mut presenter = ResultsPresenter::new();

    let start = Instant::now();
    let mut body_bytes = 0usize;
    let mut digest_bytes = 0usize;
    let mut visible_rows = 0usize;

    for _ in 0..100 {
        let boundary = random_boundary(&mut rng);
        body_bytes += encode_multipart(&payload, &boundary).len();
        digest_bytes += request_digest(&payload).len();

        presenter.set_result(report.clone());
        presenter.set_filter("love_marriage");
        visible_rows += presenter.visible().len();
        presenter.set_filter(ALL_FILTER_ID);
        visible_rows += presenter.visible().len();
    }

    let elapsed_ms = start.elapsed().as_millis();
    println!("benchmark_pipeline_elapsed_ms={elapsed_ms}");
    println!("benchmark_multipart_total_bytes={body_bytes}");
    println!("benchmark_digest_total_bytes={digest_bytes}");
    println!("benchmark_visible_rows={visible_rows}");

    // This is a lightweight guardrail; strict NFR checks are environment-specific.
    assert!(
        elapsed_ms < 5_000,
        "pipeline smoke benchmark should stay bounded"
    );
}
