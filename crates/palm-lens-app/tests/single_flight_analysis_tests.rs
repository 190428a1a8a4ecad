//! Integration tests for the single outstanding analysis request guarantee.

mod common;

use common::{FIXTURE_ENDPOINT, RecordingTransport, fixture_report_json, fixture_rng};
use palm_lens_app::AppSession;
use palm_lens_client::AnalysisClient;
use palm_lens_core::AcquisitionSource;

#[test]
fn single_flight_analysis_tests_second_trigger_while_pending_is_a_no_op() {
    let mut session = AppSession::new();
    session
        .accept_user_file(AcquisitionSource::FilePicker, "image/jpeg", vec![3])
        .expect("payload should be accepted");

    // First trigger enters Analyzing and yields the payload to submit.
    let first = session.begin_analysis();
    assert!(first.is_some());

    // Second trigger while the request is pending: the control is disabled
    // and the event is a defined no-op.
    let second = session.begin_analysis();
    assert!(second.is_none());
    assert!(!session.view().analyze_control_enabled());
}

#[test]
fn single_flight_analysis_tests_exactly_one_request_reaches_the_wire() {
    let transport = RecordingTransport::responding(200, fixture_report_json());
    let client =
        AnalysisClient::new(FIXTURE_ENDPOINT, transport.clone()).expect("client should build");

    let mut session = AppSession::new();
    session
        .accept_user_file(AcquisitionSource::FilePicker, "image/jpeg", vec![3])
        .expect("payload should be accepted");

    let mut rng = fixture_rng();
    session
        .run_analysis(&client, &mut rng)
        .expect("analysis should succeed");
    // Re-triggering from the Results view is a no-op, not a second request.
    session
        .run_analysis(&client, &mut rng)
        .expect("no-op trigger should be Ok");

    assert_eq!(transport.request_count(), 1);
}

#[test]
fn single_flight_analysis_tests_in_flight_flag_releases_after_completion() {
    let transport = RecordingTransport::responding(200, fixture_report_json());
    let client =
        AnalysisClient::new(FIXTURE_ENDPOINT, transport).expect("client should build");

    let mut session = AppSession::new();
    session
        .accept_user_file(AcquisitionSource::FilePicker, "image/jpeg", vec![3])
        .expect("payload should be accepted");
    session
        .run_analysis(&client, &mut fixture_rng())
        .expect("analysis should succeed");

    assert!(!client.in_flight());
    assert!(session.view().analyze_control_enabled());
}
