//! Integration tests for view-state transition totality and the
//! exactly-one-base-section invariant.

use palm_lens_ui::{BaseSection, Transition, ViewEvent, ViewState, ViewStateMachine};

const ALL_EVENTS: [ViewEvent; 9] = [
    ViewEvent::PayloadAccepted,
    ViewEvent::ChangeImage,
    ViewEvent::AnalyzeRequested,
    ViewEvent::AnalysisSucceeded,
    ViewEvent::AnalysisFailed,
    ViewEvent::NewAnalysis,
    ViewEvent::CameraOpened,
    ViewEvent::CameraClosed,
    ViewEvent::CaptureCompleted,
];

#[test]
fn view_state_machine_tests_exactly_one_base_section_under_any_event_sequence() {
    // Cycle every event from a spread of starting points; the base section
    // must stay well-defined at every observation point.
    let mut machine = ViewStateMachine::new();
    for round in 0..4 {
        for event in ALL_EVENTS.iter().cycle().skip(round).take(ALL_EVENTS.len()) {
            machine.dispatch(*event);
            let section = machine.base_section();
            assert!(matches!(
                section,
                BaseSection::Upload | BaseSection::Preview | BaseSection::Results
            ));
        }
    }
}

#[test]
fn view_state_machine_tests_overlay_preserves_base_state_beneath() {
    let mut machine = ViewStateMachine::new();
    machine.dispatch(ViewEvent::PayloadAccepted);
    assert_eq!(machine.base_section(), BaseSection::Preview);

    machine.dispatch(ViewEvent::CameraOpened);
    assert_eq!(machine.current(), ViewState::CameraActive);
    assert_eq!(machine.base_section(), BaseSection::Preview);
    assert!(machine.has_payload());

    machine.dispatch(ViewEvent::CameraClosed);
    assert_eq!(machine.current(), ViewState::Preview);
    assert!(machine.has_payload());
}

#[test]
fn view_state_machine_tests_full_round_trip_through_results() {
    let mut machine = ViewStateMachine::new();
    assert_eq!(machine.dispatch(ViewEvent::PayloadAccepted), Transition::Applied);
    assert_eq!(machine.dispatch(ViewEvent::AnalyzeRequested), Transition::Applied);
    assert_eq!(machine.dispatch(ViewEvent::AnalysisSucceeded), Transition::Applied);
    assert_eq!(machine.current(), ViewState::Results);

    assert_eq!(machine.dispatch(ViewEvent::NewAnalysis), Transition::Applied);
    assert_eq!(machine.current(), ViewState::Upload);
    assert!(!machine.has_payload());
}

#[test]
fn view_state_machine_tests_failure_keeps_payload_for_retry() {
    let mut machine = ViewStateMachine::new();
    machine.dispatch(ViewEvent::PayloadAccepted);
    machine.dispatch(ViewEvent::AnalyzeRequested);
    machine.dispatch(ViewEvent::AnalysisFailed);

    assert_eq!(machine.current(), ViewState::Preview);
    assert!(machine.has_payload());
    assert_eq!(machine.dispatch(ViewEvent::AnalyzeRequested), Transition::Applied);
}

#[test]
fn view_state_machine_tests_camera_never_opens_over_results_or_spinner() {
    let mut machine = ViewStateMachine::new();
    machine.dispatch(ViewEvent::PayloadAccepted);
    machine.dispatch(ViewEvent::AnalyzeRequested);
    assert_eq!(machine.dispatch(ViewEvent::CameraOpened), Transition::Ignored);

    machine.dispatch(ViewEvent::AnalysisSucceeded);
    assert_eq!(machine.dispatch(ViewEvent::CameraOpened), Transition::Ignored);
}
