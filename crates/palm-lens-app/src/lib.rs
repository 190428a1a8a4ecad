#![warn(missing_docs)]
//! # palm-lens-app
//!
//! ## Purpose
//! Orchestrates acquisition, camera capture, analysis, results presentation,
//! and the offline shell cache for `palm-lens`.
//!
//! ## Responsibilities
//! - Own the image payload and route every UI event through the view-state
//!   machine's transition table.
//! - Bracket the analysis suspend point with explicit begin/finish calls so
//!   the in-flight guard is released unconditionally.
//! - Enforce exhaustive camera-session release on every overlay exit path.
//! - Project runtime state into a flat snapshot for shells, and surface every
//!   failure as a user-visible notice with a defined target state.
//!
//! ## Data flow
//! File/drop/camera input -> payload + Preview -> analysis client ->
//! results presenter; the cache agent runs orthogonally over shell requests.
//!
//! ## Ownership and lifetimes
//! The session passes owned payload/report values between subsystems; no
//! ambient globals, no shared mutable state with the cache agent.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]; none are fatal. The worst
//! outcome is falling back to the Upload view with a notice.

use std::sync::Arc;

use palm_lens_analysis_contract::AnalysisReport;
use palm_lens_cache::{CacheAgent, CacheError, CacheManifest, CacheStore};
use palm_lens_capture::{CameraBackend, CaptureController, CaptureError, OpenOutcome};
use palm_lens_client::{AnalysisClient, AnalysisError, FailureClass, classify_analysis_error};
use palm_lens_core::{AcquisitionSource, ImagePayload, MediaError};
use palm_lens_ui::{
    BaseSection, ResultsPresenter, Transition, ViewEvent, ViewState, ViewStateMachine,
};
use rand::Rng;
use thiserror::Error;

pub mod run_log;

/// Build-time application version loaded from root `VERSION`.
pub const APP_VERSION: &str = env!("PALM_LENS_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Checks the offline-cache env toggle.
///
/// Semantics:
/// - Unset => offline cache enabled.
/// - `0`, `false`, `off` (case-insensitive) => disabled.
/// - Any other value => enabled.
pub fn offline_cache_enabled_from_env() -> bool {
    match std::env::var("PALM_LENS_OFFLINE_CACHE") {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Builds the caching agent for the current shell deploy.
pub fn shell_cache_agent(store: Arc<dyn CacheStore>) -> CacheAgent {
    CacheAgent::new(CacheManifest::shell_default(), store)
}

/// Single-threaded owner of payload, view state, and results.
///
/// All mutation runs to completion without interleaving; the only suspension
/// points are the explicit begin/finish pairs around network and device calls.
pub struct AppSession {
    view: ViewStateMachine,
    presenter: ResultsPresenter,
    payload: Option<ImagePayload>,
    notice: Option<String>,
}

impl AppSession {
    /// Creates a fresh session showing the upload view.
    pub fn new() -> Self {
        Self {
            view: ViewStateMachine::new(),
            presenter: ResultsPresenter::new(),
            payload: None,
            notice: None,
        }
    }

    /// Returns the view-state machine snapshot.
    pub fn view(&self) -> &ViewStateMachine {
        &self.view
    }

    /// Returns the results presenter.
    pub fn presenter(&self) -> &ResultsPresenter {
        &self.presenter
    }

    /// Returns the held payload, if any.
    pub fn payload(&self) -> Option<&ImagePayload> {
        self.payload.as_ref()
    }

    /// Returns the last user-visible notice, if any.
    pub fn last_notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Validates and accepts a user-supplied file from the picker or
    /// drag-drop.
    ///
    /// # Errors
    /// Returns [`AppError::Media`] for non-image declared types; the view
    /// state is left unchanged and a notice is recorded.
    pub fn accept_user_file(
        &mut self,
        source: AcquisitionSource,
        declared_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), AppError> {
        let payload = match ImagePayload::from_user_file(source, declared_type, bytes) {
            Ok(payload) => payload,
            Err(error) => {
                let error = AppError::Media(error);
                self.notice = Some(user_notice(&error));
                return Err(error);
            }
        };

        if self.view.dispatch(ViewEvent::PayloadAccepted) == Transition::Applied {
            self.payload = Some(payload);
        }
        Ok(())
    }

    /// Handles "change image": back to Upload, payload discarded.
    pub fn change_image(&mut self) {
        if self.view.dispatch(ViewEvent::ChangeImage) == Transition::Applied {
            self.payload = None;
        }
    }

    /// Handles "new analysis": back to Upload, payload and report discarded.
    pub fn new_analysis(&mut self) {
        if self.view.dispatch(ViewEvent::NewAnalysis) == Transition::Applied {
            self.payload = None;
            self.presenter.clear();
        }
    }

    /// Opens the camera overlay and negotiates device access.
    ///
    /// # Errors
    /// Returns [`AppError::Capture`] when the device is unavailable; the
    /// overlay closes and the base view is unchanged.
    pub fn open_camera(
        &mut self,
        controller: &mut CaptureController,
        backend: &dyn CameraBackend,
    ) -> Result<(), AppError> {
        if self.view.dispatch(ViewEvent::CameraOpened) == Transition::Ignored {
            return Ok(());
        }

        match controller.open(backend) {
            Ok(OpenOutcome::Streaming) => Ok(()),
            Ok(OpenOutcome::DismissedDuringRequest) => {
                self.view.dispatch(ViewEvent::CameraClosed);
                Ok(())
            }
            Err(error) => {
                self.view.dispatch(ViewEvent::CameraClosed);
                let error = AppError::Capture(error);
                self.notice = Some(user_notice(&error));
                Err(error)
            }
        }
    }

    /// Closes the camera overlay, releasing the device session.
    pub fn close_camera(&mut self, controller: &mut CaptureController) {
        controller.close();
        self.view.dispatch(ViewEvent::CameraClosed);
    }

    /// Handles the outside-modal dismissal gesture.
    pub fn dismiss_camera(&mut self, controller: &mut CaptureController) {
        controller.dismiss();
        self.view.dispatch(ViewEvent::CameraClosed);
    }

    /// Freezes a camera frame into the current payload and returns to
    /// Preview.
    ///
    /// # Errors
    /// Returns [`AppError::Capture`] on frame/encode failure; the overlay
    /// stays open so the user can retry or close.
    pub fn capture_from_camera(
        &mut self,
        controller: &mut CaptureController,
    ) -> Result<(), AppError> {
        let payload = match controller.capture() {
            Ok(payload) => payload,
            Err(error) => {
                let error = AppError::Capture(error);
                self.notice = Some(user_notice(&error));
                return Err(error);
            }
        };

        if self.view.dispatch(ViewEvent::CaptureCompleted) == Transition::Applied {
            self.payload = Some(payload);
        }
        Ok(())
    }

    /// Starts the analysis suspend point.
    ///
    /// Returns the payload to submit, or `None` when the trigger is a no-op
    /// (no payload, wrong view, or a request already outstanding, which is
    /// the single-flight guarantee).
    pub fn begin_analysis(&mut self) -> Option<ImagePayload> {
        if self.view.dispatch(ViewEvent::AnalyzeRequested) == Transition::Ignored {
            return None;
        }
        self.payload.clone()
    }

    /// Completes the analysis suspend point with the client outcome.
    ///
    /// Success moves to Results with a fresh filter set; failure records a
    /// notice and returns to Preview with the payload intact for retry.
    pub fn finish_analysis(&mut self, outcome: Result<AnalysisReport, AnalysisError>) {
        match outcome {
            Ok(report) => {
                self.presenter.set_result(report);
                self.view.dispatch(ViewEvent::AnalysisSucceeded);
            }
            Err(error) => {
                self.fail_analysis(error);
            }
        }
    }

    fn fail_analysis(&mut self, error: AnalysisError) -> AppError {
        let error = AppError::Analysis(error);
        self.notice = Some(user_notice(&error));
        self.view.dispatch(ViewEvent::AnalysisFailed);
        error
    }

    /// Runs one full analysis round trip through the client.
    ///
    /// A trigger while a request is pending is a no-op returning `Ok(())`.
    ///
    /// # Errors
    /// Returns [`AppError::Analysis`] after the session has already settled
    /// back into Preview with the payload retained.
    pub fn run_analysis(
        &mut self,
        client: &AnalysisClient,
        rng: &mut impl Rng,
    ) -> Result<(), AppError> {
        let Some(payload) = self.begin_analysis() else {
            return Ok(());
        };

        match client.analyze(&payload, rng) {
            Ok(report) => {
                self.finish_analysis(Ok(report));
                Ok(())
            }
            Err(error) => Err(self.fail_analysis(error)),
        }
    }

    /// Switches the results category filter.
    pub fn set_filter(&mut self, filter_id: &str) -> Transition {
        self.presenter.set_filter(filter_id)
    }
}

impl Default for AppSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat runtime snapshot for simple shell projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    /// Visible base section as a human-readable string.
    pub base_section: String,
    /// Whether the camera modal overlays the base section.
    pub camera_active: bool,
    /// Whether the analyze control is enabled (idle label visible).
    pub analyze_enabled: bool,
    /// Whether the analyzing spinner is visible.
    pub spinner_visible: bool,
    /// Whether a payload is currently held.
    pub has_payload: bool,
    /// Last user-visible notice.
    pub notice: Option<String>,
}

/// Projects session state into a flat status snapshot.
pub fn project_status(session: &AppSession) -> StatusSnapshot {
    let base_section = match session.view().base_section() {
        BaseSection::Upload => "Upload",
        BaseSection::Preview => "Preview",
        BaseSection::Results => "Results",
    };

    StatusSnapshot {
        version: app_version().to_string(),
        base_section: base_section.to_string(),
        camera_active: session.view().camera_active(),
        analyze_enabled: session.view().analyze_control_enabled(),
        spinner_visible: session.view().current() == ViewState::Analyzing,
        has_payload: session.view().has_payload(),
        notice: session.last_notice().map(str::to_string),
    }
}

/// Maps an error to the user-visible notification text.
pub fn user_notice(error: &AppError) -> String {
    match error {
        AppError::Media(MediaError::InvalidMediaType { .. }) => {
            "Please choose an image file.".to_string()
        }
        AppError::Media(inner) => format!("That image could not be read: {inner}"),
        AppError::Capture(CaptureError::DeviceUnavailable(detail)) => {
            format!("Camera is unavailable: {detail}")
        }
        AppError::Capture(inner) => format!("Camera error: {inner}"),
        AppError::Analysis(inner) => match classify_analysis_error(inner) {
            FailureClass::Retriable => format!("Analysis failed, please try again: {inner}"),
            FailureClass::Permanent => format!("Analysis failed: {inner}"),
        },
        AppError::Cache(inner) => format!("Offline cache degraded: {inner}"),
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Media validation error.
    #[error("media error: {0}")]
    Media(#[from] MediaError),
    /// Camera subsystem error.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Analysis client error.
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    /// Cache subsystem error.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}
