#![warn(missing_docs)]
//! # palm-lens-ui
//!
//! ## Purpose
//! Defines the view-state machine and results presentation model for
//! `palm-lens`.
//!
//! ## Responsibilities
//! - Keep exactly one of the Upload/Preview/Results sections visible, with the
//!   camera modal as an overlay rather than a replacement.
//! - Dispatch every UI event through one total transition function so all
//!   state mutation stays in a single auditable place.
//! - Hold the last analysis report and derive category filter controls fresh
//!   from each result.
//!
//! ## Data flow
//! Acquisition and analysis events feed [`ViewStateMachine::dispatch`];
//! accepted reports flow into [`ResultsPresenter`], which recomputes the
//! visible interpretation subsequence on filter changes.
//!
//! ## Ownership and lifetimes
//! The machine records payload presence as a flag; the orchestrating session
//! owns the payload itself. The presenter exclusively owns the report for the
//! lifetime of the Results view.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors: undefined events
//! are deliberate no-ops ([`Transition::Ignored`]), never partial updates.
//!
//! ## Example
//! ```rust
//! use palm_lens_ui::{Transition, ViewEvent, ViewState, ViewStateMachine};
//!
//! let mut machine = ViewStateMachine::new();
//! assert_eq!(machine.dispatch(ViewEvent::PayloadAccepted), Transition::Applied);
//! assert_eq!(machine.current(), ViewState::Preview);
//! ```

use palm_lens_analysis_contract::{AnalysisReport, LineInterpretation};

/// Sentinel filter id selecting every interpretation.
pub const ALL_FILTER_ID: &str = "all";

/// Externally observable view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Upload section visible, no payload held.
    Upload,
    /// Preview section visible with an acquired payload.
    Preview,
    /// Analysis request outstanding; preview stays beneath the spinner.
    Analyzing,
    /// Results section visible.
    Results,
    /// Camera modal overlays the current base section.
    CameraActive,
}

/// Base section marker; exactly one is visible at any observation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSection {
    /// Upload area.
    Upload,
    /// Image preview (also shown beneath the analyzing spinner).
    Preview,
    /// Analysis results.
    Results,
}

/// UI events handled by the transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// A validated image payload arrived from the picker or drag-drop.
    PayloadAccepted,
    /// "Change image" pressed in preview.
    ChangeImage,
    /// "Analyze" pressed.
    AnalyzeRequested,
    /// Analysis response accepted.
    AnalysisSucceeded,
    /// Analysis request failed; payload is retained for retry.
    AnalysisFailed,
    /// "New analysis" pressed on the results screen.
    NewAnalysis,
    /// Camera modal opened.
    CameraOpened,
    /// Camera modal closed or dismissed without capturing.
    CameraClosed,
    /// Camera capture produced a payload.
    CaptureCompleted,
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The event changed the view state.
    Applied,
    /// The event was a defined no-op in the current state.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseState {
    Upload,
    Preview,
    Analyzing,
    Results,
}

/// Single source of truth for which UI section is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStateMachine {
    base: BaseState,
    camera_open: bool,
    has_payload: bool,
}

impl ViewStateMachine {
    /// Creates the machine in the Upload state.
    pub fn new() -> Self {
        Self {
            base: BaseState::Upload,
            camera_open: false,
            has_payload: false,
        }
    }

    /// Returns the externally observable view state.
    pub fn current(&self) -> ViewState {
        if self.camera_open {
            return ViewState::CameraActive;
        }

        match self.base {
            BaseState::Upload => ViewState::Upload,
            BaseState::Preview => ViewState::Preview,
            BaseState::Analyzing => ViewState::Analyzing,
            BaseState::Results => ViewState::Results,
        }
    }

    /// Returns the single visible base section.
    ///
    /// Analyzing keeps the preview section visible beneath the spinner, and
    /// the camera overlay never hides the base section's underlying state.
    pub fn base_section(&self) -> BaseSection {
        match self.base {
            BaseState::Upload => BaseSection::Upload,
            BaseState::Preview | BaseState::Analyzing => BaseSection::Preview,
            BaseState::Results => BaseSection::Results,
        }
    }

    /// Returns `true` while the camera modal overlays the base section.
    pub fn camera_active(&self) -> bool {
        self.camera_open
    }

    /// Returns `true` while an analysis request is outstanding.
    pub fn analyzing(&self) -> bool {
        self.base == BaseState::Analyzing
    }

    /// Returns `true` when a payload is currently held.
    pub fn has_payload(&self) -> bool {
        self.has_payload
    }

    /// Returns `true` when the analyze control is enabled.
    ///
    /// Derived from the analyzing state, so the control and the spinner can
    /// never disagree: after a request completes, the idle label is visible
    /// and the spinner hidden, deterministically.
    pub fn analyze_control_enabled(&self) -> bool {
        !self.analyzing()
    }

    /// Applies one event to the transition table.
    ///
    /// The function is total: every event has a defined effect in every state,
    /// and an [`Transition::Ignored`] outcome leaves the state untouched.
    pub fn dispatch(&mut self, event: ViewEvent) -> Transition {
        match event {
            ViewEvent::PayloadAccepted => {
                if self.camera_open || !matches!(self.base, BaseState::Upload | BaseState::Preview)
                {
                    return Transition::Ignored;
                }
                self.base = BaseState::Preview;
                self.has_payload = true;
                Transition::Applied
            }
            ViewEvent::ChangeImage => {
                if self.camera_open || self.base != BaseState::Preview {
                    return Transition::Ignored;
                }
                self.base = BaseState::Upload;
                self.has_payload = false;
                Transition::Applied
            }
            ViewEvent::AnalyzeRequested => {
                // Analyzing -> Ignored is the single-flight guard.
                if self.camera_open || self.base != BaseState::Preview || !self.has_payload {
                    return Transition::Ignored;
                }
                self.base = BaseState::Analyzing;
                Transition::Applied
            }
            ViewEvent::AnalysisSucceeded => {
                if self.base != BaseState::Analyzing {
                    return Transition::Ignored;
                }
                self.base = BaseState::Results;
                Transition::Applied
            }
            ViewEvent::AnalysisFailed => {
                if self.base != BaseState::Analyzing {
                    return Transition::Ignored;
                }
                self.base = BaseState::Preview;
                Transition::Applied
            }
            ViewEvent::NewAnalysis => {
                if self.camera_open || self.base != BaseState::Results {
                    return Transition::Ignored;
                }
                self.base = BaseState::Upload;
                self.has_payload = false;
                Transition::Applied
            }
            ViewEvent::CameraOpened => {
                if self.camera_open || !matches!(self.base, BaseState::Upload | BaseState::Preview)
                {
                    return Transition::Ignored;
                }
                self.camera_open = true;
                Transition::Applied
            }
            ViewEvent::CameraClosed => {
                if !self.camera_open {
                    return Transition::Ignored;
                }
                self.camera_open = false;
                Transition::Applied
            }
            ViewEvent::CaptureCompleted => {
                if !self.camera_open {
                    return Transition::Ignored;
                }
                self.camera_open = false;
                self.base = BaseState::Preview;
                self.has_payload = true;
                Transition::Applied
            }
        }
    }
}

impl Default for ViewStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Active category filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Every interpretation in original order.
    All,
    /// Only interpretations with the matching category id.
    Category(String),
}

/// One rendered filter control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterControl {
    /// Filter id dispatched on click (`all` or a category id).
    pub id: String,
    /// Display label (icon plus name for categories).
    pub label: String,
}

/// Holds the last analysis report and the active category filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsPresenter {
    report: Option<AnalysisReport>,
    filter: CategoryFilter,
    controls: Vec<FilterControl>,
}

impl ResultsPresenter {
    /// Creates an empty presenter.
    pub fn new() -> Self {
        Self {
            report: None,
            filter: CategoryFilter::All,
            controls: Vec::new(),
        }
    }

    /// Replaces the held report, resets the filter to "all", and derives the
    /// filter control set fresh from the report's categories.
    ///
    /// Controls from a previous report can never go stale: the whole set is
    /// rebuilt here.
    pub fn set_result(&mut self, report: AnalysisReport) {
        let mut controls = vec![FilterControl {
            id: ALL_FILTER_ID.to_string(),
            label: "All readings".to_string(),
        }];
        for category in &report.categories {
            controls.push(FilterControl {
                id: category.id.clone(),
                label: format!("{} {}", category.icon, category.name),
            });
        }

        self.report = Some(report);
        self.filter = CategoryFilter::All;
        self.controls = controls;
    }

    /// Discards the held report ("new analysis").
    pub fn clear(&mut self) {
        self.report = None;
        self.filter = CategoryFilter::All;
        self.controls.clear();
    }

    /// Switches the active filter.
    ///
    /// Ids not present in the current control set are ignored, so clicking a
    /// control from a stale render cannot select a phantom category.
    pub fn set_filter(&mut self, filter_id: &str) -> Transition {
        if filter_id == ALL_FILTER_ID {
            self.filter = CategoryFilter::All;
            return Transition::Applied;
        }

        if self.controls.iter().any(|control| control.id == filter_id) {
            self.filter = CategoryFilter::Category(filter_id.to_string());
            return Transition::Applied;
        }

        Transition::Ignored
    }

    /// Returns the active filter.
    pub fn active_filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// Returns the rendered filter controls for the current report.
    pub fn controls(&self) -> &[FilterControl] {
        &self.controls
    }

    /// Returns the held report, if any.
    pub fn report(&self) -> Option<&AnalysisReport> {
        self.report.as_ref()
    }

    /// Computes the visible interpretation subsequence for the active filter.
    ///
    /// The filter is stable: matching interpretations keep their original
    /// relative order and are never re-sorted.
    pub fn visible(&self) -> Vec<&LineInterpretation> {
        let Some(report) = &self.report else {
            return Vec::new();
        };

        report
            .interpretations
            .iter()
            .filter(|interpretation| match &self.filter {
                CategoryFilter::All => true,
                CategoryFilter::Category(id) => interpretation.category == *id,
            })
            .collect()
    }
}

impl Default for ResultsPresenter {
    fn default() -> Self {
        Self::new()
    }
}
