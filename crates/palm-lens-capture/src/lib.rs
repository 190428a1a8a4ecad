#![warn(missing_docs)]
//! # palm-lens-capture
//!
//! ## Purpose
//! Owns the live camera lifecycle: device negotiation, streaming, frame
//! freezing, and release.
//!
//! ## Responsibilities
//! - Define a backend-agnostic camera trait pair ([`CameraBackend`],
//!   [`CameraStream`]).
//! - Drive the Idle -> Requesting -> Streaming -> (Captured | Closed) phase
//!   machine with explicit suspend-point boundaries.
//! - Encode frozen frames into embedded JPEG data-URL payloads.
//! - Expose deterministic synthetic capture for CI and unit tests.
//!
//! ## Data flow
//! UI opens the camera overlay -> [`CaptureController`] negotiates a device
//! session -> `capture()` freezes the current frame into a
//! [`palm_lens_core::ImagePayload`] consumed by the preview/analysis flow.
//!
//! ## Ownership and lifetimes
//! The controller exclusively owns the device session. The critical invariant
//! is exhaustive release: no code path may leave the session held once the
//! camera overlay has been exited, whether by capture, explicit close, or an
//! outside-modal dismissal.
//!
//! ## Error model
//! Access denial and hardware failures surface as
//! [`CaptureError::DeviceUnavailable`] with the phase returned to Idle.

use std::sync::Mutex;

use palm_lens_core::{ImagePayload, encode_data_url};
use thiserror::Error;

/// Ideal stream width requested during device negotiation.
pub const IDEAL_STREAM_WIDTH: u32 = 1280;

/// Ideal stream height requested during device negotiation.
pub const IDEAL_STREAM_HEIGHT: u32 = 720;

/// JPEG quality used when freezing a frame (matches the 0.9 capture quality).
pub const CAPTURE_JPEG_QUALITY: u8 = 90;

/// Camera facing preference sent to the device backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// Rear-facing (environment) camera, preferred for palm shots.
    Rear,
    /// Front-facing (user) camera.
    Front,
}

/// Device constraints requested when opening a camera session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    /// Facing preference.
    pub facing: CameraFacing,
    /// Ideal stream width in pixels.
    pub ideal_width: u32,
    /// Ideal stream height in pixels.
    pub ideal_height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Rear,
            ideal_width: IDEAL_STREAM_WIDTH,
            ideal_height: IDEAL_STREAM_HEIGHT,
        }
    }
}

/// One live frame pulled from an open camera stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA pixel buffer (`width * height * 4` bytes).
    pub rgba: Vec<u8>,
}

impl CameraFrame {
    /// Constructs a validated frame.
    ///
    /// # Errors
    /// Returns [`CaptureError::InvalidFrameShape`] when the pixel buffer length
    /// is not exactly `width * height * 4`.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(CaptureError::InvalidFrameShape {
                expected,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }
}

/// Open device session producing live frames.
pub trait CameraStream: Send {
    /// Returns the most recent frame from the live feed.
    ///
    /// # Errors
    /// Returns [`CaptureError::Backend`] on hardware read failures.
    fn latest_frame(&mut self) -> Result<CameraFrame, CaptureError>;

    /// Releases the underlying device. Must be idempotent.
    fn release(&mut self);
}

/// Trait implemented by concrete camera providers.
pub trait CameraBackend: Send + Sync {
    /// Negotiates device access and opens a live stream.
    ///
    /// # Errors
    /// Returns [`CaptureError::DeviceUnavailable`] on permission denial or
    /// hardware failure.
    fn open(&self, constraints: &CameraConstraints) -> Result<Box<dyn CameraStream>, CaptureError>;
}

/// Camera session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// No session requested.
    Idle,
    /// Device negotiation in progress.
    Requesting,
    /// Live feed active.
    Streaming,
    /// Frame frozen; device already released.
    Captured,
    /// Session explicitly closed.
    Closed,
}

/// Outcome of completing device negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Live feed is active.
    Streaming,
    /// The overlay was dismissed while the request was pending; the acquired
    /// device (if any) was released immediately.
    DismissedDuringRequest,
}

/// Owns the singleton exclusive camera session.
///
/// `begin_open`/`finish_open` bracket the device-negotiation suspend point so
/// that a dismissal arriving mid-request is handled cooperatively on resume
/// rather than by abrupt termination.
pub struct CaptureController {
    phase: CapturePhase,
    constraints: CameraConstraints,
    stream: Option<Box<dyn CameraStream>>,
    dismiss_requested: bool,
}

impl CaptureController {
    /// Creates an idle controller with the given device constraints.
    pub fn new(constraints: CameraConstraints) -> Self {
        Self {
            phase: CapturePhase::Idle,
            constraints,
            stream: None,
            dismiss_requested: false,
        }
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Returns `true` while a device session is held.
    pub fn device_held(&self) -> bool {
        self.stream.is_some()
    }

    /// Starts device negotiation and returns the constraints to request.
    ///
    /// # Errors
    /// Returns [`CaptureError::SessionAlreadyOpen`] when negotiation or a live
    /// feed is already in progress.
    pub fn begin_open(&mut self) -> Result<CameraConstraints, CaptureError> {
        match self.phase {
            CapturePhase::Requesting | CapturePhase::Streaming => {
                Err(CaptureError::SessionAlreadyOpen)
            }
            CapturePhase::Idle | CapturePhase::Captured | CapturePhase::Closed => {
                self.phase = CapturePhase::Requesting;
                self.dismiss_requested = false;
                Ok(self.constraints)
            }
        }
    }

    /// Completes device negotiation with the backend outcome.
    ///
    /// A dismissal recorded while the request was pending is honored here:
    /// the acquired stream is released immediately and the phase returns to
    /// Idle.
    ///
    /// # Errors
    /// Returns [`CaptureError::DeviceUnavailable`] when the backend denied
    /// access or failed; the phase returns to Idle.
    pub fn finish_open(
        &mut self,
        outcome: Result<Box<dyn CameraStream>, CaptureError>,
    ) -> Result<OpenOutcome, CaptureError> {
        let dismissed = self.dismiss_requested || self.phase != CapturePhase::Requesting;
        self.dismiss_requested = false;

        match outcome {
            Ok(mut stream) => {
                if dismissed {
                    stream.release();
                    self.phase = CapturePhase::Idle;
                    return Ok(OpenOutcome::DismissedDuringRequest);
                }

                self.stream = Some(stream);
                self.phase = CapturePhase::Streaming;
                Ok(OpenOutcome::Streaming)
            }
            Err(error) => {
                if self.phase == CapturePhase::Requesting {
                    self.phase = CapturePhase::Idle;
                }
                match error {
                    CaptureError::DeviceUnavailable(detail) => {
                        Err(CaptureError::DeviceUnavailable(detail))
                    }
                    other => Err(CaptureError::DeviceUnavailable(other.to_string())),
                }
            }
        }
    }

    /// Convenience wrapper running both halves of the open suspend point.
    ///
    /// # Errors
    /// Propagates [`CaptureError::SessionAlreadyOpen`] and
    /// [`CaptureError::DeviceUnavailable`].
    pub fn open(&mut self, backend: &dyn CameraBackend) -> Result<OpenOutcome, CaptureError> {
        let constraints = self.begin_open()?;
        self.finish_open(backend.open(&constraints))
    }

    /// Freezes the current frame into a static encoded image payload.
    ///
    /// The device session is released as part of the transition to Captured.
    ///
    /// # Errors
    /// Returns [`CaptureError::NoActiveStream`] outside Streaming. A frame
    /// read failure leaves the stream open so the caller may retry or close.
    pub fn capture(&mut self) -> Result<ImagePayload, CaptureError> {
        if self.phase != CapturePhase::Streaming {
            return Err(CaptureError::NoActiveStream);
        }

        let frame = self
            .stream
            .as_mut()
            .ok_or(CaptureError::NoActiveStream)?
            .latest_frame()?;
        let data_url = encode_frame_to_data_url(&frame, CAPTURE_JPEG_QUALITY)?;
        let payload = ImagePayload::from_camera_frame(data_url)
            .map_err(|error| CaptureError::Encode(error.to_string()))?;

        self.release_stream();
        self.phase = CapturePhase::Captured;
        Ok(payload)
    }

    /// Closes the session. Idempotent and always safe.
    ///
    /// From Requesting this records a dismissal so that a late negotiation
    /// result is released on resume.
    pub fn close(&mut self) {
        if self.phase == CapturePhase::Requesting {
            self.dismiss_requested = true;
        }
        self.release_stream();
        self.phase = CapturePhase::Closed;
    }

    /// Handles the outside-modal dismissal gesture; equivalent to [`close`].
    ///
    /// [`close`]: CaptureController::close
    pub fn dismiss(&mut self) {
        self.close();
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }
}

/// Encodes an RGBA frame as a JPEG data-URL string.
///
/// # Errors
/// Returns [`CaptureError::Encode`] on encoder failure.
pub fn encode_frame_to_data_url(frame: &CameraFrame, quality: u8) -> Result<String, CaptureError> {
    let pixel_count = (frame.width as usize) * (frame.height as usize);
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    for pixel in frame.rgba.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
    }

    let mut jpeg = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality);
    image::ImageEncoder::write_image(
        encoder,
        &rgb,
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgb8,
    )
    .map_err(|error| CaptureError::Encode(error.to_string()))?;

    Ok(encode_data_url("image/jpeg", &jpeg))
}

/// Deterministic synthetic backend for test and CI usage.
pub struct SyntheticCameraBackend {
    frame_width: u32,
    frame_height: u32,
    deny_access: bool,
    sequence: Mutex<u64>,
}

impl SyntheticCameraBackend {
    /// Creates a granting backend emitting small deterministic frames.
    pub fn new() -> Self {
        Self {
            frame_width: 2,
            frame_height: 2,
            deny_access: false,
            sequence: Mutex::new(0),
        }
    }

    /// Creates a backend that denies every open request.
    pub fn denying() -> Self {
        Self {
            deny_access: true,
            ..Self::new()
        }
    }
}

impl Default for SyntheticCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for SyntheticCameraBackend {
    fn open(&self, _constraints: &CameraConstraints) -> Result<Box<dyn CameraStream>, CaptureError> {
        if self.deny_access {
            return Err(CaptureError::DeviceUnavailable(
                "camera permission denied".to_string(),
            ));
        }

        let mut sequence = self
            .sequence
            .lock()
            .map_err(|_| CaptureError::Backend("synthetic sequence lock poisoned".to_string()))?;
        *sequence += 1;

        Ok(Box::new(SyntheticCameraStream {
            width: self.frame_width,
            height: self.frame_height,
            seed: (*sequence % 255) as u8,
            released: false,
        }))
    }
}

struct SyntheticCameraStream {
    width: u32,
    height: u32,
    seed: u8,
    released: bool,
}

impl CameraStream for SyntheticCameraStream {
    fn latest_frame(&mut self) -> Result<CameraFrame, CaptureError> {
        if self.released {
            return Err(CaptureError::Backend(
                "synthetic stream already released".to_string(),
            ));
        }

        let len = (self.width as usize) * (self.height as usize) * 4;
        CameraFrame::new(self.width, self.height, vec![self.seed; len])
    }

    fn release(&mut self) {
        self.released = true;
    }
}

/// Capture layer error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Frame buffer shape does not match declared geometry.
    #[error("invalid frame shape: expected {expected} bytes, got {actual}")]
    InvalidFrameShape {
        /// Expected RGBA byte count.
        expected: usize,
        /// Actual RGBA byte count.
        actual: usize,
    },
    /// Device negotiation or a live feed is already in progress.
    #[error("camera session is already open")]
    SessionAlreadyOpen,
    /// No live feed is active.
    #[error("no active camera stream")]
    NoActiveStream,
    /// Permission denial or hardware failure during negotiation.
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),
    /// Frame encoding failure.
    #[error("frame encode failure: {0}")]
    Encode(String),
    /// Backend runtime failure.
    #[error("camera backend failure: {0}")]
    Backend(String),
}
