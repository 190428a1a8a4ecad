#![warn(missing_docs)]
//! # palm-lens-core
//!
//! ## Purpose
//! Defines the pure acquisition data model used across the `palm-lens`
//! workspace.
//!
//! ## Responsibilities
//! - Represent a normalized image payload regardless of acquisition mode.
//! - Validate user-supplied files through a single entry point shared by the
//!   file picker and drag-and-drop.
//! - Encode and decode embedded data-URL image strings.
//!
//! ## Data flow
//! File picker / drag-drop / camera capture produce an [`ImagePayload`] that
//! the analysis client serializes for the remote endpoint.
//!
//! ## Ownership and lifetimes
//! Payloads own their backing buffers (`String`/`Vec<u8>`) and are immutable
//! once constructed; a new acquisition replaces the payload wholesale.
//!
//! ## Error model
//! Validation failures (non-image declared type, malformed data URLs) return
//! [`MediaError`] variants with caller-actionable categorization.
//!
//! ## Example
//! ```rust
//! use palm_lens_core::{AcquisitionSource, ImagePayload};
//!
//! let payload =
//!     ImagePayload::from_user_file(AcquisitionSource::FilePicker, "image/png", vec![1, 2, 3])
//!         .expect("declared image type should validate");
//! assert_eq!(payload.source(), AcquisitionSource::FilePicker);
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared-type prefix accepted by media validation.
pub const IMAGE_TYPE_PREFIX: &str = "image/";

/// Data-URL prefix required for embedded camera frames.
pub const IMAGE_DATA_URL_PREFIX: &str = "data:image/";

/// Acquisition mode that produced an image payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionSource {
    /// File chosen through the file picker.
    FilePicker,
    /// File dropped onto the upload area.
    DragDrop,
    /// Frame frozen from the live camera stream.
    Camera,
}

/// Image bytes in one of the two transport-ready forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageData {
    /// Embedded encoded-image string (`data:image/...;base64,...`).
    EncodedText(String),
    /// Raw binary image bytes.
    Binary(Vec<u8>),
}

/// Normalized image payload tagged with its acquisition source.
///
/// The tag tells the analysis client which serialization form to use; the two
/// forms must produce equivalent server-side acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    source: AcquisitionSource,
    data: ImageData,
}

impl ImagePayload {
    /// Validates and wraps a user-supplied file from the picker or drag-drop.
    ///
    /// Both input modes funnel through this entry point; there is no divergent
    /// behavior between them.
    ///
    /// # Errors
    /// Returns [`MediaError::InvalidMediaType`] when the declared type does not
    /// start with `image/`.
    pub fn from_user_file(
        source: AcquisitionSource,
        declared_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Self, MediaError> {
        if !declared_type.starts_with(IMAGE_TYPE_PREFIX) {
            return Err(MediaError::InvalidMediaType {
                declared: declared_type.to_string(),
            });
        }

        Ok(Self {
            source,
            data: ImageData::Binary(bytes),
        })
    }

    /// Wraps a captured camera frame already encoded as an image data URL.
    ///
    /// # Errors
    /// Returns [`MediaError::MalformedDataUrl`] when the string does not carry
    /// the `data:image/` prefix.
    pub fn from_camera_frame(data_url: String) -> Result<Self, MediaError> {
        if !data_url.starts_with(IMAGE_DATA_URL_PREFIX) {
            return Err(MediaError::MalformedDataUrl(
                "camera frame must be an image data URL".to_string(),
            ));
        }

        Ok(Self {
            source: AcquisitionSource::Camera,
            data: ImageData::EncodedText(data_url),
        })
    }

    /// Returns the acquisition source tag.
    pub fn source(&self) -> AcquisitionSource {
        self.source
    }

    /// Returns the transport form of the payload.
    pub fn data(&self) -> &ImageData {
        &self.data
    }

    /// Returns the raw representation bytes used for request digests.
    pub fn raw_bytes(&self) -> &[u8] {
        match &self.data {
            ImageData::EncodedText(text) => text.as_bytes(),
            ImageData::Binary(bytes) => bytes,
        }
    }
}

/// Encodes image bytes into an embedded data-URL string.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    let encoded = BASE64_STANDARD.encode(bytes);
    format!("data:{mime_type};base64,{encoded}")
}

/// Decodes the byte content of an embedded data-URL string.
///
/// # Errors
/// Returns [`MediaError::MalformedDataUrl`] when the prefix or base64 content
/// is invalid.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, MediaError> {
    if !data_url.starts_with("data:") {
        return Err(MediaError::MalformedDataUrl(
            "missing data: prefix".to_string(),
        ));
    }

    let encoded = data_url
        .split_once(";base64,")
        .map(|(_, encoded)| encoded)
        .ok_or_else(|| MediaError::MalformedDataUrl("missing base64 marker".to_string()))?;

    BASE64_STANDARD
        .decode(encoded)
        .map_err(|error| MediaError::MalformedDataUrl(format!("invalid base64 content: {error}")))
}

/// Error type for media validation and data-URL codec failures.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Supplied file's declared type is not an image.
    #[error("invalid media type: '{declared}' is not an image")]
    InvalidMediaType {
        /// Declared MIME type from the input source.
        declared: String,
    },
    /// Embedded encoded-image string is not a usable data URL.
    #[error("malformed data url: {0}")]
    MalformedDataUrl(String),
}
