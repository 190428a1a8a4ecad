//! Tests payload construction invariants across acquisition modes.

use palm_lens_core::{AcquisitionSource, ImageData, ImagePayload, MediaError};

#[test]
fn payload_validation_tests_picker_and_drop_share_one_entry_point() {
    for source in [AcquisitionSource::FilePicker, AcquisitionSource::DragDrop] {
        let accepted = ImagePayload::from_user_file(source, "image/gif", vec![0x47]);
        assert!(accepted.is_ok());

        let rejected = ImagePayload::from_user_file(source, "video/mp4", vec![0x00]);
        assert!(matches!(
            rejected,
            Err(MediaError::InvalidMediaType { declared }) if declared == "video/mp4"
        ));
    }
}

#[test]
fn payload_validation_tests_user_file_is_binary_form() {
    let payload =
        ImagePayload::from_user_file(AcquisitionSource::FilePicker, "image/png", vec![1, 2, 3])
            .expect("image file should validate");
    assert!(matches!(payload.data(), ImageData::Binary(bytes) if bytes == &[1, 2, 3]));
    assert_eq!(payload.raw_bytes(), &[1, 2, 3]);
}

#[test]
fn payload_validation_tests_camera_frame_is_encoded_form() {
    let payload = ImagePayload::from_camera_frame("data:image/jpeg;base64,QQ==".to_string())
        .expect("camera frame should validate");
    assert_eq!(payload.source(), AcquisitionSource::Camera);
    assert!(matches!(payload.data(), ImageData::EncodedText(_)));
}
