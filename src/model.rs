/*
 * SPDX-License-Identifier: MIT
 */

//! Selection and upload lifecycle state.
//!
//! The UI layer owns an [`AppState`] and drives it through three
//! operations: replace the selection, begin an upload, finish an upload.
//! Exactly one upload may be in flight; `begin_upload` refuses overlap.

use std::path::Path;

/// A user-chosen image awaiting upload.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Lifecycle of the single outbound OCR request.
///
/// `Failed` carries a user-visible message but exposes no result text;
/// for presentation purposes it is equivalent to `Idle`.
#[derive(Clone, Debug, PartialEq)]
pub enum UploadState {
    Idle,
    Loading,
    Succeeded(String),
    Failed(String),
}

/// Precondition failures of [`AppState::begin_upload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("no image selected")]
    NoFileSelected,
    #[error("an upload is already in progress")]
    UploadInFlight,
}

pub struct AppState {
    pub files: Vec<SelectedFile>,
    pub upload: UploadState,
    pub status_message: String,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            upload: UploadState::Idle,
            status_message: "Drop an image here or open the file dialog".into(),
        }
    }

    /// Replace the whole selection. A drop or pick never appends; the
    /// newest accepted set wins. An existing result stays visible until
    /// the next submission.
    pub fn replace_selection(&mut self, files: Vec<SelectedFile>) {
        self.files = files;
    }

    /// Transition `Idle -> Loading` and hand back the file to upload.
    ///
    /// Only the first selected file is ever sent. An empty selection and
    /// a submission while one is outstanding are defined error states,
    /// not panics; neither issues a network call.
    pub fn begin_upload(&mut self) -> Result<SelectedFile, SubmitError> {
        if self.upload == UploadState::Loading {
            return Err(SubmitError::UploadInFlight);
        }
        let Some(file) = self.files.first() else {
            return Err(SubmitError::NoFileSelected);
        };
        let file = file.clone();
        self.upload = UploadState::Loading;
        Ok(file)
    }

    /// Resolve `Loading` with the upload worker's outcome.
    pub fn finish_upload(&mut self, outcome: Result<String, String>) {
        self.upload = match outcome {
            Ok(text) => UploadState::Succeeded(text),
            Err(message) => UploadState::Failed(message),
        };
    }

    /// Recognized text, stored byte-for-byte. `Some` only after a
    /// successful upload; drives whether the result area renders at all.
    pub fn result_text(&self) -> Option<&str> {
        match &self.upload {
            UploadState::Succeeded(text) => Some(text),
            _ => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match &self.upload {
            UploadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.upload == UploadState::Loading
    }
}

/// Extensions offered by the file dialog; must stay in sync with
/// [`detect_mime`].
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// MIME type by file extension, for the multipart part.
pub fn detect_mime(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Accept filter for drops and the file dialog.
pub fn is_image_name(name: &str) -> bool {
    detect_mime(name).starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> SelectedFile {
        SelectedFile {
            name: name.into(),
            mime: detect_mime(name).into(),
            bytes: vec![0xAB; 16],
        }
    }

    #[test]
    fn selection_is_replaced_not_appended() {
        let mut state = AppState::new();
        state.replace_selection(vec![file("a.png"), file("b.jpg")]);
        state.replace_selection(vec![file("c.png")]);
        assert_eq!(state.files.len(), 1);
        assert_eq!(state.files[0].name, "c.png");
    }

    #[test]
    fn submit_with_no_file_is_a_defined_error() {
        let mut state = AppState::new();
        assert_eq!(state.begin_upload(), Err(SubmitError::NoFileSelected));
        assert_eq!(state.upload, UploadState::Idle);
    }

    #[test]
    fn submit_sends_the_first_file_only() {
        let mut state = AppState::new();
        state.replace_selection(vec![file("first.png"), file("second.png")]);
        let picked = state.begin_upload().unwrap();
        assert_eq!(picked.name, "first.png");
        assert!(state.is_loading());
    }

    #[test]
    fn overlapping_submit_is_refused() {
        let mut state = AppState::new();
        state.replace_selection(vec![file("a.png")]);
        state.begin_upload().unwrap();
        assert_eq!(state.begin_upload(), Err(SubmitError::UploadInFlight));
    }

    #[test]
    fn success_stores_text_byte_exact() {
        let mut state = AppState::new();
        state.replace_selection(vec![file("a.png")]);
        state.begin_upload().unwrap();
        state.finish_upload(Ok("  HELLO \n".into()));
        assert_eq!(state.result_text(), Some("  HELLO \n"));
        // Reading the result twice yields the same bytes (copy idempotence).
        assert_eq!(state.result_text(), Some("  HELLO \n"));
    }

    #[test]
    fn failure_shows_no_result() {
        let mut state = AppState::new();
        state.replace_selection(vec![file("a.png")]);
        state.begin_upload().unwrap();
        state.finish_upload(Err("server returned 500".into()));
        assert_eq!(state.result_text(), None);
        assert_eq!(state.failure_message(), Some("server returned 500"));
        assert!(!state.is_loading());
    }

    #[test]
    fn reselection_keeps_the_previous_result() {
        let mut state = AppState::new();
        state.replace_selection(vec![file("a.png")]);
        state.begin_upload().unwrap();
        state.finish_upload(Ok("ABC123".into()));
        state.replace_selection(vec![file("b.png")]);
        assert_eq!(state.result_text(), Some("ABC123"));
    }

    #[test]
    fn retry_after_failure_is_allowed() {
        let mut state = AppState::new();
        state.replace_selection(vec![file("a.png")]);
        state.begin_upload().unwrap();
        state.finish_upload(Err("timed out".into()));
        assert!(state.begin_upload().is_ok());
    }

    #[test]
    fn mime_detection() {
        assert_eq!(detect_mime("scan.JPG"), "image/jpeg");
        assert_eq!(detect_mime("photo.png"), "image/png");
        assert_eq!(detect_mime("notes.txt"), "application/octet-stream");
    }

    #[test]
    fn image_name_filter() {
        assert!(is_image_name("receipt.jpeg"));
        assert!(is_image_name("anim.webp"));
        assert!(!is_image_name("document.pdf"));
        assert!(!is_image_name("no_extension"));
    }
}
