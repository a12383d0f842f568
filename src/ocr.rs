/*
 * SPDX-License-Identifier: MIT
 */

//! Remote OCR client.
//!
//! One POST per submission: the image goes out as a single-part
//! multipart form (field name `file`), the service answers with
//! `{"string": <recognized text>}`. No retry, no backoff.

use std::time::Duration;

use serde::Deserialize;

use crate::model::SelectedFile;

const BASE_URL: &str = "https://somesh-ocr.herokuapp.com";

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
}

/// Wire shape of a successful `/upload` response.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    string: String,
}

pub struct OcrClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl OcrClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Upload one image and return the recognized text exactly as the
    /// service produced it, no trimming. Takes the file by value; the
    /// caller already works on its own clone of the selection.
    pub fn recognize(&self, file: SelectedFile) -> Result<String, OcrError> {
        log::debug!("POST {}/upload ({} bytes)", self.base_url, file.size());

        let SelectedFile { name, mime, bytes } = file;
        let part = reqwest::blocking::multipart::Part::bytes(bytes)
            .file_name(name)
            .mime_str(&mime)?;
        let form = reqwest::blocking::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()?;

        if !resp.status().is_success() {
            return Err(OcrError::Status(resp.status()));
        }

        let body: UploadResponse = resp.json()?;
        Ok(body.string)
    }
}

impl Default for OcrClient {
    fn default() -> Self {
        Self::new()
    }
}
