//! Verification endpoint client.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Default verification endpoint.
pub const DEFAULT_VERIFY_URL: &str = "http://localhost:5000/verify-face";

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint returned HTTP {status} without a verdict")]
    Status { status: u16 },
    #[error("unreadable response: {0}")]
    Decode(String),
}

/// One face crop to check against the subject's reference image.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    /// JPEG-encoded face crop.
    pub image_jpeg: Vec<u8>,
    /// Who is being verified (the login email).
    pub subject: String,
    /// URL of the subject's enrolled reference photo.
    pub reference_image_url: String,
}

/// Endpoint verdict for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Match,
    /// The endpoint rejected the face; `reason` is its explanation, if any.
    NoMatch { reason: Option<String> },
}

/// Something that can check a face crop. Called at most once at a time per
/// capture session.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, request: VerificationRequest) -> Result<Verdict, VerifyError>;
}

/// JSON body returned by the endpoint.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    result: String,
    #[serde(default)]
    reason: Option<String>,
}

impl VerifyResponse {
    fn verdict(self, http_ok: bool) -> Verdict {
        if http_ok && self.result == "success" {
            Verdict::Match
        } else {
            Verdict::NoMatch {
                reason: self.reason.filter(|r| !r.is_empty()),
            }
        }
    }
}

/// Posts the face crop as multipart form data.
///
/// Fields: `face_image` (file `face.jpg`, `image/jpeg`), `email`,
/// `face_img_url`.
#[derive(Debug, Clone)]
pub struct HttpVerifier {
    client: reqwest::Client,
    url: String,
}

impl HttpVerifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Verifier for HttpVerifier {
    async fn verify(&self, request: VerificationRequest) -> Result<Verdict, VerifyError> {
        let VerificationRequest {
            image_jpeg,
            subject,
            reference_image_url,
        } = request;
        let bytes = image_jpeg.len();

        let image = Part::bytes(image_jpeg)
            .file_name("face.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .part("face_image", image)
            .text("email", subject)
            .text("face_img_url", reference_image_url);

        tracing::debug!(url = %self.url, bytes, "posting face crop");
        let response = self.client.post(&self.url).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<VerifyResponse>(&body) {
            Ok(parsed) => Ok(parsed.verdict(status.is_success())),
            Err(_) if !status.is_success() => Err(VerifyError::Status {
                status: status.as_u16(),
            }),
            Err(e) => Err(VerifyError::Decode(e.to_string())),
        }
    }
}
