//! Clients for the hosted services the narrator delegates to

pub mod sfx;
pub mod speech;
pub mod vision;

pub use sfx::{MyInstantsClient, SfxInfo, SoundSearch};
pub use speech::{ElevenLabsClient, SpeechSynthesizer, SystemSpeech};
pub use vision::{GeminiClient, Part, VisionModel};

use crate::error::{NarratorError, Result};
use std::time::Duration;

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

/// Turn a non-success response into an error, keeping the body for diagnostics
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    if status.as_u16() == 429 {
        return Err(NarratorError::RateLimited(format!("{}: {}", service, message)));
    }

    Err(NarratorError::Api {
        service,
        status: status.as_u16(),
        message,
    })
}
