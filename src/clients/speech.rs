//! Text-to-speech: ElevenLabs, plus the OS speech command as a fallback

use super::{build_http_client, check_status};
use crate::config::ElevenLabsConfig;
use crate::error::{NarratorError, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Something that can turn narration text into an audio file
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<PathBuf>;
}

pub struct ElevenLabsClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    voice_id: String,
    model: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabsClient {
    pub fn new(config: &ElevenLabsConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(config.timeout_secs))?,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            voice_id: config.voice_id.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<PathBuf> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| NarratorError::Config("ELEVENLABS_API_KEY is not set".into()))?;

        let url = format!("{}/v1/text-to-speech/{}", self.endpoint, self.voice_id);
        let request = SpeechRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&request)
            .send()
            .await?;
        let response = check_status("elevenlabs", response).await?;

        // Stream into a temporary name so a half-written clip is never played
        let partial = output.with_extension("part");
        let written = match stream_to_file(response, &partial).await {
            Ok(0) => Err(NarratorError::NoData("speech service returned no audio".into())),
            other => other,
        };
        let written = match written {
            Ok(written) => written,
            Err(e) => {
                tokio::fs::remove_file(&partial).await.ok();
                return Err(e);
            }
        };

        tokio::fs::rename(&partial, output).await?;
        debug!("Wrote {} bytes of speech to {}", written, output.display());
        Ok(output.to_path_buf())
    }
}

async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<usize> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0usize;

    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        written += bytes.len();
        file.write_all(&bytes).await?;
    }
    file.flush().await?;
    Ok(written)
}

/// Speaks text through the platform's own speech command.
///
/// Used when the hosted service is unavailable; nothing is written to disk.
#[derive(Debug, Default, Clone)]
pub struct SystemSpeech;

impl SystemSpeech {
    pub async fn speak(&self, text: &str) -> Result<()> {
        for (program, args) in speech_commands(text) {
            match Command::new(program).args(&args).status().await {
                Ok(status) if status.success() => {
                    info!("Spoke narration with {}", program);
                    return Ok(());
                }
                Ok(status) => {
                    warn!("{} exited with {}", program, status);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => warn!("Could not run {}: {}", program, e),
            }
        }

        Err(NarratorError::Playback("no system speech command available".into()))
    }
}

fn speech_commands(text: &str) -> Vec<(&'static str, Vec<String>)> {
    if cfg!(target_os = "macos") {
        vec![("say", vec![text.to_string()])]
    } else if cfg!(target_os = "windows") {
        let escaped = text.replace('\'', "''");
        vec![(
            "powershell",
            vec![
                "-WindowStyle".into(),
                "Hidden".into(),
                "-Command".into(),
                format!(
                    "Add-Type -AssemblyName System.Speech; \
                     (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak('{}')",
                    escaped
                ),
            ],
        )]
    } else {
        vec![
            ("espeak", vec![text.to_string()]),
            ("spd-say", vec!["--wait".into(), text.to_string()]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_request_shape() {
        let json = serde_json::to_value(SpeechRequest {
            text: "What a play",
            model_id: "eleven_multilingual_v2",
        })
        .unwrap();
        assert_eq!(json["text"], "What a play");
        assert_eq!(json["model_id"], "eleven_multilingual_v2");
    }

    #[test]
    fn test_speech_commands_pass_text() {
        let commands = speech_commands("it's over");
        assert!(!commands.is_empty());
        assert!(commands.iter().all(|(_, args)| args.iter().any(|a| a.contains("over"))));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_per_call() {
        let client = ElevenLabsClient::new(&ElevenLabsConfig::default()).unwrap();
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.mp3");

        let err = client.synthesize("hello", &output).await.unwrap_err();
        assert!(matches!(err, NarratorError::Config(_)));
        assert!(!output.exists());
    }
}
