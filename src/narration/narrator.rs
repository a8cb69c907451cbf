// Narrator - the operations exposed as tools and driven by the pipelines

use super::keyword::parse_narration_response;
use super::prompts::{self, InputShape};
use crate::clients::{
    ElevenLabsClient, GeminiClient, MyInstantsClient, Part, SfxInfo, SoundSearch,
    SpeechSynthesizer, VisionModel,
};
use crate::config::NarratorConfig;
use crate::error::{NarratorError, Result};
use crate::storage::{AUDIO_PATTERN, SCREENSHOT_PATTERN, Storage, encode_image};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Narration text together with the sound effect chosen for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationResult {
    pub narration: String,
    pub sfx: Option<SfxInfo>,
}

pub struct Narrator {
    model: Arc<dyn VisionModel>,
    speech: Arc<dyn SpeechSynthesizer>,
    sounds: Arc<dyn SoundSearch>,
    storage: Storage,
    events_file: PathBuf,
    max_screenshots: usize,
    max_audio: usize,
    last_events: Mutex<Option<Value>>,
}

impl Narrator {
    pub fn new(
        storage: Storage,
        model: Arc<dyn VisionModel>,
        speech: Arc<dyn SpeechSynthesizer>,
        sounds: Arc<dyn SoundSearch>,
    ) -> Self {
        let events_file = storage.path("minecraft_data.json");
        Self {
            model,
            speech,
            sounds,
            storage,
            events_file,
            max_screenshots: 5,
            max_audio: 2,
            last_events: Mutex::new(None),
        }
    }

    /// Build the narrator with the hosted clients described by `config`
    pub fn from_config(config: &NarratorConfig) -> Result<Self> {
        let storage = Storage::new(&config.storage.dir)?;
        let model = Arc::new(GeminiClient::new(&config.gemini)?);
        let speech = Arc::new(ElevenLabsClient::new(&config.elevenlabs)?);
        let sounds = Arc::new(MyInstantsClient::new(&config.sfx)?);

        Ok(Self::new(storage, model, speech, sounds)
            .with_events_file(config.events_file())
            .with_retention(config.storage.max_screenshots, config.storage.max_audio))
    }

    pub fn with_events_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.events_file = path.into();
        self
    }

    pub fn with_retention(mut self, max_screenshots: usize, max_audio: usize) -> Self {
        self.max_screenshots = max_screenshots;
        self.max_audio = max_audio;
        self
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn sounds(&self) -> &Arc<dyn SoundSearch> {
        &self.sounds
    }

    pub fn events_file(&self) -> &Path {
        &self.events_file
    }

    /// Apply screenshot retention and return the newest two screenshots
    pub fn screenshots(&self) -> Result<Vec<PathBuf>> {
        self.storage.prune(SCREENSHOT_PATTERN, self.max_screenshots)?;
        self.storage.latest(SCREENSHOT_PATTERN, 2)
    }

    /// Store game event data and report how it relates to the previous batch
    pub async fn ingest_events(&self, raw: &str) -> Result<String> {
        let current: Value = serde_json::from_str(raw)?;
        tokio::fs::write(&self.events_file, serde_json::to_vec(&current)?).await?;

        let mut last = self.last_events.lock().await;
        let report = match last.as_ref() {
            Some(previous) => format!("\nPrevious: {}\nCurrent: {}", previous, current),
            None => format!("\nFirst data: {}", current),
        };
        *last = Some(current);

        Ok(format!("Minecraft data received{}", report))
    }

    /// Describe what happened in 1-2 sentences
    pub async fn describe(&self, image_count: usize, include_events: bool) -> Result<String> {
        let (shape, parts) = self.gather(image_count, include_events, prompts::describe).await?;
        debug!("Describing with {:?}", shape);
        self.model.generate(&parts).await
    }

    /// One sarcastic sentence about a description
    pub async fn narrate(&self, description: &str) -> Result<String> {
        self.model
            .generate(&[Part::text(prompts::narrate(description))])
            .await
    }

    /// Narration and sound effect from a single model call plus one search
    pub async fn describe_for_narration(
        &self,
        image_count: usize,
        include_events: bool,
    ) -> Result<NarrationResult> {
        let (shape, parts) = self
            .gather(image_count, include_events, prompts::describe_for_narration)
            .await?;
        debug!("Narrating with {:?}", shape);

        let reply = self.model.generate(&parts).await?;
        let parsed = parse_narration_response(&reply);

        let sfx = match self.sounds.search(&parsed.sfx_keyword, 1).await {
            Ok(hits) => hits.into_iter().next(),
            Err(e) => {
                warn!("SFX search for '{}' failed: {}", parsed.sfx_keyword, e);
                None
            }
        };

        Ok(NarrationResult {
            narration: parsed.narration,
            sfx,
        })
    }

    /// Condense several narrations into one sentence
    pub async fn summarize(&self, narrations: &[String]) -> Result<String> {
        match narrations {
            [] => Err(NarratorError::NoData("no narrations to summarize".into())),
            [only] => Ok(only.clone()),
            many => {
                self.model
                    .generate(&[Part::text(prompts::summarize(many))])
                    .await
            }
        }
    }

    pub async fn search_sfx(&self, query: &str, limit: usize) -> Result<Vec<SfxInfo>> {
        self.sounds.search(query, limit).await
    }

    /// Synthesize `text` into `file_name` inside the storage dir
    pub async fn speak(&self, text: &str, file_name: &str) -> Result<PathBuf> {
        self.storage.prune(AUDIO_PATTERN, self.max_audio)?;

        let output = self.storage.path(file_name);
        let path = self.speech.synthesize(text, &output).await?;
        info!("Audio saved to {}", path.display());
        Ok(path)
    }

    async fn gather(
        &self,
        image_count: usize,
        include_events: bool,
        build_prompt: fn(InputShape, &str) -> String,
    ) -> Result<(InputShape, Vec<Part>)> {
        let screenshots = if image_count > 0 {
            self.storage.latest(SCREENSHOT_PATTERN, image_count)?
        } else {
            Vec::new()
        };

        let events = if include_events {
            self.current_events().await
        } else {
            None
        };
        let events_text = events.map(|e| e.to_string()).unwrap_or_default();

        let shape = InputShape::from_counts(screenshots.len(), !events_text.is_empty())
            .ok_or_else(|| {
                NarratorError::NoData("Need screenshots or Minecraft data.".into())
            })?;

        let mut parts = vec![Part::text(build_prompt(shape, &events_text))];
        // Oldest first
        for path in screenshots.iter().rev() {
            parts.push(Part::Image(encode_image(path)?));
        }

        Ok((shape, parts))
    }

    /// Latest event data: what was ingested, else whatever the events file holds
    async fn current_events(&self) -> Option<Value> {
        if let Some(events) = self.last_events.lock().await.clone() {
            return Some(events);
        }

        let raw = tokio::fs::read_to_string(&self.events_file).await.ok()?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) if items.is_empty() => None,
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unreadable events file {}: {}", self.events_file.display(), e);
                None
            }
        }
    }
}
