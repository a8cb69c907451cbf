//! Capture → narrate → speak → play loops
//!
//! Every step is best effort: a failed call is logged and the loop moves on.

mod game;
mod screen;

use crate::clients::SystemSpeech;
use crate::config::NarratorConfig;
use crate::narration::Narrator;
use crate::playback::{AudioPlayer, PlaybackItem, play_item};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Timing and file locations used by the loops
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub capture_interval: Duration,
    pub image_count: usize,
    pub check_interval: Duration,
    pub min_batch: usize,
    pub cooldown_audio: PathBuf,
    pub sfx_cache_dir: PathBuf,
    pub sfx_max: Duration,
    pub settle: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &NarratorConfig) -> Self {
        Self {
            capture_interval: Duration::from_secs(config.capture.interval_secs.max(1)),
            image_count: config.capture.image_count,
            check_interval: config.minecraft.check_interval(),
            min_batch: config.minecraft.min_batch.max(1),
            cooldown_audio: config.minecraft.cooldown_audio().to_path_buf(),
            sfx_cache_dir: config.storage.sfx_cache_dir(),
            sfx_max: config.playback.sfx_max(),
            settle: config.playback.settle(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&NarratorConfig::default())
    }
}

/// Something ready for the speakers
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    Play(PlaybackItem),
    /// Spoken by the system speech command when no clip could be made
    Speak { text: String, sfx: Option<PathBuf> },
}

pub struct Pipeline {
    narrator: Arc<Narrator>,
    player: Arc<dyn AudioPlayer>,
    fallback: Option<SystemSpeech>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        narrator: Arc<Narrator>,
        player: Arc<dyn AudioPlayer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            narrator,
            player,
            fallback: Some(SystemSpeech),
            settings,
        }
    }

    /// Drop the system speech fallback; failed syntheses are then skipped
    pub fn without_fallback_speech(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn narrator(&self) -> &Arc<Narrator> {
        &self.narrator
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Play or speak a cue, logging failures
    pub async fn perform(&self, cue: Cue) {
        match cue {
            Cue::Play(item) => {
                if let Err(e) = play_item(
                    self.player.as_ref(),
                    &item,
                    self.settings.sfx_max,
                    self.settings.settle,
                )
                .await
                {
                    warn!("Error playing audio: {}", e);
                }
            }
            Cue::Speak { text, sfx } => {
                if let Some(speech) = &self.fallback {
                    if let Err(e) = speech.speak(&text).await {
                        warn!("System speech failed: {}", e);
                    }
                }
                if let Some(sfx) = sfx {
                    if let Err(e) = self.player.play(&sfx, Some(self.settings.sfx_max)).await {
                        warn!("Sound effect playback failed: {}", e);
                    }
                }
                tokio::time::sleep(self.settings.settle).await;
            }
        }
    }

    /// Turn synthesized speech (or its failure) into a cue
    fn cue_for(&self, text: String, clip: Option<PathBuf>, sfx: Option<PathBuf>) -> Option<Cue> {
        match clip {
            Some(narration) => Some(Cue::Play(PlaybackItem::new(narration, sfx))),
            None if self.fallback.is_some() => Some(Cue::Speak { text, sfx }),
            None => None,
        }
    }
}
