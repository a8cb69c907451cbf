// Screen mode: screenshot every interval, narrate in the background, play batched summaries

use super::{Cue, Pipeline};
use crate::capture::ScreenCapture;
use crate::error::Result;
use crate::narration::NarrationResult;
use crate::storage::timestamped_name;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

impl Pipeline {
    /// Capture and narrate until the task is cancelled
    pub async fn run_screen(self: Arc<Self>, capture: Arc<dyn ScreenCapture>) -> Result<()> {
        let (tx, rx) = mpsc::unbounded_channel::<NarrationResult>();
        let worker = tokio::spawn(self.clone().screen_audio_worker(rx));

        let mut ticker = tokio::time::interval(self.settings.capture_interval);
        let mut captured = 0usize;

        loop {
            ticker.tick().await;

            let path = self.narrator.storage().timestamped("screenshot", "png");
            match capture.capture(&path).await {
                Ok(path) => {
                    captured += 1;
                    info!("Screenshot saved: {}", path.display());
                }
                Err(e) => {
                    warn!("Screenshot failed: {}", e);
                    continue;
                }
            }

            if worker.is_finished() {
                warn!("Audio worker stopped; no more narration will play");
                return Ok(());
            }

            // Need a before and after
            if captured < 2 {
                continue;
            }

            let include_events = self.narrator.events_file().exists();
            let pipeline = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(result) = pipeline.narrate_screens(include_events).await {
                    let _ = tx.send(result);
                }
            });
        }
    }

    /// Retention, then one combined narration + SFX call
    pub async fn narrate_screens(&self, include_events: bool) -> Option<NarrationResult> {
        if let Err(e) = self.narrator.screenshots() {
            warn!("Screenshot cleanup failed: {}", e);
        }

        match self
            .narrator
            .describe_for_narration(self.settings.image_count, include_events)
            .await
        {
            Ok(result) => {
                let sfx = result.sfx.as_ref().map(|s| s.query.as_str()).unwrap_or("none");
                info!("Narration queued: {} (SFX: {})", result.narration, sfx);
                Some(result)
            }
            Err(e) => {
                warn!("Error generating narration: {}", e);
                None
            }
        }
    }

    async fn screen_audio_worker(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<NarrationResult>) {
        while let Some(first) = rx.recv().await {
            // Everything that piled up while the last clip played becomes one summary
            let mut batch = vec![first];
            while let Ok(more) = rx.try_recv() {
                batch.push(more);
            }

            if let Some(cue) = self.prepare_batch(batch).await {
                self.perform(cue).await;
                info!("Audio playback completed");
            }
        }
    }

    /// Summarize a batch of narrations, synthesize it and fetch the batch's sound effect
    pub async fn prepare_batch(&self, batch: Vec<NarrationResult>) -> Option<Cue> {
        let last = batch.last()?.narration.clone();
        let sfx = batch.iter().find_map(|r| r.sfx.clone());
        let narrations: Vec<String> = batch.into_iter().map(|r| r.narration).collect();

        info!("Summarizing {} narration(s) into one sentence", narrations.len());
        let summary = match self.narrator.summarize(&narrations).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summary failed, using latest narration: {}", e);
                last
            }
        };
        info!("Summary: {}", summary);

        let clip = match self
            .narrator
            .speak(&summary, &timestamped_name("narration", "mp3"))
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                None
            }
        };

        let sfx_path = match sfx {
            Some(sfx) => {
                info!("Downloading SFX: {}", sfx.title);
                let path = self.narrator.storage().timestamped("sfx", "mp3");
                match self.narrator.sounds().download(&sfx.mp3, &path).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!("Failed to download SFX: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        self.cue_for(summary, clip, sfx_path)
    }
}
