// Game-event mode: batch mod events, narrate one batch at a time, play clips in order

use super::{Cue, Pipeline};
use crate::error::{Result, mentions_rate_limit};
use crate::events::{GameEvent, watch_events};
use crate::playback::PlaybackItem;
use crate::storage::timestamped_name;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

impl Pipeline {
    /// Watch the events file and narrate until the task is cancelled
    pub async fn run_events(self: Arc<Self>) -> Result<()> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<GameEvent>();
        let (cue_tx, mut cue_rx) = mpsc::unbounded_channel::<Cue>();

        let watcher = tokio::spawn(watch_events(
            self.narrator.events_file().to_path_buf(),
            self.settings.check_interval,
            event_tx,
        ));

        let player = self.clone();
        tokio::spawn(async move {
            info!("Audio playback pipeline started");
            // One cue at a time, in the order they were produced
            while let Some(cue) = cue_rx.recv().await {
                player.perform(cue).await;
                info!("Audio playback completed");
            }
        });

        let mut batch: Vec<GameEvent> = Vec::new();
        while let Some(event) = event_rx.recv().await {
            batch.push(event);
            while let Ok(more) = event_rx.try_recv() {
                batch.push(more);
            }

            if batch.len() < self.settings.min_batch {
                info!("Waiting for more events ({}/{})", batch.len(), self.settings.min_batch);
                continue;
            }

            // Generation runs inline, so only one is ever in flight; new events queue up meanwhile
            let events = std::mem::take(&mut batch);
            if let Some(cue) = self.prepare_events(&events).await {
                if cue_tx.send(cue).is_err() {
                    break;
                }
            }
        }

        match watcher.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Event watcher ended: {}", e);
                Ok(())
            }
        }
    }

    /// Narrate a batch of events into a playable cue
    pub async fn prepare_events(&self, events: &[GameEvent]) -> Option<Cue> {
        info!("Generating narration for {} event(s)", events.len());

        // Prefer the receiver's full recent history over just the new batch
        let raw = match tokio::fs::read_to_string(self.narrator.events_file()).await {
            Ok(raw) if !raw.trim().is_empty() => raw,
            _ => serde_json::to_string(events).ok()?,
        };
        if let Err(e) = self.narrator.ingest_events(&raw).await {
            warn!("Could not ingest events: {}", e);
            return None;
        }

        let result = match self.narrator.describe_for_narration(0, true).await {
            Ok(result) => result,
            Err(e) if e.is_rate_limit() => return self.cooldown(),
            Err(e) => {
                warn!("Error generating narration: {}", e);
                return None;
            }
        };

        if mentions_rate_limit(&result.narration) {
            return self.cooldown();
        }
        info!("Narration: {}", result.narration);

        let clip = match self
            .narrator
            .speak(&result.narration, &timestamped_name("narration", "mp3"))
            .await
        {
            Ok(path) => Some(path),
            Err(e) if e.is_rate_limit() => return self.cooldown(),
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                None
            }
        };

        let sfx_path = match &result.sfx {
            Some(sfx) => {
                info!("SFX selected: {} (query: {})", sfx.title, sfx.query);
                match self
                    .narrator
                    .sounds()
                    .download_cached(sfx, &self.settings.sfx_cache_dir)
                    .await
                {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!("SFX download failed: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        self.cue_for(result.narration, clip, sfx_path)
    }

    fn cooldown(&self) -> Option<Cue> {
        warn!("Rate limit detected - playing cooldown audio");
        let path = &self.settings.cooldown_audio;
        if path.exists() {
            Some(Cue::Play(PlaybackItem::new(path.clone(), None)))
        } else {
            warn!("Cooldown audio not found: {}", path.display());
            None
        }
    }
}
