//! Game events reported by the companion mod
//!
//! An external receiver keeps the most recent events in a JSON file; this module
//! reads that file and notices when a new event arrives.

use crate::error::{NarratorError, Result};
use notify::RecursiveMode;
use notify_debouncer_full::{DebounceEventResult, new_debouncer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_source: Option<String>,
}

impl GameEvent {
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.event_type.as_deref().unwrap_or("unknown"),
            self.event_source.as_deref().unwrap_or("unknown")
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventsFile {
    Many(Vec<GameEvent>),
    One(GameEvent),
}

/// Read the events file; a missing file means no events
pub fn read_events(path: &Path) -> Result<Vec<GameEvent>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(match serde_json::from_str(&raw)? {
        EventsFile::Many(events) => events,
        EventsFile::One(event) => vec![event],
    })
}

/// Tracks the newest event already seen
#[derive(Debug, Default)]
pub struct EventCursor {
    /// Timestamp of the last event returned; `Some(None)` when it had none
    last_timestamp: Option<Option<String>>,
}

impl EventCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The newest event, if it was not returned before.
    /// An empty list resets the cursor so a fresh session starts over.
    pub fn poll(&mut self, events: &[GameEvent]) -> Option<GameEvent> {
        let Some(latest) = events.last() else {
            self.last_timestamp = None;
            return None;
        };

        if self.last_timestamp.as_ref() == Some(&latest.timestamp) {
            return None;
        }

        self.last_timestamp = Some(latest.timestamp.clone());
        Some(latest.clone())
    }
}

/// Watch the events file and forward every new event to `tx`.
///
/// Wakes on file system notifications and on every `interval` tick, so events are
/// still picked up on platforms where notifications are unreliable. Returns when
/// the receiver is dropped.
pub async fn watch_events(
    path: PathBuf,
    interval: Duration,
    tx: mpsc::UnboundedSender<GameEvent>,
) -> Result<()> {
    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<()>();

    let mut debouncer = new_debouncer(
        Duration::from_millis(200),
        None,
        move |result: DebounceEventResult| match result {
            Ok(events) if !events.is_empty() => {
                let _ = notify_tx.send(());
            }
            Ok(_) => {}
            Err(errors) => {
                for error in errors {
                    warn!("Watch error: {}", error);
                }
            }
        },
    )
    .map_err(|e| NarratorError::Other(e.to_string()))?;

    // Watch the parent: the file itself may not exist yet or be replaced on write
    let watch_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    match debouncer.watch(&watch_dir, RecursiveMode::NonRecursive) {
        Ok(()) => debug!("Watching {}", watch_dir.display()),
        Err(e) => warn!("Falling back to polling {}: {}", path.display(), e),
    }

    let mut cursor = EventCursor::new();
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            Some(()) = notify_rx.recv() => {}
        }

        if tx.is_closed() {
            return Ok(());
        }

        match read_events(&path) {
            Ok(events) => {
                if let Some(event) = cursor.poll(&events) {
                    info!("New event: {}", event.label());
                    if tx.send(event).is_err() {
                        return Ok(());
                    }
                }
            }
            // Usually a partially written file; the next wake-up will see it whole
            Err(e) => warn!("Error reading events: {}", e),
        }
    }
}
