//! Sequential audio playback through the platform's command line players

use crate::error::{NarratorError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play `path` to completion, or stop after `max` if given
    async fn play(&self, path: &Path, max: Option<Duration>) -> Result<()>;
}

/// A narration clip and the sound effect that follows it
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackItem {
    pub narration: PathBuf,
    pub sfx: Option<PathBuf>,
}

impl PlaybackItem {
    pub fn new(narration: PathBuf, sfx: Option<PathBuf>) -> Self {
        Self { narration, sfx }
    }
}

/// Play the narration, then the sound effect capped at `sfx_max`, then pause for `settle`
pub async fn play_item(
    player: &dyn AudioPlayer,
    item: &PlaybackItem,
    sfx_max: Duration,
    settle: Duration,
) -> Result<()> {
    info!("Playing narration: {}", item.narration.display());
    player.play(&item.narration, None).await?;

    match &item.sfx {
        Some(sfx) => {
            info!("Playing sound effect: {} (max {:?})", sfx.display(), sfx_max);
            if let Err(e) = player.play(sfx, Some(sfx_max)).await {
                warn!("Sound effect playback failed: {}", e);
            }
        }
        None => debug!("No SFX for this narration"),
    }

    tokio::time::sleep(settle).await;
    Ok(())
}

/// Uses `afplay`, `ffplay`, `paplay`, `mpg123` or `aplay` depending on the platform
#[derive(Debug, Default, Clone)]
pub struct SystemPlayer;

#[async_trait]
impl AudioPlayer for SystemPlayer {
    async fn play(&self, path: &Path, max: Option<Duration>) -> Result<()> {
        if !path.exists() {
            warn!("Audio file not found: {}", path.display());
            return Ok(());
        }

        for (program, args) in player_commands(path, max) {
            let mut child = match Command::new(program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
            {
                Ok(child) => child,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!("Could not start {}: {}", program, e);
                    continue;
                }
            };

            debug!("Playing {} with {}", path.display(), program);
            match max {
                Some(limit) => {
                    // Players that honour `-t` get a second of slack before the kill
                    let grace = if args.iter().any(|a| a == "-t") {
                        Duration::from_secs(1)
                    } else {
                        Duration::ZERO
                    };
                    if tokio::time::timeout(limit + grace, child.wait()).await.is_err() {
                        child.kill().await?;
                        info!("Audio cut off after {:?}", limit);
                    }
                }
                None => {
                    child.wait().await?;
                }
            }
            return Ok(());
        }

        Err(NarratorError::Playback("no audio player available".into()))
    }
}

fn player_commands(path: &Path, max: Option<Duration>) -> Vec<(&'static str, Vec<String>)> {
    let file = path.display().to_string();

    if cfg!(target_os = "macos") {
        vec![("afplay", vec![file])]
    } else if cfg!(target_os = "windows") {
        vec![("ffplay", ffplay_args(file, max))]
    } else {
        vec![
            ("paplay", vec![file.clone()]),
            ("mpg123", vec!["-q".into(), file.clone()]),
            ("ffplay", ffplay_args(file.clone(), max)),
            ("aplay", vec![file]),
        ]
    }
}

fn ffplay_args(file: String, max: Option<Duration>) -> Vec<String> {
    let mut args = vec!["-nodisp".into(), "-autoexit".into(), "-loglevel".into(), "quiet".into()];
    if let Some(limit) = max {
        args.push("-t".into());
        args.push(format!("{:.1}", limit.as_secs_f64()));
    }
    args.push(file);
    args
}
