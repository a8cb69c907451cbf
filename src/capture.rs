//! Screen capture through the platform's screenshot tools

use crate::error::{NarratorError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Write a PNG of the current screen to `path`
    async fn capture(&self, path: &Path) -> Result<PathBuf>;
}

/// Shells out to `screencapture`, `scrot`, `gnome-screenshot`, `import` or PowerShell
#[derive(Debug, Default, Clone)]
pub struct SystemCapture;

#[async_trait]
impl ScreenCapture for SystemCapture {
    async fn capture(&self, path: &Path) -> Result<PathBuf> {
        for (program, args) in capture_commands(path) {
            let status = match Command::new(program).args(&args).status().await {
                Ok(status) => status,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("{} not installed", program);
                    continue;
                }
                Err(e) => {
                    warn!("Could not run {}: {}", program, e);
                    continue;
                }
            };

            if status.success() && path.exists() {
                return Ok(path.to_path_buf());
            }
            warn!("{} exited with {}", program, status);
        }

        Err(NarratorError::Capture(
            "no working screenshot command found".into(),
        ))
    }
}

fn capture_commands(path: &Path) -> Vec<(&'static str, Vec<String>)> {
    let target = path.display().to_string();

    if cfg!(target_os = "macos") {
        vec![("screencapture", vec!["-x".into(), target])]
    } else if cfg!(target_os = "windows") {
        let escaped = target.replace('\'', "''");
        vec![(
            "powershell",
            vec![
                "-WindowStyle".into(),
                "Hidden".into(),
                "-Command".into(),
                format!(
                    "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
                     $b = [System.Windows.Forms.SystemInformation]::VirtualScreen; \
                     $bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
                     $g = [System.Drawing.Graphics]::FromImage($bmp); \
                     $g.CopyFromScreen($b.Left, $b.Top, 0, 0, $bmp.Size); \
                     $bmp.Save('{}', [System.Drawing.Imaging.ImageFormat]::Png)",
                    escaped
                ),
            ],
        )]
    } else {
        vec![
            ("scrot", vec!["--overwrite".into(), target.clone()]),
            ("gnome-screenshot", vec!["-f".into(), target.clone()]),
            ("import", vec!["-window".into(), "root".into(), target]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_target_the_path() {
        let path = Path::new("/tmp/screenshot_20250101_120000.png");
        let commands = capture_commands(path);
        assert!(!commands.is_empty());
        for (_, args) in commands {
            assert!(args.iter().any(|a| a.contains("screenshot_20250101_120000.png")));
        }
    }
}
