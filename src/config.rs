//! Configuration file support for the narrator

use crate::error::{NarratorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Name of the config file looked up in the working and home directories
pub const CONFIG_FILE_NAME: &str = "narrator.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarratorConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,
    #[serde(default)]
    pub sfx: SfxConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub minecraft: MinecraftConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding screenshots, narration clips and the events file
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    /// Screenshots kept after each capture
    #[serde(default = "default_max_screenshots")]
    pub max_screenshots: usize,

    /// Narration clips kept before each new synthesis
    #[serde(default = "default_max_audio")]
    pub max_audio: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Usually supplied through GEMINI_API_KEY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    /// Usually supplied through ELEVENLABS_API_KEY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_elevenlabs_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_tts_model")]
    pub model: String,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SfxConfig {
    #[serde(default = "default_sfx_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_sfx_limit")]
    pub default_limit: usize,

    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,

    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Seconds between screenshots
    #[serde(default = "default_capture_interval")]
    pub interval_secs: u64,

    /// Screenshots sent to the model per narration
    #[serde(default = "default_image_count")]
    pub image_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinecraftConfig {
    /// Overrides `<storage.dir>/minecraft_data.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_file: Option<PathBuf>,

    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Events collected before a narration is generated
    #[serde(default = "default_min_batch")]
    pub min_batch: usize,

    /// Pick the explicit cooldown clip instead of the family-friendly one
    #[serde(default = "default_explicit")]
    pub explicit: bool,

    #[serde(default = "default_cooldown_explicit")]
    pub cooldown_explicit: PathBuf,

    #[serde(default = "default_cooldown_nice")]
    pub cooldown_nice: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Sound effects are cut off after this many seconds
    #[serde(default = "default_sfx_max_secs")]
    pub sfx_max_secs: f64,

    /// Pause after each item so players fully release the device
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

// Defaults

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./screenshots")
}

fn default_max_screenshots() -> usize {
    5
}

fn default_max_audio() -> usize {
    2
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_elevenlabs_endpoint() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_voice_id() -> String {
    // "Adam"
    "pNInz6obpgDQGcFmaJgB".to_string()
}

fn default_tts_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_sfx_endpoint() -> String {
    "https://api.myinstants.com/v1/instants/search".to_string()
}

fn default_sfx_limit() -> usize {
    3
}

fn default_search_timeout() -> u64 {
    5
}

fn default_download_timeout() -> u64 {
    10
}

fn default_capture_interval() -> u64 {
    10
}

fn default_image_count() -> usize {
    2
}

fn default_check_interval() -> u64 {
    2
}

fn default_min_batch() -> usize {
    5
}

fn default_explicit() -> bool {
    true
}

fn default_cooldown_explicit() -> PathBuf {
    PathBuf::from("./Resources/CoolDownAudios/CoolDown_explicit.mp3")
}

fn default_cooldown_nice() -> PathBuf {
    PathBuf::from("./Resources/CoolDownAudios/CoolDown_nice.mp3")
}

fn default_sfx_max_secs() -> f64 {
    5.0
}

fn default_settle_ms() -> u64 {
    300
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            max_screenshots: default_max_screenshots(),
            max_audio: default_max_audio(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_gemini_endpoint(),
            model: default_gemini_model(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_elevenlabs_endpoint(),
            voice_id: default_voice_id(),
            model: default_tts_model(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for SfxConfig {
    fn default() -> Self {
        Self {
            endpoint: default_sfx_endpoint(),
            default_limit: default_sfx_limit(),
            search_timeout_secs: default_search_timeout(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_capture_interval(),
            image_count: default_image_count(),
        }
    }
}

impl Default for MinecraftConfig {
    fn default() -> Self {
        Self {
            events_file: None,
            check_interval_secs: default_check_interval(),
            min_batch: default_min_batch(),
            explicit: default_explicit(),
            cooldown_explicit: default_cooldown_explicit(),
            cooldown_nice: default_cooldown_nice(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sfx_max_secs: default_sfx_max_secs(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl StorageConfig {
    pub fn sfx_cache_dir(&self) -> PathBuf {
        self.dir.join("sfx_cache")
    }
}

impl MinecraftConfig {
    /// Events file, relative to the storage dir unless overridden
    pub fn events_file(&self, storage_dir: &Path) -> PathBuf {
        self.events_file
            .clone()
            .unwrap_or_else(|| storage_dir.join("minecraft_data.json"))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn cooldown_audio(&self) -> &Path {
        if self.explicit {
            &self.cooldown_explicit
        } else {
            &self.cooldown_nice
        }
    }
}

impl PlaybackConfig {
    pub fn sfx_max(&self) -> Duration {
        Duration::from_secs_f64(self.sfx_max_secs.max(0.0))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl NarratorConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: NarratorConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| NarratorError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load from an explicit path, else the first config found, else defaults.
    /// Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit.map(Path::to_path_buf).or_else(find_config) {
            Some(path) => {
                info!("Loading config from: {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                info!("No {} found, using default config", CONFIG_FILE_NAME);
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply GEMINI_API_KEY, ELEVENLABS_API_KEY and SCREENSHOT_DIR overrides
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()) {
            self.gemini.api_key = Some(key);
        }
        if let Some(key) = lookup("ELEVENLABS_API_KEY").filter(|k| !k.is_empty()) {
            self.elevenlabs.api_key = Some(key);
        }
        if let Some(dir) = lookup("SCREENSHOT_DIR").filter(|d| !d.is_empty()) {
            self.storage.dir = PathBuf::from(dir);
        }
    }

    pub fn events_file(&self) -> PathBuf {
        self.minecraft.events_file(&self.storage.dir)
    }
}

fn find_config() -> Option<PathBuf> {
    // Try current directory first
    let local_config = PathBuf::from(CONFIG_FILE_NAME);
    if local_config.exists() {
        return Some(local_config);
    }

    // Then the home directory, as a dotfile
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(format!(".{}", CONFIG_FILE_NAME));
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}
