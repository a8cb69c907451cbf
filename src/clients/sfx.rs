//! Sound effect search and download (MyInstants)
//!
//! Sounds are sourced from MyInstants.com through the community API at
//! https://github.com/abdipr/myinstants-api and used with attribution.

use super::{build_http_client, check_status};
use crate::config::SfxConfig;
use crate::error::{NarratorError, Result};
use crate::storage::sanitize_filename;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// A sound effect search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfxInfo {
    pub title: String,
    pub mp3: String,
    pub query: String,
}

#[async_trait]
pub trait SoundSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SfxInfo>>;

    /// Fetch a clip to `path`
    async fn download(&self, url: &str, path: &Path) -> Result<PathBuf>;

    /// Fetch a clip into `cache_dir`, reusing a previous download of the same title
    async fn download_cached(&self, sfx: &SfxInfo, cache_dir: &Path) -> Result<PathBuf> {
        let path = cache_dir.join(format!("{}.mp3", sanitize_filename(&sfx.title)));
        if path.exists() {
            info!("Using cached SFX: {}", path.display());
            return Ok(path);
        }

        tokio::fs::create_dir_all(cache_dir).await?;
        info!("Downloading new SFX: {}", sfx.title);
        self.download(&sfx.mp3, &path).await
    }
}

pub struct MyInstantsClient {
    search_client: reqwest::Client,
    download_client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: Option<String>,
    sound: Option<String>,
}

impl MyInstantsClient {
    pub fn new(config: &SfxConfig) -> Result<Self> {
        Ok(Self {
            search_client: build_http_client(Duration::from_secs(config.search_timeout_secs))?,
            download_client: build_http_client(Duration::from_secs(config.download_timeout_secs))?,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl SoundSearch for MyInstantsClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SfxInfo>> {
        let limit_param = limit.to_string();
        let response = self
            .search_client
            .get(&self.endpoint)
            .query(&[("query", query), ("limit", limit_param.as_str())])
            .send()
            .await?;

        let response: SearchResponse = check_status("myinstants", response).await?.json().await?;
        debug!("SFX search '{}' returned {} hit(s)", query, response.results.len());

        Ok(response
            .results
            .into_iter()
            .take(limit)
            .map(|hit| SfxInfo {
                title: hit.title.unwrap_or_else(|| "Unknown".to_string()),
                mp3: hit.sound.unwrap_or_default(),
                query: query.to_string(),
            })
            .collect())
    }

    async fn download(&self, url: &str, path: &Path) -> Result<PathBuf> {
        if url.is_empty() {
            return Err(NarratorError::NoData("sound effect has no mp3 url".into()));
        }

        let response = self.download_client.get(url).send().await?;
        let bytes = check_status("myinstants", response).await?.bytes().await?;
        tokio::fs::write(path, &bytes).await?;

        debug!("Saved {} bytes of SFX to {}", bytes.len(), path.display());
        Ok(path.to_path_buf())
    }
}
