//! Shared fakes and helpers for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use narrator::clients::{Part, SfxInfo, SoundSearch, SpeechSynthesizer, VisionModel};
use narrator::playback::AudioPlayer;
use narrator::storage::Storage;
use narrator::{Narrator, NarratorError, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// =============================================================================
// Fake services
// =============================================================================

pub enum Reply {
    Text(String),
    RateLimited,
}

/// Model that answers from a script and records every prompt
#[derive(Default)]
pub struct FakeModel {
    replies: Mutex<VecDeque<Reply>>,
    pub calls: Mutex<Vec<Vec<Part>>>,
}

impl FakeModel {
    pub fn replying(replies: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| Reply::Text(r.to_string())).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn rate_limited() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Reply::RateLimited])),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Text of the first part of call `i`
    pub fn prompt(&self, i: usize) -> String {
        match &self.calls.lock().unwrap()[i][0] {
            Part::Text(text) => text.clone(),
            Part::Image(_) => panic!("first part is an image"),
        }
    }

    /// Base64 payloads of the images in call `i`, in request order
    pub fn images(&self, i: usize) -> Vec<String> {
        self.calls.lock().unwrap()[i]
            .iter()
            .filter_map(|p| match p {
                Part::Image(image) => Some(image.data.clone()),
                Part::Text(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl VisionModel for FakeModel {
    async fn generate(&self, parts: &[Part]) -> Result<String> {
        self.calls.lock().unwrap().push(parts.to_vec());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::RateLimited) => Err(NarratorError::RateLimited("quota exceeded".into())),
            None => Ok("A default narration.".to_string()),
        }
    }
}

/// Writes a few fake bytes instead of calling a speech service
#[derive(Default)]
pub struct FakeSpeech {
    pub fail: bool,
    pub spoken: Mutex<Vec<String>>,
}

impl FakeSpeech {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            spoken: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<PathBuf> {
        if self.fail {
            return Err(NarratorError::Api {
                service: "elevenlabs",
                status: 500,
                message: "down".into(),
            });
        }
        self.spoken.lock().unwrap().push(text.to_string());
        std::fs::write(output, b"ID3 fake mp3")?;
        Ok(output.to_path_buf())
    }
}

/// Sound search with a fixed result list
#[derive(Default)]
pub struct FakeSounds {
    pub hits: Vec<SfxInfo>,
    pub fail: bool,
    pub queries: Mutex<Vec<(String, usize)>>,
    pub downloads: Mutex<Vec<String>>,
}

impl FakeSounds {
    pub fn with_hit(title: &str) -> Arc<Self> {
        Arc::new(Self {
            hits: vec![sfx(title)],
            ..Default::default()
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }
}

pub fn sfx(title: &str) -> SfxInfo {
    SfxInfo {
        title: title.to_string(),
        mp3: format!("https://sounds.example/{}.mp3", title.to_lowercase()),
        query: "bruh".to_string(),
    }
}

#[async_trait]
impl SoundSearch for FakeSounds {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SfxInfo>> {
        self.queries.lock().unwrap().push((query.to_string(), limit));
        if self.fail {
            return Err(NarratorError::Other("search offline".into()));
        }
        Ok(self
            .hits
            .iter()
            .take(limit)
            .cloned()
            .map(|mut hit| {
                hit.query = query.to_string();
                hit
            })
            .collect())
    }

    async fn download(&self, url: &str, path: &Path) -> Result<PathBuf> {
        self.downloads.lock().unwrap().push(url.to_string());
        std::fs::write(path, b"sfx")?;
        Ok(path.to_path_buf())
    }
}

/// Records what would have been played
#[derive(Default)]
pub struct RecordingPlayer {
    pub played: Mutex<Vec<(PathBuf, Option<Duration>)>>,
}

#[async_trait]
impl AudioPlayer for RecordingPlayer {
    async fn play(&self, path: &Path, max: Option<Duration>) -> Result<()> {
        self.played.lock().unwrap().push((path.to_path_buf(), max));
        Ok(())
    }
}

// =============================================================================
// Setup helpers
// =============================================================================

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub model: Arc<FakeModel>,
    pub speech: Arc<FakeSpeech>,
    pub sounds: Arc<FakeSounds>,
    pub narrator: Arc<Narrator>,
}

pub fn fixture(model: Arc<FakeModel>, speech: Arc<FakeSpeech>, sounds: Arc<FakeSounds>) -> Fixture {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let storage = Storage::new(dir.path()).unwrap();
    let narrator = Arc::new(Narrator::new(
        storage,
        model.clone(),
        speech.clone(),
        sounds.clone(),
    ));
    Fixture {
        dir,
        model,
        speech,
        sounds,
        narrator,
    }
}

/// Create a file with content `name` and an mtime `age_secs` in the past
pub fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, name.as_bytes()).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
    path
}

// =============================================================================
// Canned HTTP server
// =============================================================================

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

pub struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Advertised length when it should differ from the body (a cut-off transfer)
    pub content_length: Option<usize>,
}

impl CannedResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: serde_json::to_vec(&body).unwrap(),
            content_length: None,
        }
    }

    pub fn bytes(body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: "audio/mpeg",
            body: body.to_vec(),
            content_length: None,
        }
    }

    /// Promise more bytes than are sent, then close the connection
    pub fn truncated(body: &[u8], advertised: usize) -> Self {
        Self {
            content_length: Some(advertised),
            ..Self::bytes(body)
        }
    }
}

/// Serve the responses in order, one connection each, and return what was requested
pub async fn canned_server(
    responses: Vec<CannedResponse>,
) -> (String, JoinHandle<Vec<RecordedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut recorded = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            recorded.push(read_request(&mut stream).await);

            let head = format!(
                "HTTP/1.1 {} Canned\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                response.status,
                response.content_type,
                response.content_length.unwrap_or(response.body.len())
            );
            stream.write_all(head.as_bytes()).await.unwrap();
            stream.write_all(&response.body).await.unwrap();
            stream.shutdown().await.ok();
        }
        recorded
    });

    (base_url, handle)
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> RecordedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    RecordedRequest {
        method,
        path,
        headers,
        body,
    }
}
