// Tool dispatch onto the narrator

use crate::error::{NarratorError, Result};
use crate::narration::Narrator;
use serde::Serialize;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const MAX_IMAGE_COUNT: usize = 5;

/// Text blocks returned by a tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub content: Vec<String>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![text.into()],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![text.into()],
            is_error: true,
        }
    }

    /// First text block, which is the whole answer for every tool but `get_screenshot`
    pub fn first_text(&self) -> &str {
        self.content.first().map(String::as_str).unwrap_or("")
    }

    /// MCP `tools/call` result
    pub fn to_mcp(&self) -> Value {
        let content: Vec<Value> = self
            .content
            .iter()
            .map(|text| json!({ "type": "text", "text": text }))
            .collect();
        json!({ "content": content, "isError": self.is_error })
    }
}

/// Routes tool calls by name to the narrator operations
#[derive(Clone)]
pub struct ToolRouter {
    narrator: Arc<Narrator>,
    default_sfx_limit: usize,
}

impl ToolRouter {
    pub fn new(narrator: Arc<Narrator>) -> Self {
        Self {
            narrator,
            default_sfx_limit: 3,
        }
    }

    pub fn with_default_sfx_limit(mut self, limit: usize) -> Self {
        self.default_sfx_limit = limit;
        self
    }

    pub fn narrator(&self) -> &Arc<Narrator> {
        &self.narrator
    }

    /// Run a tool. Failures come back as error output rather than `Err`.
    pub async fn call(&self, name: &str, args: &Value) -> ToolOutput {
        info!("Tool call: {}", name);

        let result = match name {
            "get_screenshot" => self.get_screenshot(),
            "get_minecraft_input" => self.get_minecraft_input(args).await,
            "describe" => self.describe(args).await,
            "describe_for_narration" => self.describe_for_narration(args).await,
            "narrate" => self.narrate(args).await,
            "summarize_narrations" => self.summarize_narrations(args).await,
            "tts" => self.tts(args).await,
            "get_sfx" => self.get_sfx(args).await,
            _ => return ToolOutput::error(format!("Unknown tool: {}", name)),
        };

        result.unwrap_or_else(|e| {
            warn!("Tool {} failed: {}", name, e);
            match e {
                NarratorError::NoData(_) if name.starts_with("describe") => {
                    ToolOutput::error("No data available. Need screenshots or Minecraft data.")
                }
                other => ToolOutput::error(format!("Error: {}", other)),
            }
        })
    }

    fn get_screenshot(&self) -> Result<ToolOutput> {
        let screenshots = self.narrator.screenshots()?;
        if screenshots.is_empty() {
            return Ok(ToolOutput::text("No screenshots found"));
        }

        let mut content = vec![format!("Found {} screenshot(s)", screenshots.len())];
        for path in &screenshots {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            content.push(format!("Screenshot: {}", name));
        }

        Ok(ToolOutput {
            content,
            is_error: false,
        })
    }

    async fn get_minecraft_input(&self, args: &Value) -> Result<ToolOutput> {
        let raw = args
            .get("minecraft_data")
            .and_then(Value::as_str)
            .unwrap_or("{}");

        match self.narrator.ingest_events(raw).await {
            Ok(report) => Ok(ToolOutput::text(report)),
            Err(NarratorError::Json(_)) => Ok(ToolOutput::error("Invalid JSON data")),
            Err(e) => Err(e),
        }
    }

    async fn describe(&self, args: &Value) -> Result<ToolOutput> {
        let (image_count, include_events) = image_source_args(args);
        let description = self.narrator.describe(image_count, include_events).await?;
        Ok(ToolOutput::text(description))
    }

    async fn describe_for_narration(&self, args: &Value) -> Result<ToolOutput> {
        let (image_count, include_events) = image_source_args(args);
        let result = self
            .narrator
            .describe_for_narration(image_count, include_events)
            .await?;
        Ok(ToolOutput::text(serde_json::to_string(&result)?))
    }

    async fn narrate(&self, args: &Value) -> Result<ToolOutput> {
        let description = required_str(args, "description")?;
        Ok(ToolOutput::text(self.narrator.narrate(description).await?))
    }

    async fn summarize_narrations(&self, args: &Value) -> Result<ToolOutput> {
        let narrations: Vec<String> = args
            .get("narrations")
            .and_then(Value::as_array)
            .ok_or_else(|| missing("narrations"))?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();

        Ok(ToolOutput::text(self.narrator.summarize(&narrations).await?))
    }

    async fn tts(&self, args: &Value) -> Result<ToolOutput> {
        let text = required_str(args, "text")?;
        let output_file = args
            .get("output_file")
            .and_then(Value::as_str)
            .unwrap_or("narration.mp3");

        // Only bare file names; output always lands in the storage dir
        let is_bare_name = Path::new(output_file)
            .file_name()
            .is_some_and(|n| n == output_file);
        if !is_bare_name {
            return Err(NarratorError::Other(format!(
                "output_file must be a plain file name, got '{}'",
                output_file
            )));
        }

        self.narrator.speak(text, output_file).await?;
        Ok(ToolOutput::text(format!("Audio saved to {}", output_file)))
    }

    async fn get_sfx(&self, args: &Value) -> Result<ToolOutput> {
        let query = required_str(args, "query")?;
        let limit = args
            .get("limit")
            .and_then(Value::as_u64)
            .map(|l| l as usize)
            .unwrap_or(self.default_sfx_limit);

        match self.narrator.search_sfx(query, limit).await {
            Ok(hits) if hits.is_empty() => Ok(ToolOutput::text(format!(
                "No sound effects found for '{}'",
                query
            ))),
            Ok(hits) => Ok(ToolOutput::text(serde_json::to_string(&hits)?)),
            Err(e) => Ok(ToolOutput::error(format!(
                "Error searching sound effects: {}",
                e
            ))),
        }
    }
}

fn image_source_args(args: &Value) -> (usize, bool) {
    let image_count = args
        .get("image_count")
        .and_then(Value::as_f64)
        .map(|n| n.max(0.0) as usize)
        .unwrap_or(2)
        .min(MAX_IMAGE_COUNT);
    let include_events = args
        .get("include_minecraft")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    (image_count, include_events)
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key).and_then(Value::as_str).ok_or_else(|| missing(key))
}

fn missing(key: &str) -> NarratorError {
    NarratorError::Other(format!("Missing required argument: {}", key))
}
