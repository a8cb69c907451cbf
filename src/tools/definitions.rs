//! Tool definitions advertised to MCP clients

use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn tool(name: &'static str, description: &'static str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name,
        description,
        input_schema,
    }
}

fn image_source_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "image_count": {
                "type": "number",
                "description": "Number of recent screenshots to analyze (0-5, default 2)"
            },
            "include_minecraft": {
                "type": "boolean",
                "description": "Whether to include Minecraft mod data"
            }
        },
        "required": []
    })
}

/// Every tool the narrator serves, in listing order
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            "get_screenshot",
            "Gets the last two screenshots from the screenshot directory",
            json!({ "type": "object", "properties": {}, "required": [] }),
        ),
        tool(
            "get_minecraft_input",
            "Receives Minecraft mod data (events like block breaks, damage taken, etc.)",
            json!({
                "type": "object",
                "properties": {
                    "minecraft_data": {
                        "type": "string",
                        "description": "JSON string containing Minecraft events"
                    }
                },
                "required": ["minecraft_data"]
            }),
        ),
        tool(
            "describe",
            "Describes changes from screenshots and/or Minecraft mod data. At least one input required.",
            image_source_schema(),
        ),
        tool(
            "describe_for_narration",
            "Analyzes screenshots/Minecraft data, generates narration and selects a matching sound effect. Returns JSON with narration and SFX info.",
            image_source_schema(),
        ),
        tool(
            "narrate",
            "Generates funny, sarcastic narration from a description",
            json!({
                "type": "object",
                "properties": {
                    "description": {
                        "type": "string",
                        "description": "Description of what's happening"
                    }
                },
                "required": ["description"]
            }),
        ),
        tool(
            "summarize_narrations",
            "Summarizes multiple narrations into one concise sentence",
            json!({
                "type": "object",
                "properties": {
                    "narrations": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "List of narration strings to summarize"
                    }
                },
                "required": ["narrations"]
            }),
        ),
        tool(
            "tts",
            "Converts text to speech and saves it in the screenshot directory",
            json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Text to convert to speech"
                    },
                    "output_file": {
                        "type": "string",
                        "description": "Output filename (e.g., 'narration.mp3')"
                    }
                },
                "required": ["text", "output_file"]
            }),
        ),
        tool(
            "get_sfx",
            "Search for sound effects. Returns JSON with title, mp3 URL, and search query.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query for sound effect (e.g., 'bruh', 'explosion', 'laugh')"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of results (default 3)"
                    }
                },
                "required": ["query"]
            }),
        ),
    ]
}
