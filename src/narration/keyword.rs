// Sound effect keyword selection

use serde::Deserialize;

/// Keywords the model is asked to choose from
pub const SFX_KEYWORDS: &[&str] = &[
    "bruh", "laugh", "explosion", "wow", "scream", "crash", "fail", "epic", "oof", "yeet",
];

pub const DEFAULT_KEYWORD: &str = "bruh";

/// Ordered substring rules; the first rule with a hit wins
const KEYWORD_RULES: &[(&[&str], &str)] = &[
    (&["laugh", "funny", "hilarious", "laughing"], "laugh"),
    (&["died", "death", "fail", "falling", "fell"], "bruh"),
    (&["explosion", "explode", "boom", "tnt", "blew"], "explosion"),
    (&["wow", "amazing", "incredible"], "wow"),
    (&["scream", "yell", "shout"], "scream"),
    (&["crash", "smash", "break"], "crash"),
];

/// Pick a search keyword from the narration text when the model did not supply one
pub fn sfx_query_from_narration(narration: &str) -> &'static str {
    let lower = narration.to_lowercase();

    KEYWORD_RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, keyword)| *keyword)
        .unwrap_or(DEFAULT_KEYWORD)
}

/// Narration plus the sound effect keyword extracted from a model reply
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNarration {
    pub narration: String,
    pub sfx_keyword: String,
}

#[derive(Deserialize)]
struct NarrationJson {
    narration: Option<String>,
    sfx_keyword: Option<String>,
}

/// Parse a `{"narration": .., "sfx_keyword": ..}` reply, tolerating markdown fences
/// and falling back to keyword matching on the raw text.
pub fn parse_narration_response(response: &str) -> ParsedNarration {
    let body = strip_code_fence(response);

    match serde_json::from_str::<NarrationJson>(body) {
        Ok(parsed) => ParsedNarration {
            narration: parsed
                .narration
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| body.to_string()),
            sfx_keyword: parsed
                .sfx_keyword
                .filter(|k| !k.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_KEYWORD.to_string()),
        },
        Err(_) => ParsedNarration {
            narration: body.to_string(),
            sfx_keyword: sfx_query_from_narration(body).to_string(),
        },
    }
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();

    let inner = if let Some((_, rest)) = text.split_once("```json") {
        rest
    } else if let Some((_, rest)) = text.split_once("```") {
        rest
    } else {
        return text;
    };

    inner.split("```").next().unwrap_or(inner).trim()
}
