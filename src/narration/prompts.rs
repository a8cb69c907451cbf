// Prompt text for the vision/language model

use super::keyword::SFX_KEYWORDS;

const COMMENTATOR: &str = "Generate ONE sentence of funny, sarcastic sports-commentator-style narration about what's happening.";

/// Which inputs are available for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// Two or more screenshots, oldest first, possibly with game events
    Sequence { with_events: bool },
    /// A single screenshot, possibly with game events
    Single { with_events: bool },
    /// Game events only
    EventsOnly,
}

impl InputShape {
    pub fn from_counts(images: usize, has_events: bool) -> Option<Self> {
        match images {
            0 if has_events => Some(InputShape::EventsOnly),
            0 => None,
            1 => Some(InputShape::Single {
                with_events: has_events,
            }),
            _ => Some(InputShape::Sequence {
                with_events: has_events,
            }),
        }
    }
}

/// Prompt for a plain 1-2 sentence description
pub fn describe(shape: InputShape, events: &str) -> String {
    match shape {
        InputShape::Sequence { with_events: true } => format!(
            "In 1-2 sentences, describe in detail what is happening by combining:\n\
             1. In sequence the visuals of the screenshots (first is oldest, last is newest)\n\
             2. Minecraft gameplay events: {events}\n\n\
             Connect the on-screen activity with the in-game actions to tell a cohesive story."
        ),
        InputShape::Sequence { with_events: false } => {
            "In 1-2 sentences, describe what is happening within these screenshots as a sequence in detail (first is oldest, last is newest).".to_string()
        }
        InputShape::Single { with_events } => {
            let mut prompt =
                "In 1-2 sentences, describe what is happening in this screenshot in detail.".to_string();
            if with_events {
                prompt.push_str(&format!("\n\nMinecraft events: {events}"));
            }
            prompt
        }
        InputShape::EventsOnly => format!(
            "In 1-2 sentences, describe what is happening based on these Minecraft events: {events}"
        ),
    }
}

/// Prompt for the combined narration + sound effect keyword request
pub fn describe_for_narration(shape: InputShape, events: &str) -> String {
    let subject = match shape {
        InputShape::Sequence { with_events: true } => format!(
            "Analyze these screenshots (first is oldest, last is newest) and Minecraft events: {events}"
        ),
        InputShape::Sequence { with_events: false } => {
            "Analyze these screenshots (first is oldest, last is newest).".to_string()
        }
        InputShape::Single { with_events: true } => {
            format!("Analyze this screenshot and Minecraft events: {events}")
        }
        InputShape::Single { with_events: false } => "Analyze this screenshot.".to_string(),
        InputShape::EventsOnly => format!("Based on these Minecraft events: {events}"),
    };

    format!(
        "{subject}\n\n\
         {COMMENTATOR}\n\
         Then suggest ONE sound effect keyword that would be funny with this narration.\n\n\
         Respond in JSON format:\n\
         {{\"narration\": \"your funny narration here\", \"sfx_keyword\": \"keyword\"}}\n\n\
         Sound effect keywords: {}",
        SFX_KEYWORDS.join(", ")
    )
}

pub fn narrate(description: &str) -> String {
    format!(
        "Based on this description: '{description}'\n\n\
         Generate ONE sentence of funny, sarcastic sports-commentator-style narration. Be creative and entertaining!"
    )
}

pub fn summarize(narrations: &[String]) -> String {
    let numbered: Vec<String> = narrations
        .iter()
        .enumerate()
        .map(|(i, n)| format!("{}. {}", i + 1, n))
        .collect();

    format!(
        "Summarize these {} narrations into ONE concise, funny sentence that captures the key action:\n\n\
         {}\n\n\
         Keep the sarcastic sports-commentator style. ONE sentence only!",
        narrations.len(),
        numbered.join("\n")
    )
}
