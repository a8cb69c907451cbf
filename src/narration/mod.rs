//! Narration: prompts, keyword extraction and the narrator operations

pub mod keyword;
pub mod narrator;
pub mod prompts;

pub use keyword::{ParsedNarration, parse_narration_response, sfx_query_from_narration};
pub use narrator::{NarrationResult, Narrator};
