//! Narrator - sarcastic play-by-play commentary for your screen or Minecraft session
//!
//! Screenshots or game events go to a hosted vision model for a one-line narration,
//! a matching sound effect is looked up, the narration is turned into speech, and
//! both clips are played back in order. The same operations are available to other
//! programs as MCP tools.

pub mod capture;
pub mod clients;
pub mod config;
pub mod error;
pub mod events;
pub mod narration;
pub mod pipeline;
pub mod playback;
pub mod storage;
pub mod tools;

pub use config::NarratorConfig;
pub use error::{NarratorError, Result};
pub use narration::{NarrationResult, Narrator};
pub use pipeline::{Cue, Pipeline, PipelineSettings};
