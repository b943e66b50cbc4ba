// Anthropic streaming client and the prompt templates built on squad data.

pub mod client;
pub mod prompt;

pub use client::{ChatMessage, ClaudeClient, Completion, LlmClient, LlmError, LlmEvent, Role};
