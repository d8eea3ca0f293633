//! Concrete LLM runtime backends for WattWise.
//!
//! The proposal planner in `wattwise-optimizer` is written against the
//! `LlmRuntime` trait from `wattwise-core`; this crate supplies the real
//! backends. Only Ollama is wired up today.

pub mod backends;

#[cfg(feature = "ollama")]
pub use backends::ollama::{OllamaConfig, OllamaRuntime};
