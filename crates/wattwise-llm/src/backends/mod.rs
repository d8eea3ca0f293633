//! LLM backend implementations, feature-gated per provider.

#[cfg(feature = "ollama")]
pub mod ollama;
