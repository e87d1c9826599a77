//! conflictfix core library.
//!
//! This crate resolves Git merge conflicts in a single file by delegating to a
//! hosted large-language-model API: configuration, the fixed resolution
//! prompt, the provider clients, and the in-place [`ConflictResolver`].

pub mod config;
pub mod errors;
pub mod llm;
pub mod prompt;
pub mod resolver;

// Re-exports for convenience.
pub use config::ResolverConfig;
pub use llm::{build_generator, Generator, TextGenerator};
pub use resolver::{ConflictResolver, RequestSettings, ResolveOutcome};
