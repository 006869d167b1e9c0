//! Minimal HTTP clients for the external services the engine talks to.
//!
//! Each module is a focused client for one collaborator:
//! - [`llm`]: chat-completion text generation (ideas, captions)
//! - [`imagen`]: reference-grounded image generation
//! - [`photos`]: stock photo search for background references
//! - [`social`]: Graph-style publishing, comments, and account discovery
//!
//! Clients own their request/response types and error enums; the engine
//! crate adapts them behind its collaborator traits.

pub mod imagen;
pub mod llm;
pub mod photos;
pub mod social;
