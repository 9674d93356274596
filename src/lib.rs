// Public modules
pub mod chat;
pub mod client;
pub mod consumer;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use client::BackendClient;
pub use consumer::StreamConsumer;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use sse::{StreamFrame, process_sse};
pub use types::*;
