// Public modules
pub mod chat_event;
pub mod chat_message;
pub mod chat_request;

// Re-exports
pub use chat_event::ChatEvent;
pub use chat_message::{ChatMessage, MessageRole};
pub use chat_request::ChatRequest;
