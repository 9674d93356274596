//! Chat application module for interactive sessions with the backend.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! finchat client library. It supports:
//!
//! - Streaming responses with real-time token display
//! - Tool invocation markers and chart materialization
//! - Slash commands for session management
//! - Multiple sessions with auto-titling and per-session history
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: the in-memory session registry
//! - [`controller`]: top-level owner wiring the registry, the stream
//!   consumer, and the per-session message cache together
//! - [`commands`]: slash command parsing and handling

mod commands;
mod config;
mod controller;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use controller::ChatController;
pub use session::{DEFAULT_TITLE, INITIAL_TITLE, Session, SessionRegistry};
