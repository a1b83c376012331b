//! Chat application module for interactive conversations with Vera.
//!
//! This module provides a REPL chat interface built on top of the vera
//! client library. It supports:
//!
//! - Sending messages and rendering Vera's replies, optionally streamed
//! - Uploading PDF documents for Vera to read
//! - Slash commands for session control
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`view`]: The view state machine, free of I/O
//! - [`session`]: Background requests and their application to the view
//! - [`commands`]: Slash command parsing

pub mod commands;
pub mod config;
pub mod session;
pub mod view;

pub use crate::render::{BufferRenderer, PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ConfigFile};
pub use session::{ChatSession, GatewayEvent, SessionStats};
pub use view::{CHAT_ERROR_TEXT, ChatView, ComposerPhase, UploadAttempt, document_ready_text};
