// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use backend::{Backend, TokenStream};
pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, VeraClient, parse_base_url};
pub use client_logger::{ClientLogger, StderrLogger};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{BufferRenderer, PlainTextRenderer, Renderer, render_log};
pub use types::*;
