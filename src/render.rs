//! Output rendering for the chat view.
//!
//! This module provides the [`Renderer`] trait the session drives, a
//! terminal implementation, and an in-memory implementation used to render
//! the message log as a string.

use std::io::{self, Stdout, Write};

use crate::types::{ChatMessage, MessageLog, Role, UploadStatus};

/// ANSI escape code for dim text (used for info lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for magenta text (used for the Vera label).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// ANSI escape code for green text (used for a successful upload).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for failed uploads and errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering the chat view.
///
/// The session calls [`Renderer::print_message`] once for every entry it
/// appends to the log, in append order; that is the scroll-to-latest effect.
pub trait Renderer: Send {
    /// Print one log entry.
    fn print_message(&mut self, message: &ChatMessage);

    /// Called before the first streamed token of a reply.
    fn start_reply(&mut self) {}

    /// Print a chunk of a streamed reply.
    fn print_token(&mut self, token: &str);

    /// Called when a streamed reply is complete.
    fn finish_response(&mut self);

    /// Print the upload banner.
    fn print_upload_status(&mut self, status: &UploadStatus);

    /// Print an error message that is not part of the log.
    fn print_error(&mut self, error: &str);

    /// Print an informational message that is not part of the log.
    fn print_info(&mut self, info: &str);

    /// Called when the user cancels the requests in flight.
    fn print_interrupted(&mut self) {}
}

/// Label shown in front of an entry.
fn label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Ai => "Vera",
    }
}

fn label_color(role: Role) -> &'static str {
    match role {
        Role::User => ANSI_CYAN,
        Role::Ai => ANSI_MAGENTA,
    }
}

/// Format one entry as a single block of text terminated by a newline.
pub fn format_message(message: &ChatMessage, use_color: bool) -> String {
    let role = message.role();
    if use_color {
        format!(
            "{}{}:{ANSI_RESET} {}\n",
            label_color(role),
            label(role),
            message.content()
        )
    } else {
        format!("{}: {}\n", label(role), message.content())
    }
}

/// Format the upload banner.
pub fn format_upload_status(status: &UploadStatus, use_color: bool) -> String {
    if !use_color {
        return format!("[{status}]\n");
    }
    let color = match status {
        UploadStatus::Uploaded { .. } => ANSI_GREEN,
        UploadStatus::Uploading => ANSI_DIM,
        UploadStatus::Failed | UploadStatus::ConnectionError => ANSI_RED,
    };
    format!("{color}[{status}]{ANSI_RESET}\n")
}

/// Render the whole log top-to-bottom.
///
/// Rendering only reads the log, so rendering the same log twice yields the
/// same text.
pub fn render_log(log: &MessageLog, use_color: bool) -> String {
    let mut renderer = BufferRenderer::with_color(use_color);
    for message in log {
        renderer.print_message(message);
    }
    renderer.into_output()
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer outputs text directly to stdout (errors to stderr).
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    in_reply: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            in_reply: false,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn write(&mut self, text: &str) {
        let _ = self.stdout.write_all(text.as_bytes());
        self.flush();
    }

    fn end_reply(&mut self) {
        if self.in_reply {
            self.write("\n");
            self.in_reply = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &ChatMessage) {
        self.end_reply();
        let text = format_message(message, self.use_color);
        self.write(&text);
    }

    fn start_reply(&mut self) {
        self.end_reply();
        let text = if self.use_color {
            format!("{ANSI_MAGENTA}{}:{ANSI_RESET} ", label(Role::Ai))
        } else {
            format!("{}: ", label(Role::Ai))
        };
        self.write(&text);
        self.in_reply = true;
    }

    fn print_token(&mut self, token: &str) {
        self.write(token);
    }

    fn finish_response(&mut self) {
        self.end_reply();
    }

    fn print_upload_status(&mut self, status: &UploadStatus) {
        self.end_reply();
        let text = format_upload_status(status, self.use_color);
        self.write(&text);
    }

    fn print_error(&mut self, error: &str) {
        self.end_reply();
        if self.use_color {
            eprintln!("{ANSI_RED}Error:{ANSI_RESET} {error}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.end_reply();
        self.write(&format!("{info}\n"));
    }

    fn print_interrupted(&mut self) {
        self.end_reply();
        self.write("[interrupted]\n");
    }
}

/// Renderer that accumulates everything into a string.
#[derive(Debug, Default, Clone)]
pub struct BufferRenderer {
    output: String,
    use_color: bool,
}

impl BufferRenderer {
    /// Creates an uncolored buffer renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer renderer with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            output: String::new(),
            use_color,
        }
    }

    /// Everything rendered so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Consumes the renderer, returning its output.
    pub fn into_output(self) -> String {
        self.output
    }
}

impl Renderer for BufferRenderer {
    fn print_message(&mut self, message: &ChatMessage) {
        self.output
            .push_str(&format_message(message, self.use_color));
    }

    fn start_reply(&mut self) {
        self.output.push_str(label(Role::Ai));
        self.output.push_str(": ");
    }

    fn print_token(&mut self, token: &str) {
        self.output.push_str(token);
    }

    fn finish_response(&mut self) {
        self.output.push('\n');
    }

    fn print_upload_status(&mut self, status: &UploadStatus) {
        self.output
            .push_str(&format_upload_status(status, self.use_color));
    }

    fn print_error(&mut self, error: &str) {
        self.output.push_str(&format!("Error: {error}\n"));
    }

    fn print_info(&mut self, info: &str) {
        self.output.push_str(info);
        self.output.push('\n');
    }

    fn print_interrupted(&mut self) {
        self.output.push_str("[interrupted]\n");
    }
}
