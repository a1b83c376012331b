//! Logging trait for backend interactions.
//!
//! This module provides the [`ClientLogger`] trait that allows callers to
//! capture every exchange passing through the [`VeraClient`](crate::VeraClient),
//! and [`StderrLogger`], the developer-console logger used by `vera-chat --verbose`.

use std::io::{self, Write};

use crate::{ChatRequest, ChatResponse, Error, HealthStatus, UploadReceipt};

/// A trait for logging backend interactions.
///
/// # Example
///
/// ```rust,ignore
/// use vera::{ChatRequest, ChatResponse, ClientLogger, Error, HealthStatus, UploadReceipt};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_chat(&self, request: &ChatRequest, response: &ChatResponse) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "{} -> {}", request.message, response.response).unwrap();
///     }
///     // ...
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a complete reply from `POST /chat`.
    fn log_chat(&self, request: &ChatRequest, response: &ChatResponse);

    /// Log one token received from `POST /chat/stream`.
    fn log_stream_token(&self, token: &str);

    /// Log an accepted upload.
    fn log_upload(&self, file_name: &str, receipt: &UploadReceipt);

    /// Log a health probe.
    fn log_health(&self, health: &HealthStatus) {
        _ = health;
    }

    /// Log a failed request against `endpoint`.
    fn log_failure(&self, endpoint: &str, error: &Error);
}

/// Writes one line per interaction to stderr.
#[derive(Debug, Default)]
pub struct StderrLogger;

impl StderrLogger {
    fn line(&self, text: &str) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[vera] {text}");
    }
}

impl ClientLogger for StderrLogger {
    fn log_chat(&self, request: &ChatRequest, response: &ChatResponse) {
        self.line(&format!(
            "chat thread={} sent={}B received={}B",
            request.thread_id,
            request.message.len(),
            response.response.len()
        ));
    }

    fn log_stream_token(&self, token: &str) {
        self.line(&format!("stream token {}B", token.len()));
    }

    fn log_upload(&self, file_name: &str, receipt: &UploadReceipt) {
        self.line(&format!("upload {file_name} status={}", receipt.status));
    }

    fn log_health(&self, health: &HealthStatus) {
        self.line(&format!("health status={}", health.status));
    }

    fn log_failure(&self, endpoint: &str, error: &Error) {
        self.line(&format!("{endpoint} failed: {error}"));
    }
}
