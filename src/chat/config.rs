//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolution
//! of every setting from, in order of precedence, the command line, the
//! environment, a YAML config file and built-in defaults.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, parse_base_url};
use crate::error::{Error, Result};

/// Environment variable naming the backend origin.
pub const BASE_URL_ENV: &str = "VERA_BASE_URL";
/// Environment variable holding the request deadline in seconds.
pub const TIMEOUT_ENV: &str = "VERA_TIMEOUT_SECS";
/// Environment variable enabling streamed replies.
pub const STREAM_ENV: &str = "VERA_STREAM";
/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "VERA_CONFIG";

/// Command-line arguments for the vera-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend origin.
    #[arrrg(optional, "Backend origin (default: http://127.0.0.1:8000/)", "URL")]
    pub base_url: Option<String>,

    /// Per-request deadline in seconds.
    #[arrrg(optional, "Request deadline in seconds (default: 60)", "SECONDS")]
    pub timeout: Option<u32>,

    /// YAML config file.
    #[arrrg(optional, "Path to a YAML config file", "PATH")]
    pub config: Option<String>,

    /// Stream replies token by token.
    #[arrrg(flag, "Stream replies from /chat/stream")]
    pub stream: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log every backend exchange to stderr.
    #[arrrg(flag, "Log backend exchanges to stderr")]
    pub verbose: bool,
}

/// Settings read from the YAML config file.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Backend origin.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request deadline in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Stream replies token by token.
    #[serde(default)]
    pub streaming: Option<bool>,
}

impl ConfigFile {
    /// Loads a config file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Ok(serde_yaml::from_str(&text)?)
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments, environment and config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend origin, normalised to end in `/`.
    pub base_url: String,

    /// Deadline for every backend request.
    pub timeout: Duration,

    /// Whether replies are streamed from `/chat/stream`.
    pub streaming: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether backend exchanges are logged to stderr.
    pub verbose: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Origin: http://127.0.0.1:8000/
    /// - Timeout: 60 seconds
    /// - Streaming: disabled
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            streaming: false,
            use_color: true,
            verbose: false,
        }
    }

    /// Sets the backend origin.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables streamed replies.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Enables or disables exchange logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolves the configuration against the process environment.
    pub fn resolve(args: ChatArgs) -> Result<Self> {
        Self::resolve_with(args, |key| env::var(key).ok())
    }

    /// Resolves the configuration with a custom environment lookup.
    pub fn resolve_with<F>(args: ChatArgs, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match args.config.clone().or_else(|| lookup(CONFIG_ENV)) {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let base_url = args
            .base_url
            .or_else(|| lookup(BASE_URL_ENV))
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?.to_string();

        let timeout_secs = match args.timeout {
            Some(secs) => u64::from(secs),
            None => match lookup(TIMEOUT_ENV) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                    Error::config(
                        format!("{TIMEOUT_ENV} expects a whole number of seconds, got '{raw}'"),
                        Some("timeout".to_string()),
                    )
                })?,
                None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT.as_secs()),
            },
        };
        if timeout_secs == 0 {
            return Err(Error::config(
                "timeout must be at least one second",
                Some("timeout".to_string()),
            ));
        }

        let streaming = if args.stream {
            true
        } else {
            match lookup(STREAM_ENV) {
                Some(raw) => parse_on_off(&raw).ok_or_else(|| {
                    Error::config(
                        format!("{STREAM_ENV} expects on/off, got '{raw}'"),
                        Some("streaming".to_string()),
                    )
                })?,
                None => file.streaming.unwrap_or(false),
            }
        };

        Ok(ChatConfig {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            streaming,
            use_color: !args.no_color,
            verbose: args.verbose,
        })
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_on_off(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
