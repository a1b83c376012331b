//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the view state,
//! issues backend requests on background tasks and applies their outcomes
//! when the event loop hands them back.

use std::fs::File;
use std::future::Future;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use serde::Serialize;
use serde_json::to_writer_pretty;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::Error;
use crate::backend::Backend;
use crate::chat::config::ChatConfig;
use crate::chat::view::{ChatView, ComposerPhase, UploadAttempt};
use crate::error::Result;
use crate::observability::{
    SESSION_CANCELLATIONS, SESSION_SEND_FAILURES, SESSION_SENDS, SESSION_SENDS_REJECTED,
    SESSION_TURN_DURATION, SESSION_UPLOAD_FAILURES, SESSION_UPLOADS,
};
use crate::render::Renderer;
use crate::types::{
    ChatMessage, ChatResponse, Document, HealthStatus, MessageLog, SessionId, UploadReceipt,
    UploadStatus,
};

/// Progress or completion of a background request.
#[derive(Debug)]
pub enum GatewayEvent {
    /// One fragment of a streamed reply.
    ChatToken(String),
    /// The chat request finished.
    ChatFinished(Result<ChatResponse>),
    /// An upload finished.
    UploadFinished {
        /// Which upload this was.
        attempt: UploadAttempt,
        /// The uploaded file's name.
        file_name: String,
        /// Outcome of the request.
        result: Result<UploadReceipt>,
    },
}

/// A chat session bound to one backend.
///
/// Only the owner of the session mutates the view: background tasks report
/// through [`GatewayEvent`]s that the owner feeds to [`ChatSession::apply`].
pub struct ChatSession<B: Backend + 'static> {
    backend: Arc<B>,
    view: ChatView,
    streaming: bool,
    deadline: Duration,
    events_tx: UnboundedSender<GatewayEvent>,
    events_rx: UnboundedReceiver<GatewayEvent>,
    cancel: CancellationToken,
    uploads_in_flight: usize,
    reply_started: bool,
    turn_started: Option<Instant>,
}

/// Snapshot of a session for `/status`.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The id sent with every chat request.
    pub session_id: SessionId,
    /// Number of entries in the log, greeting included.
    pub message_count: usize,
    /// The composer phase.
    pub phase: ComposerPhase,
    /// The upload banner, if an upload was ever started.
    pub upload_status: Option<UploadStatus>,
    /// Uploads that have not finished yet.
    pub uploads_in_flight: usize,
    /// Whether replies are streamed.
    pub streaming: bool,
    /// Deadline applied to every request.
    pub deadline: Duration,
}

impl<B: Backend + 'static> ChatSession<B> {
    /// Creates a new chat session with a freshly mounted view.
    pub fn new(backend: B, config: &ChatConfig) -> Self {
        Self::with_view(backend, config, ChatView::mount())
    }

    /// Creates a new chat session around an existing view.
    pub fn with_view(backend: B, config: &ChatConfig, view: ChatView) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend: Arc::new(backend),
            view,
            streaming: config.streaming,
            deadline: config.timeout,
            events_tx,
            events_rx,
            cancel: CancellationToken::new(),
            uploads_in_flight: 0,
            reply_started: false,
            turn_started: None,
        }
    }

    /// The backend requests are sent to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The view state.
    pub fn view(&self) -> &ChatView {
        &self.view
    }

    /// The id sent as `thread_id` with every chat request.
    pub fn session_id(&self) -> &SessionId {
        self.view.session_id()
    }

    /// The conversation so far.
    pub fn log(&self) -> &MessageLog {
        self.view.log()
    }

    /// Replaces the pending composer text.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.view.set_input(text);
    }

    /// Returns true while a chat request is in flight.
    pub fn is_sending(&self) -> bool {
        self.view.is_sending()
    }

    /// Returns true while any request is in flight.
    pub fn is_busy(&self) -> bool {
        self.view.is_sending() || self.uploads_in_flight > 0
    }

    /// Whether replies are streamed.
    pub fn streaming(&self) -> bool {
        self.streaming
    }

    /// Enables or disables streamed replies for later turns.
    pub fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
    }

    /// The deadline applied to every request.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Submits the pending input.
    ///
    /// Returns false, without touching the log or the backend, when the
    /// input is blank or a chat request is already in flight. Otherwise the
    /// user's entry is rendered and the request runs in the background.
    pub fn submit(&mut self, renderer: &mut dyn Renderer) -> bool {
        let mark = self.view.log().len();
        let Some(request) = self.view.begin_send() else {
            SESSION_SENDS_REJECTED.click();
            return false;
        };
        SESSION_SENDS.click();
        self.render_since(mark, renderer);
        self.reply_started = false;
        self.turn_started = Some(Instant::now());

        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        let cancel = self.cancel.clone();
        let deadline = self.deadline;
        let streaming = self.streaming;
        tokio::spawn(async move {
            let outcome = if streaming {
                let tokens_tx = events.clone();
                bounded(
                    async move {
                        let mut tokens = backend.chat_stream(&request).await?;
                        let mut reply = String::new();
                        while let Some(token) = tokens.next().await {
                            let token = token?;
                            reply.push_str(&token);
                            let _ = tokens_tx.send(GatewayEvent::ChatToken(token));
                        }
                        Ok::<ChatResponse, Error>(ChatResponse::new(reply))
                    },
                    deadline,
                    &cancel,
                )
                .await
            } else {
                bounded(
                    async move { backend.chat(&request).await },
                    deadline,
                    &cancel,
                )
                .await
            };
            let _ = events.send(GatewayEvent::ChatFinished(outcome));
        });
        true
    }

    /// Replaces the input with `text` and submits it.
    pub fn submit_text(&mut self, text: impl Into<String>, renderer: &mut dyn Renderer) -> bool {
        self.view.set_input(text);
        self.submit(renderer)
    }

    /// Starts uploading `document` in the background.
    ///
    /// Uploads do not wait for each other or for a pending chat request.
    pub fn upload(&mut self, document: Document, renderer: &mut dyn Renderer) -> UploadAttempt {
        let attempt = self.view.begin_upload();
        SESSION_UPLOADS.click();
        self.uploads_in_flight += 1;
        if let Some(status) = self.view.upload_status() {
            renderer.print_upload_status(status);
        }

        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        let cancel = self.cancel.clone();
        let deadline = self.deadline;
        tokio::spawn(async move {
            let file_name = document.file_name().to_string();
            let result = bounded(
                async move { backend.upload(&document).await },
                deadline,
                &cancel,
            )
            .await;
            let _ = events.send(GatewayEvent::UploadFinished {
                attempt,
                file_name,
                result,
            });
        });
        attempt
    }

    /// Reads the file at `path` and uploads it.
    ///
    /// A path that is not a readable `.pdf` file is rejected before the
    /// upload starts, leaving the banner untouched.
    pub async fn upload_path(
        &mut self,
        path: impl AsRef<Path>,
        renderer: &mut dyn Renderer,
    ) -> Result<UploadAttempt> {
        let document = Document::open(path).await?;
        Ok(self.upload(document, renderer))
    }

    /// Cancels every request in flight.
    ///
    /// Returns false if nothing was in flight. Requests started afterwards
    /// are unaffected.
    pub fn cancel(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        SESSION_CANCELLATIONS.click();
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        true
    }

    /// Waits for the next background event.
    pub async fn next_event(&mut self) -> Option<GatewayEvent> {
        self.events_rx.recv().await
    }

    /// Applies a background event to the view and renders what changed.
    pub fn apply(&mut self, event: GatewayEvent, renderer: &mut dyn Renderer) {
        match event {
            GatewayEvent::ChatToken(token) => {
                if !self.view.is_sending() {
                    return;
                }
                if !self.reply_started {
                    renderer.start_reply();
                    self.reply_started = true;
                }
                renderer.print_token(&token);
            }
            GatewayEvent::ChatFinished(outcome) => {
                if let Some(start) = self.turn_started.take() {
                    SESSION_TURN_DURATION.add(start.elapsed().as_secs_f64());
                }
                if outcome.is_err() {
                    SESSION_SEND_FAILURES.click();
                }
                let streamed = std::mem::take(&mut self.reply_started);
                let mark = self.view.log().len();
                if self.view.finish_send(&outcome).is_none() {
                    return;
                }
                if streamed {
                    renderer.finish_response();
                }
                // A streamed reply is already on screen.
                if !(streamed && outcome.is_ok()) {
                    self.render_since(mark, renderer);
                }
            }
            GatewayEvent::UploadFinished {
                attempt,
                file_name,
                result,
            } => {
                self.uploads_in_flight = self.uploads_in_flight.saturating_sub(1);
                if result.is_err() {
                    SESSION_UPLOAD_FAILURES.click();
                }
                let latest = self.view.is_latest_upload(attempt);
                let mark = self.view.log().len();
                self.view.finish_upload(attempt, &file_name, &result);
                if latest && let Some(status) = self.view.upload_status() {
                    renderer.print_upload_status(status);
                }
                self.render_since(mark, renderer);
            }
        }
    }

    /// Renders every entry appended at or after `mark`.
    fn render_since(&self, mark: usize, renderer: &mut dyn Renderer) {
        for entry in self.view.log().since(mark) {
            renderer.print_message(entry);
        }
    }

    /// Applies events until nothing is in flight.
    pub async fn settle(&mut self, renderer: &mut dyn Renderer) {
        while self.is_busy() {
            match self.next_event().await {
                Some(event) => self.apply(event, renderer),
                None => break,
            }
        }
    }

    /// Probes the backend, subject to the session's deadline.
    pub async fn health(&self) -> Result<HealthStatus> {
        bounded(self.backend.health(), self.deadline, &self.cancel).await
    }

    /// Writes the log to `path` as pretty-printed JSON.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile::new(self.view.session_id(), self.view.log())?;
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.view.session_id().clone(),
            message_count: self.view.log().len(),
            phase: self.view.phase(),
            upload_status: self.view.upload_status().cloned(),
            uploads_in_flight: self.uploads_in_flight,
            streaming: self.streaming,
            deadline: self.deadline,
        }
    }
}

/// Runs `request` until it completes, the deadline passes, or `cancel` fires.
async fn bounded<T, F>(request: F, deadline: Duration, cancel: &CancellationToken) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(Error::abort("request cancelled")),
        outcome = tokio::time::timeout(deadline, request) => match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(
                "no answer before the deadline",
                Some(deadline.as_secs_f64()),
            )),
        },
    }
}

#[derive(Serialize)]
struct TranscriptFile<'a> {
    version: u8,
    thread_id: &'a SessionId,
    saved_at: String,
    messages: &'a [ChatMessage],
}

impl<'a> TranscriptFile<'a> {
    fn new(thread_id: &'a SessionId, log: &'a MessageLog) -> Result<Self> {
        let saved_at = OffsetDateTime::now_utc().format(&Rfc3339).map_err(|err| {
            Error::serialization("failed to format timestamp", Some(Box::new(err)))
        })?;
        Ok(Self {
            version: 1,
            thread_id,
            saved_at,
            messages: log.entries(),
        })
    }
}
