//! The chat view state: session id, message log, composer and upload banner.
//!
//! Every transition is a method on [`ChatView`] that performs no I/O. The
//! session issues the network calls and feeds their outcomes back in.

use crate::error::Result;
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, MessageLog, SessionId, UploadReceipt, UploadStatus,
};

/// Appended in place of a reply when a chat request fails for any reason.
pub const CHAT_ERROR_TEXT: &str = "⚠️ Error: Could not connect to Vera.";

/// The composer's state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ComposerPhase {
    /// Ready to submit.
    #[default]
    Idle,
    /// A chat request is in flight.
    Sending,
}

/// Identifies one upload attempt within a view.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadAttempt(u64);

/// The text appended when the backend accepts a document.
pub fn document_ready_text(file_name: &str) -> String {
    format!("I have read {file_name}. You can now ask me questions about it.")
}

/// State of one chat view.
#[derive(Debug, Clone)]
pub struct ChatView {
    session_id: SessionId,
    log: MessageLog,
    input: String,
    phase: ComposerPhase,
    upload_status: Option<UploadStatus>,
    latest_upload: Option<UploadAttempt>,
}

impl ChatView {
    /// Mounts a new view with a freshly generated session id.
    pub fn mount() -> Self {
        Self::with_session_id(SessionId::generate())
    }

    /// Mounts a new view with the given session id.
    pub fn with_session_id(session_id: SessionId) -> Self {
        Self {
            session_id,
            log: MessageLog::seeded(),
            input: String::new(),
            phase: ComposerPhase::Idle,
            upload_status: None,
            latest_upload: None,
        }
    }

    /// The id sent as `thread_id` with every chat request.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The conversation so far.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// The pending composer text.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replaces the pending composer text.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// The composer phase.
    pub fn phase(&self) -> ComposerPhase {
        self.phase
    }

    /// Returns true while a chat request is in flight.
    pub fn is_sending(&self) -> bool {
        self.phase == ComposerPhase::Sending
    }

    /// The upload banner, absent until the first upload starts.
    pub fn upload_status(&self) -> Option<&UploadStatus> {
        self.upload_status.as_ref()
    }

    /// Returns true if a submit would be accepted.
    pub fn can_submit(&self) -> bool {
        self.phase == ComposerPhase::Idle && !self.input.trim().is_empty()
    }

    /// `Idle -> Sending`.
    ///
    /// Appends the user's message, clears the input and returns the request
    /// to issue. Returns `None` and changes nothing when the input is blank
    /// or a request is already in flight.
    pub fn begin_send(&mut self) -> Option<ChatRequest> {
        if !self.can_submit() {
            return None;
        }
        let message = std::mem::take(&mut self.input);
        self.log.append(ChatMessage::user(message.clone()));
        self.phase = ComposerPhase::Sending;
        Some(ChatRequest::new(message, self.session_id.clone()))
    }

    /// `Sending -> Idle`.
    ///
    /// Appends the reply, or [`CHAT_ERROR_TEXT`] on any failure, and returns
    /// the appended entry. A completion arriving while idle is ignored.
    pub fn finish_send(&mut self, outcome: &Result<ChatResponse>) -> Option<&ChatMessage> {
        if self.phase != ComposerPhase::Sending {
            return None;
        }
        self.phase = ComposerPhase::Idle;
        let reply = match outcome {
            Ok(response) => ChatMessage::ai(response.response.clone()),
            Err(_) => ChatMessage::ai(CHAT_ERROR_TEXT),
        };
        Some(self.log.append(reply))
    }

    /// Starts an upload attempt and shows the in-flight banner.
    pub fn begin_upload(&mut self) -> UploadAttempt {
        let attempt = UploadAttempt(self.latest_upload.map_or(0, |UploadAttempt(n)| n + 1));
        self.latest_upload = Some(attempt);
        self.upload_status = Some(UploadStatus::Uploading);
        attempt
    }

    /// Returns true if `attempt` is the most recently started upload.
    pub fn is_latest_upload(&self, attempt: UploadAttempt) -> bool {
        self.latest_upload == Some(attempt)
    }

    /// Records the outcome of an upload attempt.
    ///
    /// Only the most recently started attempt may change the banner. A
    /// success always appends the document-ready message, since the backend
    /// did ingest the file. Returns the appended entry, if any.
    pub fn finish_upload(
        &mut self,
        attempt: UploadAttempt,
        file_name: &str,
        outcome: &Result<UploadReceipt>,
    ) -> Option<&ChatMessage> {
        let latest = self.is_latest_upload(attempt);
        match outcome {
            Ok(_) => {
                if latest {
                    self.upload_status = Some(UploadStatus::Uploaded {
                        file_name: file_name.to_string(),
                    });
                }
                Some(self.log.append(ChatMessage::ai(document_ready_text(file_name))))
            }
            Err(err) => {
                if latest {
                    self.upload_status = Some(if err.is_application() {
                        UploadStatus::Failed
                    } else {
                        UploadStatus::ConnectionError
                    });
                }
                None
            }
        }
    }
}

impl Default for ChatView {
    fn default() -> Self {
        Self::mount()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::types::{GREETING, Role};

    fn view() -> ChatView {
        ChatView::with_session_id("0b7e2d9c-3f1a-4c2e-9d4b-5a6f7e8d9c0b".parse().unwrap())
    }

    #[test]
    fn mount_seeds_greeting() {
        let view = ChatView::mount();
        assert_eq!(view.log().len(), 1);
        assert_eq!(view.log().entries()[0].role(), Role::Ai);
        assert_eq!(view.log().entries()[0].content(), GREETING);
        assert_eq!(view.phase(), ComposerPhase::Idle);
        assert!(view.upload_status().is_none());
        assert!(SessionId::is_well_formed(view.session_id().as_str()));
    }

    #[test]
    fn blank_input_is_rejected() {
        let mut view = view();
        assert!(view.begin_send().is_none());
        view.set_input("   \t ");
        assert!(view.begin_send().is_none());
        assert_eq!(view.log().len(), 1);
        assert_eq!(view.phase(), ComposerPhase::Idle);
        assert_eq!(view.input(), "   \t ");
    }

    #[test]
    fn send_appends_user_message_first() {
        let mut view = view();
        view.set_input("hello");
        let request = view.begin_send().unwrap();
        assert_eq!(request.message, "hello");
        assert_eq!(&request.thread_id, view.session_id());
        assert_eq!(view.input(), "");
        assert_eq!(view.phase(), ComposerPhase::Sending);
        let last = view.log().last().unwrap();
        assert_eq!(last.role(), Role::User);
        assert_eq!(last.content(), "hello");
    }

    #[test]
    fn second_submit_while_sending_is_a_no_op() {
        let mut view = view();
        view.set_input("first");
        assert!(view.begin_send().is_some());
        view.set_input("second");
        assert!(view.begin_send().is_none());
        assert_eq!(view.log().len(), 2);
        assert_eq!(view.input(), "second");

        view.finish_send(&Ok(ChatResponse::new("reply")));
        assert!(view.begin_send().is_some());
    }

    #[test]
    fn success_appends_reply() {
        let mut view = view();
        view.set_input("hello");
        view.begin_send();
        let reply = view.finish_send(&Ok(ChatResponse::new("hi"))).unwrap();
        assert_eq!(reply.role(), Role::Ai);
        assert_eq!(reply.content(), "hi");
        assert_eq!(view.phase(), ComposerPhase::Idle);
    }

    #[test]
    fn failure_appends_fixed_error() {
        let mut view = view();
        view.set_input("hello");
        view.begin_send();
        view.finish_send(&Err(Error::api(500, "boom")));
        assert_eq!(view.log().len(), 3);
        assert_eq!(view.log().last().unwrap().content(), CHAT_ERROR_TEXT);
        assert_eq!(view.phase(), ComposerPhase::Idle);
    }

    #[test]
    fn stray_completion_is_ignored() {
        let mut view = view();
        assert!(view.finish_send(&Ok(ChatResponse::new("late"))).is_none());
        assert_eq!(view.log().len(), 1);
    }

    #[test]
    fn session_id_is_stable_across_requests() {
        let mut view = view();
        view.set_input("one");
        let first = view.begin_send().unwrap();
        view.finish_send(&Ok(ChatResponse::new("a")));
        view.set_input("two");
        let second = view.begin_send().unwrap();
        assert_eq!(first.thread_id, second.thread_id);
    }

    #[test]
    fn upload_success() {
        let mut view = view();
        let attempt = view.begin_upload();
        assert_eq!(view.upload_status(), Some(&UploadStatus::Uploading));
        let entry = view
            .finish_upload(attempt, "report.pdf", &Ok(UploadReceipt { status: 200 }))
            .unwrap();
        assert!(entry.content().contains("report.pdf"));
        assert!(view.upload_status().unwrap().to_string().contains("report.pdf"));
        assert_eq!(view.log().len(), 2);
    }

    #[test]
    fn upload_failures_leave_log_alone() {
        let mut view = view();
        let attempt = view.begin_upload();
        view.finish_upload(attempt, "report.pdf", &Err(Error::api(422, "bad")));
        assert_eq!(view.upload_status(), Some(&UploadStatus::Failed));

        let attempt = view.begin_upload();
        view.finish_upload(
            attempt,
            "report.pdf",
            &Err(Error::connection("refused", None)),
        );
        assert_eq!(view.upload_status(), Some(&UploadStatus::ConnectionError));
        assert_eq!(view.log().len(), 1);
    }

    #[test]
    fn superseded_upload_does_not_touch_banner() {
        let mut view = view();
        let first = view.begin_upload();
        let second = view.begin_upload();
        assert_ne!(first, second);

        view.finish_upload(second, "b.pdf", &Err(Error::api(500, "boom")));
        view.finish_upload(first, "a.pdf", &Ok(UploadReceipt { status: 200 }));

        assert_eq!(view.upload_status(), Some(&UploadStatus::Failed));
        assert_eq!(
            view.log().last().unwrap().content(),
            document_ready_text("a.pdf")
        );
    }

    #[test]
    fn uploads_do_not_block_sending() {
        let mut view = view();
        view.begin_upload();
        view.set_input("hello");
        assert!(view.begin_send().is_some());
    }
}
