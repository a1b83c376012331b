// Public modules
pub mod chat_message;
pub mod chat_request;
pub mod chat_response;
pub mod document;
pub mod health_status;
pub mod message_log;
pub mod session_id;
pub mod upload_status;

// Re-exports
pub use chat_message::{ChatMessage, Role};
pub use chat_request::ChatRequest;
pub use chat_response::{ChatResponse, StreamToken};
pub use document::{Document, UploadReceipt};
pub use health_status::HealthStatus;
pub use message_log::{GREETING, MessageLog};
pub use session_id::SessionId;
pub use upload_status::UploadStatus;
