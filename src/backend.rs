//! The seam between the chat session and whatever answers its requests.

use std::pin::Pin;

use futures::Stream;
use futures::stream;

use crate::error::Result;
use crate::types::{ChatRequest, ChatResponse, Document, HealthStatus, UploadReceipt};

/// A stream of answer fragments.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Operations the chat session needs from the Vera backend.
///
/// [`VeraClient`](crate::VeraClient) implements this over HTTP. Any
/// non-2xx answer must surface as [`Error::Api`](crate::Error::Api) and any
/// failure to obtain an answer as one of the transport variants, because the
/// session classifies upload outcomes by that distinction.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Sends one chat turn and waits for the complete answer.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Sends one chat turn and streams the answer.
    ///
    /// The default implementation yields the whole [`Backend::chat`] answer
    /// as a single fragment.
    async fn chat_stream(&self, request: &ChatRequest) -> Result<TokenStream> {
        let response = self.chat(request).await?;
        Ok(Box::pin(stream::once(async move { Ok(response.response) })))
    }

    /// Uploads a document for the backend to index.
    async fn upload(&self, document: &Document) -> Result<UploadReceipt>;

    /// Probes backend liveness.
    async fn health(&self) -> Result<HealthStatus>;
}
