pub mod backend;
pub mod chat;
pub mod classifier;
pub mod injector;
pub mod renderer;
pub mod stream;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::error::ChatError;
use crate::models::response::ChatResponse;
use crate::models::result::QueryResult;

/// Chunks of a streamed response body, in arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ChatError>> + Send>>;

/// The narrow request/response contract with the analytics backend. The
/// controller only talks to the backend through this seam, so tests can
/// substitute a scripted implementation.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// `POST /query` with `{ "question": ... }`, classified into a
    /// [`ChatResponse`].
    async fn submit_query(&self, question: &str) -> Result<ChatResponse, ChatError>;

    /// `POST /generate-visualization` with `{ "results": ... }`; returns the
    /// `visualization_html` fragment.
    async fn generate_visualization(&self, results: &QueryResult) -> Result<String, ChatError>;

    /// `POST /api/chat` with `{ "message": ... }`; returns the incremental
    /// body stream. A non-2xx status fails here, before any body read.
    async fn open_chat_stream(&self, message: &str) -> Result<ChunkStream, ChatError>;
}

pub use backend::HttpBackendClient;
pub use chat::{ChatController, ControllerState, TranscriptStore};
