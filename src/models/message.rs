use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::result::QueryResult;
use crate::services::renderer::TableView;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
    /// Error-styled bot entry (backend reported a failure).
    Error,
}

/// What a transcript entry carries.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    /// Plain (or streamed, markdown-rendered) text.
    Text(String),
    /// The server-declared generated query, verbatim and unmodified.
    GeneratedQuery(String),
    /// Informational note, e.g. "query returned no results".
    Info(String),
    /// A rendered result set. `results` keeps the full, uncapped data so the
    /// classifier verdict and any visualization request operate on all rows.
    Results {
        table: TableView,
        results: QueryResult,
        visualizable: bool,
    },
}

/// One chat turn. Immutable once created, except bot text while a stream is
/// actively appending to it.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub body: MessageBody,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, body: MessageBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            body,
            created_at: Utc::now(),
        }
    }

    /// Text content, when the body is textual.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text(text)
            | MessageBody::GeneratedQuery(text)
            | MessageBody::Info(text) => Some(text),
            MessageBody::Results { .. } => None,
        }
    }
}
