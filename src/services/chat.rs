//! Orchestrates one request/response cycle against the backend and owns the
//! session transcript.

use anyhow::Result;
use log::{error, info, warn};
use uuid::Uuid;

use crate::dom::{Document, Node, ScriptHost};
use crate::error::ChatError;
use crate::models::message::{ChatMessage, MessageBody, Role};
use crate::models::response::ChatResponse;
use crate::models::result::QueryResult;

use super::stream::RenderSink;
use super::{classifier, injector, renderer, stream, BackendClient};

const REQUEST_FAILED_MESSAGE: &str =
    "Sorry, there was an error processing your request. Please try again.";
const MALFORMED_REPLY_MESSAGE: &str =
    "Sorry, I could not generate a response for that question.";
const EMPTY_RESULTS_MESSAGE: &str =
    "The query executed successfully but returned no results.";
const NO_DATA_MESSAGE: &str = "No data was returned for this query.";

/// Markup shown in the mount while a visualization request is in flight.
pub const LOADING_MARKUP: &str = r#"<div class="loading-indicator">Generating visualization…</div>"#;

/// The single owned chat transcript. Session-scoped; created at session
/// start, torn down at session end.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    messages: Vec<ChatMessage>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, body: MessageBody) -> Uuid {
        let message = ChatMessage::new(role, body);
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Replace the text of a streaming bot message. Content only ever grows
    /// through whole-buffer re-renders.
    pub fn set_text(&mut self, id: Uuid, text: String) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => match &mut message.body {
                MessageBody::Text(existing) => {
                    *existing = text;
                    true
                }
                _ => false,
            },
            None => false,
        }
    }

    /// Append a line to a text message, preserving what is already there.
    pub fn append_text_line(&mut self, id: Uuid, line: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => match &mut message.body {
                MessageBody::Text(existing) => {
                    if !existing.is_empty() {
                        existing.push('\n');
                    }
                    existing.push_str(line);
                    true
                }
                _ => false,
            },
            None => false,
        }
    }
}

/// Per-request lifecycle. Terminal outcomes return to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Pending,
}

#[derive(Debug, Default)]
struct TypingIndicator {
    visible: bool,
}

impl TypingIndicator {
    fn show(&mut self) {
        self.visible = true;
    }

    /// Hide exactly once per cycle; redundant hides are no-ops.
    fn hide(&mut self) {
        if self.visible {
            self.visible = false;
        }
    }
}

/// Binds a streaming session to one growing transcript message.
struct TranscriptSink<'a> {
    store: &'a mut TranscriptStore,
    id: Uuid,
}

impl RenderSink for TranscriptSink<'_> {
    fn render(&mut self, formatted: &str) {
        self.store.set_text(self.id, formatted.to_string());
    }

    fn append_error_line(&mut self, line: &str) {
        self.store.append_text_line(self.id, line);
    }
}

pub struct ChatController<B: BackendClient> {
    backend: B,
    transcript: TranscriptStore,
    state: ControllerState,
    indicator: TypingIndicator,
}

impl<B: BackendClient> ChatController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            transcript: TranscriptStore::new(),
            state: ControllerState::Idle,
            indicator: TypingIndicator::default(),
        }
    }

    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn indicator_visible(&self) -> bool {
        self.indicator.visible
    }

    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    /// Last transcript entry holding a visualizable result set, if any.
    pub fn last_visualizable_result(&self) -> Option<Uuid> {
        self.transcript
            .messages()
            .iter()
            .rev()
            .find(|m| matches!(m.body, MessageBody::Results { visualizable: true, .. }))
            .map(|m| m.id)
    }

    /// One `/query` cycle. Every failure is converted into a transcript
    /// entry; nothing propagates out of the session.
    pub async fn submit(&mut self, question: &str) {
        let question = question.trim();
        if question.is_empty() {
            warn!("ignoring empty question");
            return;
        }

        self.state = ControllerState::Pending;
        self.transcript
            .append(Role::User, MessageBody::Text(question.to_string()));
        self.indicator.show();

        let outcome = self.backend.submit_query(question).await;
        self.indicator.hide();

        match outcome {
            Ok(response) => self.route_response(response),
            Err(ChatError::MalformedPayload(detail)) => {
                error!("unusable /query reply: {}", detail);
                self.transcript
                    .append(Role::Error, MessageBody::Text(MALFORMED_REPLY_MESSAGE.into()));
            }
            Err(err) => {
                error!("query request failed: {}", err);
                self.transcript
                    .append(Role::Error, MessageBody::Text(REQUEST_FAILED_MESSAGE.into()));
            }
        }

        self.state = ControllerState::Idle;
    }

    fn route_response(&mut self, response: ChatResponse) {
        match response {
            ChatResponse::Message(text) => {
                self.transcript.append(Role::Bot, MessageBody::Text(text));
            }
            ChatResponse::ErrorMessage(text) => {
                self.transcript.append(Role::Error, MessageBody::Text(text));
            }
            ChatResponse::EmptyResults { sql_query } => {
                if let Some(sql) = sql_query {
                    self.transcript
                        .append(Role::Bot, MessageBody::GeneratedQuery(sql));
                }
                self.transcript
                    .append(Role::Bot, MessageBody::Info(EMPTY_RESULTS_MESSAGE.into()));
            }
            ChatResponse::QueryResults { sql_query, results } => {
                if let Some(sql) = sql_query {
                    // verbatim, never reformatted
                    self.transcript
                        .append(Role::Bot, MessageBody::GeneratedQuery(sql));
                }
                if results.is_empty() {
                    self.transcript
                        .append(Role::Bot, MessageBody::Info(NO_DATA_MESSAGE.into()));
                } else {
                    let table = renderer::render(&results);
                    let visualizable = classifier::is_visualizable(&results);
                    info!(
                        "rendered {} of {} rows (visualizable: {})",
                        table.rows.len(),
                        results.len(),
                        visualizable
                    );
                    self.transcript.append(
                        Role::Bot,
                        MessageBody::Results {
                            table,
                            results,
                            visualizable,
                        },
                    );
                }
            }
        }
    }

    /// One `/api/chat` streaming cycle. A non-2xx status or send failure
    /// short-circuits to a single bot entry carrying an error indicator.
    pub async fn stream_chat(&mut self, message: &str) {
        let message = message.trim();
        if message.is_empty() {
            warn!("ignoring empty chat message");
            return;
        }

        self.state = ControllerState::Pending;
        self.transcript
            .append(Role::User, MessageBody::Text(message.to_string()));
        self.indicator.show();

        match self.backend.open_chat_stream(message).await {
            Err(err) => {
                self.indicator.hide();
                error!("chat stream request failed: {}", err);
                self.transcript
                    .append(Role::Bot, MessageBody::Text(format!("⚠️ Error: {}", err)));
            }
            Ok(chunks) => {
                // the response arrived; hide before the first content write
                self.indicator.hide();
                let id = self
                    .transcript
                    .append(Role::Bot, MessageBody::Text(String::new()));
                let mut sink = TranscriptSink {
                    store: &mut self.transcript,
                    id,
                };
                if let Err(err) = stream::consume(chunks, &mut sink).await {
                    // partial content stays in the transcript as rendered
                    error!("chat stream aborted: {}", err);
                }
            }
        }

        self.state = ControllerState::Idle;
    }

    /// Visualization sub-request for a transcript entry the classifier
    /// approved. Shows a loading node in the mount, then either injects the
    /// payload or replaces the mount content with an inline error panel. A
    /// missing mount fails fast, including one torn down mid-request.
    pub async fn request_visualization(
        &mut self,
        message_id: Uuid,
        doc: &mut Document,
        target: &str,
        host: &mut dyn ScriptHost,
    ) -> Result<()> {
        let results: QueryResult = match self.transcript.get(message_id).map(|m| &m.body) {
            Some(MessageBody::Results {
                results,
                visualizable: true,
                ..
            }) => results.clone(),
            _ => {
                warn!("visualization requested without a visualizable result set");
                return Ok(());
            }
        };

        match doc.mount_mut(target) {
            Some(mount) => {
                mount.clear();
                mount.attach(Node::Markup(LOADING_MARKUP.to_string()));
            }
            None => return Err(ChatError::MountTargetMissing(target.to_string()).into()),
        }

        match self.backend.generate_visualization(&results).await {
            Ok(payload) => {
                match doc.mount_mut(target) {
                    Some(mount) => mount.clear(),
                    None => {
                        return Err(ChatError::MountTargetMissing(target.to_string()).into())
                    }
                }
                injector::inject(doc, target, &payload, host)
            }
            Err(err) => {
                error!("visualization request failed: {}", err);
                match doc.mount_mut(target) {
                    Some(mount) => {
                        mount.clear();
                        mount.attach(Node::Markup(format!(
                            "<div class=\"error-message\"><p>Error generating visualization: {}</p>\
                             <p>Please try again or use a different dataset.</p></div>",
                            err
                        )));
                        Ok(())
                    }
                    None => Err(ChatError::MountTargetMissing(target.to_string()).into()),
                }
            }
        }
    }
}
