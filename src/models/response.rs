use serde::Deserialize;
use serde_json::Value;

use crate::error::ChatError;
use crate::models::result::QueryResult;

/// Raw wire shape of a `/query` reply. Which fields are present depends on
/// the outcome; field names match the backend exactly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub has_error: Option<bool>,
    #[serde(default)]
    pub no_sql: Option<bool>,
    #[serde(default)]
    pub sql_query: Option<String>,
    #[serde(default)]
    pub results: Option<QueryResult>,
    #[serde(default)]
    pub empty_results: Option<bool>,
    #[serde(default)]
    pub success: Option<bool>,
}

/// A `/query` reply after classification. Downstream code matches on this
/// exhaustively instead of re-checking optional fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatResponse {
    /// Plain assistant message.
    Message(String),
    /// Assistant message flagged as an error (`has_error` or `no_sql`).
    ErrorMessage(String),
    /// A generated query with its result rows. The rows may be an empty
    /// sequence, which is distinct from the `empty_results` flag.
    QueryResults {
        sql_query: Option<String>,
        results: QueryResult,
    },
    /// The backend explicitly declared an empty result.
    EmptyResults { sql_query: Option<String> },
}

/// Classify a raw `/query` JSON body into a [`ChatResponse`].
pub fn classify(value: Value) -> Result<ChatResponse, ChatError> {
    let reply: QueryReply =
        serde_json::from_value(value).map_err(|e| ChatError::MalformedPayload(e.to_string()))?;
    classify_reply(reply)
}

/// The single classification step. Precedence: error-flagged message, declared
/// empty result, result rows, plain message. Anything else is malformed.
pub fn classify_reply(reply: QueryReply) -> Result<ChatResponse, ChatError> {
    let flagged = reply.has_error.unwrap_or(false) || reply.no_sql.unwrap_or(false);
    if flagged {
        if let Some(message) = reply.message {
            return Ok(ChatResponse::ErrorMessage(message));
        }
        return Err(ChatError::MalformedPayload(
            "error flag set but no message present".to_string(),
        ));
    }

    if reply.empty_results.unwrap_or(false) {
        return Ok(ChatResponse::EmptyResults {
            sql_query: reply.sql_query,
        });
    }

    if let Some(results) = reply.results {
        return Ok(ChatResponse::QueryResults {
            sql_query: reply.sql_query,
            results,
        });
    }

    if let Some(message) = reply.message {
        return Ok(ChatResponse::Message(message));
    }

    Err(ChatError::MalformedPayload(
        "reply carries neither a message nor results".to_string(),
    ))
}
