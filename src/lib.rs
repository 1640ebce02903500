//! Chat client engine for a natural-language data analytics backend.
//!
//! The crate owns the client-side half of a question-and-answer analytics
//! session: it submits questions, classifies the backend's reply shape,
//! renders tabular results, incrementally decodes streamed answers, and
//! mounts server-generated visualization fragments into a document model
//! with exactly-once script execution.

pub mod config;
pub mod dom;
pub mod error;
pub mod format;
pub mod markdown;
pub mod models;
pub mod services;
