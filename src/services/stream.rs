//! Incremental decoding and rendering of a streamed chat answer.
//!
//! Chunks arrive with arbitrary boundaries, so the decoder carries partial
//! UTF-8 sequences between reads, and after every chunk the ENTIRE
//! accumulated buffer is re-rendered through the markdown formatter. Block
//! constructs like code fences depend on buffer-global context, so a
//! delta-only render would corrupt them.

use futures_util::{Stream, StreamExt};
use log::{debug, error};

use crate::error::ChatError;
use crate::markdown;

/// Where rendered stream output goes: a single growing message.
pub trait RenderSink {
    /// Replace the sink content with the latest whole-buffer render.
    fn render(&mut self, formatted: &str);

    /// Append a one-line error indicator, keeping content already shown.
    fn append_error_line(&mut self, line: &str);
}

/// Transient per-response decode state.
#[derive(Debug, Default)]
pub struct StreamSession {
    buffer: String,
    carry: Vec<u8>,
    finished: bool,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Decode one chunk into the buffer. Returns true when new text appeared.
    /// A multi-byte sequence split across chunks is held back until its
    /// remaining bytes arrive; invalid bytes decode to U+FFFD.
    fn push_chunk(&mut self, chunk: &[u8]) -> bool {
        self.carry.extend_from_slice(chunk);
        let before = self.buffer.len();
        loop {
            match std::str::from_utf8(&self.carry) {
                Ok(valid) => {
                    self.buffer.push_str(valid);
                    self.carry.clear();
                    break;
                }
                Err(err) => {
                    let valid_len = err.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.carry[..valid_len]));
                    match err.error_len() {
                        Some(bad) => {
                            self.carry.drain(..valid_len + bad);
                            self.buffer.push('\u{FFFD}');
                        }
                        None => {
                            // incomplete trailing sequence, wait for the next chunk
                            self.carry.drain(..valid_len);
                            break;
                        }
                    }
                }
            }
        }
        self.buffer.len() > before
    }

    /// Mark end-of-stream. A dangling partial sequence becomes U+FFFD.
    fn finish(&mut self) -> bool {
        let flushed = !self.carry.is_empty();
        if flushed {
            self.buffer.push('\u{FFFD}');
            self.carry.clear();
        }
        self.finished = true;
        flushed
    }
}

/// Drive a byte stream into a render sink until end-of-stream.
///
/// Renders are strictly FIFO, one suspension point per chunk. A read error
/// appends a one-line indicator to the sink, preserves whatever was already
/// rendered, and stops reading. Returns the final accumulated plain text.
pub async fn consume<S, B, E>(mut chunks: S, sink: &mut dyn RenderSink) -> Result<String, ChatError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut session = StreamSession::new();
    while let Some(item) = chunks.next().await {
        match item {
            Ok(chunk) => {
                debug!("stream chunk: {} bytes", chunk.as_ref().len());
                if session.push_chunk(chunk.as_ref()) {
                    sink.render(&markdown::render(session.text()));
                }
            }
            Err(err) => {
                error!("chat stream failed mid-read: {}", err);
                sink.append_error_line(&format!("⚠️ Error: {}", err));
                session.finished = true;
                return Err(ChatError::StreamReadFailure(err.to_string()));
            }
        }
    }
    if session.finish() {
        sink.render(&markdown::render(session.text()));
    }
    Ok(session.buffer)
}
