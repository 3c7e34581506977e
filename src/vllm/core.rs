//! Wire-level pieces of the completion stream: the carry-over line
//! buffer and fragment extraction from `data:` events.

use serde_json::{Value, json};

use crate::session::Message;

const DATA_MARKER: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Accumulates raw response bytes and yields complete lines. Network
/// chunks do not align with line boundaries (or even UTF-8 code point
/// boundaries), so the trailing partial line is carried over to the
/// next read as bytes.
#[derive(Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every complete line it unlocked.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        lines
    }
}

/// Extract the incremental text fragment from one event line, if it
/// carries one. Non-data lines, the `[DONE]` sentinel, empty payloads
/// and unparseable JSON all yield None; a single bad line never
/// aborts the stream.
pub fn delta_from_line(line: &str) -> Option<String> {
    let line = line.trim();
    let data = line.strip_prefix(DATA_MARKER)?.trim();
    if data.is_empty() || data == DONE_SENTINEL {
        return None;
    }

    let value = serde_json::from_str::<Value>(data)
        .inspect_err(|e| tracing::debug!("Skipping unparseable stream line: {}", e))
        .ok()?;

    value["choices"][0]["delta"]["content"]
        .as_str()
        .map(|s| s.to_string())
}

/// Build the streaming completion payload for the given context
/// window. Only role and content go over the wire.
pub fn completion_request(model: &str, messages: &[Message]) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();
    json!({
        "model": model,
        "messages": messages,
        "stream": true,
    })
}
