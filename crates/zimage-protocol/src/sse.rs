//! Terminal-event scanner for Gradio result streams.
//!
//! Only the subset Gradio emits is understood: `event:` lines followed directly
//! by a single `data:` line. Comments, `retry:` and multi-line data are ignored.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum TerminalEvent {
    /// Parsed JSON payload of an `event: complete` record.
    Complete(Value),
    /// `event: error`, with whatever message the payload carried.
    Error(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Complete,
    Error,
}

/// Returns the first terminal record in `body`, or `None` if the stream ended
/// without one. A `complete` record whose data is not valid JSON is skipped.
pub fn scan_terminal(body: &str) -> Option<TerminalEvent> {
    let mut pending: Option<Pending> = None;

    for raw in body.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(name) = line.strip_prefix("event:") {
            pending = match name.trim() {
                "complete" => Some(Pending::Complete),
                "error" => Some(Pending::Error),
                _ => None,
            };
            continue;
        }

        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            match pending.take() {
                Some(Pending::Complete) => {
                    if let Ok(value) = serde_json::from_str::<Value>(data) {
                        return Some(TerminalEvent::Complete(value));
                    }
                }
                Some(Pending::Error) => return Some(TerminalEvent::Error(error_message(data))),
                None => {}
            }
            continue;
        }

        if !line.is_empty() {
            pending = None;
        }
    }

    None
}

fn error_message(data: &str) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(data) {
        Ok(Value::String(message)) => Some(message),
        Ok(Value::Object(map)) => map
            .get("error")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Ok(Value::Null) => None,
        Ok(other) => Some(other.to_string()),
        Err(_) => Some(data.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn complete_after_heartbeats() {
        let body = "event: generating\ndata: null\n\nevent: heartbeat\ndata: null\n\n\
                    event: complete\ndata: [{\"url\":\"https://x/y.png\"}, 42]\n\n";
        assert_eq!(
            scan_terminal(body),
            Some(TerminalEvent::Complete(json!([{ "url": "https://x/y.png" }, 42])))
        );
    }

    #[test]
    fn crlf_framing_is_accepted() {
        let body = "event: complete\r\ndata: [1]\r\n\r\n";
        assert_eq!(scan_terminal(body), Some(TerminalEvent::Complete(json!([1]))));
    }

    #[test]
    fn data_without_terminal_event_is_ignored() {
        assert_eq!(scan_terminal("data: [{\"url\":\"a\"}]\n\n"), None);
    }

    #[test]
    fn error_event_carries_message() {
        assert_eq!(
            scan_terminal("event: error\ndata: \"ZeroGPU quota exceeded\"\n\n"),
            Some(TerminalEvent::Error(Some("ZeroGPU quota exceeded".to_string())))
        );
        assert_eq!(
            scan_terminal("event: error\ndata: null\n\n"),
            Some(TerminalEvent::Error(None))
        );
    }

    #[test]
    fn broken_complete_payload_keeps_scanning() {
        let body = "event: complete\ndata: {oops\n\nevent: complete\ndata: [2]\n\n";
        assert_eq!(scan_terminal(body), Some(TerminalEvent::Complete(json!([2]))));
    }
}
