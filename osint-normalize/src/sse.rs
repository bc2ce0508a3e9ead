//! Server-Sent-Events decoding
//!
//! Turns a byte stream framed as `field: value` lines separated by blank
//! lines into discrete events. Works incrementally so a streaming HTTP
//! body can be fed chunk by chunk; [`parse_events`] handles a whole body.

/// One dispatched SSE event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// The `event:` field, if any
    pub event: Option<String>,
    /// All `data:` lines joined with `\n`
    pub data: String,
    /// The `id:` field, if any
    pub id: Option<String>,
}

/// Incremental SSE decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line
    line: Vec<u8>,
    /// Last byte seen was `\r`, so a following `\n` belongs to it
    after_cr: bool,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every event completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();

        for &byte in chunk {
            match byte {
                b'\n' if self.after_cr => {
                    self.after_cr = false;
                }
                b'\n' | b'\r' => {
                    self.after_cr = byte == b'\r';
                    let line = std::mem::take(&mut self.line);
                    if let Some(event) = self.process_line(&line) {
                        events.push(event);
                    }
                }
                _ => {
                    self.after_cr = false;
                    self.line.push(byte);
                }
            }
        }

        events
    }

    /// Flush a trailing event that was not followed by a blank line
    pub fn finish(mut self) -> Option<SseEvent> {
        if !self.line.is_empty() {
            let line = std::mem::take(&mut self.line);
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, raw: &[u8]) -> Option<SseEvent> {
        if raw.is_empty() {
            return self.dispatch();
        }

        let line = String::from_utf8_lossy(raw);
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(idx) => {
                let value = &line[idx + 1..];
                (&line[..idx], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line.as_ref(), ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let id = self.id.take();
        if self.data.is_empty() {
            return None;
        }

        Some(SseEvent {
            event,
            data: std::mem::take(&mut self.data).join("\n"),
            id,
        })
    }
}

/// Decode a complete SSE body
pub fn parse_events(text: &str) -> Vec<SseEvent> {
    let mut decoder = SseDecoder::new();
    let mut events = decoder.feed(text.as_bytes());
    events.extend(decoder.finish());
    events
}

/// Whether a body is framed as SSE rather than plain JSON
pub fn looks_like_sse(text: &str) -> bool {
    text.lines()
        .map(str::trim_start)
        .find(|line| !line.is_empty() && !line.starts_with(':'))
        .map(|line| {
            line.starts_with("data:") || line.starts_with("event:") || line.starts_with("id:")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_events() {
        let body = "data: {\"a\":1}\n\ndata: {\"b\":2}\n\n";
        let events = parse_events(body);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "{\"a\":1}");
        assert_eq!(events[1].data, "{\"b\":2}");
    }

    #[test]
    fn test_multiline_data_and_fields() {
        let body = ": keep-alive\nevent: batch\nid: 7\ndata: line one\ndata:line two\n\n";
        let events = parse_events(body);
        assert_eq!(
            events,
            vec![SseEvent {
                event: Some("batch".to_string()),
                data: "line one\nline two".to_string(),
                id: Some("7".to_string()),
            }]
        );
    }

    #[test]
    fn test_trailing_event_without_blank_line() {
        let events = parse_events("data: first\n\ndata: last");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].data, "last");
    }

    #[test]
    fn test_chunk_boundaries_and_crlf() {
        let body = b"data: he\r\n\r\ndata: wor\r\ndata: ld\r\n\r\n";
        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        // split everywhere, including between \r and \n
        for chunk in body.chunks(3) {
            events.extend(decoder.feed(chunk));
        }
        events.extend(decoder.finish());

        let data: Vec<_> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["he", "wor\nld"]);
    }

    #[test]
    fn test_event_without_data_is_not_dispatched() {
        assert!(parse_events("event: ping\n\n").is_empty());
    }

    #[test]
    fn test_looks_like_sse() {
        assert!(looks_like_sse("data: {}\n\n"));
        assert!(looks_like_sse(": comment\nevent: x\ndata: 1\n\n"));
        assert!(!looks_like_sse("{\"data\": 1}"));
        assert!(!looks_like_sse(""));
    }
}
