//! Server-sent events line decoder.
//!
//! Vendors stream `data: <json>` lines. Network chunks split lines (and
//! multi-byte characters) arbitrarily, so bytes are buffered until a full
//! line is available. A newline byte never occurs inside a UTF-8 sequence,
//! so complete lines are always complete characters.

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder yielding the payload of each complete `data:` line
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns payloads of every line completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = Self::payload(&line[..line.len() - 1]) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        Self::payload(&line)
    }

    fn payload(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.strip_suffix('\r').unwrap_or(&line);
        let data = line.strip_prefix(DATA_PREFIX)?;
        if data == DONE_SENTINEL || data.is_empty() {
            return None;
        }
        Some(data.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_lines() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"a\":1}\n\ndata: {\"b\":2}\n");
        assert_eq!(payloads, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn test_partial_record_is_buffered() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"te").is_empty());
        assert!(decoder.push(b"xt\":\"hi\"}").is_empty());
        assert_eq!(decoder.push(b"\n"), vec![r#"{"text":"hi"}"#]);
    }

    #[test]
    fn test_split_multibyte_character() {
        let line = "data: 圓桌\n".as_bytes();
        // Split inside the first CJK character
        let (head, tail) = line.split_at(8);
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(head).is_empty());
        assert_eq!(decoder.push(tail), vec!["圓桌"]);
    }

    #[test]
    fn test_ignores_done_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(
            b"event: message_start\r\ndata: {\"x\":1}\r\n: keep-alive\ndata: [DONE]\n",
        );
        assert_eq!(payloads, vec![r#"{"x":1}"#]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }
}
