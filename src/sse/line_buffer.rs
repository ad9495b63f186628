//! Splits an incoming byte stream into text lines.

/// Accumulates raw chunks and yields complete lines.
///
/// Lines end at `\n`; a trailing `\r` is dropped. Bytes are kept until a
/// newline arrives, so a multi-byte character split across chunks decodes
/// correctly. Invalid UTF-8 is replaced rather than rejected.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to contain no newline
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a received chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the next complete line, if one is buffered.
    pub fn next_line(&mut self) -> Option<String> {
        let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') else {
            self.scanned = self.buffer.len();
            return None;
        };
        let newline_pos = self.scanned + offset;
        self.scanned = 0;
        let mut line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Bytes received after the last newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_lines() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"id: 1\ndata: x\n\n");
        assert_eq!(buffer.next_line().as_deref(), Some("id: 1"));
        assert_eq!(buffer.next_line().as_deref(), Some("data: x"));
        assert_eq!(buffer.next_line().as_deref(), Some(""));
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn test_crlf() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"data: x\r\n\r\n");
        assert_eq!(buffer.next_line().as_deref(), Some("data: x"));
        assert_eq!(buffer.next_line().as_deref(), Some(""));
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"data: hel");
        assert_eq!(buffer.next_line(), None);
        assert_eq!(buffer.pending(), 9);
        buffer.push(b"lo\n");
        assert_eq!(buffer.next_line().as_deref(), Some("data: hello"));
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let bytes = "data: café\n".as_bytes();
        let split = bytes.len() - 2;
        let mut buffer = LineBuffer::new();
        buffer.push(&bytes[..split]);
        buffer.push(&bytes[split..]);
        assert_eq!(buffer.next_line().as_deref(), Some("data: café"));
    }

    #[test]
    fn test_long_line_in_small_chunks() {
        let line = format!("data: {}", "x".repeat(10_000));
        let mut buffer = LineBuffer::new();
        for chunk in line.as_bytes().chunks(3) {
            buffer.push(chunk);
            assert_eq!(buffer.next_line(), None);
            assert_eq!(buffer.scanned, buffer.pending());
        }
        buffer.push(b"\nid: 2\n");
        assert_eq!(buffer.next_line().as_deref(), Some(line.as_str()));
        assert_eq!(buffer.scanned, 0);
        assert_eq!(buffer.next_line().as_deref(), Some("id: 2"));
        assert_eq!(buffer.pending(), 0);
    }
}
