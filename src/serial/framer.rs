//! Newline framing over the inbound byte stream.
//!
//! Bytes are accumulated as received and split at every `\n`. Everything after
//! the last terminator stays buffered for the next chunk, so a line split
//! across reads (or a multi-byte character split across reads) is reassembled
//! before it is decoded.

use super::encoding::decode_line;

const TERMINATOR: u8 = b'\n';

/// Accumulates raw bytes and yields complete, trimmed lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    /// Creates an empty framer.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Appends `bytes` and returns an iterator over every line completed by
    /// them, in arrival order.
    ///
    /// The iterator borrows the framer; lines it does not yield before being
    /// dropped remain buffered and come out of the next call.
    pub fn feed<'a>(&'a mut self, bytes: &[u8]) -> Lines<'a> {
        self.buffer.extend_from_slice(bytes);
        Lines { framer: self }
    }

    /// Bytes received after the last terminator.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Removes and decodes the first complete line, if there is one.
    fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == TERMINATOR)?;
        let line = decode_line(&self.buffer[..end]);
        self.buffer.drain(..=end);
        Some(line)
    }
}

/// Lazy sequence of lines produced by [`LineFramer::feed`].
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_chunks(chunks: &[&[u8]]) -> Vec<String> {
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(framer.feed(chunk));
        }
        lines
    }

    #[test]
    fn test_single_line() {
        assert_eq!(frame_chunks(&[b"90,50\n"]), vec!["90,50"]);
    }

    #[test]
    fn test_partial_line_is_retained() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"45,1").count(), 0);
        assert_eq!(framer.pending(), b"45,1");
        let lines: Vec<String> = framer.feed(b"20\nB,").collect();
        assert_eq!(lines, vec!["45,120"]);
        assert_eq!(framer.pending(), b"B,");
    }

    #[test]
    fn test_empty_lines_are_yielded() {
        assert_eq!(frame_chunks(&[b"\n\r\nAUTO\n"]), vec!["", "", "AUTO"]);
    }

    #[test]
    fn test_chunk_boundaries_do_not_matter() {
        let stream: &[u8] =
            b"B,x,12.10,0.50,11.80,45.00,540.00\r\n90,50\nLASER_ACTIVATED\n\n170,3";
        let whole = frame_chunks(&[stream]);
        for size in 1..stream.len() {
            let chunks: Vec<&[u8]> = stream.chunks(size).collect();
            assert_eq!(frame_chunks(&chunks), whole, "chunk size {size}");
        }
        assert_eq!(
            whole,
            vec![
                "B,x,12.10,0.50,11.80,45.00,540.00",
                "90,50",
                "LASER_ACTIVATED",
                "",
            ]
        );
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let text = "90°,50\n".as_bytes();
        let split = text.iter().position(|&b| b == 0xC2).unwrap() + 1;
        let lines = frame_chunks(&[&text[..split], &text[split..]]);
        assert_eq!(lines, vec!["90°,50"]);
    }

    #[test]
    fn test_unconsumed_lines_survive_dropped_iterator() {
        let mut framer = LineFramer::new();
        let first = framer.feed(b"1,2\n3,4\n").next();
        assert_eq!(first.as_deref(), Some("1,2"));
        let rest: Vec<String> = framer.feed(b"").collect();
        assert_eq!(rest, vec!["3,4"]);
    }
}
