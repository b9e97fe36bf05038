//! Growable LF line extraction with a bounded capacity.

use crate::error::FramingError;

const INITIAL_CAPACITY: usize = 512;
const MAX_CAPACITY: usize = 1024 * 1024;

/// Buffers incoming bytes and hands back complete, CR-stripped lines.
///
/// The buffer grows by power-of-two doubling as a single logical line
/// outgrows its current capacity, and refuses to grow past `MAX_CAPACITY`,
/// failing the connection with [`FramingError::LineTooLong`] rather than
/// letting a hostile or broken controller exhaust memory.
#[derive(Debug, Default)]
pub struct LineReader {
    buf: Vec<u8>,
    cap: usize,
}

impl LineReader {
    /// Creates an empty reader at the initial capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(INITIAL_CAPACITY),
            cap: INITIAL_CAPACITY,
        }
    }

    /// Appends bytes read from the transport.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::LineTooLong`] if the pending (not yet
    /// terminated) line would exceed the implementation's capacity cap.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), FramingError> {
        let needed = self.buf.len() + chunk.len();
        while needed > self.cap {
            if self.cap >= MAX_CAPACITY {
                return Err(FramingError::LineTooLong);
            }
            self.cap = (self.cap * 2).min(MAX_CAPACITY);
        }
        if needed > self.cap {
            return Err(FramingError::LineTooLong);
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    /// Removes and returns the next complete line, if one is buffered.
    ///
    /// A line is terminated by `\n`; a trailing `\r` (forming a `\r\n` pair)
    /// is stripped from the returned payload. Returns `None` without
    /// consuming anything if no `\n` is present yet.
    pub fn take_line(&mut self) -> Option<Vec<u8>> {
        let idx = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=idx).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }

    /// Returns the number of bytes currently buffered awaiting a terminator.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_crlf_line() {
        let mut reader = LineReader::new();
        reader.feed(b"AUTHENTICATE\r\n").unwrap();
        assert_eq!(reader.take_line().unwrap(), b"AUTHENTICATE");
        assert!(reader.take_line().is_none());
    }

    #[test]
    fn extracts_bare_lf_line() {
        let mut reader = LineReader::new();
        reader.feed(b"QUIT\n").unwrap();
        assert_eq!(reader.take_line().unwrap(), b"QUIT");
    }

    #[test]
    fn incomplete_line_returns_none_without_consuming() {
        let mut reader = LineReader::new();
        reader.feed(b"SETEVENT").unwrap();
        assert!(reader.take_line().is_none());
        reader.feed(b"S BW\r\n").unwrap();
        assert_eq!(reader.take_line().unwrap(), b"SETEVENTS BW");
    }

    #[test]
    fn handles_several_lines_in_one_chunk() {
        let mut reader = LineReader::new();
        reader.feed(b"FOO\r\nBAR\r\nBAZ\r\n").unwrap();
        assert_eq!(reader.take_line().unwrap(), b"FOO");
        assert_eq!(reader.take_line().unwrap(), b"BAR");
        assert_eq!(reader.take_line().unwrap(), b"BAZ");
        assert!(reader.take_line().is_none());
    }

    #[test]
    fn grows_capacity_by_doubling() {
        let mut reader = LineReader::new();
        let chunk = vec![b'a'; INITIAL_CAPACITY + 1];
        reader.feed(&chunk).unwrap();
        assert!(reader.cap > INITIAL_CAPACITY);
        assert_eq!(reader.cap, INITIAL_CAPACITY * 2);
    }

    #[test]
    fn oversize_line_is_a_protocol_error() {
        let mut reader = LineReader::new();
        let chunk = vec![b'a'; MAX_CAPACITY + 1];
        assert_eq!(reader.feed(&chunk), Err(FramingError::LineTooLong));
    }

    #[test]
    fn growth_stops_exactly_at_the_cap() {
        let mut reader = LineReader::new();
        let chunk = vec![b'a'; MAX_CAPACITY];
        assert!(reader.feed(&chunk).is_ok());
        assert_eq!(reader.cap, MAX_CAPACITY);
    }
}
