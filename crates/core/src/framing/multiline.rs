//! Accumulates a `+COMMAND` multi-line body across successive lines.

use super::dotstuff;

/// Collects lines belonging to a `+`-prefixed multi-line command argument
/// until the `.` terminator line arrives, then decodes the dot-stuffed body.
#[derive(Debug, Default)]
pub struct MultilineCollector {
    lines: Vec<Vec<u8>>,
}

impl MultilineCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Feeds one already-terminator-stripped line.
    ///
    /// Returns the decoded body once the `.` terminator line is seen;
    /// otherwise buffers `line` and returns `None`.
    pub fn push_line(&mut self, line: Vec<u8>) -> Option<Vec<u8>> {
        if line == b"." {
            return Some(dotstuff::decode_lines(&self.lines));
        }
        self.lines.push(line);
        None
    }

    /// Number of lines buffered so far, not counting the terminator.
    #[must_use]
    pub fn pending_lines(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_lines_until_terminator() {
        let mut collector = MultilineCollector::new();
        assert!(collector.push_line(b"line one".to_vec()).is_none());
        assert!(collector.push_line(b"line two".to_vec()).is_none());
        let body = collector.push_line(b".".to_vec()).unwrap();
        assert_eq!(body, b"line one\nline two");
    }

    #[test]
    fn empty_body_terminates_immediately() {
        let mut collector = MultilineCollector::new();
        assert_eq!(collector.push_line(b".".to_vec()).unwrap(), b"");
    }

    #[test]
    fn unstuffs_lines_starting_with_dot() {
        let mut collector = MultilineCollector::new();
        collector.push_line(b"..looks stuffed".to_vec());
        let body = collector.push_line(b".".to_vec()).unwrap();
        assert_eq!(body, b".looks stuffed");
    }
}
