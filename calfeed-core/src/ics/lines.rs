//! Logical line reader with RFC 5545 style unfolding.

use std::io::BufRead;

/// Lazily yields unfolded logical lines from a byte stream.
///
/// A raw line starting with a single space continues the previous line: the
/// space is dropped and the rest is appended with no separator. Trailing
/// CR/LF sequences are stripped. The reader never fails; an IO error ends the
/// sequence early.
pub struct LineReader<R> {
    reader: R,
    /// Raw line read ahead while looking for continuations
    pending: Option<String>,
    done: bool,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        LineReader {
            reader,
            pending: None,
            done: false,
        }
    }

    fn next_raw(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                Some(String::from_utf8_lossy(&buf).into_owned())
            }
            Err(e) => {
                tracing::warn!(error = %e, "feed stream ended with a read error");
                self.done = true;
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        // A continuation with nothing before it is an ordinary line
        let mut line = match self.pending.take() {
            Some(line) => line,
            None => self.next_raw()?,
        };

        while let Some(raw) = self.next_raw() {
            match raw.strip_prefix(' ') {
                Some(rest) => line.push_str(rest),
                None => {
                    self.pending = Some(raw);
                    break;
                }
            }
        }

        Some(line)
    }
}

/// Convenience for unfolding in-memory content.
pub fn logical_lines(content: &str) -> LineReader<&[u8]> {
    LineReader::new(content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(content: &str) -> Vec<String> {
        logical_lines(content).collect()
    }

    #[test]
    fn test_folded_summary_is_joined_without_separator() {
        let lines = collect("SUMMARY:Hello\r\n  World\r\nUID:1\r\n");
        assert_eq!(lines, vec!["SUMMARY:Hello World", "UID:1"]);
    }

    #[test]
    fn test_single_space_continuation_joins_directly() {
        let lines = collect("SUMMARY:Hello\n World\n");
        assert_eq!(lines, vec!["SUMMARY:HelloWorld"]);
    }

    #[test]
    fn test_unfolding_reconstructs_original_text() {
        let original = "DESCRIPTION:The quick brown fox jumps over the lazy dog, twice.";
        let folded = format!(
            "{}\r\n {}\r\n {}\r\n",
            &original[..20],
            &original[20..41],
            &original[41..]
        );
        assert_eq!(collect(&folded), vec![original.to_string()]);
    }

    #[test]
    fn test_leading_continuation_is_an_ordinary_line() {
        let lines = collect(" orphan\nUID:1\n");
        assert_eq!(lines, vec![" orphan", "UID:1"]);
    }

    #[test]
    fn test_tab_is_not_a_continuation() {
        let lines = collect("A:1\n\tB:2\n");
        assert_eq!(lines, vec!["A:1", "\tB:2"]);
    }

    #[test]
    fn test_missing_final_newline_and_empty_input() {
        assert_eq!(collect("A:1\nB:2"), vec!["A:1", "B:2"]);
        assert!(collect("").is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let bytes: &[u8] = b"SUMMARY:caf\xe9\n";
        let lines: Vec<String> = LineReader::new(bytes).collect();
        assert_eq!(lines, vec!["SUMMARY:caf\u{FFFD}"]);
    }
}
