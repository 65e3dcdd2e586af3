// Tier 1: Tool Output Text Decoding
//
// Concept: Turn raw tool output bytes into text lines without ever failing
// Synchronization: Accepts &[u8], outputs Vec<Cow<str>> (one entry per line)
//
// Algorithm:
// 1. Split on '\n', strip a trailing '\r'
// 2. Decode each line as UTF-8
// 3. Lines that are not valid UTF-8 are decoded as ISO-8859-1 (every byte maps
//    to the code point of the same value), so decoding cannot fail

use std::borrow::Cow;

/// Decode raw tool output into lines
///
/// A trailing newline does not produce an extra empty line.
pub fn decode_lines(raw: &[u8]) -> Vec<Cow<'_, str>> {
    let body = raw.strip_suffix(b"\n").unwrap_or(raw);
    if body.is_empty() {
        return Vec::new();
    }

    body.split(|b| *b == b'\n')
        .enumerate()
        .map(|(index, line)| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            match std::str::from_utf8(line) {
                Ok(text) => Cow::Borrowed(text),
                Err(e) => {
                    tracing::debug!(
                        line_number = index + 1,
                        valid_up_to = e.valid_up_to(),
                        "Line is not valid UTF-8, decoding as ISO-8859-1"
                    );
                    Cow::Owned(decode_latin1(line))
                }
            }
        })
        .collect()
}

/// ISO-8859-1 decode (total: byte value == code point)
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Shorten a line for log output
pub fn truncate_for_log(line: &str) -> &str {
    const MAX_LOG_CHARS: usize = 120;
    match line.char_indices().nth(MAX_LOG_CHARS) {
        Some((byte_index, _)) => &line[..byte_index],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_lines_borrowed() {
        let lines = decode_lines(b"alpha\r\nbeta\n");
        assert_eq!(lines, vec!["alpha", "beta"]);
        assert!(matches!(lines[0], Cow::Borrowed(_)));
    }

    #[test]
    fn test_invalid_utf8_falls_back_per_line() {
        // 0xE9 is 'é' in ISO-8859-1 and invalid as a lone UTF-8 byte
        let raw = b"prot\xE9in_1\tK00013\nplain\n";
        let lines = decode_lines(raw);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "prot\u{e9}in_1\tK00013");
        assert_eq!(lines[1], "plain");
        assert!(matches!(lines[1], Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_input() {
        assert!(decode_lines(b"").is_empty());
        assert!(decode_lines(b"\n").is_empty());
    }

    #[test]
    fn test_truncate_for_log() {
        let long = "x".repeat(500);
        assert_eq!(truncate_for_log(&long).len(), 120);
        assert_eq!(truncate_for_log("short"), "short");
    }
}
