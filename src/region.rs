//! The line locator and the forward probe, operating over a read-only byte
//! region shared by both random-access search (`search::binary_search`)
//! and, indirectly, the streaming driver's own line-framing logic.

use crate::{error::Result, extractor::Extracted, format::CompiledMatcher};

/// The result of locating the line containing `position`.
pub enum Located {
    /// `position` itself sits on a `\n` byte.
    NotFound,
    /// The whole buffer has no `\n` anywhere.
    Null,
    Found { start: usize, length: usize },
}

/// Given `(data, position)`, returns the `[start, length)` of the line
/// containing `position`.
pub fn locate_line(data: &[u8], position: usize) -> Located {
    if data[position] == b'\n' {
        return Located::NotFound;
    }
    let start = match data[..position].iter().rposition(|&b| b == b'\n') {
        Some(idx) => idx + 1,
        None => 0,
    };
    let end = match data[position..].iter().position(|&b| b == b'\n') {
        Some(idx) => position + idx,
        None => data.len(),
    };
    if start == 0 && end == data.len() {
        return Located::Null;
    }
    Located::Found { start, length: end - start }
}

/// The result of a forward probe.
pub enum Probed {
    Found { start: usize, length: usize, ts: i64 },
    NotFound,
    Null,
}

/// From `position`, walks forward line-by-line (using the line locator)
/// until a line yields a timestamp, or `ubound` is reached. Each line is
/// inspected at most once during a single probe.
pub fn forward_probe(
    data: &[u8],
    matcher: &CompiledMatcher,
    mut position: usize,
    ubound: usize,
    current_utc_year: i16,
    local_offset_seconds: i64,
) -> Result<Probed> {
    loop {
        if position >= ubound {
            return Ok(Probed::NotFound);
        }
        match locate_line(data, position) {
            Located::Null => return Ok(Probed::Null),
            Located::NotFound => {
                position += 1;
                continue;
            }
            Located::Found { start, length } => {
                let line = &data[start..start + length];
                match crate::extractor::extract(
                    matcher,
                    line,
                    current_utc_year,
                    local_offset_seconds,
                ) {
                    Extracted::Found(ts) => {
                        return Ok(Probed::Found { start, length, ts });
                    }
                    Extracted::NotFound => {
                        position = start + length + 1;
                        continue;
                    }
                    Extracted::Error(e) => return Err(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::CompiledMatcher;

    #[test]
    fn locate_line_finds_start_and_length() {
        let data = b"abc\ndef\nghi";
        match locate_line(data, 5) {
            Located::Found { start, length } => {
                assert_eq!(start, 4);
                assert_eq!(length, 3);
            }
            _ => panic!("expected Found"),
        }
    }

    #[test]
    fn locate_line_on_newline_byte_is_not_found() {
        let data = b"abc\ndef";
        assert!(matches!(locate_line(data, 3), Located::NotFound));
    }

    #[test]
    fn locate_line_whole_buffer_no_newline_is_null() {
        let data = b"abcdef";
        assert!(matches!(locate_line(data, 2), Located::Null));
    }

    #[test]
    fn forward_probe_skips_unparseable_lines() {
        let m = CompiledMatcher::compile("%Y-%m-%d %H:%M:%S").unwrap();
        let data = b"garbage\n2020-01-01 00:00:00 ok\n";
        match forward_probe(data, &m, 0, data.len(), 2020, 0).unwrap() {
            Probed::Found { start, .. } => assert_eq!(start, 8),
            _ => panic!("expected Found"),
        }
    }

    #[test]
    fn forward_probe_respects_ubound() {
        let m = CompiledMatcher::compile("%Y-%m-%d %H:%M:%S").unwrap();
        let data = b"garbage\n2020-01-01 00:00:00 ok\n";
        match forward_probe(data, &m, 0, 7, 2020, 0).unwrap() {
            Probed::NotFound => {}
            _ => panic!("expected NotFound"),
        }
    }
}
