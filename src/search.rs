//! The bounded binary search.

use crate::{
    error::Result,
    format::CompiledMatcher,
    region::{Probed, forward_probe},
};

/// The result of a bounded binary search: the lowest byte offset of a line
/// whose timestamp is `>= target`, or `NotFound` if every parseable line in
/// `[lbound, size)` has a timestamp `< target`.
pub enum SearchResult {
    Found(usize),
    NotFound,
}

/// Finds the smallest byte offset `p` such that the line starting at `p`
/// has a timestamp `>= target` and every parseable line strictly before
/// `p` has a timestamp `< target`.
pub fn binary_search(
    data: &[u8],
    matcher: &CompiledMatcher,
    target: i64,
    lbound: usize,
    current_utc_year: i16,
    local_offset_seconds: i64,
) -> Result<SearchResult> {
    let size = data.len();
    let mut lbound = lbound;
    let mut ubound = size;
    let mut middle = lbound + (ubound - lbound) / 2;
    let mut candidate: Option<usize> = None;

    while lbound != middle {
        let probed = forward_probe(
            data,
            matcher,
            middle,
            ubound,
            current_utc_year,
            local_offset_seconds,
        )?;
        match probed {
            Probed::Found { start, length, ts } => {
                if ts < target {
                    lbound = start + length;
                    if lbound != ubound {
                        lbound += 1;
                    }
                    middle = ubound;
                } else {
                    candidate = Some(start);
                    ubound = start;
                    middle = ubound;
                }
            }
            Probed::NotFound => {
                ubound = middle;
            }
            Probed::Null => break,
        }
        middle = lbound + (middle - lbound) / 2;
    }

    Ok(match candidate {
        Some(p) => SearchResult::Found(p),
        None => SearchResult::NotFound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::CompiledMatcher;
    use jiff::civil;
    use jiff::tz::TimeZone;

    fn ts(y: i16, mo: i8, d: i8, h: i8, mi: i8, s: i8) -> i64 {
        civil::Date::new(y, mo, d)
            .unwrap()
            .at(h, mi, s, 0)
            .to_zoned(TimeZone::UTC)
            .unwrap()
            .timestamp()
            .as_second()
    }

    #[test]
    fn finds_lower_bound_of_one_minute_window() {
        let m = CompiledMatcher::compile("%Y-%m-%d %H:%M:%S").unwrap();
        let mut data = String::new();
        for minute in 0..5 {
            data.push_str(&format!("2020-01-01 12:{minute:02}:00 line\n"));
        }
        let target = ts(2020, 1, 1, 12, 2, 0);
        match binary_search(
            data.as_bytes(),
            &m,
            target,
            0,
            2020,
            0,
        )
        .unwrap()
        {
            SearchResult::Found(p) => {
                assert_eq!(&data.as_bytes()[p..p + 19], b"2020-01-01 12:02:00");
            }
            SearchResult::NotFound => panic!("expected Found"),
        }
    }

    #[test]
    fn all_timestamps_before_target_is_not_found() {
        let m = CompiledMatcher::compile("%Y-%m-%d %H:%M:%S").unwrap();
        let data = b"2020-01-01 00:00:00 a\n2020-01-01 00:00:01 b\n";
        let target = ts(2021, 1, 1, 0, 0, 0);
        match binary_search(data, &m, target, 0, 2020, 0).unwrap() {
            SearchResult::NotFound => {}
            SearchResult::Found(_) => panic!("expected NotFound"),
        }
    }

    #[test]
    fn all_timestamps_after_target_finds_offset_zero() {
        let m = CompiledMatcher::compile("%Y-%m-%d %H:%M:%S").unwrap();
        let data = b"2020-01-01 00:00:00 a\n2020-01-01 00:00:01 b\n";
        let target = ts(2019, 1, 1, 0, 0, 0);
        match binary_search(data, &m, target, 0, 2020, 0).unwrap() {
            SearchResult::Found(p) => assert_eq!(p, 0),
            SearchResult::NotFound => panic!("expected Found"),
        }
    }

    #[test]
    fn unparseable_lines_interleaved_do_not_exclude_matches() {
        let m = CompiledMatcher::compile("%Y-%m-%d %H:%M:%S").unwrap();
        let data = b"garbage one\n2020-01-01 00:00:00 a\ngarbage two\n2020-01-01 00:00:01 b\n";
        let target = ts(2020, 1, 1, 0, 0, 1);
        match binary_search(data, &m, target, 0, 2020, 0).unwrap() {
            SearchResult::Found(p) => {
                assert_eq!(&data[p..p + 19], b"2020-01-01 00:00:01");
            }
            SearchResult::NotFound => panic!("expected Found"),
        }
    }
}
