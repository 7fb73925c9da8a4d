//! The timestamp extractor.
//!
//! Given a compiled matcher and a line, produces a Unix timestamp either by
//! reading captured digits directly (fast path) or by delegating the full
//! match to `jiff`'s general `strtime` parser (slow path).

use jiff::{civil, fmt::strtime, tz::TimeZone};

use crate::{
    error::Error,
    format::{CompiledMatcher, Field},
};

/// The result of running the extractor on one line.
pub enum Extracted {
    Found(i64),
    NotFound,
    Error(Error),
}

/// Runs the extractor.
///
/// `current_utc_year` and `local_offset_seconds` are computed once by the
/// driver at startup and threaded through rather than recomputed per line.
pub fn extract(
    matcher: &CompiledMatcher,
    line: &[u8],
    current_utc_year: i16,
    local_offset_seconds: i64,
) -> Extracted {
    let mut caps = matcher.regex().create_captures();
    matcher.regex().captures(line, &mut caps);
    if !caps.is_match() {
        return Extracted::NotFound;
    }

    if matcher.is_fast_path() {
        extract_fast(matcher, line, &caps, current_utc_year, local_offset_seconds)
    } else {
        extract_slow(matcher, line, &caps, local_offset_seconds)
    }
}

fn group_text<'l>(
    line: &'l [u8],
    caps: &regex_automata::util::captures::Captures,
    slot: Option<usize>,
) -> Option<&'l [u8]> {
    let span = caps.get_group(slot?)?;
    Some(&line[span.range()])
}

fn parse_int(bytes: &[u8]) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn extract_fast(
    matcher: &CompiledMatcher,
    line: &[u8],
    caps: &regex_automata::util::captures::Captures,
    current_utc_year: i16,
    local_offset_seconds: i64,
) -> Extracted {
    if let Some(text) = group_text(line, caps, matcher.slot(Field::Timestamp)) {
        return match parse_int(text) {
            Some(ts) => Extracted::Found(ts),
            None => Extracted::NotFound,
        };
    }

    let year = match group_text(line, caps, matcher.slot(Field::Year)) {
        Some(text) => match parse_int(text) {
            Some(y) => y as i16,
            None => return Extracted::NotFound,
        },
        None => current_utc_year,
    };
    let month = match group_text(line, caps, matcher.slot(Field::Month)) {
        Some(text) => match parse_int(text) {
            Some(m) => m as i8,
            None => return Extracted::NotFound,
        },
        None => match group_text(line, caps, matcher.slot(Field::MonthText)) {
            Some(text) => match decode_month_text(text) {
                Some(m) => m,
                None => return Extracted::NotFound,
            },
            None => 1,
        },
    };
    let day = match group_text(line, caps, matcher.slot(Field::Day)) {
        Some(text) => match parse_int(text) {
            Some(d) => d as i8,
            None => return Extracted::NotFound,
        },
        None => 1,
    };
    let hour = match group_text(line, caps, matcher.slot(Field::Hour)) {
        Some(text) => match parse_int(text) {
            Some(h) => h as i8,
            None => return Extracted::NotFound,
        },
        None => 0,
    };
    let minute = match group_text(line, caps, matcher.slot(Field::Minute)) {
        Some(text) => match parse_int(text) {
            Some(m) => m as i8,
            None => return Extracted::NotFound,
        },
        None => 0,
    };
    let second = match group_text(line, caps, matcher.slot(Field::Second)) {
        Some(text) => match parse_int(text) {
            // %S's regex fragment permits a leap-second value of 60; jiff's
            // civil::Time caps seconds at 59. Clamp rather than reject, since
            // the line itself isn't malformed.
            Some(s) if s >= 60 => 59,
            Some(s) => s as i8,
            None => return Extracted::NotFound,
        },
        None => 0,
    };

    let offset_seconds = match group_text(line, caps, matcher.slot(Field::Timezone)) {
        Some(text) => match decode_timezone(text) {
            Some(off) => off,
            None => return Extracted::NotFound,
        },
        None => local_offset_seconds,
    };

    let Ok(date) = civil::Date::new(year, month, day) else {
        return Extracted::NotFound;
    };
    let Ok(time) = civil::Time::new(hour, minute, second, 0) else {
        return Extracted::NotFound;
    };
    let dt = date.to_datetime(time);
    let Ok(zdt) = dt.to_zoned(TimeZone::UTC) else {
        return Extracted::NotFound;
    };
    let utc_seconds = zdt.timestamp().as_second();
    match utc_seconds.checked_sub(offset_seconds) {
        Some(ts) => Extracted::Found(ts),
        None => Extracted::NotFound,
    }
}

fn extract_slow(
    matcher: &CompiledMatcher,
    line: &[u8],
    caps: &regex_automata::util::captures::Captures,
    local_offset_seconds: i64,
) -> Extracted {
    let Some(span) = caps.get_group(0) else {
        return Extracted::NotFound;
    };
    let matched = &line[span.range()];

    let tm = match strtime::parse(matcher.source().as_bytes(), matched) {
        Ok(tm) => tm,
        Err(_) => return Extracted::NotFound,
    };

    if matcher.has_timezone() {
        return match tm.to_zoned() {
            Ok(zdt) => Extracted::Found(zdt.timestamp().as_second()),
            Err(_) => Extracted::NotFound,
        };
    }

    let Ok(dt) = tm.to_datetime() else {
        return Extracted::NotFound;
    };
    let Ok(zdt) = dt.to_zoned(TimeZone::UTC) else {
        return Extracted::NotFound;
    };
    match zdt.timestamp().as_second().checked_sub(local_offset_seconds) {
        Some(ts) => Extracted::Found(ts),
        None => Extracted::NotFound,
    }
}

/// Decodes an English month name/abbreviation (`%b`/`%B`/`%h`) to a 1-12
/// month number via a branching table keyed on the first letter and
/// disambiguated by the second or third.
fn decode_month_text(text: &[u8]) -> Option<i8> {
    let lower: Vec<u8> = text.iter().map(|b| b.to_ascii_lowercase()).collect();
    let first = *lower.first()?;
    let second = lower.get(1).copied();
    let third = lower.get(2).copied();
    Some(match (first, second, third) {
        (b'j', Some(b'a'), _) => 1,
        (b'j', Some(b'u'), Some(b'n')) => 6,
        (b'j', Some(b'u'), Some(b'l')) => 7,
        (b'f', ..) => 2,
        (b'm', Some(b'a'), Some(b'r')) => 3,
        (b'm', Some(b'a'), Some(b'y')) => 5,
        (b'a', Some(b'p'), _) => 4,
        (b'a', Some(b'u'), _) => 8,
        (b's', ..) => 9,
        (b'o', ..) => 10,
        (b'n', ..) => 11,
        (b'd', ..) => 12,
        _ => return None,
    })
}

/// Decodes a `%z` capture to an offset in seconds east of UTC: a numeric
/// offset, a military letter, or a fixed abbreviation.
fn decode_timezone(text: &[u8]) -> Option<i64> {
    if let Some(&first) = text.first() {
        if first == b'+' || first == b'-' {
            return decode_numeric_offset(text);
        }
    }
    if text.len() == 1 {
        let letter = text[0].to_ascii_uppercase();
        return decode_military_letter(letter);
    }
    let upper: Vec<u8> = text.iter().map(|b| b.to_ascii_uppercase()).collect();
    Some(match upper.as_slice() {
        b"UT" | b"UTC" | b"GMT" => 0,
        b"EST" => -5 * 3600,
        b"EDT" => -4 * 3600,
        b"CST" => -6 * 3600,
        b"CDT" => -5 * 3600,
        b"MST" => -7 * 3600,
        b"MDT" => -6 * 3600,
        b"PST" => -8 * 3600,
        b"PDT" => -7 * 3600,
        _ => return None,
    })
}

fn decode_numeric_offset(text: &[u8]) -> Option<i64> {
    let negative = text[0] == b'-';
    let digits: Vec<u8> =
        text[1..].iter().copied().filter(|&b| b != b':').collect();
    if digits.len() != 4 || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let hours: i64 = std::str::from_utf8(&digits[0..2]).ok()?.parse().ok()?;
    let minutes: i64 = std::str::from_utf8(&digits[2..4]).ok()?.parse().ok()?;
    let total = hours * 3600 + minutes * 60;
    Some(if negative { -total } else { total })
}

/// RFC 822 military time zone letters, `A`-`Z` excluding `J`.
fn decode_military_letter(letter: u8) -> Option<i64> {
    const NEGATIVE: &[u8] = b"ABCDEFGHIKLM";
    const POSITIVE: &[u8] = b"NOPQRSTUVWXY";
    if letter == b'Z' {
        return Some(0);
    }
    if let Some(pos) = NEGATIVE.iter().position(|&b| b == letter) {
        return Some(-((pos as i64 + 1) * 3600));
    }
    if let Some(pos) = POSITIVE.iter().position(|&b| b == letter) {
        return Some((pos as i64 + 1) * 3600);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::CompiledMatcher;

    #[test]
    fn fast_path_default_format() {
        let m = CompiledMatcher::compile("%Y-%m-%d %H:%M:%S").unwrap();
        let line = b"2020-06-01 10:00:00 hello";
        match extract(&m, line, 2020, 0) {
            Extracted::Found(ts) => assert_eq!(ts, 1591005600),
            _ => panic!("expected Found"),
        }
    }

    #[test]
    fn fast_path_common_format_with_offset() {
        let m = CompiledMatcher::compile("%d/%b/%Y:%H:%M:%S %z").unwrap();
        let line = b"10.0.0.1 - - [01/Jan/2020:12:00:00 +0000] \"GET /a\"";
        match extract(&m, line, 2020, 0) {
            Extracted::Found(ts) => assert_eq!(ts, 1577880000),
            _ => panic!("expected Found"),
        }
    }

    #[test]
    fn fast_path_iso_with_positive_offset() {
        let m = CompiledMatcher::compile("%Y-%m-%dT%H:%M:%S%z").unwrap();
        let line = b"2020-06-01T10:00:00+0200 a";
        match extract(&m, line, 2020, 0) {
            Extracted::Found(ts) => {
                // 10:00 local at +02:00 is 08:00 UTC.
                let expected = civil::date(2020, 6, 1)
                    .at(8, 0, 0, 0)
                    .to_zoned(TimeZone::UTC)
                    .unwrap()
                    .timestamp()
                    .as_second();
                assert_eq!(ts, expected);
            }
            _ => panic!("expected Found"),
        }
    }

    #[test]
    fn fast_path_epoch_seconds() {
        let m = CompiledMatcher::compile("unixtime=%s").unwrap();
        match extract(&m, b"unixtime=100 a", 2020, 0) {
            Extracted::Found(ts) => assert_eq!(ts, 100),
            _ => panic!("expected Found"),
        }
    }

    #[test]
    fn fast_path_syslog_defaults_missing_year() {
        let m = CompiledMatcher::compile("%b %d %H:%M:%S").unwrap();
        match extract(&m, b"Jan 01 12:00:00", 2024, 0) {
            Extracted::Found(ts) => {
                let expected = civil::date(2024, 1, 1)
                    .at(12, 0, 0, 0)
                    .to_zoned(TimeZone::UTC)
                    .unwrap()
                    .timestamp()
                    .as_second();
                assert_eq!(ts, expected);
            }
            _ => panic!("expected Found"),
        }
    }

    #[test]
    fn no_match_is_not_found() {
        let m = CompiledMatcher::compile("%Y-%m-%d %H:%M:%S").unwrap();
        match extract(&m, b"not a timestamp at all", 2020, 0) {
            Extracted::NotFound => {}
            _ => panic!("expected NotFound"),
        }
    }

    #[test]
    fn military_letter_and_abbreviation_offsets() {
        assert_eq!(decode_timezone(b"Z"), Some(0));
        assert_eq!(decode_timezone(b"A"), Some(-3600));
        assert_eq!(decode_timezone(b"N"), Some(3600));
        assert_eq!(decode_timezone(b"M"), Some(-12 * 3600));
        assert_eq!(decode_timezone(b"Y"), Some(12 * 3600));
        assert_eq!(decode_timezone(b"EST"), Some(-5 * 3600));
        assert_eq!(decode_timezone(b"UTC"), Some(0));
        assert_eq!(decode_timezone(b"J"), None);
    }

    #[test]
    fn numeric_offset_forms() {
        assert_eq!(decode_timezone(b"+0200"), Some(7200));
        assert_eq!(decode_timezone(b"-05:00"), Some(-18000));
    }

    #[test]
    fn slow_path_forced_by_weekday_still_extracts() {
        let m = CompiledMatcher::compile("%a %b %d %H:%M:%S %Y").unwrap();
        assert!(!m.is_fast_path());
        let line = b"Wed Jun 01 10:00:00 2020";
        match extract(&m, line, 2020, 0) {
            Extracted::Found(_) => {}
            Extracted::NotFound => panic!("expected a match"),
            Extracted::Error(_) => panic!("unexpected error"),
        }
    }
}
