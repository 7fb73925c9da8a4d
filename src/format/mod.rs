//! The `strptime`-style format compiler.
//!
//! Translates a format string into a PCRE-style regex with named capture
//! groups for the nine fields the fast path can read, deciding along the
//! way whether the fast path is even applicable. The regex is then handed
//! to `regex-automata`'s meta engine, built from a `regex_syntax::Hir`.

pub mod table;

use std::collections::VecDeque;

use regex_automata::{PatternID, meta::Regex};

use crate::error::{Error, Result};

/// The nine fields the fast path can read out of a match directly, without
/// delegating to a general datetime parser.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Field {
    Year,
    Month,
    MonthText,
    Day,
    Hour,
    Minute,
    Second,
    Timezone,
    Timestamp,
}

impl Field {
    const ALL: [Field; 9] = [
        Field::Year,
        Field::Month,
        Field::MonthText,
        Field::Day,
        Field::Hour,
        Field::Minute,
        Field::Second,
        Field::Timezone,
        Field::Timestamp,
    ];

    fn name(self) -> &'static str {
        match self {
            Field::Year => "year",
            Field::Month => "month",
            Field::MonthText => "month_t",
            Field::Day => "day",
            Field::Hour => "hour",
            Field::Minute => "minute",
            Field::Second => "second",
            Field::Timezone => "timezone",
            Field::Timestamp => "timestamp",
        }
    }

    /// The inner alternation for this field's capture group, without the
    /// surrounding `(?P<name>...)`.
    fn pattern(self) -> &'static str {
        match self {
            Field::Year => r"\d{4}",
            Field::Month => r"1[0-2]|0?[1-9]",
            Field::MonthText => {
                "January|Jan|February|Feb|March|Mar|April|Apr|May\
                 |June|Jun|July|Jul|August|Aug|September|Sep\
                 |October|Oct|November|Nov|December|Dec"
            }
            Field::Day => r"[1-2][0-9]|3[0-1]|0?[1-9]",
            Field::Hour => r"1[0-9]|2[0-3]|0?[0-9]",
            Field::Minute => r"[1-5][0-9]|0?[0-9]",
            Field::Second => r"[1-5][0-9]|60|0?[0-9]",
            Field::Timezone => {
                r"(?:\+|-)\d{2}:?\d{2}|UT|UTC|GMT|EST|EDT|CST|CDT|MST|MDT|PST|PDT|[A-Z]"
            }
            Field::Timestamp => r"\d{1,20}",
        }
    }
}

/// Fields forced to the slow path by the specifier table, none of which
/// contribute a named fast-path group. Each still emits *some* regex
/// fragment so the overall pattern continues to delimit where a match
/// starts and ends, which the slow path needs in order to hand the full
/// match text to the general datetime parser.
fn slow_only_pattern(spec: u8) -> Option<&'static str> {
    Some(match spec {
        b'a' | b'A' => {
            "Sun|Mon|Tue|Wed|Thu|Fri|Sat\
             |Sunday|Monday|Tuesday|Wednesday|Thursday|Friday|Saturday"
        }
        b'p' => "AM|PM|am|pm",
        b'C' => r"\d{2}",
        b'I' => r"1[0-2]|0?[1-9]",
        b'j' => r"\d{1,3}",
        b'U' | b'W' => r"\d{1,2}",
        b'w' => "[0-6]",
        b'y' => r"\d{2}",
        b'g' => r"\d{2}",
        b'G' => r"\d{4}",
        b'u' => "[1-7]",
        b'V' => r"0[1-9]|[1-4][0-9]|5[0-3]",
        b'Z' => r"[A-Za-z_/+\-0-9]+",
        _ => return None,
    })
}

/// Specifiers that simply expand to another format string before being
/// reprocessed.
fn expansion(spec: u8) -> Option<&'static str> {
    Some(match spec {
        b'c' => "%x %X",
        b'D' => "%m/%d/%y",
        b'F' | b'x' => "%Y-%m-%d",
        b'R' => "%H:%M",
        b'r' => "%I:%M:%S %p",
        b'T' | b'X' => "%H:%M:%S",
        _ => return None,
    })
}

fn is_meta(b: u8) -> bool {
    matches!(
        b,
        b'^' | b'$'
            | b'|'
            | b'('
            | b')'
            | b'['
            | b']'
            | b'{'
            | b'}'
            | b'.'
            | b'*'
            | b'+'
            | b'?'
            | b'\\'
    )
}

/// The fast/slow descriptor produced by walking a format string once,
/// before any regex is actually compiled.
#[derive(Clone, Copy, Debug, Default)]
struct Descriptor {
    counts: [u8; 9],
    forced_slow: bool,
    has_timezone: bool,
}

impl Descriptor {
    fn count_mut(&mut self, field: Field) -> &mut u8 {
        &mut self.counts[Field::ALL.iter().position(|&f| f == field).unwrap()]
    }

    fn count(&self, field: Field) -> u8 {
        self.counts[Field::ALL.iter().position(|&f| f == field).unwrap()]
    }

    /// The fast-path invariant: each field at most once, `month`/
    /// `month_t` don't both occur, `timestamp` doesn't coexist with a
    /// date/time field, and no slow-only specifier was emitted.
    fn fast_path(&self) -> bool {
        if self.forced_slow {
            return false;
        }
        if self.counts.iter().any(|&c| c > 1) {
            return false;
        }
        if self.count(Field::Month) > 0 && self.count(Field::MonthText) > 0 {
            return false;
        }
        if self.count(Field::Timestamp) > 0 {
            let date_time_present = self.count(Field::Year) > 0
                || self.count(Field::Month) > 0
                || self.count(Field::MonthText) > 0
                || self.count(Field::Day) > 0
                || self.count(Field::Hour) > 0
                || self.count(Field::Minute) > 0
                || self.count(Field::Second) > 0;
            if date_time_present {
                return false;
            }
        }
        true
    }
}

/// A translated format: the regex text and the descriptor used to decide
/// the fast path, named group slots included.
struct Translated {
    regex_text: String,
    descriptor: Descriptor,
}

/// Walks `fmt` once, expanding recursive specifiers in place, escaping
/// regex metacharacters in literal bytes, and emitting a named group for
/// the first occurrence of each fast-path field. A repeated field (e.g.
/// from a format that expands `%F` after an explicit `%Y`) reuses a
/// non-capturing group instead of a duplicate named one.
fn translate(fmt: &str) -> Result<Translated> {
    let mut pending: VecDeque<u8> = fmt.bytes().collect();
    let mut regex_text = String::new();
    let mut descriptor = Descriptor::default();
    let mut named_emitted = [false; 9];

    while let Some(b) = pending.pop_front() {
        if b != b'%' {
            if is_meta(b) {
                regex_text.push('\\');
            }
            regex_text.push(b as char);
            continue;
        }
        let Some(spec) = pending.pop_front() else {
            return Err(Error::MalformedFormat(
                "format string ends with an unterminated `%`".to_string(),
            ));
        };
        if spec == b'%' {
            regex_text.push('%');
            continue;
        }
        if spec == b'n' || spec == b't' {
            regex_text.push_str(r"\s");
            continue;
        }
        if spec == b'O' || spec == b'E' {
            return Err(Error::MalformedFormat(format!(
                "`%{}` modifier is not supported",
                spec as char
            )));
        }
        if let Some(sub) = expansion(spec) {
            for &sb in sub.as_bytes().iter().rev() {
                pending.push_front(sb);
            }
            continue;
        }
        if let Some(field) = fast_field_for(spec) {
            if field == Field::Timezone {
                descriptor.has_timezone = true;
            }
            let idx = Field::ALL.iter().position(|&f| f == field).unwrap();
            *descriptor.count_mut(field) += 1;
            if !named_emitted[idx] {
                named_emitted[idx] = true;
                regex_text.push_str("(?P<");
                regex_text.push_str(field.name());
                regex_text.push('>');
                regex_text.push_str(field.pattern());
                regex_text.push(')');
            } else {
                regex_text.push_str("(?:");
                regex_text.push_str(field.pattern());
                regex_text.push(')');
            }
            continue;
        }
        if spec == b'Z' {
            descriptor.has_timezone = true;
        }
        if let Some(pattern) = slow_only_pattern(spec) {
            descriptor.forced_slow = true;
            regex_text.push_str("(?:");
            regex_text.push_str(pattern);
            regex_text.push(')');
            continue;
        }
        return Err(Error::MalformedFormat(format!(
            "unknown conversion specifier `%{}`",
            spec as char
        )));
    }

    Ok(Translated { regex_text, descriptor })
}

fn fast_field_for(spec: u8) -> Option<Field> {
    Some(match spec {
        b'Y' => Field::Year,
        b'm' => Field::Month,
        b'b' | b'B' | b'h' => Field::MonthText,
        b'd' | b'e' => Field::Day,
        b'H' => Field::Hour,
        b'M' => Field::Minute,
        b'S' => Field::Second,
        b'z' => Field::Timezone,
        b's' => Field::Timestamp,
        _ => return None,
    })
}

/// Where in the compiled regex each fast-path field's capture group
/// lives, or `None` if the field never appeared.
#[derive(Clone, Copy, Debug, Default)]
struct FieldSlots([Option<usize>; 9]);

impl FieldSlots {
    fn get(&self, field: Field) -> Option<usize> {
        self.0[Field::ALL.iter().position(|&f| f == field).unwrap()]
    }

    fn set(&mut self, field: Field, slot: Option<usize>) {
        self.0[Field::ALL.iter().position(|&f| f == field).unwrap()] = slot;
    }
}

/// The compiled matcher: immutable after construction and shared
/// read-only by every search operation over a single invocation.
pub struct CompiledMatcher {
    regex: Regex,
    fast_path: bool,
    has_timezone: bool,
    slots: FieldSlots,
    source: String,
}

impl CompiledMatcher {
    pub fn compile(fmt: &str) -> Result<CompiledMatcher> {
        let Translated { regex_text, descriptor } = translate(fmt)?;
        let hir = regex_syntax::Parser::new()
            .parse(&regex_text)
            .map_err(|e| Error::RegexCompile(e.to_string()))?;
        let regex = Regex::builder()
            .configure(Regex::config().auto_prefilter(false))
            .build_from_hir(&hir)
            .map_err(|e| Error::RegexCompile(e.to_string()))?;

        let mut slots = FieldSlots::default();
        for field in Field::ALL {
            let idx = regex.group_info().to_index(PatternID::ZERO, field.name());
            slots.set(field, idx);
        }

        Ok(CompiledMatcher {
            regex,
            fast_path: descriptor.fast_path(),
            has_timezone: descriptor.has_timezone,
            slots,
            source: fmt.to_string(),
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn is_fast_path(&self) -> bool {
        self.fast_path
    }

    pub fn has_timezone(&self) -> bool {
        self.has_timezone
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn slot(&self, field: Field) -> Option<usize> {
        self.slots.get(field)
    }
}

impl std::fmt::Debug for CompiledMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledMatcher")
            .field("source", &self.source)
            .field("fast_path", &self.fast_path)
            .field("has_timezone", &self.has_timezone)
            .finish()
    }
}
