//! Compiled-in named format table and alias resolution.

/// A named format, or an alias pointing at another named format.
enum Entry {
    Format(&'static str),
    Alias(&'static str),
}

const TABLE: &[(&str, Entry)] = &[
    ("default", Entry::Format("%Y-%m-%d %H:%M:%S")),
    ("iso", Entry::Format("%Y-%m-%dT%H:%M:%S%z")),
    ("common", Entry::Format("%d/%b/%Y:%H:%M:%S %z")),
    ("syslog", Entry::Format("%b %d %H:%M:%S")),
    ("tskv", Entry::Format("unixtime=%s")),
    ("apache", Entry::Alias("common")),
    ("nginx", Entry::Alias("common")),
];

/// Resolves a named format to its format string, following at most one
/// level of alias indirection (the table above never chains aliases, but
/// this loop tolerates a chain up to the table's own length as a guard
/// against an accidental cycle).
///
/// Returns `None` if `name` isn't in the table, in which case the caller
/// should treat `name` as a literal format string instead (`--format`
/// takes a name or literal format).
pub fn resolve_named_format(name: &str) -> Option<&'static str> {
    let mut current = name;
    for _ in 0..TABLE.len() {
        let entry = TABLE.iter().find(|(n, _)| *n == current)?;
        match entry.1 {
            Entry::Format(fmt) => return Some(fmt),
            Entry::Alias(target) => current = target,
        }
    }
    None
}
