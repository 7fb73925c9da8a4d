//! The random-access driver.
//!
//! Orchestrates two bounded binary searches over a memory-mapped (or
//! heap-backed, for small files) byte region, then emits the resulting
//! range in fixed-size chunks, releasing mapped pages behind the write
//! cursor as it goes.

use std::{fs::File, io::Write, path::Path};

use anyhow::Context;

use crate::{
    driver::Outcome,
    error::Result,
    format::CompiledMatcher,
    search::{SearchResult, binary_search},
};

/// Default chunk size for output writes and release-behind granularity.
/// Must be a multiple of 8192.
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

/// A conservative page size assumption used only to align release-behind
/// ranges; `madvise`-family calls tolerate unaligned hints, so a wrong
/// guess here costs efficiency, not correctness.
const PAGE_SIZE: usize = 4096;

/// The contents of a file, either memory-mapped or loaded onto the heap.
///
/// Files at or under the mmap threshold (and empty files, which
/// `memmap2::Mmap::map` refuses) are read onto the heap instead; `memmap2`
/// offers no benefit for small regions and opening a map has fixed costs.
pub enum Source {
    MemoryMap(memmap2::Mmap),
    Heap(Vec<u8>),
}

impl Source {
    /// Threshold above which a file is memory-mapped rather than read
    /// onto the heap.
    const MMAP_THRESHOLD: u64 = 10 * (1 << 20);

    pub fn open(path: &Path) -> anyhow::Result<Source> {
        let file =
            File::open(path).with_context(|| format!("{}", path.display()))?;
        let metadata =
            file.metadata().with_context(|| format!("{}", path.display()))?;
        if metadata.len() == 0 || metadata.len() <= Self::MMAP_THRESHOLD {
            return Ok(Source::Heap(
                std::fs::read(path)
                    .with_context(|| format!("{}", path.display()))?,
            ));
        }
        // SAFETY: the caller (the CLI's own single-threaded driver loop)
        // does not mutate the file concurrently with this run.
        let mmap = unsafe {
            memmap2::Mmap::map(&file)
                .with_context(|| format!("{}", path.display()))?
        };
        Ok(Source::MemoryMap(mmap))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match *self {
            Source::MemoryMap(ref mmap) => mmap,
            Source::Heap(ref bytes) => bytes,
        }
    }

    /// Releases the mapped pages in `[0, upto)`, aligned down to
    /// `PAGE_SIZE`. A no-op for heap-backed sources and on failure, since
    /// this is an optimization, not a correctness requirement.
    fn release_behind(&self, upto: usize) {
        #[cfg(unix)]
        if let Source::MemoryMap(ref mmap) = *self {
            let aligned = (upto / PAGE_SIZE) * PAGE_SIZE;
            if aligned > 0 {
                let _ = mmap.advise_range(
                    memmap2::Advice::DontNeed,
                    0,
                    aligned,
                );
            }
        }
        #[cfg(not(unix))]
        {
            let _ = upto;
        }
    }
}

/// Runs the random-access driver over one file.
pub fn run(
    source: &Source,
    matcher: &CompiledMatcher,
    start: i64,
    stop: i64,
    current_utc_year: i16,
    local_offset_seconds: i64,
    chunk_size: usize,
) -> Result<Outcome> {
    let data = source.as_bytes();
    let size = data.len();

    let p0 = match binary_search(
        data,
        matcher,
        start,
        0,
        current_utc_year,
        local_offset_seconds,
    )? {
        SearchResult::Found(p) => p,
        SearchResult::NotFound => return Ok(Outcome::NotFound),
    };
    let p1 = match binary_search(
        data,
        matcher,
        stop,
        p0,
        current_utc_year,
        local_offset_seconds,
    )? {
        SearchResult::Found(p) => p,
        SearchResult::NotFound => size,
    };

    if p0 >= p1 {
        return Ok(Outcome::NotFound);
    }

    emit(source, data, p0, p1, chunk_size)?;
    Ok(Outcome::Emitted)
}

fn emit(
    source: &Source,
    data: &[u8],
    p0: usize,
    p1: usize,
    chunk_size: usize,
) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut cursor = p0;
    while cursor < p1 {
        let end = (cursor + chunk_size).min(p1);
        out.write_all(&data[cursor..end])?;
        cursor = end;
        source.release_behind(cursor);
    }
    // An extra \n is appended if and only if the last byte of the file
    // was included in the emitted range and the file did not itself end
    // with \n.
    if p1 == data.len() && data.last() != Some(&b'\n') {
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::CompiledMatcher;

    #[test]
    fn empty_file_is_not_found() {
        let m = CompiledMatcher::compile("%Y-%m-%d %H:%M:%S").unwrap();
        let data: &[u8] = b"";
        let result =
            binary_search(data, &m, 0, 0, 2020, 0).unwrap();
        assert!(matches!(result, SearchResult::NotFound));
    }
}
