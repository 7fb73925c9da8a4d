//! The streaming driver.
//!
//! A single forward pass over a non-seekable byte stream with a growable
//! framing buffer, used whenever no positional file arguments are given.
//! Unlike the random-access driver, there is no second pass: each line is
//! classified and either written immediately or discarded as it is read.

use std::io::{Read, Write};

use crate::{
    driver::Outcome,
    error::Result,
    extractor::{self, Extracted},
    format::CompiledMatcher,
};

/// Runs the streaming driver over `reader`.
pub fn run<R: Read>(
    reader: &mut R,
    matcher: &CompiledMatcher,
    start: i64,
    stop: i64,
    current_utc_year: i16,
    local_offset_seconds: i64,
    chunk_size: usize,
) -> Result<Outcome> {
    let mut frame: Vec<u8> = vec![0; 2 * chunk_size];
    let mut lbound: usize = 0;
    let mut ubound: usize = 0;
    let mut emitting = false;
    let mut any_emitted = false;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    loop {
        let Some(length) = fill_line(reader, &mut frame, &mut ubound, lbound, chunk_size)?
        else {
            break;
        };

        let line = &frame[lbound..lbound + length];
        match extractor::extract(matcher, line, current_utc_year, local_offset_seconds) {
            Extracted::Found(ts) => {
                if ts >= stop {
                    break;
                }
                if !emitting && ts >= start {
                    emitting = true;
                }
            }
            Extracted::NotFound => {}
            Extracted::Error(e) => return Err(e),
        }

        if emitting {
            out.write_all(&frame[lbound..lbound + length + 1])?;
            any_emitted = true;
        }
        lbound += length + 1;

        if ubound - lbound < lbound {
            frame.copy_within(lbound..ubound, 0);
            ubound -= lbound;
            lbound = 0;
        }
    }

    out.flush()?;
    Ok(if any_emitted { Outcome::Emitted } else { Outcome::NotFound })
}

/// Ensures a full line (not including its trailing `\n`) is available at
/// `data[lbound..)`, growing and refilling the frame as needed. Returns
/// the line's length, or `None` if the stream ended before a `\n` was
/// found (a final, unterminated line is dropped).
fn fill_line<R: Read>(
    reader: &mut R,
    frame: &mut Vec<u8>,
    ubound: &mut usize,
    lbound: usize,
    chunk_size: usize,
) -> Result<Option<usize>> {
    loop {
        if let Some(pos) =
            frame[lbound..*ubound].iter().position(|&b| b == b'\n')
        {
            return Ok(Some(pos));
        }
        if frame.len() - *ubound < chunk_size {
            frame.resize(frame.len() + 2 * chunk_size, 0);
        }
        let n = reader.read(&mut frame[*ubound..])?;
        if n == 0 {
            return Ok(None);
        }
        *ubound += n;
    }
}
