use std::io::Write;

use rayon::prelude::*;

use crate::error::Error;
use crate::reader::LineSource;
use crate::writer::RunWriter;

/// Above this many buffered lines, sort with rayon instead of sequentially.
const PAR_SORT_THRESHOLD: usize = 10_000;

/// Buffer lines from `source` into a single byte arena up to `budget` bytes,
/// sort each buffer via a pointer array into that arena, and write it out as
/// one run via `writer`. Repeats until `source` is exhausted. Returns the
/// line count of each run in emission order.
///
/// The arena is reserved once up front and reused across every run (cleared,
/// not reallocated) rather than allocating one `Vec` per line; only growing
/// past its reserved capacity (a line larger than `budget`, or a run whose
/// lines overrun it) triggers a fallible reallocation, surfaced as
/// [`Error::Resource`] rather than aborting the process on exhaustion.
///
/// A single line larger than `budget` still becomes its own one-line run,
/// with a warning on stderr, rather than being rejected outright; the
/// caller's accounting budget is advisory, not a hard cap.
pub fn presort_to_runs<S, W>(
    source: &mut S,
    budget: usize,
    writer: &mut RunWriter<W>,
) -> Result<Vec<usize>, Error>
where
    S: LineSource,
    W: Write,
{
    let mut log = Vec::new();
    let mut bytes: Vec<u8> = Vec::new();
    bytes
        .try_reserve(budget)
        .map_err(|_| Error::Resource { requested: budget })?;
    let mut offsets: Vec<(usize, usize)> = Vec::new();

    while let Some(line) = source.next_line()? {
        let line_len = line.len();

        if line_len > budget {
            eprintln!(
                "gzsort: warning: a {line_len}-byte line exceeds the presort buffer budget of {budget} bytes; writing it as its own run"
            );
        }

        if !offsets.is_empty() && bytes.len() + line_len > budget {
            log.push(flush_run(&mut bytes, &mut offsets, writer)?);
        }

        reserve_for(&mut bytes, line_len)?;
        let start = bytes.len();
        bytes.extend_from_slice(line);
        offsets.push((start, bytes.len()));
    }

    if !offsets.is_empty() {
        log.push(flush_run(&mut bytes, &mut offsets, writer)?);
    }

    Ok(log)
}

/// Grow `bytes`' capacity if appending `additional_len` more bytes would
/// overrun what's already reserved. A no-op when capacity already suffices.
fn reserve_for(bytes: &mut Vec<u8>, additional_len: usize) -> Result<(), Error> {
    bytes
        .try_reserve(additional_len)
        .map_err(|_| Error::Resource { requested: additional_len })
}

fn flush_run<W: Write>(
    bytes: &mut Vec<u8>,
    offsets: &mut Vec<(usize, usize)>,
    writer: &mut RunWriter<W>,
) -> Result<usize, Error> {
    let line_at = |r: &(usize, usize)| &bytes[r.0..r.1];

    if offsets.len() > PAR_SORT_THRESHOLD {
        offsets.par_sort_unstable_by(|a, b| line_at(a).cmp(line_at(b)));
    } else {
        offsets.sort_unstable_by(|a, b| line_at(a).cmp(line_at(b)));
    }

    let count = offsets.len();
    for &(start, end) in offsets.iter() {
        writer.write_line(&bytes[start..end])?;
    }
    bytes.clear();
    offsets.clear();
    Ok(count)
}
