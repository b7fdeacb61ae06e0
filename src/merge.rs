use std::io::Write;
use std::path::Path;

use crate::error::Error;
use crate::reader::{GzLineReader, LineSource};
use crate::writer::RunWriter;

/// Merge adjacent pairs of runs from `source_path` into half as many runs,
/// written through `writer`.
///
/// Two independent readers are opened on the same compressed file since
/// gzip streams can't be seeked backward: `reader_a` walks the even-indexed
/// runs, `reader_b` the odd-indexed ones, each skipping forward past the
/// run the other just consumed to line up on its next pair. A trailing
/// unpaired run (odd run count) is copied straight through and its true
/// line count carried into the new log unchanged — there is no `-1`
/// sentinel here to compensate for, unlike an array-based run log.
///
/// `dedup` should only be set on the final pass; intermediate passes must
/// preserve duplicates so the run-length log stays accurate.
pub fn merge_pass<W: Write>(
    source_path: &Path,
    run_log: &[usize],
    writer: &mut RunWriter<W>,
    dedup: bool,
) -> Result<Vec<usize>, Error> {
    let mut reader_a = GzLineReader::open(source_path)?;
    let mut reader_b = GzLineReader::open(source_path)?;

    let mut new_log = Vec::with_capacity(run_log.len().div_ceil(2));
    let mut i = 0;
    let mut b_positioned = false;

    while i + 1 < run_log.len() {
        if !b_positioned {
            reader_b.skip(run_log[i] as u64)?;
            b_positioned = true;
        }

        {
            let mut bounded_a = Bounded::new(&mut reader_a, run_log[i]);
            let mut bounded_b = Bounded::new(&mut reader_b, run_log[i + 1]);
            merge_two(&mut bounded_a, &mut bounded_b, writer, dedup)?;
        }
        new_log.push(run_log[i] + run_log[i + 1]);

        if i + 3 < run_log.len() {
            reader_a.skip(run_log[i + 1] as u64)?;
            reader_b.skip(run_log[i + 2] as u64)?;
        } else if i + 2 < run_log.len() {
            reader_a.skip(run_log[i + 1] as u64)?;
        }
        i += 2;
    }

    if i < run_log.len() {
        copy_run(&mut reader_a, writer, dedup)?;
        new_log.push(run_log[i]);
    }

    Ok(new_log)
}

/// Caps a `LineSource` at `remaining` lines, then reports EOF, regardless of
/// how much more data the underlying reader actually has. `merge_two` uses
/// this to stay inside the current pair's two runs instead of reading past
/// their boundary into data that belongs to a later pair.
struct Bounded<'a, S> {
    source: &'a mut S,
    remaining: usize,
}

impl<'a, S: LineSource> Bounded<'a, S> {
    fn new(source: &'a mut S, remaining: usize) -> Self {
        Bounded { source, remaining }
    }
}

impl<'a, S: LineSource> LineSource for Bounded<'a, S> {
    fn next_line(&mut self) -> Result<Option<&[u8]>, Error> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        self.source.next_line()
    }
}

/// Two-way merge of the next run from `a` with the next run from `b`,
/// writing byte-lexicographic order; on a tie, `a`'s line is emitted first.
/// Each side stops once its own run is exhausted, independent of the other.
fn merge_two<A, B, W>(a: &mut A, b: &mut B, writer: &mut RunWriter<W>, dedup: bool) -> Result<(), Error>
where
    A: LineSource,
    B: LineSource,
    W: Write,
{
    let mut front_a = a.next_line()?.map(|l| l.to_vec());
    let mut front_b = b.next_line()?.map(|l| l.to_vec());

    loop {
        match (front_a.take(), front_b.take()) {
            (Some(la), Some(lb)) => {
                if la <= lb {
                    emit(writer, &la, dedup)?;
                    front_a = a.next_line()?.map(|l| l.to_vec());
                    front_b = Some(lb);
                } else {
                    emit(writer, &lb, dedup)?;
                    front_b = b.next_line()?.map(|l| l.to_vec());
                    front_a = Some(la);
                }
            }
            (Some(la), None) => {
                emit(writer, &la, dedup)?;
                front_a = a.next_line()?.map(|l| l.to_vec());
            }
            (None, Some(lb)) => {
                emit(writer, &lb, dedup)?;
                front_b = b.next_line()?.map(|l| l.to_vec());
            }
            (None, None) => return Ok(()),
        }
    }
}

fn copy_run<S: LineSource, W: Write>(source: &mut S, writer: &mut RunWriter<W>, dedup: bool) -> Result<(), Error> {
    while let Some(line) = source.next_line()? {
        if dedup {
            writer.write_unique(line)?;
        } else {
            writer.write_line(line)?;
        }
    }
    Ok(())
}

fn emit<W: Write>(writer: &mut RunWriter<W>, line: &[u8], dedup: bool) -> Result<(), Error> {
    if dedup {
        writer.write_unique(line)
    } else {
        writer.write_line(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::LineReader;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn cursor_source(data: &str) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(data.as_bytes().to_vec()), PathBuf::from("<test>"))
    }

    #[test]
    fn merge_two_interleaves_in_order_with_tie_favoring_a() {
        let mut a = cursor_source("a\nc\nc\n");
        let mut b = cursor_source("b\nc\n");
        let mut out = Vec::new();
        let mut w = RunWriter::new(&mut out, PathBuf::from("<out>"));
        merge_two(&mut a, &mut b, &mut w, false).unwrap();
        assert_eq!(out, b"a\nb\nc\nc\nc\n");
    }

    #[test]
    fn merge_two_dedups_on_final_pass() {
        let mut a = cursor_source("a\nb\n");
        let mut b = cursor_source("b\nc\n");
        let mut out = Vec::new();
        let mut w = RunWriter::new(&mut out, PathBuf::from("<out>"));
        merge_two(&mut a, &mut b, &mut w, true).unwrap();
        assert_eq!(out, b"a\nb\nc\n");
    }

    #[test]
    fn merge_pass_halves_an_even_run_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.gz");
        write_gz(&path, "a\nc\n|b\nd\n|e\ng\n|f\nh\n");

        let mut out = Vec::new();
        let mut w = RunWriter::new(&mut out, PathBuf::from("<out>"));
        let new_log = merge_pass(&path, &[2, 2, 2, 2], &mut w, false).unwrap();

        assert_eq!(new_log, vec![4, 4]);
        assert_eq!(out, b"a\nb\nc\nd\ne\nf\ng\nh\n");
    }

    #[test]
    fn merge_pass_carries_true_count_for_trailing_unpaired_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.gz");
        write_gz(&path, "a\nc\n|b\nd\n|e\n");

        let mut out = Vec::new();
        let mut w = RunWriter::new(&mut out, PathBuf::from("<out>"));
        let new_log = merge_pass(&path, &[2, 2, 1], &mut w, false).unwrap();

        assert_eq!(new_log, vec![4, 1]);
        assert_eq!(out, b"a\nb\nc\nd\ne\n");
    }

    fn write_gz(path: &std::path::Path, pipe_joined_runs: &str) {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::fs::File;

        let data = pipe_joined_runs.replace('|', "");
        let file = File::create(path).unwrap();
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(data.as_bytes()).unwrap();
        enc.finish().unwrap();
    }
}
