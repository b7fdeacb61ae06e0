use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::common;
use crate::common::io::report_time;
use crate::error::Error;
use crate::merge::merge_pass;
use crate::presort::presort_to_runs;
use crate::reader::{GzLineReader, LineSource};
use crate::writer::GzRunWriter;

/// Decompress and recompress `source` into `dest` line by line, with no
/// sorting or deduplication (`-T`, a debug/benchmark mode).
pub fn pass_through(source: &Path, dest: &Path) -> Result<(), Error> {
    let start = Instant::now();
    let mut reader = GzLineReader::open(source)?;
    let mut writer = GzRunWriter::create(dest)?;
    while let Some(line) = reader.next_line()? {
        writer.write_line(line)?;
    }
    writer.flush()?;
    report_time("passthrough", start);
    Ok(())
}

/// Run the full single-threaded pipeline on `source`, writing the sorted
/// result to `dest`. Returns the number of lines in the final output.
pub fn sort_single(source: &Path, dest: &Path, presort_bytes: u64, unique: bool) -> Result<u64, Error> {
    let mut reader = GzLineReader::open(source)?;
    let temp_path = common::single_temp_path(dest);
    sort_from_source(&mut reader, &temp_path, dest, presort_bytes, unique, "sort")
}

/// Shared core of the single-threaded pipeline and each parallel worker's
/// private sort: presort `source` into runs at `temp_path`,
/// then ping-pong pairwise merge passes between `temp_path` and `dest`
/// until one run remains, deduplicating only on the pass that produces it.
pub fn sort_from_source<S: LineSource>(
    source: &mut S,
    temp_path: &Path,
    dest: &Path,
    presort_bytes: u64,
    unique: bool,
    label: &str,
) -> Result<u64, Error> {
    let start = Instant::now();
    let mut run_log = {
        let mut writer = GzRunWriter::create(temp_path)?;
        let log = presort_to_runs(source, presort_bytes as usize, &mut writer)?;
        writer.flush()?;
        log
    };
    report_time(&format!("{label} presort"), start);

    let total_lines: u64 = run_log.iter().map(|&n| n as u64).sum();

    let names = [temp_path.to_path_buf(), dest.to_path_buf()];
    let mut current = 0usize;
    let mut deduped = false;
    let mut final_lines = total_lines;

    while run_log.len() > 1 || (unique && !deduped) {
        let next = 1 - current;
        let dedup_now = unique && run_log.len() <= 2;

        let pass_start = Instant::now();
        let new_log = {
            let mut writer = GzRunWriter::create(&names[next])?;
            let new_log = merge_pass(&names[current], &run_log, &mut writer, dedup_now)?;
            writer.flush()?;
            final_lines = writer.lines_written();
            new_log
        };
        report_time(&format!("{label} merge"), pass_start);

        fs::remove_file(&names[current]).map_err(|e| Error::io(names[current].clone(), e))?;
        current = next;
        run_log = new_log;
        if dedup_now {
            deduped = true;
        }
    }

    if names[current].as_path() != dest {
        fs::rename(&names[current], dest).map_err(|e| Error::io(dest.to_path_buf(), e))?;
    }

    if unique {
        println!(
            "removed {} non-unique lines",
            total_lines.saturating_sub(final_lines)
        );
    }

    Ok(final_lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::File;
    use std::io::{Read, Write};

    fn write_gz(path: &Path, contents: &str) {
        let file = File::create(path).unwrap();
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(contents.as_bytes()).unwrap();
        enc.finish().unwrap();
    }

    fn read_gz(path: &Path) -> String {
        let file = File::open(path).unwrap();
        let mut dec = GzDecoder::new(file);
        let mut out = String::new();
        dec.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn pass_through_preserves_lines() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.gz");
        let dest = dir.path().join("out.gz");
        write_gz(&source, "b\na\nb\n");

        pass_through(&source, &dest).unwrap();
        assert_eq!(read_gz(&dest), "b\na\nb\n");
    }

    #[test]
    fn sort_single_sorts_without_dedup_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.gz");
        let dest = dir.path().join("out.gz");
        write_gz(&source, "c\na\nb\na\n");

        let lines = sort_single(&source, &dest, 1_000_000, false).unwrap();
        assert_eq!(lines, 4);
        assert_eq!(read_gz(&dest), "a\na\nb\nc\n");
    }

    #[test]
    fn sort_single_dedups_when_unique_requested() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.gz");
        let dest = dir.path().join("out.gz");
        write_gz(&source, "c\na\nb\na\n");

        let lines = sort_single(&source, &dest, 1_000_000, true).unwrap();
        assert_eq!(lines, 3);
        assert_eq!(read_gz(&dest), "a\nb\nc\n");
    }

    #[test]
    fn sort_single_forces_runs_across_multiple_presort_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.gz");
        let dest = dir.path().join("out.gz");
        write_gz(&source, "e\nd\nc\nb\na\n");

        // budget of 1 byte forces a new run per line.
        let lines = sort_single(&source, &dest, 1, false).unwrap();
        assert_eq!(lines, 5);
        assert_eq!(read_gz(&dest), "a\nb\nc\nd\ne\n");
    }
}
