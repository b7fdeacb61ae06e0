use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use crate::common;
use crate::common::io::report_time;
use crate::config::{Options, MAX_WORKERS, STRIDE_WINDOW};
use crate::driver::sort_from_source;
use crate::error::Error;
use crate::reader::GzLineReader;
use crate::writer::GzRunWriter;

/// Run the parallel pipeline: partition `opts.source` into `opts.parallel`
/// strided subsets, sort each independently in its own thread, then combine
/// the per-worker sorted outputs with an N-way heap merge.
///
/// Each worker never deduplicates on its own — equal lines assigned to
/// different workers only become adjacent after the final merge, so
/// deduplication has exactly one authoritative point: the N-way merge.
pub fn sort_parallel(opts: &Options) -> Result<u64, Error> {
    let n = opts.parallel.min(MAX_WORKERS).max(1);

    let mut handles = Vec::with_capacity(n);
    for k in 0..n {
        let source = opts.source.clone();
        let dest = opts.dest.clone();
        let budget = opts.presort_bytes;
        handles.push(thread::spawn(move || -> Result<(PathBuf, u64), Error> {
            let temp_path = common::worker_temp_path(&dest, k + 1);
            let out_path = common::worker_output_path(&dest, k + 1);
            let mut reader = GzLineReader::open(&source)?;
            reader.skip((k as u64) * STRIDE_WINDOW)?;
            let mut subset = reader.begin_subset(STRIDE_WINDOW, (n as u64 - 1) * STRIDE_WINDOW);
            let label = format!("T{}", k + 1);
            let lines = sort_from_source(&mut subset, &temp_path, &out_path, budget, false, &label)?;
            Ok((out_path, lines))
        }));
    }

    // Collect every worker's result before attempting the merge: a single
    // failed or panicked worker fails the whole run rather than silently
    // merging a partial set of partitions.
    let mut worker_outputs = Vec::with_capacity(n);
    for handle in handles {
        let result = handle
            .join()
            .map_err(|_| Error::Usage("a sort worker thread panicked".to_string()))?;
        worker_outputs.push(result?);
    }

    let start = Instant::now();
    let total_lines: u64 = worker_outputs.iter().map(|(_, lines)| *lines).sum();
    let final_lines = nway_merge(&worker_outputs, &opts.dest, opts.unique)?;
    report_time(&format!("{}-way merge", n), start);

    for (path, _) in &worker_outputs {
        let _ = std::fs::remove_file(path);
    }

    if opts.unique {
        println!(
            "removed {} non-unique lines",
            total_lines.saturating_sub(final_lines)
        );
    }

    Ok(final_lines)
}

/// Min-heap entry: one buffered line plus which worker source it came from.
struct HeapItem {
    line: Vec<u8>,
    source: usize,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line && self.source == other.source
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    // Reversed so BinaryHeap (a max-heap) pops the lexicographically
    // smallest line first; ties favor the lower worker index.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .line
            .cmp(&self.line)
            .then_with(|| other.source.cmp(&self.source))
    }
}

fn nway_merge(
    workers: &[(PathBuf, u64)],
    dest: &std::path::Path,
    unique: bool,
) -> Result<u64, Error> {
    let mut readers: Vec<GzLineReader> = workers
        .iter()
        .map(|(path, _)| GzLineReader::open(path))
        .collect::<Result<_, _>>()?;

    let mut writer = GzRunWriter::create(dest)?;
    let mut heap = BinaryHeap::with_capacity(readers.len());

    for (source, reader) in readers.iter_mut().enumerate() {
        if let Some(line) = reader.next_line()? {
            heap.push(HeapItem { line: line.to_vec(), source });
        }
    }

    while let Some(HeapItem { line, source }) = heap.pop() {
        if unique {
            writer.write_unique(&line)?;
        } else {
            writer.write_line(&line)?;
        }
        if let Some(next) = readers[source].next_line()? {
            heap.push(HeapItem { line: next.to_vec(), source });
        }
    }

    writer.flush()?;
    Ok(writer.lines_written())
}
