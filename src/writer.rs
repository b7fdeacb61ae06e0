use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;

use crate::common::io::open_gz_writer;
use crate::error::Error;

/// Concrete writer type produced by [`RunWriter::create`].
pub type GzRunWriter = RunWriter<GzEncoder<BufWriter<File>>>;

/// Appends lines to a compressed output, with an optional last-written-line
/// memory used to suppress duplicates.
pub struct RunWriter<W> {
    sink: W,
    path: PathBuf,
    previous: Option<Vec<u8>>,
    lines_written: u64,
}

impl GzRunWriter {
    pub fn create(path: &Path) -> Result<Self, Error> {
        let sink = open_gz_writer(path)?;
        Ok(RunWriter::new(sink, path.to_path_buf()))
    }
}

impl<W: Write> RunWriter<W> {
    pub fn new(sink: W, path: PathBuf) -> Self {
        RunWriter { sink, path, previous: None, lines_written: 0 }
    }

    /// Append `bytes` followed by `\n`, unconditionally.
    pub fn write_line(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.sink.write_all(bytes).map_err(|e| self.wrap(e))?;
        self.sink.write_all(b"\n").map_err(|e| self.wrap(e))?;
        self.lines_written += 1;
        Ok(())
    }

    /// Append `bytes` only if it differs from the previously written line;
    /// the first call always writes. Deduplication happens only at the
    /// writer, so intermediate merge passes that don't dedup keep the
    /// run-length log accurate.
    pub fn write_unique(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let is_duplicate = match &self.previous {
            Some(prev) => prev.as_slice() == bytes,
            None => false,
        };
        if is_duplicate {
            return Ok(());
        }
        self.write_line(bytes)?;
        self.previous = Some(bytes.to_vec());
        Ok(())
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.sink.flush().map_err(|e| self.wrap(e))
    }

    fn wrap(&self, e: io::Error) -> Error {
        Error::io(self.path.clone(), e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_line_appends_newline() {
        let mut buf = Vec::new();
        {
            let mut w = RunWriter::new(&mut buf, PathBuf::from("<test>"));
            w.write_line(b"hello").unwrap();
            w.write_line(b"world").unwrap();
        }
        assert_eq!(buf, b"hello\nworld\n");
    }

    #[test]
    fn write_unique_suppresses_immediate_repeats() {
        let mut buf = Vec::new();
        {
            let mut w = RunWriter::new(&mut buf, PathBuf::from("<test>"));
            w.write_unique(b"a").unwrap();
            w.write_unique(b"a").unwrap();
            w.write_unique(b"b").unwrap();
            w.write_unique(b"a").unwrap(); // not adjacent to the first "a": still written
            assert_eq!(w.lines_written(), 3);
        }
        assert_eq!(buf, b"a\nb\na\n");
    }

    #[test]
    fn first_write_unique_call_always_writes() {
        let mut buf = Vec::new();
        let mut w = RunWriter::new(&mut buf, PathBuf::from("<test>"));
        w.write_unique(b"x").unwrap();
        assert_eq!(w.lines_written(), 1);
    }
}
