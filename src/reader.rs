use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use memchr::memchr;

use crate::common::io::open_gz_reader;
use crate::error::Error;

/// Fixed read buffer size.
const READ_BUF: usize = 16 * 1024;

/// Initial spillover capacity; grows by `Vec`'s normal amortized
/// doubling when a line outgrows it.
const SPILL_INIT: usize = 1024;

/// Concrete reader type produced by [`LineReader::open`].
pub type GzLineReader = LineReader<GzDecoder<BufReader<File>>>;

/// Streams one line at a time from a compressed source.
///
/// `next_line` yields a borrowed view into either the fixed read buffer or
/// the growable spillover buffer; the reference is invalidated by the next
/// call. Callers that need to retain a line across further reads must copy
/// it (this is the ownership contract the Run Writer relies on for its
/// previous-line memory).
pub struct LineReader<R> {
    source: R,
    path: PathBuf,
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
    spill: Vec<u8>,
}

impl GzLineReader {
    /// Open `path` as a gzip-compressed line stream.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let decoder = open_gz_reader(path)?;
        Ok(LineReader::new(decoder, path.to_path_buf()))
    }
}

impl<R: Read> LineReader<R> {
    pub fn new(source: R, path: PathBuf) -> Self {
        LineReader {
            source,
            path,
            buf: vec![0u8; READ_BUF].into_boxed_slice(),
            pos: 0,
            len: 0,
            spill: Vec::with_capacity(SPILL_INIT),
        }
    }

    fn refill(&mut self) -> Result<(), Error> {
        self.pos = 0;
        match self.source.read(&mut self.buf) {
            Ok(n) => {
                self.len = n;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                Err(Error::decode(self.path.clone(), e))
            }
            Err(e) => Err(Error::io(self.path.clone(), e)),
        }
    }

    /// Yield the next line, excluding its terminating `\n`. `None` at EOF.
    /// A trailing partial line without a terminator is still delivered.
    pub fn next_line(&mut self) -> Result<Option<&[u8]>, Error> {
        self.spill.clear();
        loop {
            if self.pos >= self.len {
                self.refill()?;
                if self.len == 0 {
                    return Ok(None);
                }
            }

            match memchr(b'\n', &self.buf[self.pos..self.len]) {
                Some(i) => {
                    let line_end = self.pos + i;
                    if self.spill.is_empty() {
                        let line = &self.buf[self.pos..line_end];
                        self.pos = line_end + 1;
                        return Ok(Some(line));
                    } else {
                        self.spill.extend_from_slice(&self.buf[self.pos..line_end]);
                        self.pos = line_end + 1;
                        return Ok(Some(&self.spill[..]));
                    }
                }
                None => {
                    self.spill.extend_from_slice(&self.buf[self.pos..self.len]);
                    self.pos = self.len;
                    self.refill()?;
                    if self.len == 0 {
                        return Ok(if self.spill.is_empty() { None } else { Some(&self.spill[..]) });
                    }
                }
            }
        }
    }

    /// Advance past `n` lines, discarding them.
    pub fn skip(&mut self, n: u64) -> Result<(), Error> {
        for _ in 0..n {
            if self.next_line()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Take the next `count` lines, then skip `stride` lines, repeating.
    /// Exposes a virtual strided-subset stream over the same reader.
    pub fn begin_subset(&mut self, count: u64, stride: u64) -> Subset<'_, R> {
        Subset { reader: self, remaining: count, count, stride }
    }
}

/// A view over a [`LineReader`] that yields only every `stride`-gapped
/// batch of `count` lines, produced by [`LineReader::begin_subset`].
pub struct Subset<'a, R> {
    reader: &'a mut LineReader<R>,
    remaining: u64,
    count: u64,
    stride: u64,
}

impl<'a, R: Read> Subset<'a, R> {
    pub fn next_line(&mut self) -> Result<Option<&[u8]>, Error> {
        if self.remaining == 0 {
            if self.count == 0 {
                return Ok(None);
            }
            self.reader.skip(self.stride)?;
            self.remaining = self.count;
        }
        self.remaining -= 1;
        self.reader.next_line()
    }
}

/// Common interface over a full [`LineReader`] or a [`Subset`] view of one,
/// so the Presort Engine doesn't need to know which it was handed.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<&[u8]>, Error>;
}

impl<R: Read> LineSource for LineReader<R> {
    fn next_line(&mut self) -> Result<Option<&[u8]>, Error> {
        LineReader::next_line(self)
    }
}

impl<'a, R: Read> LineSource for Subset<'a, R> {
    fn next_line(&mut self) -> Result<Option<&[u8]>, Error> {
        Subset::next_line(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader_over(data: &str) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(data.as_bytes().to_vec()), PathBuf::from("<test>"))
    }

    #[test]
    fn yields_lines_without_terminator() {
        let mut r = reader_over("a\nbb\nccc\n");
        assert_eq!(r.next_line().unwrap(), Some(&b"a"[..]));
        assert_eq!(r.next_line().unwrap(), Some(&b"bb"[..]));
        assert_eq!(r.next_line().unwrap(), Some(&b"ccc"[..]));
        assert_eq!(r.next_line().unwrap(), None);
    }

    #[test]
    fn delivers_trailing_line_without_terminator() {
        let mut r = reader_over("a\nb");
        assert_eq!(r.next_line().unwrap(), Some(&b"a"[..]));
        assert_eq!(r.next_line().unwrap(), Some(&b"b"[..]));
        assert_eq!(r.next_line().unwrap(), None);
    }

    #[test]
    fn empty_input_yields_no_lines() {
        let mut r = reader_over("");
        assert_eq!(r.next_line().unwrap(), None);
    }

    #[test]
    fn line_spanning_multiple_internal_reads() {
        // Longer than READ_BUF forces multiple refills inside one next_line call.
        let long_line = "x".repeat(READ_BUF * 3);
        let data = format!("{}\nshort\n", long_line);
        let mut r = reader_over(&data);
        assert_eq!(r.next_line().unwrap(), Some(long_line.as_bytes()));
        assert_eq!(r.next_line().unwrap(), Some(&b"short"[..]));
        assert_eq!(r.next_line().unwrap(), None);
    }

    #[test]
    fn skip_discards_lines() {
        let mut r = reader_over("a\nb\nc\nd\n");
        r.skip(2).unwrap();
        assert_eq!(r.next_line().unwrap(), Some(&b"c"[..]));
        assert_eq!(r.next_line().unwrap(), Some(&b"d"[..]));
    }

    #[test]
    fn begin_subset_strides_through_input() {
        // 8 lines, worker takes 2 then skips 4 (stride), repeats: lines 0,1,6,7
        let mut r = reader_over("0\n1\n2\n3\n4\n5\n6\n7\n");
        let mut sub = r.begin_subset(2, 4);
        assert_eq!(sub.next_line().unwrap(), Some(&b"0"[..]));
        assert_eq!(sub.next_line().unwrap(), Some(&b"1"[..]));
        assert_eq!(sub.next_line().unwrap(), Some(&b"6"[..]));
        assert_eq!(sub.next_line().unwrap(), Some(&b"7"[..]));
        assert_eq!(sub.next_line().unwrap(), None);
    }
}
