use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::Error;

/// Decompressor input buffer size.
const GZ_READ_BUF: usize = 64 * 1024;

/// Open `path` for gzip-compressed reading with a buffered file handle.
pub fn open_gz_reader(path: &Path) -> Result<GzDecoder<BufReader<File>>, Error> {
    let file = File::open(path).map_err(|e| Error::open(path, e))?;
    Ok(GzDecoder::new(BufReader::with_capacity(GZ_READ_BUF, file)))
}

/// Open `path` for gzip-compressed writing (default compression level).
pub fn open_gz_writer(path: &Path) -> Result<GzEncoder<BufWriter<File>>, Error> {
    let file = File::create(path).map_err(|e| Error::open(path, e))?;
    Ok(GzEncoder::new(BufWriter::new(file), Compression::default()))
}

/// Print `"<label>: <seconds> seconds"` (or `<minutes> minutes` at >= 100s)
/// to stdout, suppressed under 2 seconds.
pub fn report_time(label: &str, start: Instant) {
    let seconds = start.elapsed().as_secs_f64();
    if seconds < 2.0 {
        return;
    }
    if seconds < 100.0 {
        println!("{}: {} seconds", label, seconds.round() as u64);
    } else {
        println!("{}: {:.2} minutes", label, seconds / 60.0);
    }
}
