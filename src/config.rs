use std::path::PathBuf;

use crate::error::Error;

/// Maximum workers accepted by `-P`.
pub const MAX_WORKERS: usize = 64;

/// Default presort budget before the post-parse adjustment, in bytes.
pub const DEFAULT_PRESORT_BYTES: u64 = 1_000_000;

/// Stride window used by the parallel driver to carve up the input.
pub const STRIDE_WINDOW: u64 = 1000;

/// Parsed command-line options, already past validation.
#[derive(Debug, Clone)]
pub struct Options {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub unique: bool,
    pub presort_bytes: u64,
    pub parallel: usize,
    pub pass_through: bool,
}

impl Options {
    /// Apply the budget adjustment. `presort_bytes` must already hold the
    /// value parsed from `-S` (or the default), before splitting by worker
    /// count. Mutates `self.presort_bytes` in place.
    pub fn adjust_budget(&mut self) {
        self.presort_bytes = adjust_budget(self.presort_bytes, self.parallel);
    }
}

/// The conservative post-parse budget shrink:
/// `B <- B/2` if `B < 1e9`, else `B <- B - 5e8`; then `B <- B/N` if `N > 0`.
pub fn adjust_budget(mut b: u64, parallel: usize) -> u64 {
    if b < 1_000_000_000 {
        b /= 2;
    } else {
        b = b.saturating_sub(500_000_000);
    }
    if parallel > 0 {
        b /= parallel as u64;
    }
    b
}

/// Parse a presort-budget size string like "10K", "1M", "1G".
/// Suffixes are decimal (×10^3/10^6/10^9), not binary (×1024-based).
pub fn parse_size(s: &str) -> Result<u64, Error> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::Usage("empty size".to_string()));
    }

    let (num_part, suffix) = if s.ends_with(|c: char| c.is_ascii_alphabetic()) {
        let (n, s) = s.split_at(s.len() - 1);
        (n, s.chars().next())
    } else {
        (s, None)
    };

    let base: u64 = num_part
        .parse()
        .map_err(|_| Error::Usage(format!("invalid size: {}", s)))?;

    let multiplier: u64 = match suffix {
        Some('k') | Some('K') => 1_000,
        Some('M') => 1_000_000,
        Some('G') => 1_000_000_000,
        Some(c) => return Err(Error::Usage(format!("invalid suffix '{}' in size", c))),
        None => 1,
    };

    Ok(base * multiplier)
}
