pub mod io;

use std::path::{Path, PathBuf};

/// Temp file for the single-threaded pipeline: `<dest>.temp`.
pub fn single_temp_path(dest: &Path) -> PathBuf {
    append_suffix(dest, ".temp")
}

/// Temp (working) file for parallel worker `k`: `<dest>.T<k>.temp`.
/// `k` is 1-indexed.
pub fn worker_temp_path(dest: &Path, k: usize) -> PathBuf {
    append_suffix(dest, &format!(".T{}.temp", k))
}

/// Output file for parallel worker `k`: `<dest>.T<k>.gz`.
pub fn worker_output_path(dest: &Path, k: usize) -> PathBuf {
    append_suffix(dest, &format!(".T{}.gz", k))
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_temp_path_appends_suffix() {
        assert_eq!(single_temp_path(Path::new("out.gz")), PathBuf::from("out.gz.temp"));
    }

    #[test]
    fn worker_paths_are_1_indexed_and_distinct() {
        assert_eq!(worker_temp_path(Path::new("out.gz"), 1), PathBuf::from("out.gz.T1.temp"));
        assert_eq!(worker_output_path(Path::new("out.gz"), 3), PathBuf::from("out.gz.T3.gz"));
    }
}
