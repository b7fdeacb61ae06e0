use std::process;

use clap::Parser;

use gzsort_core::config::{self, Options, DEFAULT_PRESORT_BYTES};
use gzsort_core::driver;
use gzsort_core::error::Error;
use gzsort_core::parallel;

#[derive(Parser)]
#[command(name = "gzsort", about = "Sort the lines of a gzip-compressed file")]
struct Cli {
    /// Remove adjacent duplicate lines from the final output
    #[arg(short = 'u')]
    unique: bool,

    /// Presort memory budget, e.g. 10K, 100M, 1G (default 1M)
    #[arg(short = 'S', value_name = "SIZE")]
    buffer_size: Option<String>,

    /// Sort using N worker threads
    #[arg(short = 'P', value_name = "N")]
    parallel: Option<usize>,

    /// Decompress and recompress without sorting, for benchmarking
    #[arg(short = 'T')]
    pass_through: bool,

    /// Compressed input file
    source: String,

    /// Compressed output file
    dest: String,
}

fn main() {
    let cli = Cli::parse();

    let presort_bytes = match &cli.buffer_size {
        Some(s) => match config::parse_size(s) {
            Ok(n) => n,
            Err(e) => fail(&e),
        },
        None => DEFAULT_PRESORT_BYTES,
    };

    let mut opts = Options {
        source: cli.source.into(),
        dest: cli.dest.into(),
        unique: cli.unique,
        presort_bytes,
        parallel: cli.parallel.unwrap_or(0),
        pass_through: cli.pass_through,
    };
    opts.adjust_budget();

    let result = if opts.pass_through {
        driver::pass_through(&opts.source, &opts.dest)
    } else if opts.parallel > 0 {
        parallel::sort_parallel(&opts).map(|_| ())
    } else {
        driver::sort_single(&opts.source, &opts.dest, opts.presort_bytes, opts.unique).map(|_| ())
    };

    if let Err(e) = result {
        fail(&e);
    }
}

fn fail(e: &Error) -> ! {
    eprintln!("gzsort: {e}");
    process::exit(e.exit_code());
}
