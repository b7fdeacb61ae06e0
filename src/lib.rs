// Allow pre-existing clippy lints across the codebase
#![allow(
    clippy::collapsible_if,
    clippy::needless_range_loop,
    clippy::too_many_arguments,
    clippy::needless_lifetimes
)]

/// The presort buffer is a single byte arena reserved once and reused across
/// every run; mimalloc routes that reservation through mmap once it crosses
/// its large-object threshold, and handles the frequent small allocations
/// from line buffering well.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod common;
pub mod config;
pub mod driver;
pub mod error;
pub mod merge;
pub mod parallel;
pub mod presort;
pub mod reader;
pub mod writer;

pub use error::{Error, Result};
