pub mod cli;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod hash;
pub mod report;
pub mod scan;

pub use dedupe::{find_duplicates, DuplicateFinder, DuplicateGroup, ScanReport};
pub use error::{Error, Result};
pub use scan::{ErrorPolicy, ScanOptions};
