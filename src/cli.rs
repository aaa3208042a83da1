use clap::{Args, Parser};
use std::path::PathBuf;

use crate::scan::ErrorPolicy;

#[derive(Parser)]
#[command(
    name = "dupscan",
    version,
    about = "Find files with identical content across directory trees"
)]
pub struct Cli {
    /// Path to a YAML config file (default: dupscan.yaml in the CWD or next to the binary)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub scan: ScanArgs,
}

#[derive(Args, Default)]
pub struct ScanArgs {
    /// Directories to scan (default: current directory)
    pub dirs: Vec<PathBuf>,

    /// Follow symbolic links
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories
    #[arg(long)]
    pub skip_hidden: bool,

    /// Only consider files whose name contains a dot
    #[arg(long)]
    pub require_extension: bool,

    /// Compare matching files byte for byte before reporting them
    #[arg(long)]
    pub verify: bool,

    /// Ignore files smaller than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub min_size: Option<u64>,

    /// What to do with files that cannot be read
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_error: Option<ErrorPolicy>,

    /// Include only files matching these glob patterns
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Exclude files matching these glob patterns
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,
}
