use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hashmv",
    version,
    about = "Digest-templated file naming with atomic placement"
)]
pub struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Stream a source, then atomically place it under its digest-derived name
    Place(PlaceArgs),
    /// Checksum files with every catalogue algorithm in one read pass
    Sum(SumArgs),
    /// Hash a string, or each line read from stdin
    Line(LineArgs),
    /// List the digest algorithm catalogue
    List,
}

#[derive(clap::Args, Debug)]
pub struct PlaceArgs {
    /// Digest algorithm naming the file (e.g. sha256)
    pub algorithm: String,

    /// Destination pattern; %<width>h expands digest hex, %-<width>h takes
    /// the trailing slice, %H uppercases, %% is a literal %
    pub template: String,

    /// Read from FILE instead of stdin; regular files are renamed into place
    #[arg(long, value_name = "FILE")]
    pub from: Option<PathBuf>,

    /// Permission mask for staged files (octal); defaults to the process umask
    #[arg(long, value_name = "OCTAL")]
    pub mode_mask: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SumArgs {
    /// Files to checksum; stdin when empty
    pub files: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct LineArgs {
    /// Digest algorithm (e.g. sha256)
    pub algorithm: String,

    /// Text to hash; without it every stdin line is hashed separately
    pub text: Option<String>,
}
