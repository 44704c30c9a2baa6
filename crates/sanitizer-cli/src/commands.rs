use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "media-sanitizer")]
#[command(
    about = "Mirror a directory tree, replacing every image with a blank placeholder of the same format and size",
    long_about = None
)]
pub struct Cli {
    /// Existing media directory to be sanitized
    #[arg(long, value_name = "DIR")]
    pub source: PathBuf,

    /// Directory to create for the sanitized media; must not exist yet
    #[arg(long, value_name = "DIR")]
    pub target: PathBuf,

    /// Configuration file (defaults to an optional Sanitizer.toml in the working directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log every copied, grouped and linked file
    #[arg(short, long)]
    pub verbose: bool,
}
