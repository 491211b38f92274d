use clap::Parser;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Run a file-search command and list what it finds, classified and batched.
#[derive(Clone, Parser)]
#[command(name = "file-external")]
#[command(about = "Run a find-like command in DIR and stream its results as classified entries.")]
pub struct Cli {
    /// Directory to run the command in. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: String,

    /// Batch size after the first batch.
    #[arg(long, short = 'u', value_parser = clap::value_parser!(usize))]
    pub update_items: Option<usize>,

    /// Size of the first batch.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub first_batch: Option<usize>,

    /// Print one JSON object per entry instead of its display path.
    #[arg(long, short = 'j', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub json: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Command and arguments to run, after `--` (e.g. `-- fd --type f`).
    #[arg(last = true, value_name = "CMD")]
    pub cmd: Vec<String>,
}
