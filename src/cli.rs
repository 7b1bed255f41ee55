use crate::session::{DEFAULT_FOLLOW_INTERVAL, DEFAULT_LOG_LINES};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cloudtail", version)]
#[command(about = "Tail logs from AWS CloudWatch log groups")]
pub struct Cli {
    /// Log group name, or any unique part of it
    #[arg(required_unless_present = "list")]
    pub group: Option<String>,

    /// Number of lines to dump
    #[arg(short = 'n', long, default_value_t = DEFAULT_LOG_LINES)]
    pub lines: usize,

    /// Follow the log group
    #[arg(short = 'f', long)]
    pub follow: bool,

    /// Interval (in seconds) to sleep between polls while following
    #[arg(short = 's', long, default_value_t = DEFAULT_FOLLOW_INTERVAL,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Stop following once this process exits
    #[arg(short = 'p', long)]
    pub pid: Option<i32>,

    /// Wait for the log group to appear instead of failing (implied by --follow)
    #[arg(short = 'w', long)]
    pub wait: bool,

    /// Only print events whose message matches this regex
    #[arg(short = 'g', long)]
    pub grep: Option<String>,

    /// List log groups and exit
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Verbose output, including stream and group metadata
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// With --verbose, keep event lines plain and skip metadata
    #[arg(long)]
    pub hide_metadata: bool,

    /// AWS region (defaults to the environment/profile, then us-west-2)
    #[arg(long)]
    pub region: Option<String>,

    /// AWS shared config profile
    #[arg(long)]
    pub profile: Option<String>,
}

impl Cli {
    /// Following a group that does not exist yet waits for it, as does `--wait`.
    pub fn waits_for_group(&self) -> bool {
        self.wait || self.follow
    }
}
