use anyhow::Context;
use clap::Parser;
use cloudtail::TailError;
use cloudtail::cli::Cli;
use cloudtail::cloudwatch::CloudWatchSource;
use cloudtail::liveness::PidWatch;
use cloudtail::output::{EventSink, OutputOptions, StdoutSink};
use cloudtail::session::{
    DEFAULT_LOG_LINES, Session, SessionOptions, resolve_group, wait_for_group,
};
use cloudtail::source::LogSource;
use regex::Regex;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Keep the AWS SDK's own debug chatter out unless RUST_LOG asks for it.
    let filter = if cli.verbose {
        "cloudtail=debug,warn"
    } else {
        "cloudtail=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let grep = cli
        .grep
        .as_deref()
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("Invalid regex pattern '{}'", pattern))
        })
        .transpose()?;

    let wait = cli.waits_for_group();
    match run(cli, grep).await {
        Ok(()) => {}
        Err(TailError::Stopped { reason }) => info!("Stopped following: {}", reason),
        Err(TailError::Output(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
        Err(e) => {
            error!("{}", e);
            if matches!(e, TailError::NoMatchingGroup { .. }) && !wait {
                info!("To wait for a log group, run cloudtail with --follow or --wait");
            }
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn run(cli: Cli, grep: Option<Regex>) -> Result<(), TailError> {
    let source = Arc::new(CloudWatchSource::connect(cli.region.clone(), cli.profile.clone()).await?);

    let stdout = std::io::stdout();
    let options = OutputOptions {
        verbose: cli.verbose,
        hide_metadata: cli.hide_metadata,
        color: stdout.is_terminal(),
        grep,
    };
    let mut sink = StdoutSink::new(stdout, options);

    if cli.list {
        for group in source.list_groups().await? {
            sink.list_group(&group)?;
        }
        return Ok(());
    }

    let fragment = cli.group.as_deref().unwrap_or_default();
    let interval = Duration::from_secs(cli.interval);
    let group = if cli.waits_for_group() {
        wait_for_group(source.as_ref(), fragment, interval).await?
    } else {
        resolve_group(source.as_ref(), fragment).await?
    };
    debug!("Resolved log group {}", group.name);
    sink.group_resolved(&group)?;

    let options = SessionOptions {
        batch_size: DEFAULT_LOG_LINES,
        interval,
    };
    let mut session = Session::new(source, group, options);

    if !cli.follow {
        let shown = session.dump(cli.lines, &mut sink).await?;
        debug!("Dumped {} events", shown);
        return Ok(());
    }

    if let Some(pid) = cli.pid {
        session = session.with_liveness(Box::new(PidWatch::new(pid)));
    }
    info!("Following {} every {}s", session.group().name, cli.interval);
    session.follow(&mut sink).await
}
