use crate::collector::collect_events;
use crate::error::TailError;
use crate::liveness::Liveness;
use crate::ordering::{SeenSet, sort_events};
use crate::output::EventSink;
use crate::source::LogSource;
use crate::types::{LogEvent, LogGroup, LogStream};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_LOG_LINES: usize = 10;
pub const DEFAULT_FOLLOW_INTERVAL: u64 = 3;

/// Find the single group whose name contains `fragment`.
pub async fn resolve_group<S>(source: &S, fragment: &str) -> Result<LogGroup, TailError>
where
    S: LogSource + ?Sized,
{
    let groups = source.list_groups().await?;
    pick_group(groups, fragment)
}

fn pick_group(groups: Vec<LogGroup>, fragment: &str) -> Result<LogGroup, TailError> {
    let mut matches: Vec<LogGroup> = groups
        .into_iter()
        .filter(|g| g.name.contains(fragment))
        .collect();

    match matches.len() {
        0 => Err(TailError::NoMatchingGroup {
            fragment: fragment.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(TailError::AmbiguousGroup {
            fragment: fragment.to_string(),
            matches: matches.into_iter().map(|g| g.name).collect(),
        }),
    }
}

/// Like `resolve_group`, but keeps polling while nothing matches yet.
/// Ambiguity is still fatal.
pub async fn wait_for_group<S>(
    source: &S,
    fragment: &str,
    interval: Duration,
) -> Result<LogGroup, TailError>
where
    S: LogSource + ?Sized,
{
    let mut announced = false;
    loop {
        match resolve_group(source, fragment).await {
            Err(e @ TailError::NoMatchingGroup { .. }) => {
                if !announced {
                    info!("{}", e);
                    info!("Waiting for log group...");
                    announced = true;
                }
            }
            Err(e) if e.is_transient() => warn!("Listing log groups failed, retrying: {}", e),
            Ok(group) => {
                if announced {
                    info!("Log group {} has become available", group.name);
                }
                return Ok(group);
            }
            Err(e) => return Err(e),
        }
        tokio::time::sleep(interval).await;
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Events collected per follow pass.
    pub batch_size: usize,
    pub interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_LOG_LINES,
            interval: Duration::from_secs(DEFAULT_FOLLOW_INTERVAL),
        }
    }
}

type RefreshResult = Result<Vec<LogStream>, TailError>;

/// A stream listing running in the background.
struct PendingRefresh {
    result: oneshot::Receiver<RefreshResult>,
    task: AbortHandle,
}

impl Drop for PendingRefresh {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Tailing state for one resolved group.
pub struct Session<S: LogSource + 'static> {
    source: Arc<S>,
    group: LogGroup,
    streams: Vec<LogStream>,
    seen: SeenSet,
    /// Last event timestamp announced per stream name.
    announced_streams: HashMap<String, Option<i64>>,
    refresh: Option<PendingRefresh>,
    liveness: Option<Box<dyn Liveness>>,
    options: SessionOptions,
}

impl<S: LogSource + 'static> Session<S> {
    pub fn new(source: Arc<S>, group: LogGroup, options: SessionOptions) -> Self {
        Self {
            source,
            group,
            streams: Vec::new(),
            seen: SeenSet::new(),
            announced_streams: HashMap::new(),
            refresh: None,
            liveness: None,
            options,
        }
    }

    pub fn with_liveness(mut self, liveness: Box<dyn Liveness>) -> Self {
        self.liveness = Some(liveness);
        self
    }

    pub fn group(&self) -> &LogGroup {
        &self.group
    }

    pub fn streams(&self) -> &[LogStream] {
        &self.streams
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn refresh_in_flight(&self) -> bool {
        self.refresh.is_some()
    }

    fn check_liveness(&self) -> Result<(), TailError> {
        match &self.liveness {
            Some(liveness) if !liveness.is_alive() => Err(TailError::Stopped {
                reason: liveness.describe(),
            }),
            _ => Ok(()),
        }
    }

    /// Replace the stream list, waiting for the listing to finish.
    pub async fn refresh_streams(&mut self) -> Result<(), TailError> {
        let streams = self.source.list_streams(&self.group).await?;
        debug!("Group {} has {} active streams", self.group.name, streams.len());
        self.streams = streams;
        Ok(())
    }

    /// Start listing streams without waiting; `apply_refresh` picks the
    /// result up later. Only one listing runs at a time, but a finished one
    /// is applied first so it never holds back the next.
    pub fn start_refresh(&mut self) {
        self.apply_refresh();
        if self.refresh.is_some() {
            debug!("Stream refresh for {} still in flight", self.group.name);
            return;
        }

        let source = Arc::clone(&self.source);
        let group = self.group.clone();
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let _ = tx.send(source.list_streams(&group).await);
        });

        self.refresh = Some(PendingRefresh {
            result: rx,
            task: handle.abort_handle(),
        });
    }

    /// Swap in the result of a finished background refresh. Returns whether
    /// the stream list changed. A failed refresh keeps the current list.
    pub fn apply_refresh(&mut self) -> bool {
        let Some(pending) = self.refresh.as_mut() else {
            return false;
        };

        let outcome = match pending.result.try_recv() {
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => Err(TailError::transport(
                "DescribeLogStreams",
                "refresh task ended without a result",
            )),
            Ok(outcome) => outcome,
        };
        self.refresh = None;

        match outcome {
            Ok(streams) => {
                debug!("Refreshed streams for {}: {}", self.group.name, streams.len());
                self.streams = streams;
                true
            }
            Err(e) => {
                warn!("Keeping previous stream list for {}: {}", self.group.name, e);
                false
            }
        }
    }

    async fn collect<K>(&mut self, num_events: usize, sink: &mut K) -> Result<Vec<LogEvent>, TailError>
    where
        K: EventSink + ?Sized,
    {
        let announced = &mut self.announced_streams;
        collect_events(
            self.source.as_ref(),
            &self.group,
            &self.streams,
            num_events,
            self.liveness.as_deref(),
            |stream| {
                if announced.get(&stream.name) != Some(&stream.last_event_timestamp) {
                    announced.insert(stream.name.clone(), stream.last_event_timestamp);
                    sink.stream_discovered(stream)?;
                }
                Ok(())
            },
        )
        .await
    }

    async fn emit_all<K>(&mut self, num_events: usize, sink: &mut K) -> Result<usize, TailError>
    where
        K: EventSink + ?Sized,
    {
        let events = self.collect(num_events, sink).await?;
        let sorted = sort_events(events);
        for event in &sorted {
            sink.emit(event)?;
            self.seen.insert(event);
        }
        Ok(sorted.len())
    }

    /// Print the latest `lines` events once. Any failure is fatal here.
    pub async fn dump<K>(&mut self, lines: usize, sink: &mut K) -> Result<usize, TailError>
    where
        K: EventSink + ?Sized,
    {
        self.refresh_streams().await?;
        self.emit_all(lines, sink).await
    }

    /// First follow pass: show the latest batch unconditionally and
    /// remember all of it.
    pub async fn initial_pass<K>(&mut self, sink: &mut K) -> Result<usize, TailError>
    where
        K: EventSink + ?Sized,
    {
        self.emit_all(self.options.batch_size, sink).await
    }

    /// One follow pass: emit only events not shown before.
    pub async fn tick<K>(&mut self, sink: &mut K) -> Result<usize, TailError>
    where
        K: EventSink + ?Sized,
    {
        self.apply_refresh();

        let events = self.collect(self.options.batch_size, sink).await?;
        let mut emitted = 0;
        for event in sort_events(events) {
            if self.seen.contains(&event) {
                continue;
            }
            sink.emit(&event)?;
            self.seen.insert(&event);
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Follow the group until liveness fails or output breaks. Transport
    /// errors are logged and retried on the next tick.
    pub async fn follow<K>(&mut self, sink: &mut K) -> Result<(), TailError>
    where
        K: EventSink + ?Sized,
    {
        self.check_liveness()?;

        let refreshed = self.refresh_streams().await;
        tolerate(refreshed, "Listing streams")?;

        let shown = self.initial_pass(sink).await;
        tolerate(shown, "Initial collection")?;

        loop {
            self.check_liveness()?;

            let emitted = self.tick(sink).await;
            if let Some(n) = tolerate(emitted, "Collecting events")?
                && n > 0
            {
                debug!("Emitted {} new events from {}", n, self.group.name);
            }

            // Listing overlaps the sleep and is swapped in by the next tick.
            self.start_refresh();
            tokio::time::sleep(self.options.interval).await;
        }
    }
}

/// Downgrade transient failures to a warning.
fn tolerate<T>(result: Result<T, TailError>, what: &str) -> Result<Option<T>, TailError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_transient() => {
            warn!("{} failed, retrying next tick: {}", what, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
