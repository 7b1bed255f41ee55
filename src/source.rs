use crate::error::TailError;
use crate::types::{LogEvent, LogGroup, LogStream};

/// Most recently active streams considered per group.
pub const STREAM_LIMIT: i32 = 10;

/// Where groups, streams and events come from.
///
/// The core only ever talks to this trait; `CloudWatchSource` is the real
/// backend.
#[async_trait::async_trait]
pub trait LogSource: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<LogGroup>, TailError>;

    /// Up to `STREAM_LIMIT` streams, most recent event first.
    async fn list_streams(&self, group: &LogGroup) -> Result<Vec<LogStream>, TailError>;

    async fn get_events(
        &self,
        group: &LogGroup,
        stream: &LogStream,
        limit: usize,
    ) -> Result<Vec<LogEvent>, TailError>;
}
