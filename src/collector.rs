use crate::error::TailError;
use crate::liveness::Liveness;
use crate::source::LogSource;
use crate::types::{LogEvent, LogGroup, LogStream};
use tracing::debug;

/// Gather up to `num_events` events from `streams`, visiting them in the
/// order given (most recently active first).
///
/// Every stream fetch asks for the full `num_events`, so a page can be cut
/// short once the cap is hit; streams after that are never fetched, even if
/// they hold newer events. `liveness` is checked before each stream and
/// `visit` sees every stream reached before the cap.
pub async fn collect_events<S, F>(
    source: &S,
    group: &LogGroup,
    streams: &[LogStream],
    num_events: usize,
    liveness: Option<&dyn Liveness>,
    mut visit: F,
) -> Result<Vec<LogEvent>, TailError>
where
    S: LogSource + ?Sized,
    F: FnMut(&LogStream) -> Result<(), TailError>,
{
    let mut events = Vec::with_capacity(num_events.min(1024));

    for stream in streams {
        if let Some(liveness) = liveness
            && !liveness.is_alive()
        {
            return Err(TailError::Stopped {
                reason: liveness.describe(),
            });
        }

        visit(stream)?;

        if events.len() >= num_events {
            break;
        }

        let page = source.get_events(group, stream, num_events).await?;
        debug!(
            "Fetched {} events from stream {} of {}",
            page.len(),
            stream.name,
            group.name
        );

        let room = num_events - events.len();
        events.extend(page.into_iter().take(room));
    }

    Ok(events)
}
