/// A single log line fetched from a stream.
///
/// Two events are the same event when both `timestamp` and `message` match;
/// `ingestion_time` is carried for display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: i64,
    pub message: String,
    pub ingestion_time: Option<i64>,
}

impl LogEvent {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
            ingestion_time: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogStream {
    pub name: String,
    pub last_event_timestamp: Option<i64>,
    pub arn: Option<String>,
    pub creation_time: Option<i64>,
    pub first_event_timestamp: Option<i64>,
    pub last_ingestion_time: Option<i64>,
}

impl LogStream {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogGroup {
    pub name: String,
    pub arn: Option<String>,
    pub creation_time: Option<i64>,
    pub retention_in_days: Option<i32>,
    pub stored_bytes: Option<i64>,
    pub metric_filter_count: Option<i32>,
}

impl LogGroup {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
