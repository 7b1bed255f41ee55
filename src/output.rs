use crate::types::{LogEvent, LogGroup, LogStream};
use crate::utils::{format_timestamp, format_timestamp_utc, get_color};
use crossterm::style::{Color, Stylize};
use regex::Regex;
use serde::Serialize;
use std::io::{self, Write};

/// Receives everything the tailer wants shown.
pub trait EventSink {
    fn emit(&mut self, event: &LogEvent) -> io::Result<()>;

    fn group_resolved(&mut self, _group: &LogGroup) -> io::Result<()> {
        Ok(())
    }

    /// Called once per (name, last event timestamp) pair the session sees.
    fn stream_discovered(&mut self, _stream: &LogStream) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct EventRecord {
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion_time: Option<String>,
    pub message: String,
}

impl From<&LogEvent> for EventRecord {
    fn from(event: &LogEvent) -> Self {
        Self {
            timestamp: format_timestamp_utc(event.timestamp),
            ingestion_time: event.ingestion_time.map(format_timestamp_utc),
            message: event.message.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StreamRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_event_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ingestion_time: Option<String>,
}

impl From<&LogStream> for StreamRecord {
    fn from(stream: &LogStream) -> Self {
        Self {
            name: stream.name.clone(),
            arn: stream.arn.clone(),
            creation_time: stream.creation_time.map(format_timestamp_utc),
            first_event_timestamp: stream.first_event_timestamp.map(format_timestamp_utc),
            last_event_timestamp: stream.last_event_timestamp.map(format_timestamp_utc),
            last_ingestion_time: stream.last_ingestion_time.map(format_timestamp_utc),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_in_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_filter_count: Option<i32>,
}

impl From<&LogGroup> for GroupRecord {
    fn from(group: &LogGroup) -> Self {
        Self {
            name: group.name.clone(),
            arn: group.arn.clone(),
            creation_time: group.creation_time.map(format_timestamp_utc),
            retention_in_days: group.retention_in_days,
            stored_bytes: group.stored_bytes,
            metric_filter_count: group.metric_filter_count,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub verbose: bool,
    pub hide_metadata: bool,
    pub color: bool,
    pub grep: Option<Regex>,
}

impl OutputOptions {
    fn show_metadata(&self) -> bool {
        self.verbose && !self.hide_metadata
    }
}

/// Line-oriented sink, normally over stdout.
pub struct StdoutSink<W: Write> {
    out: W,
    options: OutputOptions,
}

impl<W: Write> StdoutSink<W> {
    pub fn new(out: W, options: OutputOptions) -> Self {
        Self { out, options }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.options.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn write_record<T: Serialize>(&mut self, header: &str, color: Color, record: &T) -> io::Result<()> {
        let yaml = serde_yaml::to_string(record).map_err(io::Error::other)?;
        let header = self.paint(header, color);
        writeln!(self.out, "{}", header)?;
        write!(self.out, "{}", yaml)?;
        self.out.flush()
    }

    /// One entry of the `--list` output.
    pub fn list_group(&mut self, group: &LogGroup) -> io::Result<()> {
        let created = group
            .creation_time
            .map(format_timestamp)
            .unwrap_or_else(|| "unknown".to_string());
        let label = self.paint("LogGroupName:", Color::Magenta);
        let created_label = self.paint("Created:", Color::Green);
        writeln!(self.out, "{} {}\n\t{} {}", label, group.name, created_label, created)
    }
}

impl<W: Write> EventSink for StdoutSink<W> {
    fn emit(&mut self, event: &LogEvent) -> io::Result<()> {
        if let Some(re) = &self.options.grep
            && !re.is_match(&event.message)
        {
            return Ok(());
        }

        if self.options.show_metadata() {
            return self.write_record("cloudtail-log-event", Color::Magenta, &EventRecord::from(event));
        }

        let time = self.paint(&format_timestamp(event.timestamp), Color::Magenta);
        writeln!(self.out, "{}: {}", time, event.message.trim())?;
        self.out.flush()
    }

    fn group_resolved(&mut self, group: &LogGroup) -> io::Result<()> {
        if !self.options.show_metadata() {
            return Ok(());
        }
        self.write_record("cloudtail-log-group", Color::Cyan, &GroupRecord::from(group))
    }

    fn stream_discovered(&mut self, stream: &LogStream) -> io::Result<()> {
        if !self.options.show_metadata() {
            return Ok(());
        }
        let header = format!("cloudtail-log-stream {}", stream.name);
        self.write_record(&header, get_color(&stream.name), &StreamRecord::from(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(options: OutputOptions, f: impl FnOnce(&mut StdoutSink<Vec<u8>>)) -> String {
        let mut sink = StdoutSink::new(Vec::new(), options);
        f(&mut sink);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn plain_line_trims_message() {
        let out = render(OutputOptions::default(), |sink| {
            sink.emit(&LogEvent::new(0, "  hello world \n")).unwrap();
        });
        assert!(out.ends_with(": hello world\n"), "got {:?}", out);
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn grep_filters_messages() {
        let options = OutputOptions {
            grep: Some(Regex::new("ERROR").unwrap()),
            ..Default::default()
        };
        let out = render(options, |sink| {
            sink.emit(&LogEvent::new(1, "INFO started")).unwrap();
            sink.emit(&LogEvent::new(2, "ERROR boom")).unwrap();
        });
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("ERROR boom"));
    }

    #[test]
    fn verbose_event_is_a_yaml_record() {
        let options = OutputOptions {
            verbose: true,
            ..Default::default()
        };
        let mut event = LogEvent::new(0, "raw message ");
        event.ingestion_time = Some(1000);
        let out = render(options, |sink| sink.emit(&event).unwrap());
        assert!(out.starts_with("cloudtail-log-event\n"));
        assert!(out.contains("1970-01-01T00:00:00+00:00"));
        assert!(out.contains("1970-01-01T00:00:01+00:00"));
        assert!(out.contains("raw message "));
    }

    #[test]
    fn hide_metadata_keeps_plain_lines_and_skips_streams() {
        let options = OutputOptions {
            verbose: true,
            hide_metadata: true,
            ..Default::default()
        };
        let out = render(options, |sink| {
            sink.group_resolved(&LogGroup::named("g")).unwrap();
            sink.stream_discovered(&LogStream::named("s")).unwrap();
            sink.emit(&LogEvent::new(0, "x")).unwrap();
        });
        assert_eq!(out.lines().count(), 1);
        assert!(out.ends_with(": x\n"));
    }

    #[test]
    fn verbose_metadata_records() {
        let options = OutputOptions {
            verbose: true,
            ..Default::default()
        };
        let mut group = LogGroup::named("/app/payments");
        group.retention_in_days = Some(14);
        let mut stream = LogStream::named("i-123");
        stream.last_event_timestamp = Some(0);
        let out = render(options, |sink| {
            sink.group_resolved(&group).unwrap();
            sink.stream_discovered(&stream).unwrap();
        });
        assert!(out.contains("cloudtail-log-group\nname: /app/payments\nretention_in_days: 14\n"));
        assert!(out.contains("cloudtail-log-stream i-123\nname: i-123\n"));
        assert!(out.contains("last_event_timestamp:"));
    }

    #[test]
    fn list_group_line() {
        let out = render(OutputOptions::default(), |sink| {
            sink.list_group(&LogGroup::named("/aws/lambda/fn")).unwrap();
        });
        assert_eq!(out, "LogGroupName: /aws/lambda/fn\n\tCreated: unknown\n");
    }
}
