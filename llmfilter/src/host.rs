//! Newline-delimited JSON host.
//!
//! Drives an [`LlmFilter`] over a line stream. Each line is either a record
//! object or a `[tag, timestamp, record]` event; anything else is written
//! back untouched so a malformed line never stops the stream.

use crate::{Event, FilterStatus, LlmFilter, OutcomeKind, Record};
use futures::StreamExt;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_stream::wrappers::LinesStream;

/// Per-run counters, logged when the input ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HostStats {
    pub lines: u64,
    pub passed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub malformed: u64,
}

impl HostStats {
    fn record(&mut self, status: Option<FilterStatus>) {
        self.lines += 1;
        match status {
            None => self.malformed += 1,
            Some(FilterStatus::Unmodified) => self.passed += 1,
            Some(FilterStatus::Modified(OutcomeKind::Success)) => self.succeeded += 1,
            Some(FilterStatus::Modified(OutcomeKind::DomainError)) => self.failed += 1,
            Some(FilterStatus::Modified(OutcomeKind::Timeout)) => self.timed_out += 1,
        }
    }
}

/// Process one input line. Returns the output line and the filter status,
/// or `None` as status when the line was not a record.
pub async fn process_line(filter: &LlmFilter, line: &str) -> (String, Option<FilterStatus>) {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "skipping line that is not JSON");
            return (line.to_string(), None);
        }
    };

    match value {
        Value::Object(mut record) => {
            let status = filter.filter(&mut record).await;
            (Value::Object(record).to_string(), Some(status))
        }
        Value::Array(items) => match into_event(items) {
            Ok(event) => {
                let (status, event) = filter.filter_event(event).await;
                (event_to_line(event), Some(status))
            }
            Err(_) => {
                tracing::warn!("skipping array line that is not a [tag, timestamp, record] event");
                (line.to_string(), None)
            }
        },
        _ => {
            tracing::warn!("skipping line that is neither a record nor an event");
            (line.to_string(), None)
        }
    }
}

fn into_event(items: Vec<Value>) -> Result<Event, Vec<Value>> {
    let [tag, timestamp, record]: [Value; 3] = items.try_into()?;
    match (tag, record) {
        (Value::String(tag), Value::Object(record)) => Ok(Event::new(tag, timestamp, record)),
        (tag, record) => Err(vec![tag, timestamp, record]),
    }
}

fn event_to_line(event: Event) -> String {
    Value::Array(vec![
        Value::String(event.tag),
        event.timestamp,
        Value::Object(event.record),
    ])
    .to_string()
}

/// Run the filter over every line of `reader`, writing results to `writer`.
///
/// Up to `concurrency` records are in flight at once; output keeps input
/// order. Blank lines are dropped. Only I/O errors end the run early.
pub async fn run<R, W>(
    filter: &LlmFilter,
    reader: R,
    mut writer: W,
    concurrency: usize,
) -> std::io::Result<HostStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = HostStats::default();
    let mut results = LinesStream::new(reader.lines())
        .map(|line| async move {
            let line = line?;
            if line.trim().is_empty() {
                return Ok(None);
            }
            Ok::<_, std::io::Error>(Some(process_line(filter, &line).await))
        })
        .buffered(concurrency.max(1));

    while let Some(result) = results.next().await {
        let Some((out, status)) = result? else {
            continue;
        };
        stats.record(status);
        writer.write_all(out.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    tracing::info!(
        lines = stats.lines,
        passed = stats.passed,
        succeeded = stats.succeeded,
        failed = stats.failed,
        timed_out = stats.timed_out,
        malformed = stats.malformed,
        "input exhausted"
    );

    Ok(stats)
}

/// Parse `key=value` pairs into a settings bag.
pub fn parse_properties(properties: &[String]) -> Result<Vec<(String, String)>, String> {
    properties
        .iter()
        .map(|p| match p.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
            _ => Err(format!("expected key=value, got '{p}'")),
        })
        .collect()
}

/// Convenience for tests and embedders: filter a single record value.
pub async fn filter_record(filter: &LlmFilter, mut record: Record) -> (FilterStatus, Record) {
    let status = filter.filter(&mut record).await;
    (status, record)
}
