use std::io::{self, Write};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use prost::Message;

use crate::config::SummaryWriterConfig;
use crate::proto::event::What;
use crate::proto::Event;
use crate::record_writer::RecordWriter;

/// When pending events are flushed to the underlying writer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FlushPolicy {
    max_queue: usize,
    interval: Duration,
}

impl From<&SummaryWriterConfig> for FlushPolicy {
    fn from(config: &SummaryWriterConfig) -> Self {
        FlushPolicy {
            max_queue: config.max_queue,
            interval: Duration::from_secs(config.flush_secs),
        }
    }
}

pub struct EventWriter<W> {
    writer: RecordWriter<W>,
    policy: FlushPolicy,
    pending: usize,
    last_flush: Instant,
}

pub fn wall_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

impl<W> EventWriter<W>
where
    W: Write,
{
    pub fn new_with_wall_time(write: W, policy: FlushPolicy, wall_time: f64) -> io::Result<Self> {
        let mut writer = EventWriter {
            writer: RecordWriter::from(write),
            policy,
            pending: 0,
            last_flush: Instant::now(),
        };

        writer.write_event_with_wall_time(
            wall_time,
            0,
            What::FileVersion("brain.Event:2".to_string()),
        )?;
        writer.flush()?;

        Ok(writer)
    }

    pub fn write_event(&mut self, step: i64, what: What) -> io::Result<()> {
        self.write_event_with_wall_time(wall_time(), step, what)
    }

    pub fn write_event_with_wall_time(
        &mut self,
        wall_time: f64,
        step: i64,
        what: What,
    ) -> io::Result<()> {
        let event = Event {
            wall_time,
            step,
            what: Some(what),
        };

        let mut event_bytes = Vec::with_capacity(event.encoded_len());
        event.encode(&mut event_bytes)?;

        self.writer.write_record(&event_bytes)?;
        self.pending += 1;

        if self.pending >= self.policy.max_queue
            || self.last_flush.elapsed() >= self.policy.interval
        {
            self.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.pending = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.pending
    }
}
