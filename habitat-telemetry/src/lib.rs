//! Telemetry for training runs
//!
//! [`TelemetryWriter`] wraps a summary sink that only exists when a log
//! directory was configured. Without a sink every operation is a no-op,
//! so training loops can log unconditionally.

mod sink;
pub use sink::{OpenSink, TelemetrySink};

mod writer;
pub use writer::{TelemetryWriter, DEFAULT_VIDEO_FPS};

pub use habitat_summary::{Pixel, SummaryError, SummaryWriter, SummaryWriterConfig, TomlRead};
