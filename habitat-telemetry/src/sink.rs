use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use habitat_summary::{Pixel, SummaryError, SummaryWriter, SummaryWriterConfig};
use ndarray::{ArrayView3, ArrayView5};

/// Operations of a telemetry backend.
pub trait TelemetrySink {
    /// Write a scalar.
    fn write_scalar(&mut self, tag: &str, step: i64, value: f32) -> Result<(), SummaryError>;

    /// Write an image with shape (height, width, channels).
    fn write_image<T>(
        &mut self,
        tag: &str,
        step: i64,
        image: ArrayView3<T>,
    ) -> Result<(), SummaryError>
    where
        T: Pixel;

    /// Write a video with shape (batch, time, channels, height, width).
    fn write_video<T>(
        &mut self,
        tag: &str,
        step: i64,
        video: ArrayView5<T>,
        fps: u32,
    ) -> Result<(), SummaryError>
    where
        T: Pixel;

    fn flush(&mut self) -> Result<(), SummaryError>;

    /// Release the backend. Called at most once.
    fn close(&mut self) -> Result<(), SummaryError>;
}

/// Backends that can be opened for a log directory.
pub trait OpenSink: TelemetrySink + Sized {
    /// Backend configuration, passed to `open` as-is.
    type Config;

    fn open(log_dir: &Path, config: Self::Config) -> Result<Self, SummaryError>;
}

impl<W> TelemetrySink for SummaryWriter<W>
where
    W: Write,
{
    fn write_scalar(&mut self, tag: &str, step: i64, value: f32) -> Result<(), SummaryError> {
        SummaryWriter::write_scalar(self, tag, step, value)
    }

    fn write_image<T>(
        &mut self,
        tag: &str,
        step: i64,
        image: ArrayView3<T>,
    ) -> Result<(), SummaryError>
    where
        T: Pixel,
    {
        SummaryWriter::write_image(self, tag, step, image)
    }

    fn write_video<T>(
        &mut self,
        tag: &str,
        step: i64,
        video: ArrayView5<T>,
        fps: u32,
    ) -> Result<(), SummaryError>
    where
        T: Pixel,
    {
        SummaryWriter::write_video(self, tag, step, video, fps)
    }

    fn flush(&mut self) -> Result<(), SummaryError> {
        SummaryWriter::flush(self)
    }

    fn close(&mut self) -> Result<(), SummaryError> {
        SummaryWriter::close(self)
    }
}

impl OpenSink for SummaryWriter<BufWriter<File>> {
    type Config = SummaryWriterConfig;

    fn open(log_dir: &Path, config: Self::Config) -> Result<Self, SummaryError> {
        SummaryWriter::from_log_dir(log_dir, &config)
    }
}
