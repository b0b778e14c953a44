use std::ffi::OsString;
use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use ndarray::{ArrayView3, ArrayView5};

use crate::config::SummaryWriterConfig;
use crate::encode::{encode_gif, encode_png, video_grid};
use crate::error::SummaryError;
use crate::event_writer::{wall_time, EventWriter, FlushPolicy};
use crate::pixel::Pixel;
use crate::proto::event::What;
use crate::proto::session_log::SessionStatus;
use crate::proto::summary::value::Value::{Image as ImageValue, SimpleValue};
use crate::proto::summary::{Image, Value};
use crate::proto::{SessionLog, Summary};

/// Distinguishes event files that are created in the same second.
static FILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// TensorBoard summary writer.
pub struct SummaryWriter<W> {
    writer: EventWriter<W>,
}

impl SummaryWriter<BufWriter<File>> {
    /// Construct a writer for a log directory.
    ///
    /// The directory is created if it does not exist. Within that
    /// directory, events are written to the file
    /// `events.out.tfevents.<timestamp>.<hostname>.<pid>.<n><suffix>`.
    pub fn from_log_dir(
        log_dir: impl AsRef<Path>,
        config: &SummaryWriterConfig,
    ) -> Result<Self, SummaryError> {
        let log_dir = log_dir.as_ref();
        create_dir_all(log_dir)?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let hostname = hostname::get()?;

        let mut file_name = OsString::from(format!("events.out.tfevents.{}.", timestamp));
        file_name.push(hostname);
        file_name.push(format!(
            ".{}.{}{}",
            process::id(),
            FILE_COUNTER.fetch_add(1, Ordering::Relaxed),
            config.filename_suffix
        ));

        let path = log_dir.join(file_name);
        log::debug!("Writing events to {}", path.display());

        SummaryWriter::new_with_config(BufWriter::new(File::create(path)?), config)
    }

    /// Construct a writer from a path prefix.
    ///
    /// For instance, a path such as `tensorboard/ppo/train` will create
    /// the directory `tensorboard/ppo` if it does not exist. Within that
    /// directory, it will write to the file
    /// `train.out.tfevents.<timestamp>.<hostname>`.
    pub fn from_prefix(path: impl Into<PathBuf>) -> Result<Self, SummaryError> {
        let path = path.into();

        if path.components().count() == 0 {
            return Err(io::Error::new(
                ErrorKind::NotFound,
                "summary prefix must not be empty".to_string(),
            )
            .into());
        }

        if let Some(dir) = path.parent() {
            create_dir_all(dir)?;
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_micros())
            .unwrap_or_default();
        let hostname = hostname::get()?;

        let mut path_string = path.into_os_string();
        path_string.push(format!(".out.tfevents.{}.", timestamp));
        path_string.push(hostname);

        SummaryWriter::new(BufWriter::new(File::create(path_string)?))
    }
}

impl<W> SummaryWriter<W>
where
    W: Write,
{
    /// Construct a writer from a `Write` type.
    pub fn new(write: W) -> Result<Self, SummaryError> {
        Self::new_with_config(write, &SummaryWriterConfig::default())
    }

    /// Construct a writer from a `Write` type with the given configuration.
    pub fn new_with_config(write: W, config: &SummaryWriterConfig) -> Result<Self, SummaryError> {
        Self::new_with_wall_time(write, config, wall_time())
    }

    /// Create a writer that uses the given wall time in the version record.
    fn new_with_wall_time(
        write: W,
        config: &SummaryWriterConfig,
        wall_time: f64,
    ) -> Result<Self, SummaryError> {
        let mut writer =
            EventWriter::new_with_wall_time(write, FlushPolicy::from(config), wall_time)?;

        if let Some(purge_step) = config.purge_step {
            writer.write_event_with_wall_time(
                wall_time,
                purge_step,
                What::SessionLog(SessionLog {
                    status: SessionStatus::Start as i32,
                    ..Default::default()
                }),
            )?;
            writer.flush()?;
        }

        Ok(SummaryWriter { writer })
    }

    fn write_value(
        &mut self,
        step: i64,
        tag: impl Into<String>,
        value: ValueKind,
    ) -> io::Result<()> {
        self.writer.write_event(step, summary_event(tag, value))
    }

    /// Write a scalar.
    pub fn write_scalar(
        &mut self,
        tag: impl Into<String>,
        step: i64,
        scalar: f32,
    ) -> Result<(), SummaryError> {
        Ok(self.write_value(step, tag, SimpleValue(scalar))?)
    }

    /// Write a scalar with the given wall time.
    #[cfg(test)]
    fn write_scalar_with_wall_time(
        &mut self,
        wall_time: f64,
        tag: impl Into<String>,
        step: i64,
        scalar: f32,
    ) -> Result<(), SummaryError> {
        Ok(self.writer.write_event_with_wall_time(
            wall_time,
            step,
            summary_event(tag, SimpleValue(scalar)),
        )?)
    }

    /// Write an image with shape (height, width, channels).
    ///
    /// The image must have 1 (grayscale), 3 (RGB), or 4 (RGBA) channels.
    pub fn write_image<T>(
        &mut self,
        tag: impl Into<String>,
        step: i64,
        image: ArrayView3<T>,
    ) -> Result<(), SummaryError>
    where
        T: Pixel,
    {
        let (height, width, channels) = image.dim();
        let png = encode_png(image)?;

        Ok(self.write_value(
            step,
            tag,
            ImageValue(Image {
                height: height as i32,
                width: width as i32,
                colorspace: channels as i32,
                encoded_image_string: png,
            }),
        )?)
    }

    /// Write a video with shape (batch, time, channels, height, width).
    ///
    /// Multiple videos in a batch are tiled into a grid. The video is
    /// stored as an animated GIF that is played at `fps` frames per
    /// second.
    pub fn write_video<T>(
        &mut self,
        tag: impl Into<String>,
        step: i64,
        video: ArrayView5<T>,
        fps: u32,
    ) -> Result<(), SummaryError>
    where
        T: Pixel,
    {
        let frames = video_grid(video)?;
        let (_, height, width, channels) = frames.dim();
        let gif = encode_gif(frames.view(), fps)?;

        Ok(self.write_value(
            step,
            tag,
            ImageValue(Image {
                height: height as i32,
                width: width as i32,
                colorspace: channels as i32,
                encoded_image_string: gif,
            }),
        )?)
    }

    /// Flush pending events.
    pub fn flush(&mut self) -> Result<(), SummaryError> {
        Ok(self.writer.flush()?)
    }

    /// Flush pending events before the writer is released.
    pub fn close(&mut self) -> Result<(), SummaryError> {
        self.flush()
    }
}

type ValueKind = crate::proto::summary::value::Value;

fn summary_event(tag: impl Into<String>, value: ValueKind) -> What {
    What::Summary(Summary {
        value: vec![Value {
            node_name: "".to_string(),
            tag: tag.into(),
            value: Some(value),
        }],
    })
}
