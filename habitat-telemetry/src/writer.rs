use std::path::Path;

use habitat_summary::{Pixel, SummaryError};
use ndarray::{concatenate, ArrayBase, ArrayView3, ArrayView5, Axis, Data, Ix3};

use crate::sink::{OpenSink, TelemetrySink};

/// Frame rate of videos logged with `add_video_from_images_default_fps`.
pub const DEFAULT_VIDEO_FPS: u32 = 10;

/// Telemetry writer that is either active or inert.
///
/// An active writer owns a sink and delegates every operation to it.
/// An inert writer has no sink, every operation succeeds without any
/// effect. The mode is fixed at construction.
///
/// The sink is closed when the writer is dropped, closed explicitly
/// with [`TelemetryWriter::close`], or when a [`TelemetryWriter::scoped`]
/// block ends.
pub struct TelemetryWriter<S>
where
    S: TelemetrySink,
{
    writer: Option<S>,
}

impl<S> TelemetryWriter<S>
where
    S: OpenSink,
{
    /// Construct a writer for a log directory.
    ///
    /// A sink is only opened when `log_dir` is not empty. Otherwise, the
    /// writer is inert. `config` is passed to the sink unchanged.
    pub fn new(log_dir: impl AsRef<Path>, config: S::Config) -> Result<Self, SummaryError> {
        let log_dir = log_dir.as_ref();

        if log_dir.as_os_str().is_empty() {
            log::debug!("Log directory is empty, telemetry is disabled");
            return Ok(Self::inert());
        }

        let sink = S::open(log_dir, config)?;
        log::debug!("Writing telemetry to {}", log_dir.display());

        Ok(Self::from_sink(sink))
    }

    /// Construct a writer for an optional log directory.
    ///
    /// The writer is inert when `log_dir` is absent or empty.
    pub fn from_option<P>(log_dir: Option<P>, config: S::Config) -> Result<Self, SummaryError>
    where
        P: AsRef<Path>,
    {
        match log_dir {
            Some(log_dir) => Self::new(log_dir, config),
            None => {
                log::debug!("No log directory, telemetry is disabled");
                Ok(Self::inert())
            }
        }
    }
}

impl<S> TelemetryWriter<S>
where
    S: TelemetrySink,
{
    /// Construct a writer without a sink.
    pub fn inert() -> Self {
        TelemetryWriter { writer: None }
    }

    /// Construct an active writer from an opened sink.
    pub fn from_sink(sink: S) -> Self {
        TelemetryWriter { writer: Some(sink) }
    }

    /// Returns `true` if the writer has a sink.
    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    /// Get the sink, `None` if the writer is inert.
    pub fn sink(&self) -> Option<&S> {
        self.writer.as_ref()
    }

    /// Get the sink mutably, `None` if the writer is inert.
    pub fn sink_mut(&mut self) -> Option<&mut S> {
        self.writer.as_mut()
    }

    pub fn write_scalar(&mut self, tag: &str, step: i64, value: f32) -> Result<(), SummaryError> {
        match self.writer.as_mut() {
            Some(sink) => sink.write_scalar(tag, step, value),
            None => Ok(()),
        }
    }

    pub fn write_image<T>(
        &mut self,
        tag: &str,
        step: i64,
        image: ArrayView3<T>,
    ) -> Result<(), SummaryError>
    where
        T: Pixel,
    {
        match self.writer.as_mut() {
            Some(sink) => sink.write_image(tag, step, image),
            None => Ok(()),
        }
    }

    pub fn write_video<T>(
        &mut self,
        tag: &str,
        step: i64,
        video: ArrayView5<T>,
        fps: u32,
    ) -> Result<(), SummaryError>
    where
        T: Pixel,
    {
        match self.writer.as_mut() {
            Some(sink) => sink.write_video(tag, step, video, fps),
            None => Ok(()),
        }
    }

    /// Log a sequence of frames as a video.
    ///
    /// Every frame has shape (height, width, channels) and all frames
    /// must have the same shape. The frames are stacked into a video
    /// with shape (1, frames, channels, height, width) before they are
    /// passed to the sink.
    ///
    /// On an inert writer, this is a no-op, even for frames that could
    /// not be stacked.
    pub fn add_video_from_images<T, D>(
        &mut self,
        video_name: &str,
        step_idx: i64,
        images: &[ArrayBase<D, Ix3>],
        fps: u32,
    ) -> Result<(), SummaryError>
    where
        T: Pixel,
        D: Data<Elem = T>,
    {
        let sink = match self.writer.as_mut() {
            Some(sink) => sink,
            None => return Ok(()),
        };

        let frames: Vec<_> = images
            .iter()
            .map(|image| image.view().insert_axis(Axis(0)))
            .collect();

        // Fails on frames with different shapes, before anything is written.
        let frames = concatenate(Axis(0), &frames)?;
        let video = frames.permuted_axes([0, 3, 1, 2]).insert_axis(Axis(0));

        sink.write_video(video_name, step_idx, video.view(), fps)
    }

    /// Log a sequence of frames as a video at `DEFAULT_VIDEO_FPS`.
    pub fn add_video_from_images_default_fps<T, D>(
        &mut self,
        video_name: &str,
        step_idx: i64,
        images: &[ArrayBase<D, Ix3>],
    ) -> Result<(), SummaryError>
    where
        T: Pixel,
        D: Data<Elem = T>,
    {
        self.add_video_from_images(video_name, step_idx, images, DEFAULT_VIDEO_FPS)
    }

    pub fn flush(&mut self) -> Result<(), SummaryError> {
        match self.writer.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }

    /// Close the sink.
    pub fn close(mut self) -> Result<(), SummaryError> {
        self.close_sink()
    }

    /// Run `f` with this writer and close the sink afterwards.
    ///
    /// The sink is closed regardless of whether `f` fails. An error
    /// returned by `f` takes precedence over an error from closing.
    pub fn scoped<F, R, E>(mut self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Self) -> Result<R, E>,
        E: From<SummaryError>,
    {
        let result = f(&mut self);
        let closed = self.close_sink();

        match result {
            Ok(value) => {
                closed?;
                Ok(value)
            }
            Err(err) => {
                if let Err(close_err) = closed {
                    log::warn!("Cannot close telemetry sink: {}", close_err);
                }
                Err(err)
            }
        }
    }

    fn close_sink(&mut self) -> Result<(), SummaryError> {
        match self.writer.take() {
            Some(mut sink) => sink.close(),
            None => Ok(()),
        }
    }
}

impl<S> Drop for TelemetryWriter<S>
where
    S: TelemetrySink,
{
    fn drop(&mut self) {
        if let Err(err) = self.close_sink() {
            log::warn!("Cannot close telemetry sink: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs::{self, File};
    use std::io::{self, BufWriter};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::path::Path;
    use std::rc::Rc;

    use habitat_summary::{Pixel, SummaryError, SummaryWriter, SummaryWriterConfig};
    use ndarray::{Array3, ArrayView3, ArrayView5};

    use super::{TelemetryWriter, DEFAULT_VIDEO_FPS};
    use crate::sink::{OpenSink, TelemetrySink};

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Open(String),
        Scalar(String, i64, f32),
        Image(String, i64, Vec<usize>),
        Video {
            tag: String,
            step: i64,
            shape: Vec<usize>,
            fps: u32,
            first: u8,
        },
        Flush,
        Close,
    }

    type CallLog = Rc<RefCell<Vec<Call>>>;

    struct RecordingSink {
        calls: CallLog,
        fail_close: bool,
    }

    impl RecordingSink {
        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl TelemetrySink for RecordingSink {
        fn write_scalar(&mut self, tag: &str, step: i64, value: f32) -> Result<(), SummaryError> {
            self.record(Call::Scalar(tag.to_string(), step, value));
            Ok(())
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
            self.record(Call::Image(tag.to_string(), step, image.shape().to_vec()));
            Ok(())
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
            self.record(Call::Video {
                tag: tag.to_string(),
                step,
                shape: video.shape().to_vec(),
                fps,
                first: video[[0, 0, 0, 0, 0]].to_u8(),
            });
            Ok(())
        }

        fn flush(&mut self) -> Result<(), SummaryError> {
            self.record(Call::Flush);
            Ok(())
        }

        fn close(&mut self) -> Result<(), SummaryError> {
            self.record(Call::Close);
            if self.fail_close {
                Err(io::Error::new(io::ErrorKind::Other, "close failed").into())
            } else {
                Ok(())
            }
        }
    }

    impl OpenSink for RecordingSink {
        type Config = CallLog;

        fn open(log_dir: &Path, calls: Self::Config) -> Result<Self, SummaryError> {
            calls
                .borrow_mut()
                .push(Call::Open(log_dir.to_string_lossy().into_owned()));
            Ok(RecordingSink {
                calls,
                fail_close: false,
            })
        }
    }

    fn frames(n: usize, shape: (usize, usize, usize)) -> Vec<Array3<u8>> {
        (0..n).map(|i| Array3::from_elem(shape, i as u8)).collect()
    }

    fn closes(calls: &CallLog) -> usize {
        calls
            .borrow()
            .iter()
            .filter(|call| **call == Call::Close)
            .count()
    }

    #[test]
    fn empty_log_dir_is_inert() {
        let calls = CallLog::default();
        {
            let mut writer = TelemetryWriter::<RecordingSink>::new("", calls.clone()).unwrap();
            assert!(!writer.is_active());
            assert!(writer.sink().is_none());

            writer.write_scalar("reward", 1, 0.5).unwrap();
            writer
                .write_image("rgb", 1, Array3::<u8>::zeros((2, 2, 3)).view())
                .unwrap();
            writer
                .add_video_from_images("rollout", 1, &frames(2, (4, 5, 3)), 10)
                .unwrap();
            writer.flush().unwrap();
        }

        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn absent_log_dir_is_inert() {
        let calls = CallLog::default();
        let writer =
            TelemetryWriter::<RecordingSink>::from_option(None::<&str>, calls.clone()).unwrap();
        assert!(!writer.is_active());
        writer.close().unwrap();

        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn log_dir_opens_sink_with_config() {
        let calls = CallLog::default();
        let mut writer =
            TelemetryWriter::<RecordingSink>::from_option(Some("runs/ppo"), calls.clone()).unwrap();
        assert!(writer.is_active());

        writer.write_scalar("reward", 3, 1.5).unwrap();
        writer
            .write_image("depth", 3, Array3::<f32>::zeros((6, 8, 1)).view())
            .unwrap();
        writer.flush().unwrap();

        assert_eq!(
            *calls.borrow(),
            vec![
                Call::Open("runs/ppo".to_string()),
                Call::Scalar("reward".to_string(), 3, 1.5),
                Call::Image("depth".to_string(), 3, vec![6, 8, 1]),
                Call::Flush,
            ]
        );
    }

    #[test]
    fn drop_closes_active_sink_once() {
        let calls = CallLog::default();
        let writer = TelemetryWriter::<RecordingSink>::new("runs", calls.clone()).unwrap();
        drop(writer);
        assert_eq!(closes(&calls), 1);
    }

    #[test]
    fn explicit_close_is_not_repeated_on_drop() {
        let calls = CallLog::default();
        let writer = TelemetryWriter::<RecordingSink>::new("runs", calls.clone()).unwrap();
        writer.close().unwrap();
        assert_eq!(closes(&calls), 1);
    }

    #[test]
    fn scoped_closes_after_success() {
        let calls = CallLog::default();
        let writer = TelemetryWriter::<RecordingSink>::new("runs", calls.clone()).unwrap();

        let steps = writer
            .scoped(|writer| -> Result<_, SummaryError> {
                writer.write_scalar("loss", 1, 0.25)?;
                Ok(1)
            })
            .unwrap();

        assert_eq!(steps, 1);
        assert_eq!(calls.borrow().last(), Some(&Call::Close));
        assert_eq!(closes(&calls), 1);
    }

    #[test]
    fn scoped_closes_after_error() {
        let calls = CallLog::default();
        let writer = TelemetryWriter::<RecordingSink>::new("runs", calls.clone()).unwrap();

        let result = writer.scoped(|writer| -> Result<(), SummaryError> {
            writer.write_scalar("loss", 1, 0.25)?;
            Err(SummaryError::InvalidTensor("diverged".to_string()))
        });

        assert!(matches!(result, Err(SummaryError::InvalidTensor(_))));
        assert_eq!(closes(&calls), 1);
    }

    #[test]
    fn scoped_closes_after_panic() {
        let calls = CallLog::default();
        let writer = TelemetryWriter::<RecordingSink>::new("runs", calls.clone()).unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| {
            writer.scoped(|_| -> Result<(), SummaryError> { panic!("environment crashed") })
        }));

        assert!(result.is_err());
        assert_eq!(closes(&calls), 1);
    }

    #[test]
    fn scoped_reports_close_error() {
        let calls = CallLog::default();
        let mut writer = TelemetryWriter::<RecordingSink>::new("runs", calls.clone()).unwrap();
        writer.sink_mut().unwrap().fail_close = true;

        let result = writer.scoped(|_| -> Result<(), SummaryError> { Ok(()) });

        assert!(matches!(result, Err(SummaryError::Io(_))));
        assert_eq!(closes(&calls), 1);
    }

    #[test]
    fn scoped_inert_writer_never_closes() {
        let calls = CallLog::default();
        let writer = TelemetryWriter::<RecordingSink>::new("", calls.clone()).unwrap();

        writer
            .scoped(|writer| -> Result<(), SummaryError> { writer.write_scalar("loss", 1, 0.) })
            .unwrap();

        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn frames_are_stacked_into_video() {
        let calls = CallLog::default();
        let mut writer = TelemetryWriter::<RecordingSink>::new("runs", calls.clone()).unwrap();

        writer
            .add_video_from_images("episode=3", 120, &frames(3, (4, 5, 3)), 30)
            .unwrap();

        assert_eq!(
            calls.borrow()[1],
            Call::Video {
                tag: "episode=3".to_string(),
                step: 120,
                shape: vec![1, 3, 3, 4, 5],
                fps: 30,
                first: 0,
            }
        );
    }

    #[test]
    fn frames_keep_their_order() {
        let calls = CallLog::default();
        let mut writer = TelemetryWriter::<RecordingSink>::new("runs", calls.clone()).unwrap();

        let mut images = frames(2, (2, 2, 3));
        images.reverse();
        writer
            .add_video_from_images_default_fps("rollout", 0, &images)
            .unwrap();

        match &calls.borrow()[1] {
            Call::Video { fps, first, .. } => {
                assert_eq!(*fps, DEFAULT_VIDEO_FPS);
                assert_eq!(*first, 1);
            }
            call => panic!("expected video, got {:?}", call),
        };
    }

    #[test]
    fn mismatched_frames_are_not_written() {
        let calls = CallLog::default();
        let mut writer = TelemetryWriter::<RecordingSink>::new("runs", calls.clone()).unwrap();

        let images = vec![Array3::<u8>::zeros((4, 5, 3)), Array3::<u8>::zeros((4, 6, 3))];
        let result = writer.add_video_from_images("rollout", 0, &images, 10);

        assert!(matches!(result, Err(SummaryError::Shape(_))));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn no_frames_is_an_error() {
        let calls = CallLog::default();
        let mut writer = TelemetryWriter::<RecordingSink>::new("runs", calls.clone()).unwrap();

        let images: Vec<Array3<u8>> = Vec::new();
        assert!(matches!(
            writer.add_video_from_images("rollout", 0, &images, 10),
            Err(SummaryError::Shape(_))
        ));
    }

    #[test]
    fn writes_event_file_to_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("tb");

        let writer = TelemetryWriter::<SummaryWriter<BufWriter<File>>>::new(
            &log_dir,
            SummaryWriterConfig::default(),
        )
        .unwrap();
        assert!(writer.is_active());

        writer
            .scoped(|writer| -> Result<(), SummaryError> {
                writer.write_scalar("reward", 0, 1.)?;
                writer.add_video_from_images("rollout", 0, &frames(3, (4, 5, 3)), 10)
            })
            .unwrap();

        let entries: Vec<_> = fs::read_dir(&log_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let metadata = entries[0].as_ref().unwrap().metadata().unwrap();
        assert!(metadata.len() > 0);
    }
}
