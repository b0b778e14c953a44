use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use habitat_telemetry::DEFAULT_VIDEO_FPS;
use image::RgbImage;
use ndarray::Array3;

use crate::telemetry::{LogDirOption, TelemetrySettings};
use crate::traits::{TelemetryApp, TelemetryOption};

const FPS: &str = "FPS";
const FRAMES: &str = "FRAMES";
const NAME: &str = "NAME";
const STEP: &str = "STEP";

pub struct VideoApp {
    fps: u32,
    frames: Vec<String>,
    name: String,
    step: i64,
    telemetry: TelemetrySettings,
}

/// Convert an image to an array with shape (height, width, 3).
fn rgb_to_array(image: RgbImage) -> Result<Array3<u8>> {
    let (width, height) = image.dimensions();
    Array3::from_shape_vec((height as usize, width as usize, 3), image.into_raw())
        .context("Cannot convert image to array")
}

fn load_frame(path: &str) -> Result<Array3<u8>> {
    let image = image::open(path).context(format!("Cannot read frame: {}", path))?;
    rgb_to_array(image.to_rgb8())
}

impl TelemetryApp for VideoApp {
    fn app() -> Command {
        let app = Command::new("video")
            .arg_required_else_help(true)
            .about("Log a sequence of images as a video")
            .arg(
                Arg::new(NAME)
                    .help("Video name")
                    .index(1)
                    .required(true),
            )
            .arg(
                Arg::new(FRAMES)
                    .help("Frames in playback order, all with the same size")
                    .index(2)
                    .action(ArgAction::Append)
                    .num_args(1..)
                    .required(true),
            )
            .arg(
                Arg::new(FPS)
                    .long("fps")
                    .value_name("N")
                    .value_parser(value_parser!(u32))
                    .help("Playback frame rate (default: 10)"),
            )
            .arg(
                Arg::new(STEP)
                    .long("step")
                    .value_name("N")
                    .value_parser(value_parser!(i64))
                    .allow_negative_numbers(true)
                    .help("Training step of the video (default: 0)"),
            );

        LogDirOption::add_to_app(app)
    }

    fn parse(matches: &ArgMatches) -> Result<Self> {
        let name = matches.get_one::<String>(NAME).unwrap().clone();
        let frames = matches
            .get_many::<String>(FRAMES)
            .unwrap()
            .cloned()
            .collect();
        let fps = matches
            .get_one::<u32>(FPS)
            .copied()
            .unwrap_or(DEFAULT_VIDEO_FPS);
        let step = matches.get_one::<i64>(STEP).copied().unwrap_or(0);
        let telemetry = LogDirOption::parse(matches)?;

        Ok(VideoApp {
            fps,
            frames,
            name,
            step,
            telemetry,
        })
    }

    fn run(&self) -> Result<()> {
        let frames = self
            .frames
            .iter()
            .map(|path| load_frame(path))
            .collect::<Result<Vec<_>>>()?;

        self.telemetry.open()?.scoped(|writer| -> Result<()> {
            writer
                .add_video_from_images(&self.name, self.step, &frames, self.fps)
                .context(format!("Cannot write video {}", self.name))
        })?;

        log::info!(
            "Read video {} with {} frames at step {}",
            self.name,
            frames.len(),
            self.step
        );

        Ok(())
    }
}
