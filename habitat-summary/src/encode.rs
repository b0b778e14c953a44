use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::png::PngEncoder;
use image::{ColorType, Delay, Frame, ImageEncoder, RgbaImage};
use ndarray::{s, Array4, ArrayView3, ArrayView4, ArrayView5, Axis};

use crate::error::SummaryError;
use crate::pixel::Pixel;

/// Shortest frame delay in centiseconds that GIF viewers honour. Shorter
/// delays are played back at the viewer's default speed.
const MIN_FRAME_DELAY_CS: u32 = 2;

/// GIF frame delay for the given frame rate.
///
/// GIF stores delays in centiseconds, so the delay is rounded to the
/// nearest centisecond and frame rates above 50 are capped at 50.
fn frame_delay(fps: u32) -> Delay {
    let centiseconds = ((100 + fps / 2) / fps).max(MIN_FRAME_DELAY_CS);
    Delay::from_numer_denom_ms(centiseconds * 10, 1)
}

fn check_channels(channels: usize) -> Result<(), SummaryError> {
    match channels {
        1 | 3 | 4 => Ok(()),
        n => Err(SummaryError::InvalidTensor(format!(
            "expected 1, 3, or 4 channels, got {}",
            n
        ))),
    }
}

fn checked_dim(dim: usize, name: &str) -> Result<u32, SummaryError> {
    if dim == 0 || dim > u16::MAX as usize {
        return Err(SummaryError::InvalidTensor(format!(
            "{} must be in [1, {}], got {}",
            name,
            u16::MAX,
            dim
        )));
    }

    Ok(dim as u32)
}

/// Encode an image with shape (height, width, channels) as PNG.
pub(crate) fn encode_png<T>(image: ArrayView3<T>) -> Result<Vec<u8>, SummaryError>
where
    T: Pixel,
{
    let (height, width, channels) = image.dim();
    check_channels(channels)?;
    let height = checked_dim(height, "image height")?;
    let width = checked_dim(width, "image width")?;

    let color_type = match channels {
        1 => ColorType::L8,
        3 => ColorType::Rgb8,
        _ => ColorType::Rgba8,
    };

    // Iteration is in logical order, regardless of the memory layout.
    let raw: Vec<u8> = image.iter().map(|&v| v.to_u8()).collect();

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&raw, width, height, color_type)?;

    Ok(png)
}

/// Tile a batch of videos into a single video.
///
/// The input has shape (batch, time, channels, height, width). The batch
/// is padded with black clips to the next power of two and laid out in a
/// grid of `2^(log2(batch) / 2)` rows. The result has shape
/// (time, rows * height, cols * width, channels).
pub(crate) fn video_grid<T>(video: ArrayView5<T>) -> Result<Array4<u8>, SummaryError>
where
    T: Pixel,
{
    let (batch, time, channels, height, width) = video.dim();
    check_channels(channels)?;
    if batch == 0 || time == 0 || height == 0 || width == 0 {
        return Err(SummaryError::InvalidTensor(format!(
            "video must not have empty dimensions, shape: {:?}",
            video.shape()
        )));
    }

    let padded = batch.next_power_of_two();
    let n_rows = 1 << (padded.trailing_zeros() / 2);
    let n_cols = padded / n_rows;

    let mut grid = Array4::zeros((time, n_rows * height, n_cols * width, channels));
    for (idx, clip) in video.outer_iter().enumerate() {
        let (row, col) = (idx / n_cols, idx % n_cols);
        let clip = clip.permuted_axes([0, 2, 3, 1]);
        grid.slice_mut(s![
            ..,
            row * height..(row + 1) * height,
            col * width..(col + 1) * width,
            ..
        ])
        .zip_mut_with(&clip, |out, &v| *out = v.to_u8());
    }

    Ok(grid)
}

fn frame_to_rgba(frame: ArrayView3<u8>) -> Result<RgbaImage, SummaryError> {
    let (height, width, _) = frame.dim();

    let mut raw = Vec::with_capacity(height * width * 4);
    for pixel in frame.lanes(Axis(2)) {
        match pixel.len() {
            1 => raw.extend_from_slice(&[pixel[0], pixel[0], pixel[0], u8::MAX]),
            3 => raw.extend_from_slice(&[pixel[0], pixel[1], pixel[2], u8::MAX]),
            4 => raw.extend_from_slice(&[pixel[0], pixel[1], pixel[2], pixel[3]]),
            n => check_channels(n)?,
        }
    }

    RgbaImage::from_raw(width as u32, height as u32, raw).ok_or_else(|| {
        SummaryError::InvalidTensor("frame buffer does not match frame size".to_string())
    })
}

/// Encode frames with shape (time, height, width, channels) as a looping
/// animated GIF.
pub(crate) fn encode_gif(frames: ArrayView4<u8>, fps: u32) -> Result<Vec<u8>, SummaryError> {
    if fps == 0 {
        return Err(SummaryError::InvalidTensor(
            "frame rate must be positive".to_string(),
        ));
    }

    let (_, height, width, channels) = frames.dim();
    check_channels(channels)?;
    checked_dim(height, "video height")?;
    checked_dim(width, "video width")?;

    let delay = frame_delay(fps);

    let mut gif = Vec::new();
    {
        // The trailer is written when the encoder is dropped.
        let mut encoder = GifEncoder::new(&mut gif);
        encoder.set_repeat(Repeat::Infinite)?;
        for frame in frames.outer_iter() {
            encoder.encode_frame(Frame::from_parts(frame_to_rgba(frame)?, 0, 0, delay))?;
        }
    }

    Ok(gif)
}
