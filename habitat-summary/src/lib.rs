//! TensorBoard summary writer
//!
//! This crate implements just enough of the TensorFlow event file format
//! to log scalars, images, and videos for TensorBoard. Records are framed
//! as TFRecords and each record holds one `Event` protocol buffer.

mod config;
pub use config::{SummaryWriterConfig, TomlRead};

mod crc32;

mod error;
pub use error::SummaryError;

pub(crate) mod event_writer;

mod encode;

mod pixel;
pub use pixel::Pixel;

pub(crate) mod proto;

pub(crate) mod record_writer;

mod summary_writer;
pub use summary_writer::SummaryWriter;
