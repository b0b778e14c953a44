use std::io;

use image::ImageError;
use ndarray::ShapeError;
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Invalid summary tensor: {0}")]
    InvalidTensor(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    TomlDeserialization(#[from] toml::de::Error),
}
