use image::ImageError;
use thiserror::Error;
use toml::de::Error as TomlError;

use std::io::Error as IOError;
use std::path::PathBuf;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct PlateError(PlateErrorKind);

#[derive(Debug, Error)]
pub enum PlateErrorKind {
    #[error("image not found: {}", .path.display())]
    ImageNotFound {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("image is empty")]
    EmptyImage,
    #[error(transparent)]
    ImageError(#[from] ImageError),
    #[error(transparent)]
    IOError(#[from] IOError),
    #[error("failed to parse config: {0}")]
    ConfigError(#[from] TomlError),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("failed to initialize OCR engine: {0}")]
    OcrInitError(String),
    #[error("OCR failed: {0}")]
    OcrError(String),
}

impl PlateError {
    pub fn kind(&self) -> &PlateErrorKind {
        &self.0
    }
}

impl<T> From<T> for PlateError
where T: Into<PlateErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}
