//! # Errors
//!
//! Only failures that abort a run are represented here. Problems with single records are
//! [`RecordError`](crate::record::RecordError)s which callers count and skip.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Fatal errors of a layout, render or annotation run
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a specific file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a stream without a known path failed
    #[error(transparent)]
    Stream(#[from] std::io::Error),

    /// Walking the record directory failed
    #[error("cannot walk record directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A CSV input could not be read or the CSV output could not be written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Encoding or writing the output image failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Shorthand for results with the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Attaches a path to an `std::io::Error`
pub(crate) trait IoContext<T> {
    fn with_path<P: AsRef<Path>>(self, path: P) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn with_path<P: AsRef<Path>>(self, path: P) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Returns `Err(Error::InvalidConfig)` early when a condition fails
macro_rules! config_error_unless {
    ($cond : expr, $($info : tt)+) => {
        if !($cond) {
            return Err($crate::error::Error::InvalidConfig(format!($($info)+)));
        }
    };
}

pub(crate) use config_error_unless;
