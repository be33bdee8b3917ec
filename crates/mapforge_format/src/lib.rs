//! The line-oriented text map format
//!
//! One map per file: a tab-separated header line followed by one
//! tab-separated record per entity. See [`reader::parse_map`] and
//! [`writer::serialize_map`].

mod reader;
mod record;
mod writer;

pub use reader::{load_map, parse_map};
pub use record::{RecordReader, RecordWriter};
pub use writer::{save_map, serialize_map};

use mapforge_core::{MapError, ResourceError};
use thiserror::Error;

/// Failure to load or save a map file
#[derive(Debug, Error)]
pub enum FormatError {
    /// A malformed record; carries the 1-based line number
    #[error("line {line}: {cause}")]
    Parse { line: usize, cause: String },

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl FormatError {
    pub(crate) fn parse(line: usize, cause: impl ToString) -> Self {
        FormatError::Parse {
            line,
            cause: cause.to_string(),
        }
    }
}
