use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot build a tree from an empty dataset")]
    EmptyDataset,

    #[error("input has {dimension} features but the tree tests feature {index}")]
    InconsistentDimension { index: usize, dimension: usize },

    #[error("{actual} column types were given for {expected} features")]
    ColumnTypeMismatch { expected: usize, actual: usize },

    #[error("malformed tree stream: {0}")]
    SerializationFormat(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Classifies an I/O error raised while decoding a stream.
    pub(crate) fn from_read(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Self::SerializationFormat("truncated stream".to_owned()),
            io::ErrorKind::InvalidData => Self::SerializationFormat(e.to_string()),
            _ => Self::Io(e),
        }
    }
}
