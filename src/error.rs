use thiserror::Error;

use crate::paper::RECORD_WIDTH;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("refs blob for paper {id} is {len} bytes; expected a multiple of {RECORD_WIDTH}")]
    Format { id: u32, len: usize },
    #[error("paper at index {index} is not included in the map")]
    NotIncluded { index: usize },
    #[error("no paper at index {index}")]
    UnknownIndex { index: usize },
}

pub type Result<T> = std::result::Result<T, MapError>;
