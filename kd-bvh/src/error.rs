//! Errors raised while building a hierarchy.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("index count {count} is not a multiple of 3")]
    IndexCountNotMultipleOfThree { count: usize },

    #[error("vertex stride {stride} is smaller than one position (12 bytes)")]
    InvalidStride { stride: usize },

    #[error("triangle {triangle} references vertex {index}, but the buffer holds {vertex_count}")]
    VertexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("triangle {triangle} references vertex {index} with a non-finite position")]
    NonFiniteVertex { triangle: usize, index: u32 },

    #[error("{count} primitives do not fit the 32-bit packed index range")]
    TooManyPrimitives { count: usize },

    #[error("hierarchy depth exceeded the configured limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    #[error("hierarchy invariant violated: {0}")]
    InvariantViolation(String),
}
