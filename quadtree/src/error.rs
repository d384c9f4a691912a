use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum QuadtreeError {
    #[error("position ({x}, {y}) lies outside the tree bounds")]
    OutOfBounds { x: f32, y: f32 },

    #[error("invalid bounds: half extents must be finite and non-negative, got {half_width}x{half_height}")]
    InvalidBounds { half_width: f32, half_height: f32 },

    #[error("invalid config: node_capacity must be at least 1, got {node_capacity}")]
    InvalidConfig { node_capacity: usize },
}

pub type QuadtreeResult<T> = Result<T, QuadtreeError>;
