//! Error types for rejecting bad input before a run starts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board dimensions must be non-zero, got {width}x{height}")]
    EmptyBoard { width: u32, height: u32 },

    #[error(
        "margins {margin_x}/{margin_y} leave no working area on a {width}x{height} board"
    )]
    MarginsTooLarge {
        width: u32,
        height: u32,
        margin_x: u32,
        margin_y: u32,
    },

    #[error("fallback grid step must be non-zero")]
    ZeroGridStep,

    #[error("piece '{name}' has a zero dimension ({width}x{height})")]
    EmptyPiece { name: String, width: u32, height: u32 },

    #[error("piece '{name}' has quantity 0")]
    ZeroQuantity { name: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
