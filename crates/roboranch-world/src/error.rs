//! Error types for the `roboranch-world` crate.
//!
//! Grid construction and restoration are the only fallible world
//! operations. Runtime queries return `Option` or `bool` instead, because
//! a failed precondition during play is an ordinary outcome and not an
//! error.

use roboranch_types::Position;

/// Errors that can occur during grid construction or restoration.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The requested grid dimensions are zero or too large to index.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A snapshot's tile list does not match its declared dimensions.
    #[error("tile count mismatch: expected {expected}, found {actual}")]
    TileCountMismatch {
        /// `width * height`.
        expected: usize,
        /// Tiles actually present.
        actual: usize,
    },

    /// A position lies outside the grid.
    #[error("position {0} is out of bounds")]
    OutOfBounds(Position),

    /// A crop sits on a tile that cannot hold one.
    #[error("crop on non-tilled tile at {0}")]
    CropOnUntilledTile(Position),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
