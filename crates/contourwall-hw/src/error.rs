//! Error types for the ContourWall hardware library.

use thiserror::Error;

use crate::serial::StatusCode;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when driving the wall.
#[derive(Error, Debug)]
pub enum Error {
    /// Port layout is not one of the supported variants (0, 1 or 6 ports).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Operation requires an attached device handle.
    #[error("Wall is not attached to a device")]
    NotAttached,

    /// Attach was called while a handle is still held.
    #[error("Wall is already attached; detach before attaching again")]
    AlreadyAttached,

    /// Pixel coordinate outside the grid.
    #[error("Pixel ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// Device handle was already released.
    #[error("Device handle already released")]
    AlreadyReleased,

    /// Device discovery or open failed.
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// No device core is available for this host.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),

    /// Frame buffer size mismatch.
    #[error("Frame size mismatch: expected {expected}, got {actual}")]
    FrameSize { expected: usize, actual: usize },

    /// Invalid colour string.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Invalid tile identifier.
    #[error("Invalid tile identifier (must be 1-6): {0}")]
    InvalidIdentifier(u8),

    /// A tile answered with something other than Ok.
    #[error("Tile {port} answered {status}")]
    TileStatus { port: String, status: StatusCode },

    /// Serial port communication error.
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Serial I/O error.
    #[error("Serial I/O error: {0}")]
    SerialIo(#[from] std::io::Error),
}
