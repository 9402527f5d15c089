//! ContourWall Hardware Library
//!
//! Provides the pixel grid, frame serialization and device abstraction for the
//! ContourWall LED matrix: six 20x20 tiles, each driven over its own serial port.

pub mod color;
pub mod device;
pub mod error;
pub mod frame;
pub mod grid;
pub mod serial;
pub mod wall;

pub use color::{hsv_to_rgb, Rgb};
pub use device::{DeviceConfiguration, DeviceCore, DeviceHandle};
pub use error::{Error, Result};
pub use frame::{Frame, FrameSerializer};
pub use grid::PixelGrid;
pub use serial::SerialCore;
pub use wall::{ContourWall, WallState};

/// Wall dimensions in pixels.
pub const WIDTH: usize = 60;
pub const HEIGHT: usize = 40;

/// Total pixel count of the wall.
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;

/// Size in bytes of one serialized frame (R, G, B per pixel).
pub const FRAME_SIZE: usize = PIXEL_COUNT * 3;

/// Tile dimensions in pixels.
pub const TILE_WIDTH: usize = 20;
pub const TILE_HEIGHT: usize = 20;

/// Size in bytes of one tile's share of a frame.
pub const TILE_FRAME_SIZE: usize = TILE_WIDTH * TILE_HEIGHT * 3;

/// Number of tiles in a full wall (three across, two down).
pub const WALL_TILES: usize = 6;

/// Baud rate the tile firmware is flashed with.
pub const DEFAULT_BAUD_RATE: u32 = 2_000_000;
