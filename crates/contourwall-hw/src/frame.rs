//! Frame serialization.
//!
//! A frame is the wire-ready snapshot of the grid: 60x40 pixels, row-major,
//! three bytes (R, G, B) per pixel, 7200 bytes in total. Tiles are laid out
//! three across and two down:
//!
//! ```text
//! +---+---+---+
//! | 0 | 1 | 2 |
//! +---+---+---+
//! | 3 | 4 | 5 |
//! +---+---+---+
//! ```

use crate::{
    Error, PixelGrid, Result, FRAME_SIZE, TILE_FRAME_SIZE, TILE_HEIGHT, TILE_WIDTH, WALL_TILES,
    WIDTH,
};

/// Tiles per row of the wall.
const TILES_ACROSS: usize = WIDTH / TILE_WIDTH;

/// A complete serialized frame. Always exactly [`FRAME_SIZE`] bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    /// Returns the raw frame bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Extracts the 20x20 region driven by tile `index` as row-major RGB.
    ///
    /// Returns `None` for indices past the last tile.
    pub fn tile(&self, index: usize) -> Option<[u8; TILE_FRAME_SIZE]> {
        if index >= WALL_TILES {
            return None;
        }

        let tile_x = index % TILES_ACROSS;
        let tile_y = index / TILES_ACROSS;
        let row_len = TILE_WIDTH * 3;

        let mut out = [0u8; TILE_FRAME_SIZE];
        for (row, dst) in out.chunks_exact_mut(row_len).enumerate() {
            let y = tile_y * TILE_HEIGHT + row;
            let start = (y * WIDTH + tile_x * TILE_WIDTH) * 3;
            dst.copy_from_slice(&self.bytes[start..start + row_len]);
        }
        Some(out)
    }
}

impl TryFrom<Vec<u8>> for Frame {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != FRAME_SIZE {
            return Err(Error::FrameSize {
                expected: FRAME_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Turns a [`PixelGrid`] into the buffer the device core consumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSerializer;

impl FrameSerializer {
    /// Serializes the grid. Never fails: the grid is always fully populated.
    pub fn serialize(grid: &PixelGrid) -> Frame {
        let bytes = grid.to_bytes();
        debug_assert_eq!(bytes.len(), FRAME_SIZE);
        Frame { bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rgb;

    #[test]
    fn test_serialize_length_and_determinism() {
        let mut grid = PixelGrid::new();
        grid.set_pixel(12, 34, Rgb::new(9, 8, 7)).unwrap();

        let a = FrameSerializer::serialize(&grid);
        let b = FrameSerializer::serialize(&grid.clone());
        assert_eq!(a.as_bytes().len(), FRAME_SIZE);
        assert_eq!(a, b);
        assert_eq!(a.as_bytes(), grid.to_bytes().as_slice());
    }

    #[test]
    fn test_frame_rejects_wrong_length() {
        assert!(matches!(
            Frame::try_from(vec![0; 1200]),
            Err(Error::FrameSize {
                expected: 7200,
                actual: 1200
            })
        ));
        assert!(Frame::try_from(vec![0; 7200]).is_ok());
    }

    #[test]
    fn test_tile_split() {
        let mut grid = PixelGrid::new();
        // Mark the top-left pixel of every tile with its index.
        for index in 0..WALL_TILES {
            let x = (index % 3) * 20;
            let y = (index / 3) * 20;
            grid.set_pixel(x, y, Rgb::new(index as u8 + 1, 0, 0)).unwrap();
        }
        // And the bottom-right pixel of the last tile.
        grid.set_pixel(59, 39, Rgb::new(0, 0, 42)).unwrap();

        let frame = FrameSerializer::serialize(&grid);
        for index in 0..WALL_TILES {
            let tile = frame.tile(index).unwrap();
            assert_eq!(tile[0], index as u8 + 1, "tile {index}");
        }
        let last = frame.tile(5).unwrap();
        assert_eq!(last[TILE_FRAME_SIZE - 1], 42);
        assert!(frame.tile(6).is_none());
    }
}
