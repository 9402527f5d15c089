//! Pixel grid backing the wall.

use crate::{Error, Result, Rgb, FRAME_SIZE, HEIGHT, PIXEL_COUNT, WIDTH};

/// RGB pixel grid for the 60x40 wall.
///
/// Every cell always holds a colour; a fresh grid is black.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    /// Pixels in row-major order.
    data: Vec<Rgb>,
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelGrid {
    /// Creates a new grid initialized to black.
    pub fn new() -> Self {
        Self {
            data: vec![Rgb::BLACK; PIXEL_COUNT],
        }
    }

    /// Returns the width of the grid.
    pub fn width(&self) -> usize {
        WIDTH
    }

    /// Returns the height of the grid.
    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// Returns the pixels in row-major order.
    pub fn data(&self) -> &[Rgb] {
        &self.data
    }

    fn index(x: usize, y: usize) -> Result<usize> {
        if x < WIDTH && y < HEIGHT {
            Ok(y * WIDTH + x)
        } else {
            Err(Error::OutOfBounds {
                x,
                y,
                width: WIDTH,
                height: HEIGHT,
            })
        }
    }

    /// Sets a pixel at the given coordinates.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) -> Result<()> {
        let idx = Self::index(x, y)?;
        self.data[idx] = color;
        Ok(())
    }

    /// Gets the pixel at the given coordinates.
    pub fn pixel(&self, x: usize, y: usize) -> Result<Rgb> {
        Ok(self.data[Self::index(x, y)?])
    }

    /// Sets every pixel to one colour.
    pub fn set_all(&mut self, color: Rgb) {
        self.data.fill(color);
    }

    /// Fills a rectangle with a solid colour.
    ///
    /// The whole rectangle must lie inside the grid; otherwise nothing is
    /// written.
    pub fn fill_rect(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        color: Rgb,
    ) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        // Both corners are checked before any write.
        Self::index(x, y)?;
        let far_x = x.saturating_add(width - 1);
        let far_y = y.saturating_add(height - 1);
        Self::index(far_x, far_y)?;

        for row in self.data.chunks_exact_mut(WIDTH).skip(y).take(height) {
            row[x..x + width].fill(color);
        }
        Ok(())
    }

    /// Copies pixel data from an RGB8 slice.
    pub fn copy_from_rgb8(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != FRAME_SIZE {
            return Err(Error::FrameSize {
                expected: FRAME_SIZE,
                actual: data.len(),
            });
        }

        for (pixel, chunk) in self.data.iter_mut().zip(data.chunks_exact(3)) {
            *pixel = Rgb::new(chunk[0], chunk[1], chunk[2]);
        }
        Ok(())
    }

    /// Flattens the grid into row-major R, G, B bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(FRAME_SIZE);
        for pixel in &self.data {
            bytes.extend_from_slice(&pixel.to_bytes());
        }
        bytes
    }
}
