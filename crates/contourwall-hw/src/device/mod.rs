//! Device core boundary.
//!
//! The wall never touches hardware itself. It is handed a [`DeviceCore`] at
//! construction and drives the tiles exclusively through it.

mod config;
mod handle;

pub use config::DeviceConfiguration;
pub use handle::DeviceHandle;

use crate::{Frame, Result, Rgb, WALL_TILES};

/// Collaborator that owns the actual transmission to the tiles.
///
/// Handles returned by the `create_*` operations must be passed back to
/// [`DeviceCore::release`] exactly once; [`DeviceHandle`] takes care of that.
pub trait DeviceCore {
    /// Open session with one or more tiles.
    type Handle;

    /// Discovers the tiles of a full wall on its own.
    fn create_auto(&self, baud_rate: u32) -> Result<Self::Handle>;

    /// Opens the six tiles of a full wall, top-left first.
    fn create_with_ports(
        &self,
        ports: &[String; WALL_TILES],
        baud_rate: u32,
    ) -> Result<Self::Handle>;

    /// Opens a single tile.
    fn create_with_port(&self, port: &str, baud_rate: u32) -> Result<Self::Handle>;

    /// Uploads a frame to the tiles' buffers without displaying it.
    fn push_frame(&self, handle: &mut Self::Handle, frame: &Frame, optimize: bool) -> Result<()>;

    /// Flips the already-pushed buffers to the LEDs.
    fn display(&self, handle: &mut Self::Handle) -> Result<()>;

    /// Paints every LED of every tile with one colour.
    fn solid_color(&self, handle: &mut Self::Handle, color: Rgb) -> Result<()>;

    /// Closes the session.
    fn release(&self, handle: Self::Handle);
}
