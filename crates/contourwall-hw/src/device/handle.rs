//! Owned device session.

use std::sync::Arc;
use tracing::info;

use super::{DeviceConfiguration, DeviceCore};
use crate::{Error, Frame, Result, Rgb};

/// A live session with the tiles, released exactly once.
///
/// The session is released by [`DeviceHandle::release`] or, failing that,
/// when the handle is dropped.
pub struct DeviceHandle<C: DeviceCore> {
    core: Arc<C>,
    raw: Option<C::Handle>,
    config: DeviceConfiguration,
}

impl<C: DeviceCore> DeviceHandle<C> {
    /// Opens a session through `core` using the given port layout.
    pub fn open(core: Arc<C>, config: DeviceConfiguration) -> Result<Self> {
        let raw = match &config {
            DeviceConfiguration::Auto { baud_rate } => core.create_auto(*baud_rate)?,
            DeviceConfiguration::Wall { ports, baud_rate } => {
                core.create_with_ports(ports, *baud_rate)?
            }
            DeviceConfiguration::Single { port, baud_rate } => {
                core.create_with_port(port, *baud_rate)?
            }
        };

        info!("Device attached ({})", config);
        Ok(Self {
            core,
            raw: Some(raw),
            config,
        })
    }

    /// Returns the configuration this session was opened with.
    pub fn configuration(&self) -> &DeviceConfiguration {
        &self.config
    }

    /// Uploads a frame to the tiles.
    pub fn push_frame(&mut self, frame: &Frame, optimize: bool) -> Result<()> {
        let raw = self.raw.as_mut().ok_or(Error::AlreadyReleased)?;
        self.core.push_frame(raw, frame, optimize)
    }

    /// Shows the uploaded frame.
    pub fn display(&mut self) -> Result<()> {
        let raw = self.raw.as_mut().ok_or(Error::AlreadyReleased)?;
        self.core.display(raw)
    }

    /// Paints every LED with one colour.
    pub fn solid_color(&mut self, color: Rgb) -> Result<()> {
        let raw = self.raw.as_mut().ok_or(Error::AlreadyReleased)?;
        self.core.solid_color(raw, color)
    }

    /// Closes the session now instead of at drop.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.core.release(raw);
            info!("Device released ({})", self.config);
        }
    }
}

impl<C: DeviceCore> Drop for DeviceHandle<C> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl<C: DeviceCore> std::fmt::Debug for DeviceHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("config", &self.config)
            .field("released", &self.raw.is_none())
            .finish()
    }
}
