//! Serial device core.
//!
//! Drives the tiles directly over their serial ports, one scoped thread per
//! tile for every command.

mod protocol;
mod tile;

pub use protocol::StatusCode;
pub use tile::Tile;

use std::time::Duration;
use tokio_serial::SerialPortType;
use tracing::{debug, info, warn};

use crate::device::DeviceCore;
use crate::{Error, Frame, Result, Rgb, WALL_TILES};

/// Minimum time between two shows on one tile.
pub const DEFAULT_FRAME_TIME: Duration = Duration::from_millis(33);

/// Device core talking to the tiles over serial ports.
#[derive(Debug, Clone)]
pub struct SerialCore {
    frame_time: Duration,
}

/// Open connections to the tiles of one wall, in wall order.
pub struct SerialWall {
    tiles: Vec<Tile>,
}

impl SerialWall {
    /// Number of connected tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
}

impl SerialCore {
    /// Creates a serial core for the current host.
    ///
    /// Fails with [`Error::UnsupportedPlatform`] on hosts without serial
    /// port support.
    pub fn new() -> Result<Self> {
        ensure_supported_platform()?;
        Ok(Self {
            frame_time: DEFAULT_FRAME_TIME,
        })
    }

    /// Sets the minimum time between two shows on one tile.
    pub fn with_frame_time(mut self, frame_time: Duration) -> Self {
        self.frame_time = frame_time;
        self
    }

    /// Returns the minimum time between two shows.
    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }
}

fn ensure_supported_platform() -> Result<()> {
    if cfg!(any(
        target_os = "linux",
        target_os = "macos",
        target_os = "windows"
    )) {
        Ok(())
    } else {
        Err(Error::UnsupportedPlatform(std::env::consts::OS))
    }
}

/// Runs `f` on every tile concurrently, returning the first error.
fn for_each_tile<F>(tiles: &mut [Tile], f: F) -> Result<()>
where
    F: Fn(usize, &mut Tile) -> Result<()> + Sync,
{
    if tiles.len() == 1 {
        return f(0, &mut tiles[0]);
    }

    let f = &f;
    let results: Vec<Result<()>> = std::thread::scope(|s| {
        let jobs: Vec<_> = tiles
            .iter_mut()
            .enumerate()
            .map(|(i, tile)| s.spawn(move || f(i, tile)))
            .collect();
        jobs.into_iter()
            .map(|job| {
                job.join().unwrap_or_else(|_| {
                    Err(Error::DeviceUnavailable("tile worker panicked".to_string()))
                })
            })
            .collect()
    });

    results.into_iter().collect()
}

impl DeviceCore for SerialCore {
    type Handle = SerialWall;

    fn create_auto(&self, baud_rate: u32) -> Result<SerialWall> {
        let ports = tokio_serial::available_ports()?;
        let mut slots: Vec<Option<Tile>> = (0..WALL_TILES).map(|_| None).collect();

        for port in ports {
            let SerialPortType::UsbPort(_) = port.port_type else {
                debug!("Skipping non-USB port {}", port.port_name);
                continue;
            };

            let mut tile = match Tile::open(&port.port_name, baud_rate, self.frame_time) {
                Ok(tile) => tile,
                Err(e) => {
                    debug!("{} is not a tile: {}", port.port_name, e);
                    continue;
                }
            };

            match tile.identifier() {
                Ok(id) if (1..=WALL_TILES).contains(&(id as usize)) => {
                    let slot = &mut slots[id as usize - 1];
                    if slot.is_some() {
                        warn!("Duplicate tile identifier {} on {}", id, port.port_name);
                    } else {
                        info!("Found tile {} on {}", id, port.port_name);
                        *slot = Some(tile);
                    }
                }
                Ok(id) => warn!("Tile on {} has invalid identifier {}", port.port_name, id),
                Err(e) => warn!("Could not identify tile on {}: {}", port.port_name, e),
            }
        }

        let found = slots.iter().filter(|s| s.is_some()).count();
        if found != WALL_TILES {
            return Err(Error::DeviceUnavailable(format!(
                "only {}/{} tiles were found",
                found, WALL_TILES
            )));
        }

        Ok(SerialWall {
            tiles: slots.into_iter().flatten().collect(),
        })
    }

    fn create_with_ports(
        &self,
        ports: &[String; WALL_TILES],
        baud_rate: u32,
    ) -> Result<SerialWall> {
        let tiles = ports
            .iter()
            .map(|port| Tile::open(port, baud_rate, self.frame_time))
            .collect::<Result<Vec<_>>>()?;
        Ok(SerialWall { tiles })
    }

    fn create_with_port(&self, port: &str, baud_rate: u32) -> Result<SerialWall> {
        let tile = Tile::open(port, baud_rate, self.frame_time)?;
        Ok(SerialWall { tiles: vec![tile] })
    }

    fn push_frame(&self, handle: &mut SerialWall, frame: &Frame, optimize: bool) -> Result<()> {
        // A single tile shows the top-left corner of the frame.
        for_each_tile(&mut handle.tiles, |i, tile| {
            let data = frame.tile(i).ok_or_else(|| {
                Error::InvalidConfiguration(format!("no frame region for tile {}", i))
            })?;
            tile.update_all(&data, optimize)
        })
    }

    fn display(&self, handle: &mut SerialWall) -> Result<()> {
        for_each_tile(&mut handle.tiles, |_, tile| tile.show())
    }

    fn solid_color(&self, handle: &mut SerialWall, color: Rgb) -> Result<()> {
        for_each_tile(&mut handle.tiles, |_, tile| tile.solid_color(color))
    }

    fn release(&self, handle: SerialWall) {
        let ports: Vec<&str> = handle.tiles.iter().map(Tile::port_name).collect();
        debug!("Closing {} tile(s): {}", handle.tile_count(), ports.join(", "));
        drop(handle);
    }
}

/// A serial port visible on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    /// Port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub name: String,
    /// Whether the port is a USB serial adapter, as tiles are.
    pub usb: bool,
    /// USB product string, when reported.
    pub product: Option<String>,
}

/// Lists the serial ports of this host.
pub fn list_ports() -> Result<Vec<PortEntry>> {
    let ports = tokio_serial::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|port| {
            let (usb, product) = match port.port_type {
                SerialPortType::UsbPort(info) => (true, info.product),
                _ => (false, None),
            };
            PortEntry {
                name: port.port_name,
                usb,
                product,
            }
        })
        .collect())
}

/// Writes a new wall position to the tile on `port`.
pub fn set_tile_identifier(port: &str, baud_rate: u32, identifier: u8) -> Result<()> {
    tile::validate_identifier(identifier)?;
    let mut tile = Tile::open(port, baud_rate, DEFAULT_FRAME_TIME)?;
    tile.set_identifier(identifier)?;
    info!("Tile on {} now has identifier {}", port, identifier);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_platform() {
        // CI runs on Linux, macOS or Windows.
        let core = SerialCore::new().unwrap();
        assert_eq!(core.frame_time(), DEFAULT_FRAME_TIME);

        let core = core.with_frame_time(Duration::from_millis(10));
        assert_eq!(core.frame_time(), Duration::from_millis(10));
    }

    #[test]
    fn test_set_identifier_validates_first() {
        // Rejected before any port is opened.
        assert!(matches!(
            set_tile_identifier("/dev/does-not-exist", 2_000_000, 0),
            Err(Error::InvalidIdentifier(0))
        ));
    }

    #[test]
    fn test_missing_port_is_unavailable() {
        let core = SerialCore::new().unwrap();
        assert!(matches!(
            core.create_with_port("/dev/contourwall-missing", 2_000_000),
            Err(Error::DeviceUnavailable(_))
        ));
    }

    #[test]
    #[ignore]
    fn test_auto_discovery() {
        let core = SerialCore::new().unwrap();
        let wall = core.create_auto(crate::DEFAULT_BAUD_RATE).unwrap();
        assert_eq!(wall.tile_count(), WALL_TILES);
    }
}
