//! Single tile connection over a serial port.

use std::io::{Read, Write};
use std::time::{Duration, Instant};
use tokio_serial::{DataBits, Parity, SerialPort, StopBits};
use tracing::debug;

use super::protocol::{
    build_set_identifier_packet, build_solid_color_packet, build_update_all_payload,
    index_conversion_table, Command, StatusCode, MAGIC,
};
use crate::{Error, Result, Rgb, TILE_FRAME_SIZE, WALL_TILES};

/// How long a freshly opened tile may take to send its magic bytes.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(1000);

/// How long a tile may take to answer a command.
const REPLY_TIMEOUT: Duration = Duration::from_millis(30);

/// One tile, reached over `P` (a serial port outside of tests).
pub struct Tile<P = Box<dyn SerialPort>> {
    port_name: String,
    port: P,
    frame_time: Duration,
    last_show: Option<Instant>,
    last_frame: Option<[u8; TILE_FRAME_SIZE]>,
    table: [usize; TILE_FRAME_SIZE],
}

impl Tile {
    /// Opens the serial port and checks that a tile is listening on it.
    pub fn open(port_name: &str, baud_rate: u32, frame_time: Duration) -> Result<Self> {
        let port = tokio_serial::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(HANDSHAKE_TIMEOUT)
            .open()
            .map_err(|e| Error::DeviceUnavailable(format!("{}: {}", port_name, e)))?;

        let mut tile = Tile::handshake(port_name, port, frame_time)?;
        tile.port.set_timeout(REPLY_TIMEOUT)?;
        Ok(tile)
    }
}

impl<P: Read + Write> Tile<P> {
    /// Wraps an open connection, reading the tile's magic bytes.
    pub fn handshake(port_name: &str, mut port: P, frame_time: Duration) -> Result<Self> {
        let mut magic = [0u8; 5];
        port.read_exact(&mut magic).map_err(|e| {
            Error::DeviceUnavailable(format!("{}: no handshake received ({})", port_name, e))
        })?;

        if &magic != MAGIC {
            return Err(Error::DeviceUnavailable(format!(
                "{} is not a ContourWall tile (got {:02X?})",
                port_name, magic
            )));
        }

        debug!("Tile handshake completed on {}", port_name);
        Ok(Self {
            port_name: port_name.to_string(),
            port,
            frame_time,
            last_show: None,
            last_frame: None,
            table: index_conversion_table(),
        })
    }

    /// Returns the port path.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_status(&mut self) -> Result<StatusCode> {
        let mut reply = [0u8; 1];
        self.port.read_exact(&mut reply)?;
        StatusCode::from_byte(reply[0]).ok_or_else(|| Error::TileStatus {
            port: self.port_name.clone(),
            status: StatusCode::ErrorInternal,
        })
    }

    fn expect_ok(&mut self) -> Result<()> {
        match self.read_status()? {
            StatusCode::Ok => Ok(()),
            status => Err(Error::TileStatus {
                port: self.port_name.clone(),
                status,
            }),
        }
    }

    /// Displays the uploaded frame, keeping at least one frame time between
    /// consecutive shows.
    pub fn show(&mut self) -> Result<()> {
        if let Some(last) = self.last_show {
            let elapsed = last.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }
        }

        self.send(&[Command::Show as u8])?;
        self.last_show = Some(Instant::now());
        Ok(())
    }

    /// Paints every LED of the tile.
    pub fn solid_color(&mut self, color: Rgb) -> Result<()> {
        let packet = build_solid_color_packet(color);
        self.send(&packet)?;
        // The tile buffer no longer matches any uploaded frame.
        self.last_frame = None;
        self.expect_ok()
    }

    /// Uploads a row-major tile frame.
    ///
    /// With `optimize`, a frame identical to the last accepted one is not
    /// sent again.
    ///
    /// Changed tiles are always uploaded whole. The firmware's per-LED update
    /// command (3, acknowledged with [`StatusCode::Next`]) is not used.
    pub fn update_all(&mut self, frame: &[u8; TILE_FRAME_SIZE], optimize: bool) -> Result<()> {
        if optimize && self.last_frame.as_ref() == Some(frame) {
            debug!("Tile {} unchanged, skipping upload", self.port_name);
            return Ok(());
        }

        let payload = build_update_all_payload(frame, &self.table);
        self.send(&[Command::UpdateAll as u8])?;
        self.send(&payload)?;
        self.expect_ok()?;

        self.last_frame = Some(*frame);
        Ok(())
    }

    /// Reads the tile's position on the wall (1-6).
    pub fn identifier(&mut self) -> Result<u8> {
        self.send(&[Command::GetIdentifier as u8])?;

        let mut reply = [0u8; 3];
        self.port.read_exact(&mut reply)?;
        let status = StatusCode::from_byte(reply[2]).unwrap_or(StatusCode::ErrorInternal);

        if reply[0] != reply[1] {
            return Err(Error::TileStatus {
                port: self.port_name.clone(),
                status: StatusCode::NonMatchingCrc,
            });
        }
        if status != StatusCode::Ok {
            return Err(Error::TileStatus {
                port: self.port_name.clone(),
                status,
            });
        }
        Ok(reply[0])
    }

    /// Stores a new position on the tile.
    pub fn set_identifier(&mut self, identifier: u8) -> Result<()> {
        validate_identifier(identifier)?;
        self.send(&build_set_identifier_packet(identifier))?;
        self.expect_ok()
    }
}

/// Checks that `identifier` names a wall position.
pub fn validate_identifier(identifier: u8) -> Result<()> {
    if identifier == 0 || identifier as usize > WALL_TILES {
        return Err(Error::InvalidIdentifier(identifier));
    }
    Ok(())
}

impl<P> Drop for Tile<P> {
    fn drop(&mut self) {
        debug!("Closing tile on {}", self.port_name);
    }
}
