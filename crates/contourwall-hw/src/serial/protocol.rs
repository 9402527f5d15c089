//! Tile protocol definitions and encoding.
//!
//! Protocol structure:
//! - On connect the tile sends the 5 magic bytes `Ellie`
//! - Every command starts with a single command byte (0-5)
//! - Payload checksums are the wrapping 8-bit sum of the payload bytes
//! - Most commands are answered with a single status byte

use crate::{Rgb, TILE_FRAME_SIZE, TILE_HEIGHT, TILE_WIDTH};

/// Magic bytes a tile sends when its port is opened.
pub const MAGIC: &[u8; 5] = b"Ellie";

/// Size of an update-all payload (pixel data + checksum).
pub const UPDATE_ALL_SIZE: usize = TILE_FRAME_SIZE + 1;

/// LEDs per strand; a tile is wired as five interleaved strands of 100 LEDs.
const STRAND_LEN: usize = 100;

/// Rows sharing a strand.
const ROWS_PER_STRAND: usize = 5;

/// Tile command bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Flip the uploaded buffer to the LEDs.
    Show = 0,
    /// Paint every LED one colour.
    SolidColor = 1,
    /// Upload a complete tile frame.
    UpdateAll = 2,
    /// Ask the tile for its position on the wall.
    GetIdentifier = 4,
    /// Store a new position on the tile.
    SetIdentifier = 5,
}

/// Status codes returned by a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusCode {
    Error = 0,
    TooSlow = 1,
    NonMatchingCrc = 2,
    UnknownCommand = 3,
    ErrorInternal = 50,
    NotACwPort = 51,
    Ok = 100,
    Next = 101,
    Reset = 255,
}

impl StatusCode {
    /// Converts a status byte to StatusCode.
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(StatusCode::Error),
            1 => Some(StatusCode::TooSlow),
            2 => Some(StatusCode::NonMatchingCrc),
            3 => Some(StatusCode::UnknownCommand),
            50 => Some(StatusCode::ErrorInternal),
            51 => Some(StatusCode::NotACwPort),
            100 => Some(StatusCode::Ok),
            101 => Some(StatusCode::Next),
            255 => Some(StatusCode::Reset),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StatusCode::Error => "error",
            StatusCode::TooSlow => "too slow",
            StatusCode::NonMatchingCrc => "non-matching CRC",
            StatusCode::UnknownCommand => "unknown command",
            StatusCode::ErrorInternal => "internal error",
            StatusCode::NotACwPort => "not a ContourWall port",
            StatusCode::Ok => "ok",
            StatusCode::Next => "next",
            StatusCode::Reset => "reset",
        };
        write!(f, "{} ({})", name, *self as u8)
    }
}

/// Calculates the checksum of a payload.
pub fn crc(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &x| acc.wrapping_add(x))
}

/// Position on the LED chain of the pixel at `row`, `col` of a tile.
fn led_index(row: usize, col: usize) -> usize {
    (row / ROWS_PER_STRAND) * STRAND_LEN + row % ROWS_PER_STRAND + col * ROWS_PER_STRAND
}

/// Builds the table mapping each byte of a row-major tile frame to its byte
/// position on the LED chain.
pub fn index_conversion_table() -> [usize; TILE_FRAME_SIZE] {
    let mut table = [0usize; TILE_FRAME_SIZE];
    for row in 0..TILE_HEIGHT {
        for col in 0..TILE_WIDTH {
            let src = (row * TILE_WIDTH + col) * 3;
            let dst = led_index(row, col) * 3;
            table[src] = dst;
            table[src + 1] = dst + 1;
            table[src + 2] = dst + 2;
        }
    }
    table
}

/// Builds a solid colour command packet.
pub fn build_solid_color_packet(color: Rgb) -> [u8; 5] {
    let [r, g, b] = color.to_bytes();
    [Command::SolidColor as u8, r, g, b, crc(&[r, g, b])]
}

/// Builds the payload following an update-all command byte: the tile frame in
/// LED chain order, then its checksum.
pub fn build_update_all_payload(
    frame: &[u8; TILE_FRAME_SIZE],
    table: &[usize; TILE_FRAME_SIZE],
) -> [u8; UPDATE_ALL_SIZE] {
    let mut payload = [0u8; UPDATE_ALL_SIZE];
    for (&byte, &dst) in frame.iter().zip(table.iter()) {
        payload[dst] = byte;
    }
    payload[TILE_FRAME_SIZE] = crc(frame);
    payload
}

/// Builds a set-identifier command packet (identifier sent twice as a check).
pub fn build_set_identifier_packet(identifier: u8) -> [u8; 3] {
    [Command::SetIdentifier as u8, identifier, identifier]
}
