//! Port layout of a wall.

use crate::{Error, Result, WALL_TILES};

/// How the wall's tiles are reached.
///
/// Chosen once when attaching; changing it means releasing the handle and
/// attaching again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceConfiguration {
    /// Let the device core find the six tiles itself.
    Auto { baud_rate: u32 },
    /// Six tiles, top-left, top-center, top-right, bottom-left, bottom-center,
    /// bottom-right.
    Wall {
        ports: [String; WALL_TILES],
        baud_rate: u32,
    },
    /// One tile on its own.
    Single { port: String, baud_rate: u32 },
}

impl DeviceConfiguration {
    /// Picks the variant matching the number of ports given.
    ///
    /// No ports means auto-discovery, one port a single tile, six ports a full
    /// wall. Every other count is rejected.
    pub fn from_ports<S: AsRef<str>>(ports: &[S], baud_rate: u32) -> Result<Self> {
        if baud_rate == 0 {
            return Err(Error::InvalidConfiguration(
                "baud rate must be non-zero".to_string(),
            ));
        }
        if let Some(pos) = ports.iter().position(|p| p.as_ref().trim().is_empty()) {
            return Err(Error::InvalidConfiguration(format!(
                "port {} is empty",
                pos
            )));
        }

        match ports.len() {
            0 => Ok(Self::Auto { baud_rate }),
            1 => Ok(Self::Single {
                port: ports[0].as_ref().to_string(),
                baud_rate,
            }),
            WALL_TILES => Ok(Self::Wall {
                ports: std::array::from_fn(|i| ports[i].as_ref().to_string()),
                baud_rate,
            }),
            n => Err(Error::InvalidConfiguration(format!(
                "expected 0, 1 or {} ports, got {}",
                WALL_TILES, n
            ))),
        }
    }

    /// Returns the shared baud rate.
    pub fn baud_rate(&self) -> u32 {
        match self {
            Self::Auto { baud_rate }
            | Self::Wall { baud_rate, .. }
            | Self::Single { baud_rate, .. } => *baud_rate,
        }
    }

    /// Returns the explicitly configured ports, empty for auto-discovery.
    pub fn ports(&self) -> Vec<&str> {
        match self {
            Self::Auto { .. } => Vec::new(),
            Self::Wall { ports, .. } => ports.iter().map(String::as_str).collect(),
            Self::Single { port, .. } => vec![port.as_str()],
        }
    }

    /// Number of tiles driven under this configuration.
    pub fn tile_count(&self) -> usize {
        match self {
            Self::Auto { .. } | Self::Wall { .. } => WALL_TILES,
            Self::Single { .. } => 1,
        }
    }
}

impl std::fmt::Display for DeviceConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto { baud_rate } => write!(f, "auto-discovery @ {} baud", baud_rate),
            Self::Wall { ports, baud_rate } => {
                write!(f, "wall [{}] @ {} baud", ports.join(", "), baud_rate)
            }
            Self::Single { port, baud_rate } => {
                write!(f, "single tile {} @ {} baud", port, baud_rate)
            }
        }
    }
}
