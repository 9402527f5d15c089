//! ContourWall Control Tool
//!
//! CLI for filling, animating and provisioning a ContourWall over its serial
//! ports.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contourwall_hw::serial::{list_ports, set_tile_identifier};
use contourwall_hw::{hsv_to_rgb, ContourWall, PixelGrid, Rgb, SerialCore, HEIGHT, WIDTH};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Parser)]
#[command(name = "cwctl")]
#[command(about = "Control tool for the ContourWall LED matrix")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port; give none for auto-discovery, one for a single tile or
    /// six for a full wall (top-left first)
    #[arg(short, long = "port")]
    ports: Vec<String>,

    /// Baud rate shared by all tiles
    #[arg(long)]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the whole wall with one colour
    Fill {
        /// Color in hex format (e.g., #FF0000 for red)
        color: String,
    },
    /// Run a rainbow wave until interrupted
    Rainbow {
        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,

        /// Delay after each frame in milliseconds (defaults to the config)
        #[arg(long)]
        delay: Option<u64>,
    },
    /// List serial ports
    Ports {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a tile's position on the wall (1-6)
    SetId {
        /// Serial port of the tile
        port: String,

        /// Position: 1-3 top row left to right, 4-6 bottom row
        id: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path).context("Failed to load configuration")?;
            info!("Loaded configuration from: {}", path.display());
            config
        }
        None => Config::default(),
    };
    if !cli.ports.is_empty() {
        config.ports = cli.ports;
    }
    if let Some(baud) = cli.baud {
        config.baud_rate = baud;
    }

    match cli.command {
        Commands::Fill { color } => handle_fill(&color, &config),
        Commands::Rainbow { frames, delay } => handle_rainbow(config, frames, delay).await,
        Commands::Ports { json } => handle_ports(json),
        Commands::SetId { port, id } => {
            set_tile_identifier(&port, config.baud_rate, id)
                .with_context(|| format!("Failed to set identifier on {}", port))?;
            println!("Tile on {} now has identifier {}", port, id);
            Ok(())
        }
    }
}

/// Creates the serial core and attaches a wall according to `config`.
fn open_wall(config: &Config) -> Result<ContourWall<SerialCore>> {
    let core = SerialCore::new()
        .context("No device core available for this host")?
        .with_frame_time(Duration::from_millis(config.frame_time_ms));

    let mut wall = ContourWall::new(core);
    wall.attach_ports(&config.ports, config.baud_rate)
        .context("Failed to attach to the wall")?;
    wall.set_optimize(config.optimize);
    Ok(wall)
}

fn handle_fill(color: &str, config: &Config) -> Result<()> {
    let color: Rgb = color.parse()?;
    let mut wall = open_wall(config)?;
    wall.fill_solid(color).context("Failed to fill the wall")?;
    wall.detach()?;
    println!("Wall filled with: {}", color);
    Ok(())
}

/// Paints one frame of a diagonal rainbow wave.
fn draw_rainbow(grid: &mut PixelGrid, hue: u8) -> contourwall_hw::Result<()> {
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let offset = ((x + y) * 3) as u8;
            grid.set_pixel(x, y, hsv_to_rgb(hue.wrapping_add(offset), 255, 255))?;
        }
    }
    Ok(())
}

async fn handle_rainbow(config: Config, frames: Option<u64>, delay: Option<u64>) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));

    let stop = running.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, stopping");
                stop.store(false, Ordering::SeqCst);
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let delay_ms = delay.unwrap_or(config.delay_ms);
    let shown = tokio::task::spawn_blocking(move || -> Result<u64> {
        // The wall is dropped, and its handle released, on every early return.
        let mut wall = open_wall(&config)?;
        let mut hue: u8 = 0;

        while running.load(Ordering::SeqCst) && frames.map_or(true, |n| wall.pushed_frames() < n)
        {
            draw_rainbow(wall.grid_mut(), hue)?;
            wall.show(delay_ms).context("Failed to show frame")?;
            hue = hue.wrapping_add(2);
        }

        let shown = wall.pushed_frames();
        wall.detach()?;
        Ok(shown)
    })
    .await
    .context("Animation task failed")??;

    println!("Shown {} frames", shown);
    Ok(())
}

fn handle_ports(json: bool) -> Result<()> {
    let ports = list_ports().context("Failed to list serial ports")?;

    if json {
        let entries: Vec<_> = ports
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "usb": p.usb,
                    "product": p.product,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }
    println!("Serial ports:");
    for port in ports {
        let kind = if port.usb { "usb" } else { "other" };
        match port.product {
            Some(product) => println!("  {} ({}, {})", port.name, kind, product),
            None => println!("  {} ({})", port.name, kind),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_rainbow_fills_grid() {
        let mut grid = PixelGrid::new();
        draw_rainbow(&mut grid, 0).unwrap();
        assert_eq!(grid.pixel(0, 0).unwrap(), Rgb::new(255, 0, 0));
        assert_ne!(grid.pixel(59, 39).unwrap(), Rgb::BLACK);
    }

    #[test]
    fn test_cli_parses_ports() {
        let cli = Cli::parse_from(["cwctl", "-p", "COM1", "--port", "COM2", "fill", "#ff0000"]);
        assert_eq!(cli.ports, vec!["COM1", "COM2"]);
        assert!(matches!(cli.command, Commands::Fill { .. }));
    }
}
