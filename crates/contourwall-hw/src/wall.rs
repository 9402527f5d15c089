//! Wall orchestration.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::device::{DeviceConfiguration, DeviceCore, DeviceHandle};
use crate::{Error, FrameSerializer, PixelGrid, Result, Rgb};

/// Lifecycle of a wall's device handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallState {
    /// No handle has been acquired yet.
    Uninitialized,
    /// A handle is held and frames can be shown.
    Attached,
    /// The handle was released by [`ContourWall::detach`].
    Released,
}

impl std::fmt::Display for WallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WallState::Uninitialized => write!(f, "uninitialized"),
            WallState::Attached => write!(f, "attached"),
            WallState::Released => write!(f, "released"),
        }
    }
}

/// A ContourWall: one pixel grid plus the device session that displays it.
///
/// Owned by a single caller; `show` blocks while the frame is transmitted and
/// for the requested delay afterwards.
pub struct ContourWall<C: DeviceCore> {
    core: Arc<C>,
    grid: PixelGrid,
    handle: Option<DeviceHandle<C>>,
    state: WallState,
    pushed_frames: u64,
    optimize: bool,
}

impl<C: DeviceCore> ContourWall<C> {
    /// Creates an unattached wall driven by `core`.
    pub fn new(core: C) -> Self {
        Self::with_shared_core(Arc::new(core))
    }

    /// Creates an unattached wall from a core shared with the caller.
    pub fn with_shared_core(core: Arc<C>) -> Self {
        Self {
            core,
            grid: PixelGrid::new(),
            handle: None,
            state: WallState::Uninitialized,
            pushed_frames: 0,
            optimize: false,
        }
    }

    /// Attaches using an explicit configuration.
    pub fn attach(&mut self, config: DeviceConfiguration) -> Result<()> {
        if self.state == WallState::Attached {
            return Err(Error::AlreadyAttached);
        }

        let handle = DeviceHandle::open(Arc::clone(&self.core), config)?;
        self.handle = Some(handle);
        self.state = WallState::Attached;
        Ok(())
    }

    /// Attaches to a full wall found by the device core.
    pub fn attach_auto(&mut self, baud_rate: u32) -> Result<()> {
        self.attach(DeviceConfiguration::Auto { baud_rate })
    }

    /// Attaches to the given ports: six for a full wall, one for a single
    /// tile, none for auto-discovery.
    pub fn attach_ports<S: AsRef<str>>(&mut self, ports: &[S], baud_rate: u32) -> Result<()> {
        let config = DeviceConfiguration::from_ports(ports, baud_rate)?;
        self.attach(config)
    }

    /// Attaches to a single tile.
    pub fn attach_single_port(&mut self, port: &str, baud_rate: u32) -> Result<()> {
        let config = DeviceConfiguration::from_ports(&[port], baud_rate)?;
        self.attach(config)
    }

    /// Pushes the grid to the tiles, displays it and then waits `delay_ms`.
    ///
    /// The frame counter only moves when both the push and the display
    /// succeed.
    pub fn show(&mut self, delay_ms: u64) -> Result<()> {
        let handle = self.handle.as_mut().ok_or(Error::NotAttached)?;

        let frame = FrameSerializer::serialize(&self.grid);
        handle.push_frame(&frame, self.optimize)?;
        handle.display()?;

        self.pushed_frames += 1;
        debug!("Frame {} shown", self.pushed_frames);

        if delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(delay_ms));
        }
        Ok(())
    }

    /// Fills the whole wall with one colour and shows it immediately.
    ///
    /// The grid follows the tiles as soon as they accept the colour, even if
    /// the following display fails. The frame counter is left alone.
    pub fn fill_solid(&mut self, color: Rgb) -> Result<()> {
        let handle = self.handle.as_mut().ok_or(Error::NotAttached)?;

        handle.solid_color(color)?;
        self.grid.set_all(color);
        handle.display()?;

        debug!("Wall filled with {}", color);
        Ok(())
    }

    /// Releases the device handle.
    pub fn detach(&mut self) -> Result<()> {
        match self.state {
            WallState::Uninitialized => Err(Error::NotAttached),
            WallState::Released => Err(Error::AlreadyReleased),
            WallState::Attached => {
                if let Some(handle) = self.handle.take() {
                    handle.release();
                }
                self.state = WallState::Released;
                info!("Wall detached after {} frames", self.pushed_frames);
                Ok(())
            }
        }
    }

    /// Sets whether unchanged tiles may be skipped when pushing frames.
    pub fn set_optimize(&mut self, optimize: bool) {
        self.optimize = optimize;
    }

    /// Returns the pixel grid.
    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    /// Returns the pixel grid for drawing.
    pub fn grid_mut(&mut self) -> &mut PixelGrid {
        &mut self.grid
    }

    /// Number of frames successfully shown.
    pub fn pushed_frames(&self) -> u64 {
        self.pushed_frames
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WallState {
        self.state
    }

    /// Configuration of the attached handle, if any.
    pub fn configuration(&self) -> Option<&DeviceConfiguration> {
        self.handle.as_ref().map(DeviceHandle::configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Frame, WALL_TILES};
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        CreateAuto(u32),
        CreateWall(Vec<String>),
        CreateSingle(String),
        Push { session: u32, first: u8, optimize: bool },
        Display(u32),
        Solid(u32, Rgb),
        Release(u32),
    }

    #[derive(Default)]
    struct MockCore {
        calls: Mutex<Vec<Call>>,
        sessions: Mutex<u32>,
        fail_push: Mutex<bool>,
        fail_display: Mutex<bool>,
        unavailable: bool,
    }

    impl MockCore {
        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn next_session(&self) -> Result<u32> {
            if self.unavailable {
                return Err(Error::DeviceUnavailable("no tiles found".to_string()));
            }
            let mut sessions = self.sessions.lock().unwrap();
            *sessions += 1;
            Ok(*sessions)
        }

        fn releases(&self, session: u32) -> usize {
            self.calls()
                .iter()
                .filter(|c| **c == Call::Release(session))
                .count()
        }
    }

    impl DeviceCore for MockCore {
        type Handle = u32;

        fn create_auto(&self, baud_rate: u32) -> Result<u32> {
            let session = self.next_session()?;
            self.record(Call::CreateAuto(baud_rate));
            Ok(session)
        }

        fn create_with_ports(&self, ports: &[String; WALL_TILES], _baud: u32) -> Result<u32> {
            let session = self.next_session()?;
            self.record(Call::CreateWall(ports.to_vec()));
            Ok(session)
        }

        fn create_with_port(&self, port: &str, _baud: u32) -> Result<u32> {
            let session = self.next_session()?;
            self.record(Call::CreateSingle(port.to_string()));
            Ok(session)
        }

        fn push_frame(&self, handle: &mut u32, frame: &Frame, optimize: bool) -> Result<()> {
            if *self.fail_push.lock().unwrap() {
                return Err(Error::DeviceUnavailable("tile unplugged".to_string()));
            }
            assert_eq!(frame.as_bytes().len(), crate::FRAME_SIZE);
            self.record(Call::Push {
                session: *handle,
                first: frame.as_bytes()[0],
                optimize,
            });
            Ok(())
        }

        fn display(&self, handle: &mut u32) -> Result<()> {
            if *self.fail_display.lock().unwrap() {
                return Err(Error::DeviceUnavailable("tile unplugged".to_string()));
            }
            self.record(Call::Display(*handle));
            Ok(())
        }

        fn solid_color(&self, handle: &mut u32, color: Rgb) -> Result<()> {
            self.record(Call::Solid(*handle, color));
            Ok(())
        }

        fn release(&self, handle: u32) {
            self.record(Call::Release(handle));
        }
    }

    const BAUD: u32 = 2_000_000;
    const SIX: [&str; 6] = ["p0", "p1", "p2", "p3", "p4", "p5"];

    fn wall() -> (Arc<MockCore>, ContourWall<MockCore>) {
        let core = Arc::new(MockCore::default());
        let wall = ContourWall::with_shared_core(Arc::clone(&core));
        (core, wall)
    }

    #[test]
    fn test_show_before_attach_fails() {
        let (core, mut wall) = wall();
        assert_eq!(wall.state(), WallState::Uninitialized);
        assert!(matches!(wall.show(0), Err(Error::NotAttached)));
        assert!(matches!(wall.fill_solid(Rgb::WHITE), Err(Error::NotAttached)));
        assert_eq!(wall.pushed_frames(), 0);
        assert!(core.calls().is_empty());
    }

    #[test]
    fn test_show_counts_frames() {
        let (core, mut wall) = wall();
        wall.attach_ports(&SIX, BAUD).unwrap();
        wall.grid_mut().set_pixel(0, 0, Rgb::new(77, 0, 0)).unwrap();

        for _ in 0..5 {
            wall.show(0).unwrap();
        }
        assert_eq!(wall.pushed_frames(), 5);

        let calls = core.calls();
        assert_eq!(
            calls[0],
            Call::CreateWall(SIX.iter().map(|p| p.to_string()).collect())
        );
        assert_eq!(
            calls[1],
            Call::Push {
                session: 1,
                first: 77,
                optimize: false
            }
        );
        assert_eq!(calls[2], Call::Display(1));
        assert_eq!(calls.len(), 1 + 5 * 2);
    }

    #[test]
    fn test_show_after_detach_fails() {
        let (core, mut wall) = wall();
        wall.attach_single_port("/dev/ttyUSB0", BAUD).unwrap();
        wall.show(0).unwrap();
        wall.detach().unwrap();

        assert_eq!(wall.state(), WallState::Released);
        assert!(matches!(wall.show(0), Err(Error::NotAttached)));
        assert_eq!(wall.pushed_frames(), 1);
        assert_eq!(core.releases(1), 1);
    }

    #[test]
    fn test_failed_push_leaves_counter() {
        let (core, mut wall) = wall();
        wall.attach_auto(BAUD).unwrap();
        wall.show(0).unwrap();

        *core.fail_push.lock().unwrap() = true;
        assert!(matches!(wall.show(0), Err(Error::DeviceUnavailable(_))));
        assert_eq!(wall.pushed_frames(), 1);
        assert_eq!(wall.state(), WallState::Attached);
    }

    #[test]
    fn test_double_detach() {
        let (core, mut wall) = wall();
        assert!(matches!(wall.detach(), Err(Error::NotAttached)));

        wall.attach_auto(BAUD).unwrap();
        wall.detach().unwrap();
        assert!(matches!(wall.detach(), Err(Error::AlreadyReleased)));

        drop(wall);
        assert_eq!(core.releases(1), 1);
    }

    #[test]
    fn test_drop_releases_handle() {
        let (core, mut wall) = wall();
        wall.attach_auto(BAUD).unwrap();
        drop(wall);
        assert_eq!(core.calls(), vec![Call::CreateAuto(BAUD), Call::Release(1)]);
    }

    #[test]
    fn test_attach_variants_by_port_count() {
        let (core, mut wall) = wall();
        wall.attach_ports::<&str>(&[], BAUD).unwrap();
        wall.detach().unwrap();
        wall.attach_ports(&["COM3"], BAUD).unwrap();
        wall.detach().unwrap();
        wall.attach_ports(&SIX, BAUD).unwrap();
        assert_eq!(wall.configuration().map(|c| c.tile_count()), Some(6));

        let calls = core.calls();
        assert_eq!(calls[0], Call::CreateAuto(BAUD));
        assert_eq!(calls[2], Call::CreateSingle("COM3".to_string()));
        assert!(matches!(calls[4], Call::CreateWall(_)));
    }

    #[test]
    fn test_invalid_port_count() {
        let (core, mut wall) = wall();
        let err = wall.attach_ports(&["a", "b", "c"], BAUD).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
        assert_eq!(wall.state(), WallState::Uninitialized);
        assert!(core.calls().is_empty());
    }

    #[test]
    fn test_reattach_requires_detach() {
        let (_core, mut wall) = wall();
        wall.attach_auto(BAUD).unwrap();
        assert!(matches!(wall.attach_auto(BAUD), Err(Error::AlreadyAttached)));

        wall.detach().unwrap();
        wall.attach_auto(BAUD).unwrap();
        assert_eq!(wall.state(), WallState::Attached);
    }

    #[test]
    fn test_device_unavailable_surfaces() {
        let core = MockCore {
            unavailable: true,
            ..Default::default()
        };
        let mut wall = ContourWall::new(core);
        assert!(matches!(
            wall.attach_auto(BAUD),
            Err(Error::DeviceUnavailable(_))
        ));
        assert_eq!(wall.state(), WallState::Uninitialized);
    }

    #[test]
    fn test_fill_solid_updates_grid() {
        let (core, mut wall) = wall();
        wall.attach_auto(BAUD).unwrap();
        let color = Rgb::new(10, 20, 30);
        wall.fill_solid(color).unwrap();

        assert_eq!(wall.pushed_frames(), 0);
        assert!(wall.grid().data().iter().all(|&p| p == color));
        assert!(core.calls().contains(&Call::Solid(1, color)));

        wall.show(0).unwrap();
        wall.fill_solid(Rgb::WHITE).unwrap();
        wall.show(0).unwrap();
        assert_eq!(wall.pushed_frames(), 2);
    }

    #[test]
    fn test_fill_solid_grid_tracks_tiles_when_display_fails() {
        let (core, mut wall) = wall();
        wall.attach_auto(BAUD).unwrap();
        *core.fail_display.lock().unwrap() = true;

        let color = Rgb::new(1, 2, 3);
        assert!(matches!(
            wall.fill_solid(color),
            Err(Error::DeviceUnavailable(_))
        ));
        assert!(core.calls().contains(&Call::Solid(1, color)));
        assert!(wall.grid().data().iter().all(|&p| p == color));
        assert_eq!(wall.pushed_frames(), 0);
    }

    #[test]
    fn test_optimize_flag_forwarded() {
        let (core, mut wall) = wall();
        wall.attach_auto(BAUD).unwrap();
        wall.set_optimize(true);
        wall.show(0).unwrap();
        assert!(core.calls().iter().any(|c| matches!(
            c,
            Call::Push {
                optimize: true,
                ..
            }
        )));
    }

    #[test]
    fn test_show_delay_blocks() {
        let (_core, mut wall) = wall();
        wall.attach_auto(BAUD).unwrap();
        let start = Instant::now();
        wall.show(20).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
