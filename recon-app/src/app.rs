use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use recon_core::{AngularMapper, GridMapper, ParamValue, ResponseRecord};
use recon_render::{Layout, SkiaSurface, SurfaceStyle};
use recon_session::{InteractionSession, SessionConfig, SessionEvent, SpaceSpec};
use recon_timing::MonotonicClock;

const WINDOW_WIDTH: u32 = 1000;
const WINDOW_HEIGHT: u32 = 800;
const GRID_STIMULUS_SIZE: u32 = 300;
const WHEEL_STIMULUS_SIZE: u32 = 200;

/// One running session of either variant, behind a single dispatch point.
enum DemoSession {
    Grid(InteractionSession<GridMapper, SkiaSurface, MonotonicClock>),
    Wheel(InteractionSession<AngularMapper, SkiaSurface, MonotonicClock>),
}

impl DemoSession {
    fn build(config: SessionConfig, window_size: PhysicalSize<u32>) -> Result<Self> {
        let (layout, stimulus_size) = match config.space {
            SpaceSpec::Grid { .. } => (Layout::SideBySide, GRID_STIMULUS_SIZE),
            SpaceSpec::Angular { .. } if config.answer_value.is_some() => {
                (Layout::Split, WHEEL_STIMULUS_SIZE)
            }
            SpaceSpec::Angular { .. } => (Layout::Centered, WHEEL_STIMULUS_SIZE),
        };
        let style = SurfaceStyle {
            shape: config.surface.shape,
            surface_width: config.surface.width,
            surface_height: config.surface.height,
            border_width: config.surface.border_width,
            stimulus_width: stimulus_size,
            stimulus_height: stimulus_size,
            layout,
        };
        let mut surface = SkiaSurface::new(window_size.width, window_size.height, style)?;
        if let Some(answer) = config.answer_value {
            surface.set_answer_asset(config.assets.asset_for(ParamValue::from_raw(answer)));
        }
        let clock = MonotonicClock::new();
        let mut rng = rand::rng();

        Ok(match config.space.grid_mapper() {
            Some(mapper) => {
                DemoSession::Grid(InteractionSession::new(config, mapper, surface, clock)?)
            }
            None => {
                let mapper = config
                    .space
                    .angular_mapper(&config.indicator, &mut rng)
                    .context("angular space must yield a mapper")?;
                DemoSession::Wheel(InteractionSession::new(config, mapper, surface, clock)?)
            }
        })
    }

    fn handle_event(&mut self, event: SessionEvent) -> Option<ResponseRecord> {
        match self {
            DemoSession::Grid(session) => session.handle_event(event),
            DemoSession::Wheel(session) => session.handle_event(event),
        }
    }

    fn surface(&self) -> &SkiaSurface {
        match self {
            DemoSession::Grid(session) => session.surface(),
            DemoSession::Wheel(session) => session.surface(),
        }
    }

    fn surface_mut(&mut self) -> &mut SkiaSurface {
        match self {
            DemoSession::Grid(session) => session.surface_mut(),
            DemoSession::Wheel(session) => session.surface_mut(),
        }
    }
}

fn buffer_sizes_match(frame: &[u8], data: &[u8]) -> bool {
    frame.len() == data.len()
}

/// Winit host wiring real pointer input into one interaction session.
pub struct App {
    config: SessionConfig,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    session: Option<DemoSession>,
    cursor: (f64, f64),
    should_exit: bool,
}

impl App {
    /// Builds the app from the first CLI argument: `--wheel` for the wheel
    /// preset, a path for a JSON config file, nothing for the grid defaults.
    pub fn new() -> Result<Self> {
        let config = match std::env::args().nth(1).as_deref() {
            None => SessionConfig::default(),
            Some("--wheel") => SessionConfig::wheel_default(),
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {path}"))?;
                serde_json::from_str(&text).with_context(|| format!("parsing config {path}"))?
            }
        };
        // Fail before any window appears.
        config.validate()?;

        Ok(Self {
            config,
            window: None,
            pixels: None,
            session: None,
            cursor: (0.0, 0.0),
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!("move the pointer over the response surface, click to confirm");
        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title("Reconstruction task")
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);
        self.session = Some(DemoSession::build(self.config.clone(), size)?);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(session)) = (&mut self.pixels, &self.session) else {
            return Ok(());
        };
        let data = session.surface().data();
        let frame = pixels.frame_mut();
        // A failed `resize_buffer` leaves the frame at its old size while the
        // canvas has already moved on; skip the frame until the sizes agree.
        if !buffer_sizes_match(frame, data) {
            warn!("frame is {} bytes, canvas is {} bytes, skipping frame", frame.len(), data.len());
            return Ok(());
        }
        frame.copy_from_slice(data);
        pixels.render()?;
        Ok(())
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let Some(session) = &mut self.session else {
            return;
        };
        if let Some(record) = session.handle_event(event) {
            match serde_json::to_string_pretty(&record) {
                Ok(json) => println!("{json}"),
                Err(err) => error!("serializing record: {err}"),
            }
            self.should_exit = true;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(err) = pixels.resize_surface(size.width, size.height) {
                error!("resizing surface: {err}");
            }
            if let Err(err) = pixels.resize_buffer(size.width, size.height) {
                error!("resizing buffer: {err}");
            }
        }
        if let Some(session) = &mut self.session {
            session.surface_mut().resize(size.width, size.height);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none()
            && let Err(err) = self.create_window_and_surface(event_loop)
        {
            error!("failed to start session: {err:#}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.render() {
                    error!("render: {err:#}");
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
                self.dispatch(SessionEvent::PointerMoved { x: position.x, y: position.y });
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.cursor;
                self.dispatch(SessionEvent::Confirm { x, y });
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::buffer_sizes_match;

    #[test]
    fn stale_frame_sizes_are_detected() {
        assert!(buffer_sizes_match(&[0; 16], &[0; 16]));
        assert!(!buffer_sizes_match(&[0; 16], &[0; 12]));
    }
}
