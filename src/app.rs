use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::config::{Config, RenderSettings};
use crate::error::InitializationError;
use crate::gfx::RenderEngine;
use crate::performance::FrameStats;
use crate::simulation::{FrameDriver, FrameHandles};

/// Window and event loop around a [`FrameDriver`]
///
/// Each redraw runs tick, submit and present. Escape or closing the window
/// exits; `R` reseeds the particles.
pub struct OrbitApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    render: RenderSettings,
    driver: FrameDriver,
    rng: StdRng,
    stats: FrameStats,
    handles: Option<FrameHandles>,
    render_engine: Option<RenderEngine>,
    window: Option<Arc<Window>>,
    error: Option<InitializationError>,
}

impl OrbitApp {
    /// Creates the event loop and seeds the particles
    pub fn new(config: Config) -> Result<Self, InitializationError> {
        let event_loop = EventLoop::new()?;

        let mut rng = match config.seed {
            Some(seed) => {
                log::info!("Seeding particles with {seed}");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_os_rng(),
        };
        let driver = FrameDriver::with_rng(config.params, &mut rng);
        log::info!(
            "Seeded {} particles (trails: {}, temperature: {})",
            driver.particles().len(),
            driver.params().trails_enabled(),
            driver.params().temperature_enabled
        );

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                render: config.render,
                driver,
                rng,
                stats: FrameStats::new(),
                handles: None,
                render_engine: None,
                window: None,
                error: None,
            },
        })
    }

    /// Runs until the window closes, returning any failure from window or
    /// GPU setup
    pub fn run(mut self) -> Result<(), InitializationError> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), InitializationError> {
        let window = event_loop.create_window(
            WindowAttributes::default()
                .with_title(self.render.title.as_str())
                .with_inner_size(LogicalSize::new(self.render.width, self.render.height)),
        )?;
        let window_handle = Arc::new(window);
        self.window = Some(window_handle.clone());

        let (width, height) = window_handle.inner_size().into();
        let background = self.render.background;
        let mut renderer = pollster::block_on(async move {
            RenderEngine::new(window_handle, width, height, background).await
        })?;

        self.handles = Some(self.driver.prepare(&mut renderer, &self.render));
        self.render_engine = Some(renderer);
        Ok(())
    }

    fn teardown(&mut self) {
        self.handles = None;
        if let Some(render_engine) = self.render_engine.take() {
            render_engine.destroy();
        }
        if self.window.take().is_some() {
            log::info!("Closed window");
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(error) = self.init_graphics(event_loop) {
            log::error!("Initialization failed: {error}");
            self.error = Some(error);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (Some(render_engine), Some(handles)) = (self.render_engine.as_mut(), self.handles)
        else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key_code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyR => self.driver.reseed(&mut self.rng),
                _ => (),
            },
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                render_engine.resize(width, height);
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.stats.begin_frame();

                self.driver.tick();
                let draws = self.driver.submit(render_engine, &handles, &self.render);
                if let Err(error) = render_engine.present() {
                    log::error!("Failed to present frame: {error}");
                    event_loop.exit();
                    return;
                }

                self.stats.end_frame(self.driver.steps(), draws);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}
