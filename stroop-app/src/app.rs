use crate::bridge::{AppEvent, ChannelInput, SharedSize, WindowScreen};
use ab_glyph::FontVec;
use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, unbounded};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use stroop_core::{ExperimentError, Frame};
use stroop_experiment::{
    Apparatus, InputEvent, RandomStimuli, Session, SessionConfig, SessionResultSet,
};
use stroop_render::SkiaRenderer;
use stroop_timing::{CalibrationStats, HighPrecisionTimer, Timer};
use tracing::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

pub type SessionOutcome = Result<SessionResultSet, ExperimentError>;

/// Fullscreen window that paints the session's frames and forwards the
/// subject's clicks. The session itself runs on a worker thread.
pub struct App {
    config: Option<SessionConfig>,
    font: Option<FontVec>,
    proxy: Option<EventLoopProxy<AppEvent>>,
    input_tx: Sender<InputEvent>,
    input_rx: Option<Receiver<InputEvent>>,
    size: SharedSize,

    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer<FontVec>>,
    frame: Frame,
    cursor: Option<(f32, f32)>,
    timer: HighPrecisionTimer,
    scale_factor: f64,
    refresh_rate: Option<f64>,

    worker: Option<JoinHandle<()>>,
    outcome: Option<SessionOutcome>,
    failure: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: SessionConfig, font: Option<FontVec>) -> Self {
        let (input_tx, input_rx) = unbounded();
        Self {
            config: Some(config),
            font,
            proxy: None,
            input_tx,
            input_rx: Some(input_rx),
            size: SharedSize::default(),
            window: None,
            pixels: None,
            renderer: None,
            frame: Frame::blank(),
            cursor: None,
            timer: HighPrecisionTimer::new(),
            scale_factor: 1.0,
            refresh_rate: None,
            worker: None,
            outcome: None,
            failure: None,
        }
    }

    /// Runs the window until the session finishes or is cancelled.
    pub fn run(mut self) -> Result<SessionOutcome> {
        let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
        self.proxy = Some(event_loop.create_proxy());
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "starting Stroop session; press ESC to abort"
        );

        event_loop.run_app(&mut self)?;
        self.log_frame_timing();

        let App {
            input_tx,
            worker,
            outcome,
            failure,
            ..
        } = self;
        // A blocked session sees the channel close and unwinds.
        drop(input_tx);
        if let Some(handle) = worker {
            if handle.join().is_err() {
                return Err(anyhow!("session thread panicked"));
            }
        }
        if let Some(failure) = failure {
            return Err(failure);
        }
        outcome.ok_or_else(|| anyhow!("window closed before the session reported back"))
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Stroop")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor.clone()))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale_factor = self.scale_factor,
            refresh_hz = self.refresh_rate,
            "display configuration"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(
            Pixels::new(physical_size.width, physical_size.height, surface_texture)
                .context("creating pixel surface")?,
        );
        self.renderer = Some(SkiaRenderer::new(
            physical_size.width,
            physical_size.height,
            self.font.take(),
        )?);
        self.size.set(physical_size.width, physical_size.height);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn start_session(&mut self) -> Result<()> {
        let (Some(config), Some(rx), Some(proxy)) =
            (self.config.take(), self.input_rx.take(), self.proxy.clone())
        else {
            return Ok(());
        };
        let size = self.size.clone();
        let handle = thread::Builder::new()
            .name("session".into())
            .spawn(move || {
                let apparatus = Apparatus::new(
                    WindowScreen::new(proxy.clone(), size),
                    ChannelInput::new(rx),
                    HighPrecisionTimer::new(),
                    RandomStimuli::seeded(config.seed),
                );
                let outcome = Session::new(config, apparatus).and_then(|mut session| session.run());
                if proxy.send_event(AppEvent::Finished(outcome)).is_err() {
                    debug!("window closed before the session finished");
                }
            })
            .context("spawning session thread")?;
        self.worker = Some(handle);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let stats = renderer.render_frame(&self.frame, pixels.frame_mut(), &mut self.timer)?;
        let now = self.timer.now();
        pixels.render().context("presenting frame")?;
        let present = self.timer.elapsed(now);

        trace!(
            present_ms = present.as_secs_f64() * 1e3,
            paint_ms = stats.paint.as_secs_f64() * 1e3,
            copy_ms = stats.copy.as_secs_f64() * 1e3,
            total_ms = stats.total.as_secs_f64() * 1e3,
            commands = stats.commands,
            "frame"
        );
        Ok(())
    }

    fn send_input(&self, event: InputEvent) {
        if self.input_tx.send(event).is_err() {
            debug!(?event, "session no longer listening");
        }
    }

    fn handle_click(&self) {
        let (Some(pixels), Some((x, y))) = (self.pixels.as_ref(), self.cursor) else {
            return;
        };
        match pixels.window_pos_to_pixel((x, y)) {
            Ok((px, py)) => self.send_input(InputEvent::Pointer {
                x: px as f32,
                y: py as f32,
            }),
            Err(_) => trace!(x, y, "click outside the drawing surface"),
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize surface");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize buffer");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize canvas");
            }
        }
        self.size.set(new_size.width, new_size.height);
        info!(width = new_size.width, height = new_size.height, "display resized");
    }

    /// Stops the window; the session unwinds with `event` and writes nothing.
    fn cancel(&mut self, event: InputEvent, event_loop: &ActiveEventLoop) {
        self.send_input(event);
        if self.outcome.is_none() {
            self.outcome = Some(Err(ExperimentError::Cancelled));
        }
        info!(?event, "session aborted");
        event_loop.exit();
    }

    fn fail(&mut self, err: anyhow::Error, event_loop: &ActiveEventLoop) {
        error!(error = %format!("{err:#}"), "window failure");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn log_frame_timing(&self) {
        log_stats("frame", &self.timer.calibration_stats());
        if let Some(renderer) = &self.renderer {
            for (stage, stats) in renderer.component_stats() {
                log_stats(stage, &stats);
            }
        }
    }
}

fn log_stats(stage: &str, stats: &CalibrationStats) {
    if stats.samples == 0 {
        return;
    }
    info!(
        stage,
        samples = stats.samples,
        mean_ms = stats.average_frame_time_ns / 1e6,
        jitter_ms = stats.jitter_ns / 1e6,
        min_ms = stats.min_frame_time_ns / 1e6,
        max_ms = stats.max_frame_time_ns / 1e6,
        fps = stats.effective_fps,
        "frame timing"
    );
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let started = self
                .create_window_and_surface(event_loop)
                .and_then(|()| self.start_session());
            if let Err(e) = started {
                self.fail(e, event_loop);
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Frame(frame) => {
                self.frame = frame;
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            AppEvent::Finished(outcome) => {
                match &outcome {
                    Ok(results) => info!(trials = results.len(), "session finished"),
                    Err(e) => info!(error = %e, "session ended early"),
                }
                self.outcome = Some(outcome);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cancel(InputEvent::Quit, event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    self.fail(e, event_loop);
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.cancel(InputEvent::Escape, event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.handle_click(),
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }
}
