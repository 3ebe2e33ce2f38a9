use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use gallery_walk::camera::Camera;
use gallery_walk::config::GalleryConfig;
use gallery_walk::controller::{LocomotionController, Mode};
use gallery_walk::geometry::{WallPanel, layout_panels};
use gallery_walk::input::MoveKey;
use gallery_walk::present::{Upscaler, draw_crosshair, internal_size};
use gallery_walk::renderer;
use gallery_walk::world::Layout;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutChoice {
    /// One long hall
    Hall,
    /// Hall with a side room on each flank
    Rooms,
}

impl LayoutChoice {
    fn build(self) -> Layout {
        match self {
            LayoutChoice::Hall => Layout::single_hall(),
            LayoutChoice::Rooms => Layout::three_rooms(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Walk through a first-person gallery")]
struct Args {
    /// Built-in layout, ignored when --config is given
    #[arg(long, value_enum, default_value_t = LayoutChoice::Rooms)]
    layout: LayoutChoice,
    /// RON gallery config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the effective config as RON and exit
    #[arg(long)]
    dump_config: bool,
}

/// Cursor grab held for as long as this value lives.
struct PointerCapture {
    window: Rc<Window>,
}

impl PointerCapture {
    fn acquire(window: &Rc<Window>) -> Option<Self> {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                window.set_cursor_visible(false);
                debug!("pointer captured");
                Some(Self {
                    window: window.clone(),
                })
            }
            Err(err) => {
                warn!(%err, "pointer capture refused");
                None
            }
        }
    }
}

impl Drop for PointerCapture {
    fn drop(&mut self) {
        if let Err(err) = self.window.set_cursor_grab(CursorGrabMode::None) {
            warn!(%err, "failed to release cursor grab");
        }
        self.window.set_cursor_visible(true);
        debug!("pointer released");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlay {
    Intro,
    Info,
    Hidden,
}

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    capture: Option<PointerCapture>,
    fatal: Option<anyhow::Error>,

    panels: Vec<WallPanel>,
    controller: LocomotionController,
    camera: Camera,
    overlay: Overlay,

    // HUD
    frame_counter: u32,
    last_fps_log: Instant,

    // Internal low-res buffer
    fb_small: Vec<u32>,
    fb_w: usize,
    fb_h: usize,
    upscaler: Upscaler,

    last_tick: Instant,
}

impl App {
    fn new(config: &GalleryConfig) -> Self {
        // the intro overlay is up until the first click
        let controller = LocomotionController::from_layout(config.controller, &config.layout)
            .with_enabled(false);
        let panels = layout_panels(&config.layout);
        info!(
            rooms = config.layout.rooms.len(),
            panels = panels.len(),
            colliders = controller.colliders().len(),
            "gallery built"
        );

        let mut camera = Camera::default();
        camera.sync_pose(controller.pose());

        Self {
            window: None,
            surface: None,
            capture: None,
            fatal: None,
            panels,
            controller,
            camera,
            overlay: Overlay::Intro,
            frame_counter: 0,
            last_fps_log: Instant::now(),
            fb_small: Vec::new(),
            fb_w: 0,
            fb_h: 0,
            upscaler: Upscaler::default(),
            last_tick: Instant::now(),
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title("Gallery")
            .with_inner_size(LogicalSize::new(960.0, 600.0));
        let window = Rc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );

        let context = softbuffer::Context::new(window.clone())
            .map_err(|e| anyhow!("softbuffer context: {e}"))?;
        let surface = softbuffer::Surface::new(&context, window.clone())
            .map_err(|e| anyhow!("softbuffer surface: {e}"))?;

        let size = window.inner_size();
        self.rebuild_internal_fb(size.width as usize, size.height as usize);

        self.surface = Some(surface);
        self.window = Some(window);
        self.update_title();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn capture_pointer(&mut self) {
        if !self.controller.wants_capture() {
            return;
        }
        if let Some(window) = &self.window {
            self.capture = PointerCapture::acquire(window);
            self.controller.set_pointer_captured(self.capture.is_some());
        }
    }

    fn release_pointer(&mut self) {
        self.capture = None;
        self.controller.set_pointer_captured(false);
    }

    fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = overlay;
        let open = overlay != Overlay::Hidden;
        if open {
            self.release_pointer();
        }
        self.controller.set_enabled(!open);
        self.update_title();
    }

    fn update_title(&self) {
        let Some(window) = &self.window else {
            return;
        };
        let title = match self.overlay {
            Overlay::Intro => "Gallery - click or press Enter to walk in",
            Overlay::Info => "Gallery - Tab to close, click to resume",
            Overlay::Hidden => "Gallery - WASD to move, Esc to release the mouse",
        };
        window.set_title(title);
    }

    fn on_key(&mut self, code: KeyCode, state: ElementState) {
        if let Some(key) = MoveKey::from_key_code(code) {
            self.controller
                .input_mut()
                .set_key(key, state == ElementState::Pressed);
            return;
        }
        if state != ElementState::Pressed {
            return;
        }
        match code {
            KeyCode::Escape => self.release_pointer(),
            KeyCode::Tab => {
                let next = if self.overlay == Overlay::Info {
                    Overlay::Hidden
                } else {
                    Overlay::Info
                };
                self.set_overlay(next);
            }
            KeyCode::Enter if self.overlay == Overlay::Intro => {
                self.set_overlay(Overlay::Hidden);
                self.capture_pointer();
            }
            _ => {}
        }
    }

    fn on_click(&mut self) {
        if self.overlay != Overlay::Hidden {
            self.set_overlay(Overlay::Hidden);
        }
        self.capture_pointer();
    }

    fn tick(&mut self) {
        // Compute dt with cap to avoid huge jumps if the app was paused
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).min(Duration::from_millis(100));
        self.last_tick = now;

        let pose = self.controller.step(dt.as_secs_f32());
        self.camera.sync_pose(pose);
    }

    fn redraw(&mut self, id: WindowId) -> Result<()> {
        let size = match &self.window {
            Some(w) if w.id() == id => w.inner_size(),
            _ => return Ok(()),
        };
        self.tick();

        let (Some(dw), Some(dh)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(()); // Minimized window, skip drawing
        };
        if self.upscaler.dst_size() != (dw.get() as usize, dh.get() as usize) {
            self.rebuild_internal_fb(dw.get() as usize, dh.get() as usize);
        }

        renderer::render_frame(
            &mut self.fb_small,
            self.fb_w,
            self.fb_h,
            &self.panels,
            &self.camera,
        );
        let locked = self.controller.mode() == Mode::Locked;
        if locked {
            draw_crosshair(&mut self.fb_small, self.fb_w, self.fb_h);
        }

        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        surface
            .resize(dw, dh)
            .map_err(|e| anyhow!("surface resize: {e}"))?;
        let mut buf = surface
            .buffer_mut()
            .map_err(|e| anyhow!("surface buffer: {e}"))?;
        // Overlays show the scene dimmed behind them
        self.upscaler.blit(&mut buf, &self.fb_small, !locked);
        buf.present().map_err(|e| anyhow!("present: {e}"))?;

        self.frame_counter += 1;
        let elapsed = self.last_fps_log.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frame_counter as f32 / elapsed;
            let p = self.controller.pose().position;
            debug!(fps, x = p.x, z = p.z, "frame stats");
            self.frame_counter = 0;
            self.last_fps_log = Instant::now();
        }
        Ok(())
    }

    fn rebuild_internal_fb(&mut self, dst_w: usize, dst_h: usize) {
        let (w, h) = internal_size(dst_w, dst_h);
        if w != self.fb_w || h != self.fb_h {
            self.fb_w = w;
            self.fb_h = h;
            self.fb_small = vec![0u32; w * h];
        }
        self.camera
            .set_fov_from_horizontal(self.fb_w as f32, self.fb_h as f32, 90.0);
        self.upscaler = Upscaler::new(dst_w, dst_h, self.fb_w, self.fb_h);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_window(event_loop) {
            self.fail(event_loop, err);
            return;
        }
        self.last_tick = Instant::now();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested, exiting");
                self.release_pointer();
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => self.on_key(code, state),

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.on_click(),

            WindowEvent::Focused(false) => {
                self.release_pointer();
                self.controller.input_mut().clear();
            }

            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw(id) {
                    self.fail(event_loop, err);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::Resized(new_size) => {
                self.rebuild_internal_fb(new_size.width as usize, new_size.height as usize);
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.capture.is_some() {
                self.controller
                    .input_mut()
                    .push_pointer_delta(dx as f32, dy as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn load_config(args: &Args) -> Result<GalleryConfig> {
    match &args.config {
        Some(path) => GalleryConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => {
            let config = GalleryConfig::with_layout(args.layout.build());
            config.validate().context("built-in layout is invalid")?;
            Ok(config)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if args.dump_config {
        print!("{}", config.to_ron_string()?);
        return Ok(());
    }

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    // Redraws are requested continuously from about_to_wait
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(&config);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
