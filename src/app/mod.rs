mod egui_host;
mod input;
mod timing;

pub use egui_host::EguiFrameOutput;

use crate::assets::SceneSource;
use crate::config::PortfolioConfig;
use crate::controller::{Pointer, SceneController, SceneRole};
use crate::loading::SceneSession;
use crate::presentation::PresentationPort;
use crate::render::{FrameScene, RenderContext, RenderError};
use crate::ui::camera_panel::CameraPanel;
use crate::ui::{self, OverlayState, UiEvent, UiFrame};
use egui_host::EguiHost;
use glam::Vec2;
use input::{InputAction, PointerState};
use timing::FrameTiming;

use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

const BASE_TITLE: &str = "deskfolio";
/// Pixel-delta scroll units per wheel notch.
const PIXELS_PER_SCROLL_LINE: f32 = 50.0;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What to show at startup.
pub struct LaunchOptions {
    pub config: PortfolioConfig,
    pub source: SceneSource,
    pub role: SceneRole,
}

pub struct App {
    window: Option<Arc<Window>>,
    render: Option<RenderContext>,
    egui: Option<EguiHost>,
    controller: SceneController,
    overlay: OverlayState,
    camera_panel: CameraPanel,
    session: Option<SceneSession>,
    pending_source: Option<(SceneSource, SceneRole)>,
    pointer: PointerState,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
    fatal: Option<RenderError>,
}

impl App {
    fn new(options: LaunchOptions) -> Self {
        let controller = SceneController::new(options.config);
        let camera_panel = CameraPanel::new(controller.camera());
        Self {
            window: None,
            render: None,
            egui: None,
            controller,
            overlay: OverlayState::new(),
            camera_panel,
            session: None,
            pending_source: Some((options.source, options.role)),
            pointer: PointerState::default(),
            timing: FrameTiming::new(BASE_TITLE.to_string()),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
            fatal: None,
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn start_session(&mut self, source: SceneSource, role: SceneRole) {
        let enter_delay = self.controller.config().timings.enter_gate();
        match SceneSession::start(source, role, enter_delay) {
            Ok(session) => {
                self.overlay.show_status("Loading...");
                self.session = Some(session);
            }
            Err(err) => {
                log::error!("Error loading scene: {}", err);
                self.overlay
                    .show_status(&format!("Failed to load scene: {}", err));
            }
        }
    }

    fn pointer_at(&self, position: Vec2) -> Option<Pointer> {
        let size = self.window.as_ref()?.inner_size();
        Some(Pointer {
            position,
            viewport: Vec2::new(size.width as f32, size.height as f32),
        })
    }

    fn scene_input_blocked(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.gate().is_blocking())
    }

    fn ui_wants_pointer(&self) -> bool {
        self.egui
            .as_ref()
            .is_some_and(|egui| egui.wants_pointer_input())
    }

    fn handle_input_action(&mut self, action: InputAction) {
        match action {
            InputAction::Control(action) => self.controller.handle_action(action),
            InputAction::CloseDetail => self.close_detail(),
            InputAction::None => {}
        }
    }

    fn close_detail(&mut self) {
        if self.overlay.close_detail() {
            self.controller.detail_dismissed();
        }
    }

    fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::NavigateTo(name) => {
                self.controller.move_to_view(&name);
            }
            UiEvent::OpenScene => {
                let Some(path) = rfd::FileDialog::new()
                    .add_filter("glTF", &["gltf", "glb"])
                    .pick_file()
                else {
                    return;
                };
                self.start_session(SceneSource::File(path), SceneRole::Portfolio);
            }
            UiEvent::ToggleCameraPanel => self.camera_panel.toggle(self.controller.camera()),
            UiEvent::DetailClosed => self.close_detail(),
            UiEvent::EnterScene => {
                if let Some(session) = &mut self.session {
                    if session.gate_mut().enter() {
                        log::info!("Entered {}", session.source().display_name());
                        self.overlay.clear_status();
                    }
                }
            }
        }
    }

    fn poll_session(&mut self, dt: Duration) {
        let Some(session) = &mut self.session else {
            return;
        };
        let Some(scene) = session.poll(dt, &mut self.overlay) else {
            return;
        };
        let role = session.role();
        let name = session.source().display_name();
        if let Some(render) = &mut self.render {
            render.upload_scene(&scene);
        }
        self.controller.attach_scene(scene, role, &mut self.overlay);
        if role == SceneRole::Portfolio {
            self.overlay.clear_status();
        }
        self.timing.set_base_title(format!("{} - {}", BASE_TITLE, name));
    }

    fn frame(&mut self) {
        let frame_start = Instant::now();
        self.timing
            .update(self.window.as_ref().map(|w| w.as_ref()), frame_start);
        let dt = self.timing.frame_dt;
        let dt_duration = self.timing.frame_duration();

        self.poll_session(dt_duration);
        let camera_moved = self.controller.update(dt, &mut self.overlay);
        self.overlay.tick(dt_duration);
        if camera_moved && self.camera_panel.is_open() && self.controller.movement().any() {
            self.camera_panel.capture(self.controller.camera());
        }

        let (Some(window), Some(egui)) = (self.window.clone(), self.egui.as_mut()) else {
            return;
        };
        let size = window.inner_size();
        let blocked = self
            .session
            .as_ref()
            .is_some_and(|session| session.gate().is_blocking());
        let mut events = Vec::new();
        let mut applied = None;
        let scene_name = self.controller.scene().map(|scene| scene.name().to_string());
        let ui_output = egui.run_ui(&window, |ctx| {
            let frame = UiFrame {
                overlay: &self.overlay,
                views: self.controller.views(),
                current_view: self.controller.current_view(),
                transitioning: self.controller.is_transitioning(),
                orbit_mode: self.controller.camera().orbit_enabled(),
                camera_panel_open: self.camera_panel.is_open(),
                gate: self.session.as_ref().map(|session| session.gate()),
                camera: self.controller.camera(),
                helpers_visible: self.controller.helpers_visible(),
                viewport_px: Vec2::new(size.width as f32, size.height as f32),
                scene_name: scene_name.as_deref(),
            };
            events = ui::draw_overlay(ctx, &frame);
            if !blocked {
                applied = self.camera_panel.show(ctx, self.controller.camera());
            }
        });
        if let Some(inputs) = applied {
            inputs.apply_to(self.controller.camera_mut());
        }
        for event in events {
            self.handle_ui_event(event);
        }
        self.timing
            .set_update_ms(frame_start.elapsed().as_secs_f32() * 1000.0);

        let Some(render) = &mut self.render else {
            return;
        };
        let frame = FrameScene {
            scene: if blocked { None } else { self.controller.scene() },
            camera: self.controller.camera(),
            effects: self.controller.effects(),
            helpers_visible: !blocked && self.controller.helpers_visible(),
        };
        if let Err(err) = render.render(&frame, ui_output) {
            log::error!("Render failed: {}", err);
            self.fatal = Some(err);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(BASE_TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);
        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        match RenderContext::new(window.clone()) {
            Ok(render) => self.render = Some(render),
            Err(err) => {
                log::error!("Failed to initialize GPU: {}", err);
                self.fatal = Some(err);
                event_loop.exit();
                return;
            }
        }
        self.egui = Some(EguiHost::new(&window));
        self.update_target_frame_duration(&window);
        self.window = Some(window);

        if let Some((source, role)) = self.pending_source.take() {
            self.start_session(source, role);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match (&self.window, &mut self.egui) {
            (Some(window), Some(egui)) => egui.on_window_event(window, &event),
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.controller.release_movement();
                    self.pointer.left();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                let ui_keyboard = self
                    .egui
                    .as_ref()
                    .is_some_and(|egui| egui.wants_keyboard_input());
                // Releases always pass so a key held while focusing a text field cannot stick.
                if (ui_keyboard && pressed) || self.scene_input_blocked() {
                    return;
                }
                let action = input::handle_key(event.physical_key, pressed, event.repeat);
                self.handle_input_action(action);
            }
            WindowEvent::Resized(new_size) => {
                if let Some(render) = &mut self.render {
                    render.resize(new_size);
                }
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if let Some(delta) = self.pointer.moved(position) {
                    self.controller.orbit_drag(delta);
                }
                if consumed || self.ui_wants_pointer() || self.scene_input_blocked() {
                    self.controller.pointer_left(&mut self.overlay);
                } else if let Some(pointer) = self.pointer_at(position) {
                    self.controller.pointer_moved(pointer, &mut self.overlay);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer.left();
                self.controller.pointer_left(&mut self.overlay);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    if !consumed && !self.ui_wants_pointer() && !self.scene_input_blocked() {
                        self.pointer.pressed();
                    }
                }
                ElementState::Released => {
                    if let Some(position) = self.pointer.released() {
                        if let Some(pointer) = self.pointer_at(position) {
                            self.controller.click(pointer);
                        }
                    }
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                if consumed || self.ui_wants_pointer() || self.scene_input_blocked() {
                    return;
                }
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_SCROLL_LINE,
                };
                self.controller.zoom(scroll);
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                if self.fatal.is_some() {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

pub fn run(options: LaunchOptions) -> Result<(), AppError> {
    log::info!("Starting {} ({})", BASE_TITLE, options.source.display_name());
    log::info!("WASD/QE to move, F toggles orbit, H helpers, R home");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(options);
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.fatal.take() {
        return Err(err.into());
    }
    log::info!("Goodbye");
    Ok(())
}
