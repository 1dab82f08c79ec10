//! egui overlay: navigation bar, tooltip, caption, detail dialog, status
//! line and the loading screen.

pub mod camera_panel;

use crate::config::{NamedView, ObjectInfo};
use crate::loading::{GateState, LoadGate};
use crate::presentation::PresentationPort;
use crate::render::CameraRig;
use egui::{Align2, Color32, Context, FontId, RichText};
use glam::{Vec2, Vec3};
use std::time::Duration;

const TOOLTIP_OFFSET: egui::Vec2 = egui::vec2(14.0, 14.0);
const AXIS_LABEL_DISTANCE: f32 = 5.5;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    NavigateTo(String),
    OpenScene,
    ToggleCameraPanel,
    DetailClosed,
    EnterScene,
}

#[derive(Debug, Clone, PartialEq)]
struct Caption {
    text: String,
    remaining: Duration,
}

/// Visible overlay text, written through [`PresentationPort`] and drawn each frame.
#[derive(Debug, Default)]
pub struct OverlayState {
    tooltip: Option<(String, [f32; 2])>,
    caption: Option<Caption>,
    detail: Option<ObjectInfo>,
    status: Option<String>,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts down the caption; it disappears once its time is used up.
    pub fn tick(&mut self, dt: Duration) {
        if let Some(caption) = &mut self.caption {
            caption.remaining = caption.remaining.saturating_sub(dt);
            if caption.remaining.is_zero() {
                self.caption = None;
            }
        }
    }

    pub fn tooltip(&self) -> Option<(&str, [f32; 2])> {
        self.tooltip.as_ref().map(|(text, at)| (text.as_str(), *at))
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_ref().map(|caption| caption.text.as_str())
    }

    pub fn detail(&self) -> Option<&ObjectInfo> {
        self.detail.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn close_detail(&mut self) -> bool {
        self.detail.take().is_some()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }
}

impl PresentationPort for OverlayState {
    fn show_tooltip(&mut self, text: &str, at: [f32; 2]) {
        self.tooltip = Some((text.to_string(), at));
    }

    fn move_tooltip(&mut self, at: [f32; 2]) {
        if let Some((_, position)) = &mut self.tooltip {
            *position = at;
        }
    }

    fn hide_tooltip(&mut self) {
        self.tooltip = None;
    }

    fn show_caption(&mut self, text: &str, ttl: Duration) {
        self.caption = Some(Caption {
            text: text.to_string(),
            remaining: ttl,
        });
    }

    fn show_detail(&mut self, info: &ObjectInfo) {
        self.detail = Some(info.clone());
    }

    fn show_status(&mut self, text: &str) {
        self.status = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
    }

    fn hide_all(&mut self) {
        self.tooltip = None;
        self.caption = None;
        self.detail = None;
    }
}

/// Read-only state the overlay needs for one frame.
pub struct UiFrame<'a> {
    pub overlay: &'a OverlayState,
    pub views: &'a [NamedView],
    pub current_view: Option<&'a str>,
    pub transitioning: bool,
    pub orbit_mode: bool,
    pub camera_panel_open: bool,
    pub gate: Option<&'a LoadGate>,
    pub camera: &'a CameraRig,
    pub helpers_visible: bool,
    pub viewport_px: Vec2,
    pub scene_name: Option<&'a str>,
}

pub fn draw_overlay(ctx: &Context, frame: &UiFrame<'_>) -> Vec<UiEvent> {
    let mut events = Vec::new();

    if let Some(gate) = frame.gate.filter(|gate| gate.is_blocking()) {
        draw_loading_screen(ctx, gate, &mut events);
        return events;
    }

    draw_top_bar(ctx, frame, &mut events);
    if frame.helpers_visible {
        draw_axis_labels(ctx, frame.camera, frame.viewport_px);
    }
    draw_controls_hint(ctx, frame.orbit_mode);
    if let Some(status) = frame.overlay.status() {
        egui::Area::new("status".into())
            .anchor(Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
            .interactable(false)
            .show(ctx, |ui| {
                ui.label(RichText::new(status).color(Color32::LIGHT_GRAY));
            });
    }
    if let Some(text) = frame.overlay.caption() {
        egui::Area::new("caption".into())
            .anchor(Align2::CENTER_BOTTOM, egui::vec2(0.0, -60.0))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(RichText::new(text).size(18.0));
                });
            });
    }
    if let Some((text, at)) = frame.overlay.tooltip() {
        let ppp = ctx.pixels_per_point();
        let pos = egui::pos2(at[0] / ppp, at[1] / ppp) + TOOLTIP_OFFSET;
        egui::Area::new("object_tooltip".into())
            .fixed_pos(pos)
            .interactable(false)
            .order(egui::Order::Tooltip)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(text);
                });
            });
    }
    if let Some(info) = frame.overlay.detail() {
        draw_detail(ctx, info, &mut events);
    }
    events
}

fn draw_top_bar(ctx: &Context, frame: &UiFrame<'_>, events: &mut Vec<UiEvent>) {
    egui::TopBottomPanel::top("navigation").show(ctx, |ui| {
        ui.horizontal(|ui| {
            for view in frame.views {
                let label = if view.label.is_empty() {
                    view.name.as_str()
                } else {
                    view.label.as_str()
                };
                let active = frame.current_view == Some(view.name.as_str());
                let button = ui.add_enabled(
                    !frame.transitioning,
                    egui::Button::new(label).selected(active),
                );
                if button.clicked() {
                    events.push(UiEvent::NavigateTo(view.name.clone()));
                }
            }
            ui.separator();
            if ui.button("Open scene…").clicked() {
                events.push(UiEvent::OpenScene);
            }
            if ui
                .add(egui::Button::new("Camera").selected(frame.camera_panel_open))
                .clicked()
            {
                events.push(UiEvent::ToggleCameraPanel);
            }
            if let Some(name) = frame.scene_name {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(RichText::new(name).weak());
                });
            }
        });
    });
}

fn draw_controls_hint(ctx: &Context, orbit_mode: bool) {
    let mode = if orbit_mode { "Orbit" } else { "Free-fly" };
    egui::Area::new("controls".into())
        .anchor(Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(
                RichText::new(format!(
                    "{mode} | WASD move, Q/E down/up, F mode, H helpers, R home"
                ))
                .small()
                .color(Color32::GRAY),
            );
        });
}

fn draw_detail(ctx: &Context, info: &ObjectInfo, events: &mut Vec<UiEvent>) {
    let response = egui::Modal::new(egui::Id::new("object_detail")).show(ctx, |ui| {
        ui.set_max_width(420.0);
        ui.heading(&info.title);
        ui.add_space(6.0);
        ui.label(&info.description);
        if !info.content.is_empty() {
            ui.add_space(6.0);
            for item in &info.content {
                ui.label(format!("• {}", item));
            }
        }
        ui.add_space(10.0);
        ui.button("Close").clicked()
    });
    if response.inner || response.should_close() {
        events.push(UiEvent::DetailClosed);
    }
}

fn draw_loading_screen(ctx: &Context, gate: &LoadGate, events: &mut Vec<UiEvent>) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.35);
            match gate.state() {
                GateState::Loading { progress } => {
                    ui.heading("Loading scene");
                    ui.add_space(8.0);
                    ui.add(
                        egui::ProgressBar::new(*progress)
                            .desired_width(240.0)
                            .show_percentage(),
                    );
                }
                GateState::Loaded { .. } => {
                    ui.heading("Scene loaded");
                    ui.add_space(8.0);
                    ui.spinner();
                }
                GateState::EnterReady => {
                    ui.heading("Scene loaded");
                    ui.add_space(8.0);
                    if ui.button(RichText::new("Enter").size(20.0)).clicked() {
                        events.push(UiEvent::EnterScene);
                    }
                }
                GateState::Failed(_) => {
                    ui.heading("Error");
                    ui.label(gate.status_text());
                }
                GateState::Entered => {}
            }
        });
    });
}

fn draw_axis_labels(ctx: &Context, camera: &CameraRig, viewport_px: Vec2) {
    let ppp = ctx.pixels_per_point();
    let painter = ctx.layer_painter(egui::LayerId::background());
    let labels = [
        ("X", Vec3::X, Color32::from_rgb(0xff, 0x44, 0x44)),
        ("Y", Vec3::Y, Color32::from_rgb(0x44, 0xff, 0x44)),
        ("Z", Vec3::Z, Color32::from_rgb(0x44, 0x88, 0xff)),
    ];
    for (text, axis, color) in labels {
        let Some(px) = camera.project(axis * AXIS_LABEL_DISTANCE, viewport_px) else {
            continue;
        };
        painter.text(
            egui::pos2(px.x / ppp, px.y / ppp),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(16.0),
            color,
        );
    }
}
