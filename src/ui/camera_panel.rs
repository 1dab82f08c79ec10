//! Floating panel for reading and tweaking the live camera, and for copying
//! its pose as a ready-to-paste view entry.

use crate::config::NamedView;
use crate::render::{CameraPose, CameraRig};
use egui::Context;

/// Editable copy of the camera state shown in the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraInputs {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraInputs {
    pub fn from_rig(rig: &CameraRig) -> Self {
        Self {
            position: rig.pose.position.to_array(),
            target: rig.pose.target.to_array(),
            fov_deg: rig.fov_deg,
            near: rig.near,
            far: rig.far,
        }
    }

    pub fn apply_to(&self, rig: &mut CameraRig) {
        rig.pose = CameraPose::new(self.position, self.target);
        rig.fov_deg = self.fov_deg.clamp(1.0, 179.0);
        rig.near = self.near.max(1e-4);
        rig.far = self.far.max(rig.near + 1e-3);
    }
}

pub struct CameraPanel {
    open: bool,
    inputs: CameraInputs,
    snippet: String,
}

impl CameraPanel {
    pub fn new(rig: &CameraRig) -> Self {
        Self {
            open: false,
            inputs: CameraInputs::from_rig(rig),
            snippet: String::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self, rig: &CameraRig) {
        self.open = !self.open;
        if self.open {
            self.capture(rig);
        }
    }

    #[cfg(test)]
    pub fn inputs(&self) -> &CameraInputs {
        &self.inputs
    }

    pub fn capture(&mut self, rig: &CameraRig) {
        self.inputs = CameraInputs::from_rig(rig);
    }

    /// Captures the rig and rebuilds the snippet text.
    pub fn refresh_snippet(&mut self, rig: &CameraRig) -> &str {
        self.capture(rig);
        self.snippet = camera_snippet(rig);
        &self.snippet
    }

    /// Draws the panel. Returns the inputs when the user pressed Apply.
    pub fn show(&mut self, ctx: &Context, rig: &CameraRig) -> Option<CameraInputs> {
        if !self.open {
            return None;
        }
        let mut open = self.open;
        let mut applied = None;
        egui::Window::new("Camera")
            .open(&mut open)
            .resizable(false)
            .default_pos(egui::pos2(12.0, 48.0))
            .show(ctx, |ui| {
                egui::Grid::new("camera_inputs")
                    .num_columns(4)
                    .spacing([6.0, 4.0])
                    .show(ui, |ui| {
                        vector_row(ui, "Position", &mut self.inputs.position);
                        vector_row(ui, "Target", &mut self.inputs.target);
                    });
                ui.horizontal(|ui| {
                    ui.label("FOV");
                    ui.add(
                        egui::DragValue::new(&mut self.inputs.fov_deg)
                            .speed(0.5)
                            .range(1.0..=179.0),
                    );
                    ui.label("Near");
                    ui.add(
                        egui::DragValue::new(&mut self.inputs.near)
                            .speed(0.01)
                            .range(0.0001..=100.0),
                    );
                    ui.label("Far");
                    ui.add(egui::DragValue::new(&mut self.inputs.far).speed(1.0));
                });
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Apply").clicked() {
                        applied = Some(self.inputs);
                    }
                    if ui.button("Get current").clicked() {
                        self.capture(rig);
                    }
                    if ui.button("Copy").clicked() {
                        let text = self.refresh_snippet(rig).to_string();
                        ui.ctx().copy_text(text);
                        log::info!("Camera info copied to clipboard");
                    }
                });
                if !self.snippet.is_empty() {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.snippet.as_str())
                            .font(egui::TextStyle::Monospace)
                            .desired_rows(12),
                    );
                }
            });
        self.open = open;
        applied
    }
}

fn vector_row(ui: &mut egui::Ui, label: &str, values: &mut [f32; 3]) {
    ui.label(label);
    for value in values.iter_mut() {
        ui.add(egui::DragValue::new(value).speed(0.05).max_decimals(5));
    }
    ui.end_row();
}

fn round5(value: f32) -> f32 {
    (value * 100_000.0).round() / 100_000.0
}

/// Text describing the current camera: a view entry in the config format
/// followed by distance, rotation and FOV.
pub fn camera_snippet(rig: &CameraRig) -> String {
    let view = NamedView {
        name: "custom".to_string(),
        label: "Custom".to_string(),
        position: rig.pose.position.to_array().map(round5),
        target: rig.pose.target.to_array().map(round5),
        caption: String::new(),
    };
    let entry = serde_json::to_string_pretty(&view)
        .unwrap_or_else(|err| format!("<failed to encode view: {}>", err));
    let rotation = rig.rotation_euler();
    format!(
        "{entry}\ndistance: {:.5}\nrotation (rad): [{:.5}, {:.5}, {:.5}]\nrotation (deg): [{:.2}, {:.2}, {:.2}]\nfov: {:.1}",
        rig.pose.distance(),
        rotation.x,
        rotation.y,
        rotation.z,
        rotation.x.to_degrees(),
        rotation.y.to_degrees(),
        rotation.z.to_degrees(),
        rig.fov_deg,
    )
}
