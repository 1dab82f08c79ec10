//! Line geometry for the orientation helpers: axes, reference grids and the
//! origin marker.

use glam::{Mat4, Vec3};

pub const AXES_LENGTH: f32 = 5.0;
pub const GRID_SIZE: f32 = 10.0;
pub const GRID_DIVISIONS: u32 = 10;
pub const ORIGIN_MARKER_RADIUS: f32 = 0.1;

const GRID_CENTER_COLOR: [f32; 4] = [0x44 as f32 / 255.0, 0x44 as f32 / 255.0, 0x44 as f32 / 255.0, 1.0];
const GRID_LINE_COLOR: [f32; 4] = [0x22 as f32 / 255.0, 0x22 as f32 / 255.0, 0x22 as f32 / 255.0, 1.0];
pub const ORIGIN_MARKER_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPlane {
    XY,
    XZ,
    YZ,
}

impl GridPlane {
    /// The two in-plane axes.
    fn axes(self) -> (Vec3, Vec3) {
        match self {
            GridPlane::XY => (Vec3::X, Vec3::Y),
            GridPlane::XZ => (Vec3::X, Vec3::Z),
            GridPlane::YZ => (Vec3::Y, Vec3::Z),
        }
    }
}

fn segment(out: &mut Vec<LineVertex>, a: Vec3, b: Vec3, color: [f32; 4]) {
    out.push(LineVertex {
        position: a.to_array(),
        color,
    });
    out.push(LineVertex {
        position: b.to_array(),
        color,
    });
}

/// X red, Y green, Z blue, each starting at the origin.
pub fn axes_lines(length: f32) -> Vec<LineVertex> {
    let mut out = Vec::with_capacity(6);
    segment(&mut out, Vec3::ZERO, Vec3::X * length, [1.0, 0.0, 0.0, 1.0]);
    segment(&mut out, Vec3::ZERO, Vec3::Y * length, [0.0, 1.0, 0.0, 1.0]);
    segment(&mut out, Vec3::ZERO, Vec3::Z * length, [0.0, 0.0, 1.0, 1.0]);
    out
}

/// Square grid centred on the origin; the two centre lines use a brighter colour.
pub fn grid_lines(plane: GridPlane, size: f32, divisions: u32) -> Vec<LineVertex> {
    let divisions = divisions.max(1);
    let (u, v) = plane.axes();
    let half = size * 0.5;
    let step = size / divisions as f32;
    let center = divisions / 2;
    let mut out = Vec::with_capacity((divisions as usize + 1) * 4);
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if divisions % 2 == 0 && i == center {
            GRID_CENTER_COLOR
        } else {
            GRID_LINE_COLOR
        };
        segment(&mut out, u * -half + v * k, u * half + v * k, color);
        segment(&mut out, v * -half + u * k, v * half + u * k, color);
    }
    out
}

/// Everything toggled by the helpers key, as one line list.
pub fn helper_lines() -> Vec<LineVertex> {
    let mut out = axes_lines(AXES_LENGTH);
    for plane in [GridPlane::XY, GridPlane::XZ, GridPlane::YZ] {
        out.extend(grid_lines(plane, GRID_SIZE, GRID_DIVISIONS));
    }
    out
}

pub fn origin_marker_transform() -> Mat4 {
    Mat4::from_scale(Vec3::splat(ORIGIN_MARKER_RADIUS))
}
