use cubeedit_common::PickSample;
use cubeedit_kernel::InstanceSnapshot;
use glam::{Mat4, UVec2, Vec2, Vec3};
use std::fmt::Write;

/// Matrices and viewport for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub view: Mat4,
    pub projection: Mat4,
    /// Camera position in world space.
    pub eye: Vec3,
    pub viewport: UVec2,
}

impl RenderView {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl Default for RenderView {
    fn default() -> Self {
        let viewport = UVec2::new(800, 600);
        Self {
            view: Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(60f32.to_radians(), 800.0 / 600.0, 0.1, 100.0),
            eye: Vec3::new(0.0, 0.0, 10.0),
            viewport,
        }
    }
}

/// A pixel on the pick surface. `y` grows upward from the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickPixel {
    pub x: u32,
    pub y: u32,
}

impl PickPixel {
    /// Convert a window position (top-left origin) into pick coordinates:
    /// `y = viewport_height - window_y`. Returns `None` outside the viewport.
    pub fn from_window(position: Vec2, viewport: UVec2) -> Option<Self> {
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let x = position.x.floor() as u32;
        let window_y = position.y.floor() as u32;
        if x >= viewport.x || window_y >= viewport.y {
            return None;
        }
        Some(Self {
            x,
            y: viewport.y - window_y,
        })
    }

    /// Row index counted from the top, as stored in a texture.
    pub fn texture_row(self, viewport_height: u32) -> u32 {
        viewport_height.saturating_sub(self.y)
    }
}

/// Receives per-instance data whenever the world changes.
pub trait InstanceSink {
    fn upload_instances(&mut self, snapshot: &InstanceSnapshot);
}

/// Reads one sample of the ID target.
pub trait PickSurface {
    /// `None` when the pixel cannot be read; callers treat that as background.
    fn read_pick(&mut self, pixel: PickPixel) -> Option<PickSample>;
}

/// Renderer-agnostic interface.
///
/// A renderer sees the world only through uploaded [`InstanceSnapshot`]s and
/// never mutates it.
pub trait Renderer {
    type Output;

    /// Draw one frame from the last uploaded instances.
    fn render(&mut self, view: &RenderView) -> Self::Output;
}

/// Text renderer for the CLI and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    instances: InstanceSnapshot,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstanceSink for DebugTextRenderer {
    fn upload_instances(&mut self, snapshot: &InstanceSnapshot) {
        self.instances = snapshot.clone();
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Voxels (generation={}) ===",
            self.instances.generation
        );
        let _ = writeln!(out, "Voxels: {}", self.instances.len());
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) viewport={}x{}",
            view.eye.x, view.eye.y, view.eye.z, view.viewport.x, view.viewport.y
        );
        let rows = self
            .instances
            .positions
            .iter()
            .zip(&self.instances.colours)
            .zip(&self.instances.ids);
        for (index, ((position, colour), id)) in rows.enumerate() {
            let _ = writeln!(
                out,
                "  [{index:>3}] id={:02X}{:02X}{:02X} pos=({}, {}, {}) colour={}",
                id[0],
                id[1],
                id[2],
                position.x,
                position.y,
                position.z,
                colour.to_hex()
            );
        }
        out
    }
}
