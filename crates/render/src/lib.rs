//! Rendering Adapter: camera and renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers never mutate the world; they only see uploaded instance snapshots.
//! - The view matrix is derived from the orbit values on every read.
//! - `OrbitCamera::rotation` stays in [0, 360) and `pan` within the configured limit.
//! - Pick reads use bottom-left pixel coordinates on every surface.

pub mod camera;
pub mod raycast;
mod renderer;

pub use camera::{CameraConfig, CameraState, DEFAULT_SIM_RATE_MS, OrbitAxes, OrbitCamera, PanRange};
pub use raycast::{GROUND_LEVEL, Ray, RaycastPicker};
pub use renderer::{
    DebugTextRenderer, InstanceSink, PickPixel, PickSurface, RenderView, Renderer,
};
