//! wgpu render backend for the voxel editor.
//!
//! Draws the ground plane and instanced cubes into the colour target and, in
//! the same pass, into an offscreen `Rgba8Unorm` pick target whose texels
//! follow the pick-buffer byte protocol.
//!
//! # Invariants
//! - Renderer never mutates world state; instances come from uploaded snapshots.
//! - The pick target is cleared to the background sample every frame.
//! - Passes run in a fixed order: ground, then cubes.

mod error;
mod gpu;
mod passes;
mod shaders;

pub use error::RenderError;
pub use gpu::{GpuPickTarget, ID_FORMAT, WgpuRenderer};
pub use passes::{CubePass, GroundPass, RenderPass, run_passes};
