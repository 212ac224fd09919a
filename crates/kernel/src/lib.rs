//! World Kernel: the ordered voxel collection edited by picking.
//!
//! # Invariants
//! - A voxel's identity is its index; removal compacts and renumbers survivors.
//! - Every mutation bumps the generation and produces an event record.

pub mod world;

pub use world::{InstanceSnapshot, Voxel, World, WorldEvent};
