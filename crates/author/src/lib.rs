//! In-World Authoring: turns decoded picks into voxel edits.
//!
//! # Invariants
//! - Deletes only ever target a cube face; sentinel samples never remove anything.
//! - Every applied edit goes through the World and produces its event record.
//! - The control bar always has exactly one selected tool.

mod editor;
mod tools;

pub use editor::{EditOutcome, Editor, IgnoreReason};
pub use tools::{ControlBar, DEFAULT_SWATCHES, Tool, ToolSelection};
