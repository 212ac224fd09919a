//! Input normalization: raw pointer and touch events in, camera actions out.
//!
//! # Invariants
//! - Mouse and touch share one pipeline; touch is translated, never special-cased.
//! - A session that dispatched a drag can never produce a click.
//! - The axis lock is decided once per session and never revisited.

pub mod action;
pub mod gesture;
pub mod touch;

pub use action::{Action, DragButton};
pub use gesture::{AxisLock, Buttons, GestureConfig, GestureNormalizer, PointerEvent, PointerKind};
pub use touch::{TouchInput, TouchPhase};
