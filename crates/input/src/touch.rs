//! Touch input is replayed as synthetic pointer events.
//!
//! The first touch point supplies the coordinates and the number of touches
//! picks the button: one finger behaves like the primary button, two or more
//! like the secondary. Callers must also suppress the platform's default
//! scroll/zoom handling for every touch they forward.

use crate::gesture::{Buttons, PointerEvent, PointerKind};
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// One touch event, reduced to what the pointer pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchInput {
    pub phase: TouchPhase,
    /// Position of the first touch point, window coordinates.
    pub point: Vec2,
    /// Touches currently on the surface, including this one for `Start`/`Move`.
    pub touch_count: usize,
    pub timestamp_ms: f64,
}

impl TouchInput {
    /// Synthetic button mask for a number of simultaneous touches.
    pub fn buttons_for(touch_count: usize) -> Buttons {
        match touch_count {
            0 => Buttons::NONE,
            1 => Buttons::PRIMARY,
            _ => Buttons::SECONDARY,
        }
    }

    /// Whether the platform's own scroll and zoom handling must be cancelled
    /// for this touch. Always true: the editor consumes every touch it is
    /// given, whatever the phase or touch count.
    pub fn suppresses_default(&self) -> bool {
        true
    }

    pub fn to_pointer(&self) -> PointerEvent {
        let kind = match self.phase {
            TouchPhase::Start => PointerKind::Down,
            TouchPhase::Move => PointerKind::Move,
            TouchPhase::End => PointerKind::Up,
            TouchPhase::Cancel => PointerKind::Leave,
        };
        PointerEvent {
            kind,
            position: self.point,
            buttons: Self::buttons_for(self.touch_count),
            timestamp_ms: self.timestamp_ms,
        }
    }
}
