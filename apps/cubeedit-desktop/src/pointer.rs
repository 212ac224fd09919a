//! Translation of winit mouse and touch events into the editor's pointer model.

use cubeedit_input::{Buttons, PointerEvent, PointerKind, TouchInput, TouchPhase};
use glam::Vec2;
use winit::event::{MouseButton, TouchPhase as WinitTouchPhase};

/// Tracks held buttons, the cursor and active touches between winit events,
/// which report them one change at a time.
#[derive(Debug, Default)]
pub struct PointerTracker {
    buttons: Buttons,
    cursor: Vec2,
    /// Active touches in the order they started.
    touches: Vec<(u64, Vec2)>,
}

fn mask_for(button: MouseButton) -> Option<Buttons> {
    match button {
        MouseButton::Left => Some(Buttons::PRIMARY),
        MouseButton::Right => Some(Buttons::SECONDARY),
        MouseButton::Middle => Some(Buttons::MIDDLE),
        _ => None,
    }
}

impl PointerTracker {
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn cursor_moved(&mut self, position: Vec2, now: f64) -> PointerEvent {
        self.cursor = position;
        PointerEvent::new(PointerKind::Move, position.x, position.y, self.buttons, now)
    }

    /// Press or release a mouse button. Buttons the editor has no use for are
    /// dropped. Like browser pointer events, only the first press starts a
    /// gesture and only the last release ends it; presses in between just
    /// join the held mask.
    pub fn button(&mut self, button: MouseButton, pressed: bool, now: f64) -> Option<PointerEvent> {
        let mask = mask_for(button)?;
        let held = self.buttons;
        let kind = if pressed {
            self.buttons = held.union(mask);
            if held != Buttons::NONE {
                return None;
            }
            PointerKind::Down
        } else {
            if !held.contains(mask) {
                return None;
            }
            self.buttons = Buttons(held.0 & !mask.0);
            if self.buttons != Buttons::NONE {
                return None;
            }
            PointerKind::Up
        };
        Some(PointerEvent::new(
            kind,
            self.cursor.x,
            self.cursor.y,
            self.buttons,
            now,
        ))
    }

    /// The cursor left the window. Held buttons are forgotten since their
    /// release will not be reported.
    pub fn left(&mut self, now: f64) -> PointerEvent {
        self.buttons = Buttons::NONE;
        PointerEvent::new(PointerKind::Leave, self.cursor.x, self.cursor.y, Buttons::NONE, now)
    }

    pub fn touch(&mut self, id: u64, phase: WinitTouchPhase, location: Vec2, now: f64) -> TouchInput {
        let phase = match phase {
            WinitTouchPhase::Started => {
                self.touches.retain(|(t, _)| *t != id);
                self.touches.push((id, location));
                TouchPhase::Start
            }
            WinitTouchPhase::Moved => {
                if let Some(entry) = self.touches.iter_mut().find(|(t, _)| *t == id) {
                    entry.1 = location;
                }
                TouchPhase::Move
            }
            WinitTouchPhase::Ended => {
                self.touches.retain(|(t, _)| *t != id);
                TouchPhase::End
            }
            WinitTouchPhase::Cancelled => {
                self.touches.retain(|(t, _)| *t != id);
                TouchPhase::Cancel
            }
        };
        let point = self.touches.first().map_or(location, |(_, p)| *p);
        TouchInput {
            phase,
            point,
            touch_count: self.touches.len(),
            timestamp_ms: now,
        }
    }
}
