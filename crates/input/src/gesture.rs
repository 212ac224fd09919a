use crate::action::{Action, DragButton};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Pressed-button mask in the browser `buttons` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Buttons(pub u8);

impl Buttons {
    pub const NONE: Self = Self(0);
    pub const PRIMARY: Self = Self(1);
    pub const SECONDARY: Self = Self(2);
    pub const MIDDLE: Self = Self(4);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Camera control pair for this mask. Secondary wins when both are held.
    pub fn drag_button(self) -> Option<DragButton> {
        if self.contains(Self::SECONDARY) {
            Some(DragButton::Secondary)
        } else if self.contains(Self::PRIMARY) {
            Some(DragButton::Primary)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Leave,
}

/// A raw pointer event in window coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Vec2,
    pub buttons: Buttons,
    pub timestamp_ms: f64,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f32, y: f32, buttons: Buttons, timestamp_ms: f64) -> Self {
        Self {
            kind,
            position: Vec2::new(x, y),
            buttons,
            timestamp_ms,
        }
    }
}

/// Tuning for click/drag classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Net movement in pixels before a press becomes a drag.
    pub move_threshold: f32,
    /// Share of net movement one axis needs to claim the whole session.
    pub lock_ratio: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            move_threshold: 15.0,
            lock_ratio: 0.7,
        }
    }
}

/// Axes a drag session dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisLock {
    X,
    Y,
    Both,
}

impl AxisLock {
    fn decide(net: Vec2, ratio: f32) -> Self {
        let total = net.x + net.y;
        if net.x / total > ratio {
            AxisLock::X
        } else if net.y / total > ratio {
            AxisLock::Y
        } else {
            AxisLock::Both
        }
    }

    fn allows_x(self) -> bool {
        matches!(self, AxisLock::X | AxisLock::Both)
    }

    fn allows_y(self) -> bool {
        matches!(self, AxisLock::Y | AxisLock::Both)
    }
}

#[derive(Debug, Clone)]
struct PointerSession {
    button: DragButton,
    anchor: Vec2,
    last: Vec2,
    /// Signed movement not yet dispatched.
    pending: Vec2,
    /// Unsigned movement since pointer-down; never cleared.
    net: Vec2,
    lock: Option<AxisLock>,
    last_dispatch: f64,
}

/// Turns pointer events into click and drag actions.
///
/// A press stays a potential click until its net movement crosses the
/// threshold. At that moment the dominant axis is locked in for the rest of
/// the session and every later move dispatches only that axis.
#[derive(Debug, Clone, Default)]
pub struct GestureNormalizer {
    config: GestureConfig,
    session: Option<PointerSession>,
}

impl GestureNormalizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Whether a pointer is currently held.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The current session's axis lock, once decided.
    pub fn lock(&self) -> Option<AxisLock> {
        self.session.as_ref().and_then(|s| s.lock)
    }

    /// Where the current session started.
    pub fn anchor(&self) -> Option<Vec2> {
        self.session.as_ref().map(|s| s.anchor)
    }

    pub fn handle(&mut self, event: &PointerEvent) -> Vec<Action> {
        match event.kind {
            PointerKind::Down => self.pointer_down(event),
            PointerKind::Move => self.pointer_move(event),
            PointerKind::Up => self.pointer_up(event),
            PointerKind::Leave => self.pointer_leave(event),
        }
    }

    fn pointer_down(&mut self, event: &PointerEvent) -> Vec<Action> {
        let Some(button) = event.buttons.drag_button() else {
            tracing::debug!(mask = event.buttons.0, "pointer down without a drag button ignored");
            return Vec::new();
        };
        self.session = Some(PointerSession {
            button,
            anchor: event.position,
            last: event.position,
            pending: Vec2::ZERO,
            net: Vec2::ZERO,
            lock: None,
            last_dispatch: event.timestamp_ms,
        });
        vec![Action::DragStart {
            now: event.timestamp_ms,
        }]
    }

    fn pointer_move(&mut self, event: &PointerEvent) -> Vec<Action> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let step = event.position - session.last;
        session.last = event.position;
        session.pending += step;
        session.net += step.abs();

        let lock = match session.lock {
            Some(lock) => lock,
            None => {
                let total = session.net.x + session.net.y;
                if total < self.config.move_threshold || total <= 0.0 {
                    return Vec::new();
                }
                let lock = AxisLock::decide(session.net, self.config.lock_ratio);
                tracing::debug!(?lock, net = ?session.net, "drag axis locked");
                session.lock = Some(lock);
                lock
            }
        };

        let dx = lock.allows_x().then_some(session.pending.x);
        let dy = lock.allows_y().then_some(session.pending.y);
        session.pending = Vec2::ZERO;
        let delta = event.timestamp_ms - session.last_dispatch;
        session.last_dispatch = event.timestamp_ms;

        vec![Action::Drag {
            button: session.button,
            dx,
            dy,
            now: event.timestamp_ms,
            delta,
        }]
    }

    fn pointer_up(&mut self, event: &PointerEvent) -> Vec<Action> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        let end = Action::DragEnd {
            now: event.timestamp_ms,
            delta: event.timestamp_ms - session.last_dispatch,
        };
        if session.lock.is_some() {
            vec![end]
        } else {
            vec![
                end,
                Action::Click {
                    position: event.position,
                },
            ]
        }
    }

    fn pointer_leave(&mut self, event: &PointerEvent) -> Vec<Action> {
        if self.session.take().is_none() {
            return Vec::new();
        }
        vec![Action::DragCancel {
            now: event.timestamp_ms,
        }]
    }
}
