use glam::Vec2;

/// Which camera control pair a drag drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragButton {
    /// Rotate on the horizontal axis, pan on the vertical axis.
    Primary,
    /// Elevate on the horizontal axis, zoom on the vertical axis.
    Secondary,
}

/// A high-level action produced by the gesture normalizer.
///
/// The camera and editor consume actions, never raw input events, so mouse
/// and touch drive exactly the same logic. Times are milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A pointer went down; the camera enters its dragging state.
    DragStart { now: f64 },
    /// Movement along the locked axes since the previous dispatch.
    /// An axis outside the lock is `None`.
    Drag {
        button: DragButton,
        dx: Option<f32>,
        dy: Option<f32>,
        now: f64,
        delta: f64,
    },
    /// The pointer was released. `delta` is the time since the last dispatch.
    DragEnd { now: f64, delta: f64 },
    /// The pointer left the surface mid-session; motion stops dead.
    DragCancel { now: f64 },
    /// Released without ever dragging: a pick request at this window position.
    Click { position: Vec2 },
}

impl Action {
    pub fn is_click(&self) -> bool {
        matches!(self, Action::Click { .. })
    }
}
