use crate::renderer::RenderView;
use glam::{Mat4, UVec2, Vec3};
use serde::{Deserialize, Serialize};

/// One value per orbit axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrbitAxes {
    pub distance: f32,
    pub ascension: f32,
    pub rotation: f32,
    pub pan: f32,
}

impl OrbitAxes {
    pub const ZERO: Self = Self {
        distance: 0.0,
        ascension: 0.0,
        rotation: 0.0,
        pan: 0.0,
    };

    pub const fn new(distance: f32, ascension: f32, rotation: f32, pan: f32) -> Self {
        Self {
            distance,
            ascension,
            rotation,
            pan,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Pan clamp variants, in degrees either side of level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanRange {
    /// ±89.9°: the camera never tips over the poles.
    #[default]
    Standard,
    /// ±179.9°: the camera may swing under the scene.
    Extended,
}

impl PanRange {
    pub fn limit(self) -> f32 {
        match self {
            PanRange::Standard => 89.9,
            PanRange::Extended => 179.9,
        }
    }
}

/// Simulation period used when a configured one is not positive.
pub const DEFAULT_SIM_RATE_MS: f64 = 1000.0 / 60.0;

/// Starting pose and tuning of an [`OrbitCamera`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Fixed eye position the orbit is built around; looks at the origin.
    pub anchor: Vec3,
    pub ascension: f32,
    pub rotation: f32,
    pub pan_range: PanRange,
    /// Units (or degrees) per pixel of drag.
    pub sensitivity: OrbitAxes,
    /// Velocities below these snap to zero.
    pub rest_threshold: OrbitAxes,
    /// Velocity multiplier per simulation tick.
    pub decay: f32,
    /// Simulation period in milliseconds.
    pub sim_rate_ms: f64,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            anchor: Vec3::new(0.0, 6.0, 12.0),
            ascension: 0.0,
            rotation: 30.0,
            pan_range: PanRange::Standard,
            sensitivity: OrbitAxes::new(0.005, 0.002, 0.1, 0.03),
            rest_threshold: OrbitAxes::new(0.005, 0.002, 0.1, 0.03),
            decay: 0.95,
            sim_rate_ms: DEFAULT_SIM_RATE_MS,
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Idle,
    Dragging,
}

/// Damped orbit camera around a fixed anchor.
///
/// Drags move the orbit immediately and leave a per-tick velocity behind; once
/// the pointer is released, [`OrbitCamera::update`] decays that velocity
/// tick by tick until every axis snaps to rest.
/// Camera motion is NOT part of the world: it never touches voxel state.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    config: CameraConfig,
    distance: f32,
    ascension: f32,
    rotation: f32,
    pan: f32,
    velocity: OrbitAxes,
    state: CameraState,
    last_action: f64,
    viewport: UVec2,
    projection: Mat4,
}

impl OrbitCamera {
    pub fn new(mut config: CameraConfig, width: u32, height: u32) -> Self {
        if config.sim_rate_ms.is_nan() || config.sim_rate_ms <= 0.0 {
            tracing::warn!(sim_rate_ms = config.sim_rate_ms, "invalid sim rate, using default");
            config.sim_rate_ms = DEFAULT_SIM_RATE_MS;
        }
        let mut camera = Self {
            config,
            distance: 0.0_f32.min(config.anchor.z - 0.5),
            ascension: config.ascension,
            rotation: wrap_degrees(config.rotation),
            pan: 0.0,
            velocity: OrbitAxes::ZERO,
            state: CameraState::Idle,
            last_action: 0.0,
            viewport: UVec2::ONE,
            projection: Mat4::IDENTITY,
        };
        camera.resize(width, height);
        camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn anchor(&self) -> Vec3 {
        self.config.anchor
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn ascension(&self) -> f32 {
        self.ascension
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Current orbit values as one bundle.
    pub fn pose(&self) -> OrbitAxes {
        OrbitAxes::new(self.distance, self.ascension, self.rotation, self.pan)
    }

    pub fn velocity(&self) -> OrbitAxes {
        self.velocity
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == CameraState::Dragging
    }

    /// No drag in progress and no momentum left.
    pub fn is_at_rest(&self) -> bool {
        !self.is_dragging() && self.velocity.is_zero()
    }

    pub fn last_action(&self) -> f64 {
        self.last_action
    }

    pub fn viewport(&self) -> UVec2 {
        self.viewport
    }

    /// Upper bound on `distance`: half a unit short of the anchor plane.
    pub fn max_distance(&self) -> f32 {
        self.config.anchor.z - 0.5
    }

    pub fn pan_limit(&self) -> f32 {
        self.config.pan_range.limit()
    }

    /// Regenerate the cached projection for a new viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = UVec2::new(width.max(1), height.max(1));
        self.projection = Mat4::perspective_rh(
            self.config.fov_degrees.to_radians(),
            self.viewport.x as f32 / self.viewport.y as f32,
            self.config.near,
            self.config.far,
        );
    }

    /// View matrix, rebuilt from the orbit values on every call.
    ///
    /// The order is fixed: look at the origin from the anchor, slide along the
    /// view axis, pitch, yaw, then lift the target. Swapping pitch and yaw
    /// changes how drags feel.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.config.anchor, Vec3::ZERO, Vec3::Y)
            * Mat4::from_translation(Vec3::new(0.0, 0.0, self.distance))
            * Mat4::from_rotation_x(self.pan.to_radians())
            * Mat4::from_rotation_y(self.rotation.to_radians())
            * Mat4::from_translation(Vec3::new(0.0, self.ascension, 0.0))
    }

    /// Cached perspective projection for the current viewport.
    pub fn perspective(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }

    /// World-space eye position implied by the current view.
    pub fn eye(&self) -> Vec3 {
        self.view().inverse().transform_point3(Vec3::ZERO)
    }

    pub fn render_view(&self) -> RenderView {
        RenderView {
            view: self.view(),
            projection: self.projection,
            eye: self.eye(),
            viewport: self.viewport,
        }
    }

    pub fn drag_start(&mut self, now: f64) {
        self.velocity = OrbitAxes::ZERO;
        self.last_action = now;
        self.state = CameraState::Dragging;
    }

    /// Primary horizontal drag: yaw around the vertical axis.
    pub fn drag_rotate_primary(&mut self, dx: f32, now: f64, delta: f64) {
        let step = dx * self.config.sensitivity.rotation;
        self.rotate(step);
        self.last_action = now;
        self.velocity.rotation = self.per_tick(step, delta);
    }

    /// Primary vertical drag: pitch.
    pub fn drag_pan_primary(&mut self, dy: f32, now: f64, delta: f64) {
        let step = dy * self.config.sensitivity.pan;
        self.tilt(step);
        self.last_action = now;
        self.velocity.pan = self.per_tick(step, delta);
    }

    /// Secondary horizontal drag: raise or lower the look-at target.
    pub fn drag_elevate_secondary(&mut self, dx: f32, now: f64, delta: f64) {
        let step = dx * self.config.sensitivity.ascension;
        self.climb(step);
        self.last_action = now;
        self.velocity.ascension = self.per_tick(step, delta);
    }

    /// Secondary vertical drag: zoom along the view axis.
    pub fn drag_zoom_secondary(&mut self, dy: f32, now: f64, delta: f64) {
        let step = dy * self.config.sensitivity.distance;
        self.slide(step);
        self.last_action = now;
        self.velocity.distance = self.per_tick(step, delta);
    }

    /// Release. A pointer that sat still for more than two ticks first means "stop".
    pub fn drag_end(&mut self, now: f64, delta: f64) {
        if !self.is_dragging() {
            return;
        }
        if delta > self.config.sim_rate_ms * 2.0 {
            self.velocity = OrbitAxes::ZERO;
        }
        self.last_action = now;
        self.state = CameraState::Idle;
    }

    /// Pointer left the surface: stop dead.
    pub fn drag_cancel(&mut self, now: f64) {
        self.velocity = OrbitAxes::ZERO;
        self.last_action = now;
        self.state = CameraState::Idle;
    }

    /// Advance momentum by one simulation tick. Does nothing while dragging.
    pub fn update(&mut self) {
        if self.is_dragging() {
            return;
        }
        let decay = self.config.decay;
        let rest = self.config.rest_threshold;

        self.velocity.distance *= decay;
        self.velocity.ascension *= decay;
        self.velocity.rotation *= decay;
        self.velocity.pan *= decay;

        if self.velocity.distance.abs() < rest.distance {
            self.velocity.distance = 0.0;
        } else {
            self.slide(self.velocity.distance);
        }
        if self.velocity.ascension.abs() < rest.ascension {
            self.velocity.ascension = 0.0;
        } else {
            self.climb(self.velocity.ascension);
        }
        if self.velocity.rotation.abs() < rest.rotation {
            self.velocity.rotation = 0.0;
        } else {
            self.rotate(self.velocity.rotation);
        }
        if self.velocity.pan.abs() < rest.pan {
            self.velocity.pan = 0.0;
        } else {
            self.tilt(self.velocity.pan);
        }
    }

    /// Convert a step taken over `delta` ms into a step per simulation tick.
    fn per_tick(&self, step: f32, delta: f64) -> f32 {
        if delta > 0.0 {
            step * (self.config.sim_rate_ms / delta) as f32
        } else {
            step
        }
    }

    fn tilt(&mut self, step: f32) {
        let limit = self.pan_limit();
        self.pan = (self.pan + step).clamp(-limit, limit);
    }

    fn rotate(&mut self, step: f32) {
        self.rotation = wrap_degrees(self.rotation + step);
    }

    fn slide(&mut self, step: f32) {
        self.distance = (self.distance + step).min(self.max_distance());
    }

    fn climb(&mut self, step: f32) {
        self.ascension += step;
    }
}

/// Wrap an angle into [0, 360).
fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
