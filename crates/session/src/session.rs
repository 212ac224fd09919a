use crate::clock::SimClock;
use crate::config::SessionConfig;
use cubeedit_author::{ControlBar, EditOutcome, Editor};
use cubeedit_common::PickSample;
use cubeedit_input::{Action, DragButton, GestureNormalizer, PointerEvent, TouchInput};
use cubeedit_kernel::World;
use cubeedit_render::{InstanceSink, OrbitCamera, PickPixel, PickSurface, RenderView};
use glam::Vec2;

/// One editing session: world, camera, input state and tools.
///
/// Input flows one way: pointer events become actions, drag actions move the
/// camera, and click actions become a pick read, an edit and, if the world
/// changed, an instance upload to the same surface.
pub struct EditorSession {
    world: World,
    camera: OrbitCamera,
    gestures: GestureNormalizer,
    editor: Editor,
    controls: ControlBar,
    clock: SimClock,
    uploaded: Option<u64>,
}

impl EditorSession {
    /// Start on the seed world.
    pub fn new(config: &SessionConfig, width: u32, height: u32) -> Self {
        Self::with_world(World::seeded(), config, width, height)
    }

    pub fn with_world(world: World, config: &SessionConfig, width: u32, height: u32) -> Self {
        tracing::info!(voxels = world.len(), width, height, "session started");
        let camera = OrbitCamera::new(config.camera, width, height);
        // The clock must tick at the rate the camera's release rule assumes.
        let clock = SimClock::new(camera.config().sim_rate_ms);
        Self {
            world,
            camera,
            gestures: GestureNormalizer::new(config.gesture),
            editor: Editor::new(),
            controls: ControlBar::new(config.swatches.clone()),
            clock,
            uploaded: None,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn controls(&self) -> &ControlBar {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut ControlBar {
        &mut self.controls
    }

    pub fn gestures(&self) -> &GestureNormalizer {
        &self.gestures
    }

    pub fn render_view(&self) -> RenderView {
        self.camera.render_view()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    /// Whether the sink holds instances for the current world generation.
    pub fn is_synced(&self) -> bool {
        self.uploaded == Some(self.world.generation())
    }

    /// Upload the current snapshot unless the sink already has it.
    pub fn sync(&mut self, sink: &mut impl InstanceSink) {
        if self.is_synced() {
            return;
        }
        let snapshot = self.world.snapshot();
        sink.upload_instances(&snapshot);
        self.uploaded = Some(snapshot.generation);
        tracing::debug!(generation = snapshot.generation, count = snapshot.len(), "instances synced");
    }

    /// Run camera momentum for one frame's worth of whole ticks.
    pub fn tick(&mut self, frame_ms: f64) -> u32 {
        let ticks = self.clock.advance(frame_ms);
        for _ in 0..ticks {
            self.camera.update();
        }
        ticks
    }

    pub fn handle_pointer<S>(&mut self, event: &PointerEvent, surface: &mut S) -> Vec<EditOutcome>
    where
        S: InstanceSink + PickSurface,
    {
        let actions = self.gestures.handle(event);
        actions
            .iter()
            .filter_map(|action| self.apply_action(action, surface))
            .collect()
    }

    pub fn handle_touch<S>(&mut self, touch: &TouchInput, surface: &mut S) -> Vec<EditOutcome>
    where
        S: InstanceSink + PickSurface,
    {
        self.handle_pointer(&touch.to_pointer(), surface)
    }

    /// Apply one action. Only clicks produce an outcome.
    pub fn apply_action<S>(&mut self, action: &Action, surface: &mut S) -> Option<EditOutcome>
    where
        S: InstanceSink + PickSurface,
    {
        match *action {
            Action::Click { position } => Some(self.click(position, surface)),
            _ => {
                drive_camera(&mut self.camera, action);
                None
            }
        }
    }

    /// Pick at a window position and apply the selected tool.
    pub fn click<S>(&mut self, position: Vec2, surface: &mut S) -> EditOutcome
    where
        S: InstanceSink + PickSurface,
    {
        let _span = tracing::debug_span!("pick", x = position.x, y = position.y).entered();
        // A stale upload would decode indices against the wrong world.
        self.sync(surface);

        let sample = PickPixel::from_window(position, self.camera.viewport())
            .and_then(|pixel| surface.read_pick(pixel))
            .unwrap_or(PickSample::BACKGROUND);
        let hit = sample.hit();
        tracing::debug!(?sample, ?hit, "pick decoded");

        let outcome = self.editor.apply(&mut self.world, hit, &self.controls);
        if outcome.changed_world() {
            self.sync(surface);
        }
        outcome
    }
}

/// Map a drag action onto the camera. Primary drives rotation and pan,
/// secondary drives ascension and distance.
fn drive_camera(camera: &mut OrbitCamera, action: &Action) {
    match *action {
        Action::DragStart { now } => camera.drag_start(now),
        Action::Drag {
            button,
            dx,
            dy,
            now,
            delta,
        } => match button {
            DragButton::Primary => {
                if let Some(dx) = dx {
                    camera.drag_rotate_primary(dx, now, delta);
                }
                if let Some(dy) = dy {
                    camera.drag_pan_primary(dy, now, delta);
                }
            }
            DragButton::Secondary => {
                if let Some(dx) = dx {
                    camera.drag_elevate_secondary(dx, now, delta);
                }
                if let Some(dy) = dy {
                    camera.drag_zoom_secondary(dy, now, delta);
                }
            }
        },
        Action::DragEnd { now, delta } => camera.drag_end(now, delta),
        Action::DragCancel { now } => camera.drag_cancel(now),
        Action::Click { .. } => {}
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("voxels", &self.world.len())
            .field("generation", &self.world.generation())
            .field("camera", &self.camera.pose())
            .field("uploaded", &self.uploaded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubeedit_author::{IgnoreReason, Tool, ToolSelection};
    use cubeedit_common::{Colour, Face, PickHit};
    use cubeedit_input::{Buttons, PointerKind, TouchPhase};
    use cubeedit_kernel::{InstanceSnapshot, Voxel};
    use cubeedit_render::{CameraState, DEFAULT_SIM_RATE_MS, RaycastPicker, Renderer};
    use glam::{IVec3, Vec3};

    /// Surface that returns a fixed sample and records uploads and reads.
    #[derive(Default)]
    struct Scripted {
        sample: Option<PickSample>,
        reads: Vec<PickPixel>,
        uploads: Vec<InstanceSnapshot>,
    }

    impl InstanceSink for Scripted {
        fn upload_instances(&mut self, snapshot: &InstanceSnapshot) {
            self.uploads.push(snapshot.clone());
        }
    }

    impl PickSurface for Scripted {
        fn read_pick(&mut self, pixel: PickPixel) -> Option<PickSample> {
            self.reads.push(pixel);
            self.sample
        }
    }

    fn pointer(kind: PointerKind, x: f32, y: f32, buttons: Buttons, t: f64) -> PointerEvent {
        PointerEvent::new(kind, x, y, buttons, t)
    }

    fn session() -> EditorSession {
        EditorSession::new(&SessionConfig::default(), 800, 600)
    }

    fn tap(s: &mut EditorSession, surface: &mut Scripted, x: f32, y: f32) -> Vec<EditOutcome> {
        s.handle_pointer(&pointer(PointerKind::Down, x, y, Buttons::PRIMARY, 0.0), surface);
        s.handle_pointer(&pointer(PointerKind::Up, x, y, Buttons::NONE, 50.0), surface)
    }

    #[test]
    fn horizontal_drag_rotates_three_degrees_without_click() {
        let mut s = session();
        let mut surface = Scripted::default();
        s.sync(&mut surface);
        let start = s.camera().rotation();

        s.handle_pointer(&pointer(PointerKind::Down, 100.0, 100.0, Buttons::PRIMARY, 0.0), &mut surface);
        s.handle_pointer(&pointer(PointerKind::Move, 130.0, 100.0, Buttons::PRIMARY, 16.0), &mut surface);
        assert!((s.camera().rotation() - (start + 3.0)).abs() < 1e-5);
        assert_eq!(s.camera().pan(), 0.0);

        let outcomes =
            s.handle_pointer(&pointer(PointerKind::Up, 130.0, 100.0, Buttons::NONE, 32.0), &mut surface);
        assert!(outcomes.is_empty());
        assert!(surface.reads.is_empty());
        assert_eq!(s.world().len(), 23);
        assert_eq!(s.camera().state(), CameraState::Idle);
    }

    #[test]
    fn secondary_vertical_drag_zooms() {
        let mut s = session();
        let mut surface = Scripted::default();
        s.handle_pointer(&pointer(PointerKind::Down, 0.0, 0.0, Buttons::SECONDARY, 0.0), &mut surface);
        s.handle_pointer(&pointer(PointerKind::Move, 0.0, 100.0, Buttons::SECONDARY, 16.0), &mut surface);
        assert!((s.camera().distance() - 0.5).abs() < 1e-5);
        assert_eq!(s.camera().ascension(), 0.0);
    }

    #[test]
    fn momentum_runs_on_ticks() {
        let mut s = session();
        let mut surface = Scripted::default();
        let rate = SessionConfig::default().camera.sim_rate_ms;
        s.handle_pointer(&pointer(PointerKind::Down, 0.0, 0.0, Buttons::PRIMARY, 0.0), &mut surface);
        s.handle_pointer(&pointer(PointerKind::Move, 100.0, 0.0, Buttons::PRIMARY, rate), &mut surface);
        s.handle_pointer(&pointer(PointerKind::Up, 100.0, 0.0, Buttons::NONE, rate * 1.5), &mut surface);
        let released = s.camera().rotation();

        assert_eq!(s.tick(rate / 2.0), 0);
        assert_eq!(s.camera().rotation(), released);
        assert_eq!(s.tick(rate / 2.0), 1);
        assert!(s.camera().rotation() != released);

        let mut frames = 0;
        while !s.camera().is_at_rest() {
            s.tick(rate);
            frames += 1;
            assert!(frames < 10_000);
        }
    }

    #[test]
    fn pointer_leave_cancels_drag() {
        let mut s = session();
        let mut surface = Scripted::default();
        s.handle_pointer(&pointer(PointerKind::Down, 0.0, 0.0, Buttons::PRIMARY, 0.0), &mut surface);
        s.handle_pointer(&pointer(PointerKind::Move, 100.0, 0.0, Buttons::PRIMARY, 5.0), &mut surface);
        s.handle_pointer(&pointer(PointerKind::Leave, 100.0, 0.0, Buttons::NONE, 6.0), &mut surface);
        assert!(s.camera().is_at_rest());
        assert!(!s.gestures().is_active());
    }

    #[test]
    fn click_reads_flipped_y_and_adds() {
        let mut s = session();
        let mut surface = Scripted {
            sample: Some(PickSample::cube(0, Face::Top)),
            ..Scripted::default()
        };
        let outcomes = tap(&mut s, &mut surface, 10.0, 20.0);

        assert_eq!(surface.reads, vec![PickPixel { x: 10, y: 580 }]);
        assert_eq!(
            outcomes,
            vec![EditOutcome::Added {
                index: 23,
                position: IVec3::new(0, 1, 0)
            }]
        );
        assert_eq!(s.world().get(23).unwrap().colour, s.controls().current_colour());
        // Initial sync, then the post-edit upload.
        assert_eq!(surface.uploads.len(), 2);
        assert_eq!(surface.uploads[1].len(), 24);
        assert!(s.is_synced());
    }

    #[test]
    fn delete_tool_removes_and_uploads() {
        let mut s = session();
        s.controls_mut().select(Tool::Delete);
        let mut surface = Scripted {
            sample: Some(PickSample::cube(5, Face::Front)),
            ..Scripted::default()
        };
        s.sync(&mut surface);
        let outcomes = tap(&mut s, &mut surface, 1.0, 1.0);
        assert!(matches!(outcomes.as_slice(), [EditOutcome::Removed { index: 5, .. }]));
        assert_eq!(surface.uploads.last().unwrap().len(), 22);
    }

    #[test]
    fn unreadable_pick_is_background() {
        let mut s = session();
        let mut surface = Scripted::default();
        s.sync(&mut surface);
        let outcomes = tap(&mut s, &mut surface, 5.0, 5.0);
        assert_eq!(outcomes, vec![EditOutcome::Ignored(IgnoreReason::Background)]);
        assert_eq!(surface.uploads.len(), 1);
        assert_eq!(s.world().generation(), 0);
    }

    #[test]
    fn click_outside_viewport_never_reads() {
        let mut s = session();
        let mut surface = Scripted::default();
        let outcome = s.click(Vec2::new(900.0, 10.0), &mut surface);
        assert_eq!(outcome, EditOutcome::Ignored(IgnoreReason::Background));
        assert!(surface.reads.is_empty());
    }

    #[test]
    fn touch_tap_edits_like_a_click() {
        let mut s = session();
        let mut surface = Scripted {
            sample: Some(PickSample::ground(IVec3::new(3, 0, -2))),
            ..Scripted::default()
        };
        let start = TouchInput {
            phase: TouchPhase::Start,
            point: Vec2::new(50.0, 50.0),
            touch_count: 1,
            timestamp_ms: 0.0,
        };
        let end = TouchInput {
            phase: TouchPhase::End,
            touch_count: 0,
            timestamp_ms: 40.0,
            ..start
        };
        s.handle_touch(&start, &mut surface);
        let outcomes = s.handle_touch(&end, &mut surface);
        assert_eq!(
            outcomes,
            vec![EditOutcome::Added {
                index: 23,
                position: IVec3::new(3, 0, -2)
            }]
        );
    }

    #[test]
    fn sync_skips_current_generation() {
        let mut s = session();
        let mut surface = Scripted::default();
        s.sync(&mut surface);
        s.sync(&mut surface);
        assert_eq!(surface.uploads.len(), 1);
    }

    #[test]
    fn raycast_click_on_seed_world() {
        let config = SessionConfig {
            camera: cubeedit_render::CameraConfig {
                anchor: Vec3::new(0.0, 0.0, 10.0),
                rotation: 0.0,
                ..Default::default()
            },
            ..SessionConfig::default()
        };
        let mut s = EditorSession::new(&config, 101, 101);
        let mut picker = RaycastPicker::new(config.ground_extent);
        picker.render(&s.render_view());

        // Straight down the view axis onto the south arm's tip at (0, 0, 2).
        let outcome = s.click(Vec2::new(50.5, 50.5), &mut picker);
        assert_eq!(
            outcome,
            EditOutcome::Added {
                index: 23,
                position: IVec3::new(0, 0, 3)
            }
        );

        let after = picker.cast(PickPixel { x: 50, y: 51 });
        assert_eq!(
            after.hit(),
            PickHit::Face {
                index: 23,
                face: Face::Front
            }
        );
    }

    #[test]
    fn session_on_custom_world() {
        let world = World::from_voxels(vec![Voxel::new(IVec3::ZERO, Colour::WHITE)]);
        let s = EditorSession::with_world(world, &SessionConfig::default(), 10, 10);
        assert_eq!(s.world().len(), 1);
        assert!(!s.is_synced());
    }

    #[test]
    fn clock_and_camera_agree_on_bad_sim_rate() {
        let mut config = SessionConfig::default();
        config.camera.sim_rate_ms = -1.0;
        let mut s = EditorSession::new(&config, 100, 100);
        assert_eq!(s.camera().config().sim_rate_ms, DEFAULT_SIM_RATE_MS);
        assert_eq!(s.tick(DEFAULT_SIM_RATE_MS), 1);
    }
}
