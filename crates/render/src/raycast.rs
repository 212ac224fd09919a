//! CPU pick surface.
//!
//! Answers pick reads the way the ID target would, by casting a ray through
//! the pixel centre against unit cubes and the ground plane. Used headless
//! (CLI, tests) where no GPU target exists.

use crate::renderer::{InstanceSink, PickPixel, PickSurface, RenderView, Renderer};
use cubeedit_common::codec::MAX_PICKABLE;
use cubeedit_common::{Face, GridPos, PickSample};
use cubeedit_kernel::InstanceSnapshot;
use glam::{IVec3, Vec3};

/// Height of the ground plane, just under the bottom faces of `y = 0` cubes.
pub const GROUND_LEVEL: f32 = -0.5001;

/// A ray defined by origin and direction.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Precomputed 1/direction for the slab test.
    pub inv_direction: Vec3,
}

impl Ray {
    /// `direction` should be normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    /// Ray from the near plane through the centre of `pixel`.
    pub fn through_pixel(view: &RenderView, pixel: PickPixel) -> Option<Self> {
        let size = view.viewport.as_vec2();
        let window_x = pixel.x as f32 + 0.5;
        let window_y = pixel.texture_row(view.viewport.y) as f32 + 0.5;
        let ndc_x = 2.0 * window_x / size.x - 1.0;
        let ndc_y = 1.0 - 2.0 * window_y / size.y;

        let inverse = view.view_projection().inverse();
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        let direction = (far - near).try_normalize()?;
        Some(Self::new(near, direction))
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab test. Returns `(t_near, t_far)` with `t_near` clamped to zero.
    pub fn intersects_aabb(&self, min: Vec3, max: Vec3) -> Option<(f32, f32)> {
        let t1 = (min - self.origin) * self.inv_direction;
        let t2 = (max - self.origin) * self.inv_direction;

        let t_min = t1.min(t2);
        let t_max = t1.max(t2);

        let t_near = t_min.max_element();
        let t_far = t_max.min_element();

        if t_near <= t_far && t_far >= 0.0 {
            Some((t_near.max(0.0), t_far))
        } else {
            None
        }
    }

    /// Distance to the horizontal plane at `level`, if ahead of the origin.
    pub fn hits_level(&self, level: f32) -> Option<f32> {
        if self.direction.y == 0.0 {
            return None;
        }
        let t = (level - self.origin.y) / self.direction.y;
        (t > 0.0).then_some(t)
    }
}

/// Face of a unit cube containing a point given relative to the cube centre.
fn face_at(local: Vec3) -> Face {
    let a = local.abs();
    if a.x >= a.y && a.x >= a.z {
        if local.x >= 0.0 { Face::Right } else { Face::Left }
    } else if a.y >= a.z {
        if local.y >= 0.0 { Face::Top } else { Face::Bottom }
    } else if local.z >= 0.0 {
        Face::Front
    } else {
        Face::Back
    }
}

/// Pick surface backed by ray casts instead of a rendered ID target.
#[derive(Debug, Clone)]
pub struct RaycastPicker {
    cells: Vec<GridPos>,
    ground_extent: i32,
    view: RenderView,
}

impl RaycastPicker {
    /// `ground_extent` is the largest |x| or |z| of a ground cell.
    pub fn new(ground_extent: i32) -> Self {
        Self {
            cells: Vec::new(),
            ground_extent: ground_extent.max(0),
            view: RenderView::default(),
        }
    }

    pub fn set_view(&mut self, view: RenderView) {
        self.view = view;
    }

    pub fn view(&self) -> &RenderView {
        &self.view
    }

    /// The sample the ID target would hold at `pixel`.
    pub fn cast(&self, pixel: PickPixel) -> PickSample {
        let Some(ray) = Ray::through_pixel(&self.view, pixel) else {
            return PickSample::BACKGROUND;
        };

        let mut nearest: Option<(f32, PickSample)> = None;
        for (index, cell) in self.cells.iter().enumerate().take(MAX_PICKABLE as usize + 1) {
            let centre = cell.as_vec3();
            let Some((t, _)) = ray.intersects_aabb(centre - 0.5, centre + 0.5) else {
                continue;
            };
            if nearest.is_none_or(|(best, _)| t < best) {
                let face = face_at(ray.at(t) - centre);
                nearest = Some((t, PickSample::cube(index as u32, face)));
            }
        }

        if let Some(t) = ray.hits_level(GROUND_LEVEL)
            && nearest.is_none_or(|(best, _)| t < best)
        {
            let point = ray.at(t);
            let half = self.ground_extent as f32 + 0.5;
            if point.x.abs() <= half && point.z.abs() <= half {
                let y = if ray.origin.y > GROUND_LEVEL { 0 } else { -1 };
                let cell = IVec3::new(point.x.round() as i32, y, point.z.round() as i32);
                nearest = Some((t, PickSample::ground(cell)));
            }
        }

        nearest.map_or(PickSample::BACKGROUND, |(_, sample)| sample)
    }
}

impl InstanceSink for RaycastPicker {
    fn upload_instances(&mut self, snapshot: &InstanceSnapshot) {
        self.cells.clone_from(&snapshot.positions);
    }
}

impl Renderer for RaycastPicker {
    type Output = ();

    fn render(&mut self, view: &RenderView) {
        self.view = *view;
    }
}

impl PickSurface for RaycastPicker {
    fn read_pick(&mut self, pixel: PickPixel) -> Option<PickSample> {
        let viewport = self.view.viewport;
        if pixel.x >= viewport.x || pixel.y == 0 || pixel.y > viewport.y {
            tracing::debug!(?pixel, ?viewport, "pick outside viewport");
            return None;
        }
        Some(self.cast(pixel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraConfig, OrbitCamera};
    use cubeedit_common::{Colour, PickHit};
    use cubeedit_kernel::{Voxel, World};
    use glam::{UVec2, Vec2};

    const SIDE: u32 = 101;

    fn picker(anchor: Vec3, world: &World, extent: i32) -> RaycastPicker {
        let camera = OrbitCamera::new(
            CameraConfig {
                anchor,
                rotation: 0.0,
                ..CameraConfig::default()
            },
            SIDE,
            SIDE,
        );
        let mut picker = RaycastPicker::new(extent);
        picker.upload_instances(&world.snapshot());
        picker.render(&camera.render_view());
        picker
    }

    fn centre_hit(picker: &mut RaycastPicker) -> PickHit {
        let centre = Vec2::splat(SIDE as f32 / 2.0);
        let pixel = PickPixel::from_window(centre, UVec2::splat(SIDE)).unwrap();
        picker.read_pick(pixel).unwrap().hit()
    }

    fn single_cube() -> World {
        World::from_voxels(vec![Voxel::new(IVec3::ZERO, Colour::WHITE)])
    }

    #[test]
    fn slab_hit_and_miss() {
        let ray = Ray::new(Vec3::new(-2.0, 0.5, 0.5), Vec3::X);
        let (near, far) = ray.intersects_aabb(Vec3::ZERO, Vec3::ONE).unwrap();
        assert!((near - 2.0).abs() < 1e-4);
        assert!((far - 3.0).abs() < 1e-4);

        let miss = Ray::new(Vec3::new(-2.0, 5.0, 0.5), Vec3::X);
        assert!(miss.intersects_aabb(Vec3::ZERO, Vec3::ONE).is_none());
    }

    #[test]
    fn level_hit_needs_vertical_component() {
        let flat = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(flat.hits_level(GROUND_LEVEL).is_none());
        let down = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y);
        assert!((down.hits_level(0.0).unwrap() - 1.0).abs() < 1e-6);
        let up = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert!(up.hits_level(0.0).is_none());
    }

    #[test]
    fn face_from_local_point() {
        assert_eq!(face_at(Vec3::new(0.0, 0.0, 0.5)), Face::Front);
        assert_eq!(face_at(Vec3::new(0.1, -0.5, 0.2)), Face::Bottom);
        assert_eq!(face_at(Vec3::new(-0.5, 0.3, 0.0)), Face::Left);
    }

    #[test]
    fn centre_ray_hits_front_face() {
        let mut p = picker(Vec3::new(0.0, 0.0, 10.0), &single_cube(), 10);
        assert_eq!(
            centre_hit(&mut p),
            PickHit::Face {
                index: 0,
                face: Face::Front
            }
        );
    }

    #[test]
    fn downward_ray_hits_top_face() {
        let mut p = picker(Vec3::new(0.0, 10.0, 5.0), &single_cube(), 10);
        assert_eq!(
            centre_hit(&mut p),
            PickHit::Face {
                index: 0,
                face: Face::Top
            }
        );
    }

    #[test]
    fn nearest_cube_wins() {
        let world = World::from_voxels(vec![
            Voxel::new(IVec3::new(0, 0, -3), Colour::BLACK),
            Voxel::new(IVec3::ZERO, Colour::WHITE),
        ]);
        let mut p = picker(Vec3::new(0.0, 0.0, 10.0), &world, 10);
        assert_eq!(
            centre_hit(&mut p),
            PickHit::Face {
                index: 1,
                face: Face::Front
            }
        );
    }

    #[test]
    fn empty_ground_from_above() {
        let mut p = picker(Vec3::new(0.0, 10.0, 5.0), &World::new(), 10);
        assert_eq!(
            centre_hit(&mut p),
            PickHit::Ground {
                position: IVec3::ZERO
            }
        );
    }

    #[test]
    fn ground_from_below_is_level_minus_one() {
        let mut p = picker(Vec3::new(0.0, -10.0, 5.0), &World::new(), 10);
        assert_eq!(
            centre_hit(&mut p),
            PickHit::Ground {
                position: IVec3::new(0, -1, 0)
            }
        );
    }

    #[test]
    fn ground_respects_extent() {
        let anchor = Vec3::new(0.0, 1.0, 20.0);
        let mut near = picker(anchor, &World::new(), 2);
        assert_eq!(centre_hit(&mut near), PickHit::Background);

        let mut wide = picker(anchor, &World::new(), 20);
        assert_eq!(
            centre_hit(&mut wide),
            PickHit::Ground {
                position: IVec3::new(0, 0, -10)
            }
        );
    }

    #[test]
    fn horizon_is_background() {
        let mut p = picker(Vec3::new(0.0, 0.0, 10.0), &World::new(), 10);
        assert_eq!(centre_hit(&mut p), PickHit::Background);
    }

    #[test]
    fn removed_cube_is_no_longer_picked() {
        let mut world = single_cube();
        let mut p = picker(Vec3::new(0.0, 0.0, 10.0), &world, 10);
        world.remove_at(0);
        p.upload_instances(&world.snapshot());
        assert_eq!(centre_hit(&mut p), PickHit::Background);
    }

    #[test]
    fn outside_viewport_reads_nothing() {
        let mut p = picker(Vec3::new(0.0, 0.0, 10.0), &single_cube(), 10);
        assert!(p.read_pick(PickPixel { x: SIDE, y: 5 }).is_none());
        assert!(p.read_pick(PickPixel { x: 5, y: 0 }).is_none());
        assert!(p.read_pick(PickPixel { x: 5, y: SIDE + 1 }).is_none());
    }
}
