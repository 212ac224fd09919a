use crate::tools::ToolSelection;
use cubeedit_common::{GridPos, PickHit};
use cubeedit_kernel::{Voxel, World};

/// Why a click left the world unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Nothing was under the pointer.
    Background,
    /// Delete tool on the ground: there is no cube to remove.
    DeleteOnGround,
    /// The decoded index is not a voxel in the current world.
    MissingVoxel(u32),
}

/// Result of applying one pick to the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditOutcome {
    Added { index: usize, position: GridPos },
    Removed { index: usize, voxel: Voxel },
    Ignored(IgnoreReason),
}

impl EditOutcome {
    /// The world was mutated and instance data must be re-uploaded.
    pub fn changed_world(&self) -> bool {
        !matches!(self, EditOutcome::Ignored(_))
    }
}

/// Applies decoded picks to a world according to the selected tool.
///
/// Face hits add next to the face or delete the cube; ground hits add at the
/// encoded cell; everything else is ignored. Holds no world state itself.
#[derive(Debug, Default)]
pub struct Editor {
    applied: u64,
    ignored: u64,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(
        &mut self,
        world: &mut World,
        hit: PickHit,
        tools: &impl ToolSelection,
    ) -> EditOutcome {
        let outcome = Self::dispatch(world, hit, tools);
        match outcome {
            EditOutcome::Ignored(reason) => {
                self.ignored += 1;
                tracing::debug!(?reason, "click ignored");
            }
            EditOutcome::Added { index, position } => {
                self.applied += 1;
                tracing::info!(index, ?position, "cube added");
            }
            EditOutcome::Removed { index, voxel } => {
                self.applied += 1;
                tracing::info!(index, position = ?voxel.position, "cube deleted");
            }
        }
        outcome
    }

    /// Edits that changed the world.
    pub fn applied_count(&self) -> u64 {
        self.applied
    }

    pub fn ignored_count(&self) -> u64 {
        self.ignored
    }

    fn dispatch(world: &mut World, hit: PickHit, tools: &impl ToolSelection) -> EditOutcome {
        let deleting = tools.is_deleting();
        match hit {
            PickHit::Background => EditOutcome::Ignored(IgnoreReason::Background),
            PickHit::Ground { .. } if deleting => {
                EditOutcome::Ignored(IgnoreReason::DeleteOnGround)
            }
            PickHit::Ground { position } => {
                let index = world.add_at(position, tools.current_colour());
                EditOutcome::Added { index, position }
            }
            PickHit::Face { index, .. } if deleting => match world.remove_at(index as usize) {
                Some(voxel) => EditOutcome::Removed {
                    index: index as usize,
                    voxel,
                },
                None => EditOutcome::Ignored(IgnoreReason::MissingVoxel(index)),
            },
            PickHit::Face { index, face } => {
                match world.add_adjacent(index as usize, face, tools.current_colour()) {
                    Some(added) => EditOutcome::Added {
                        index: added,
                        position: world.voxels()[added].position,
                    },
                    None => EditOutcome::Ignored(IgnoreReason::MissingVoxel(index)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ControlBar, Tool};
    use cubeedit_common::{Colour, Face, PickSample};
    use glam::IVec3;

    fn painting(hex: &str) -> ControlBar {
        ControlBar::new(vec![hex.to_string()])
    }

    fn deleting() -> ControlBar {
        let mut bar = ControlBar::default();
        bar.select(Tool::Delete);
        bar
    }

    #[test]
    fn face_click_adds_adjacent() {
        let mut world = World::seeded();
        let mut editor = Editor::new();
        let hit = PickSample::cube(0, Face::Top).hit();
        let outcome = editor.apply(&mut world, hit, &painting("#336699"));
        assert_eq!(
            outcome,
            EditOutcome::Added {
                index: 23,
                position: IVec3::new(0, 1, 0)
            }
        );
        assert_eq!(world.len(), 24);
        assert_eq!(world.get(23).unwrap().colour, Colour::from_hex("#336699"));
        assert_eq!(editor.applied_count(), 1);
    }

    #[test]
    fn face_click_with_delete_removes() {
        let mut world = World::seeded();
        let mut editor = Editor::new();
        let hit = PickSample::cube(7, Face::Left).hit();
        let outcome = editor.apply(&mut world, hit, &deleting());
        assert!(matches!(outcome, EditOutcome::Removed { index: 7, voxel } if voxel.position == IVec3::new(2, -2, 0)));
        assert_eq!(world.len(), 22);
    }

    #[test]
    fn ground_click_adds_at_cell() {
        let mut world = World::new();
        let mut editor = Editor::new();
        let hit = PickSample::ground(IVec3::new(-3, 0, 4)).hit();
        let outcome = editor.apply(&mut world, hit, &painting("#FFFFFF"));
        assert_eq!(
            outcome,
            EditOutcome::Added {
                index: 0,
                position: IVec3::new(-3, 0, 4)
            }
        );
        assert_eq!(world.get(0).unwrap().colour, Colour::WHITE);
    }

    #[test]
    fn ground_click_with_delete_does_nothing() {
        let mut world = World::seeded();
        let mut editor = Editor::new();
        let hit = PickSample::ground(IVec3::new(1, 0, 1)).hit();
        let outcome = editor.apply(&mut world, hit, &deleting());
        assert_eq!(outcome, EditOutcome::Ignored(IgnoreReason::DeleteOnGround));
        assert_eq!(world.len(), 23);
        assert_eq!(world.generation(), 0);
    }

    #[test]
    fn background_never_mutates() {
        let mut world = World::seeded();
        let mut editor = Editor::new();
        for tools in [painting("#123456"), deleting()] {
            let outcome = editor.apply(&mut world, PickSample::BACKGROUND.hit(), &tools);
            assert_eq!(outcome, EditOutcome::Ignored(IgnoreReason::Background));
            assert!(!outcome.changed_world());
        }
        assert_eq!(world.generation(), 0);
        assert_eq!(editor.ignored_count(), 2);
    }

    #[test]
    fn stale_index_is_ignored() {
        let mut world = World::seeded();
        let mut editor = Editor::new();
        let hit = PickSample::cube(40, Face::Top).hit();
        assert_eq!(
            editor.apply(&mut world, hit, &deleting()),
            EditOutcome::Ignored(IgnoreReason::MissingVoxel(40))
        );
        assert_eq!(
            editor.apply(&mut world, hit, &painting("#FFFFFF")),
            EditOutcome::Ignored(IgnoreReason::MissingVoxel(40))
        );
        assert_eq!(world.len(), 23);
    }

    #[test]
    fn delete_reindexes_following_cubes() {
        let mut world = World::seeded();
        let mut editor = Editor::new();
        let after = world.get(4).unwrap().position;
        editor.apply(&mut world, PickSample::cube(3, Face::Front).hit(), &deleting());
        assert_eq!(world.get(3).unwrap().position, after);
    }
}
