use cubeedit_common::codec::encode_index;
use cubeedit_common::{Colour, Face, GridPos};
use glam::IVec3;
use serde::{Deserialize, Serialize};

/// A coloured unit cube on the integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Voxel {
    pub position: GridPos,
    pub colour: Colour,
}

impl Voxel {
    pub fn new(position: GridPos, colour: Colour) -> Self {
        Self { position, colour }
    }
}

/// An event record produced by every mutation to the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Voxel appended at `index`.
    Added { index: usize, voxel: Voxel },
    /// Voxel removed from `index`; every later index shifted down by one.
    Removed { index: usize, voxel: Voxel },
}

/// Per-instance data handed to a renderer, in index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstanceSnapshot {
    /// World generation the snapshot was taken at.
    pub generation: u64,
    pub positions: Vec<GridPos>,
    pub colours: Vec<Colour>,
    /// Encoded index triplets, written verbatim to the ID target.
    pub ids: Vec<[u8; 3]>,
}

impl InstanceSnapshot {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// The authoritative voxel world.
///
/// Voxels live in a dense vector and are identified by their index, which is
/// what the pick buffer encodes. Removing a voxel renumbers everything after
/// it, so any instance data derived from an older generation must be
/// regenerated before the next pick is trusted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct World {
    voxels: Vec<Voxel>,
    generation: u64,
    #[serde(skip)]
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed startup layout: a black centre cube, white cubes two above and
    /// below, and four coloured arms along ±x and ±z that turn up and down at
    /// their tips.
    pub fn seeded() -> Self {
        let white = Colour::WHITE;
        let east = Colour::new(0.0, 1.0, 0.5);
        let west = Colour::new(0.5, 1.0, 0.0);
        let south = Colour::new(0.0, 0.5, 1.0);
        let north = Colour::new(1.0, 0.0, 0.5);

        let mut layout = vec![
            Voxel::new(IVec3::new(0, 0, 0), Colour::BLACK),
            Voxel::new(IVec3::new(0, 2, 0), white),
            Voxel::new(IVec3::new(0, -2, 0), white),
        ];
        let arms = [
            (IVec3::X, east),
            (IVec3::NEG_X, west),
            (IVec3::Z, south),
            (IVec3::NEG_Z, north),
        ];
        for (dir, colour) in arms {
            let tip = dir * 2;
            for pos in [dir, tip, tip + IVec3::Y, tip + IVec3::Y * 2, tip - IVec3::Y * 2] {
                layout.push(Voxel::new(pos, colour));
            }
        }
        Self::from_voxels(layout)
    }

    /// Build a world from an initial layout. No events are recorded.
    pub fn from_voxels(voxels: Vec<Voxel>) -> Self {
        Self {
            voxels,
            ..Self::default()
        }
    }

    /// Number of voxels.
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Incremented on every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, index: usize) -> Option<&Voxel> {
        self.voxels.get(index)
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn positions(&self) -> Vec<GridPos> {
        self.voxels.iter().map(|v| v.position).collect()
    }

    pub fn colours(&self) -> Vec<Colour> {
        self.voxels.iter().map(|v| v.colour).collect()
    }

    pub fn ids(&self) -> Vec<[u8; 3]> {
        (0..self.voxels.len() as u32).map(encode_index).collect()
    }

    /// All three projections at once, tagged with the current generation.
    pub fn snapshot(&self) -> InstanceSnapshot {
        InstanceSnapshot {
            generation: self.generation,
            positions: self.positions(),
            colours: self.colours(),
            ids: self.ids(),
        }
    }

    /// Append a voxel in the cell next to `face` of the voxel at `index`.
    ///
    /// Returns the new voxel's index, or `None` if `index` does not exist.
    pub fn add_adjacent(&mut self, index: usize, face: Face, colour: Colour) -> Option<usize> {
        let Some(touched) = self.voxels.get(index) else {
            tracing::warn!(index, len = self.voxels.len(), "add on missing voxel ignored");
            return None;
        };
        let position = touched.position + face.normal();
        Some(self.add_at(position, colour))
    }

    /// Append a voxel at an explicit cell. Returns its index.
    pub fn add_at(&mut self, position: GridPos, colour: Colour) -> usize {
        let index = self.voxels.len();
        let voxel = Voxel::new(position, colour);
        self.voxels.push(voxel);
        self.record(WorldEvent::Added { index, voxel });
        tracing::debug!(index, ?position, "voxel added");
        index
    }

    /// Remove the voxel at `index`, shifting every later voxel down by one.
    pub fn remove_at(&mut self, index: usize) -> Option<Voxel> {
        if index >= self.voxels.len() {
            tracing::warn!(index, len = self.voxels.len(), "remove on missing voxel ignored");
            return None;
        }
        let voxel = self.voxels.remove(index);
        self.record(WorldEvent::Removed { index, voxel });
        tracing::debug!(index, position = ?voxel.position, "voxel removed");
        Some(voxel)
    }

    fn record(&mut self, event: WorldEvent) {
        self.generation += 1;
        self.event_log.push(event);
    }
}
