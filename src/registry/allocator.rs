//! Multiplexing of custom block variants behind vanilla state spaces.
//!
//! Each group owns a few vanilla blocks whose property combinations are
//! never shown to clients in their natural form. Every combination except
//! the canonical one (see [`SubstitutionRegistry::surrogate_for`]) can
//! stand in for one custom block.
//!
//! [`SubstitutionRegistry::surrogate_for`]: crate::registry::SubstitutionRegistry::surrogate_for

use crate::registry::{BlockRegistry, RegistryError};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SurrogateGroup {
    /// Mushroom blocks and stems, six face booleans each.
    Wood,
    /// Droppers and dispensers, six facings with `triggered=true`.
    Stone,
    /// Target power levels and pale oak leaf distances.
    Grass,
}

impl SurrogateGroup {
    fn blocks(self) -> &'static [&'static str] {
        match self {
            SurrogateGroup::Wood => &[
                "minecraft:red_mushroom_block",
                "minecraft:brown_mushroom_block",
                "minecraft:mushroom_stem",
            ],
            SurrogateGroup::Stone => &["minecraft:dropper", "minecraft:dispenser"],
            SurrogateGroup::Grass => &["minecraft:target", "minecraft:pale_oak_leaves"],
        }
    }

    fn states_per_block(self) -> u32 {
        match self {
            SurrogateGroup::Wood => 63,
            SurrogateGroup::Stone => 6,
            SurrogateGroup::Grass => 13,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Mushroom face index of the canonical all-faces state.
pub(crate) const MUSHROOM_CANONICAL: u32 = 63;
/// Leaves index of the canonical `distance=7, persistent=true` state.
pub(crate) const LEAVES_CANONICAL: u32 = 13;

/// Hands out surrogate states in registration order.
#[derive(Debug)]
pub struct SurrogateAllocator<'a> {
    blocks: &'a BlockRegistry,
    next: [u32; 3],
}

impl<'a> SurrogateAllocator<'a> {
    pub fn new(blocks: &'a BlockRegistry) -> Self {
        Self {
            blocks,
            next: [0; 3],
        }
    }

    /// Allocates the next unused surrogate state in `group`.
    pub fn allocate(&mut self, group: SurrogateGroup) -> Result<i32, RegistryError> {
        let id = self.next[group.index()];
        let block_index = (id / group.states_per_block()) as usize;
        let local = id % group.states_per_block();
        let name = group
            .blocks()
            .get(block_index)
            .ok_or(RegistryError::Exhausted(group))?;
        let block = self
            .blocks
            .by_name(name)
            .ok_or_else(|| RegistryError::UnknownBlock((*name).to_owned()))?;
        let base = self
            .blocks
            .default_state(block)
            .ok_or_else(|| RegistryError::UnknownBlock((*name).to_owned()))?;

        let state = match group {
            SurrogateGroup::Wood => mushroom_state(self.blocks, base, local),
            SurrogateGroup::Stone => dispenser_state(self.blocks, base, local),
            SurrogateGroup::Grass if block_index == 0 => {
                self.blocks.with_property(base, "power", &(local + 1).to_string())
            }
            SurrogateGroup::Grass => leaves_state(self.blocks, base, local),
        }
        .ok_or_else(|| RegistryError::UnknownProperty {
            block: (*name).to_owned(),
            property: format!("surrogate {local}"),
        })?;

        self.next[group.index()] = id + 1;
        Ok(state)
    }
}

/// Sets the six face properties from the low six bits of `faces`.
pub(crate) fn mushroom_state(blocks: &BlockRegistry, state: i32, faces: u32) -> Option<i32> {
    const FACES: [&str; 6] = ["north", "east", "south", "west", "up", "down"];
    FACES
        .iter()
        .enumerate()
        .try_fold(state, |state, (bit, face)| {
            let value = if faces & (1 << bit) != 0 { "true" } else { "false" };
            blocks.with_property(state, face, value)
        })
}

fn dispenser_state(blocks: &BlockRegistry, state: i32, facing: u32) -> Option<i32> {
    const FACINGS: [&str; 6] = ["down", "up", "north", "south", "west", "east"];
    let state = blocks.with_property(state, "facing", FACINGS.get(facing as usize)?)?;
    blocks.with_property(state, "triggered", "true")
}

pub(crate) fn leaves_state(blocks: &BlockRegistry, state: i32, index: u32) -> Option<i32> {
    let state = blocks.with_property(state, "distance", &(index % 7 + 1).to_string())?;
    let persistent = if index / 7 >= 1 { "true" } else { "false" };
    blocks.with_property(state, "persistent", persistent)
}
