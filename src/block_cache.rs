use crate::{
    position::{BlockPosition, ChunkPosition},
    registry::{SubstitutionRegistry, AIR},
};
use ahash::AHashMap;

/// Real block states at the positions where the client was shown a
/// custom block's surrogate.
///
/// Keys are packed block positions. Entries are replaced on every block
/// or chunk update and dropped when their chunk unloads.
#[derive(Debug, Default)]
pub struct BlockCache {
    states: AHashMap<i64, i32>,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the state just sent for `position`, keeping it only
    /// when it is a custom block.
    pub fn update(&mut self, registry: &SubstitutionRegistry, position: BlockPosition, state: i32) {
        if registry.is_custom_state(state) {
            self.insert(position, state);
        } else {
            self.remove(position);
        }
    }

    pub fn insert(&mut self, position: BlockPosition, state: i32) {
        self.states.insert(position.as_long(), state);
    }

    pub fn remove(&mut self, position: BlockPosition) {
        self.states.remove(&position.as_long());
    }

    pub fn get(&self, position: BlockPosition) -> Option<i32> {
        self.states.get(&position.as_long()).copied()
    }

    /// The real state at `position`, or air when nothing is cached.
    pub fn real_for(&self, position: BlockPosition) -> i32 {
        self.get(position).unwrap_or(AIR)
    }

    pub fn unload_chunk(&mut self, chunk: ChunkPosition) {
        self.states
            .retain(|&key, _| BlockPosition::from_long(key).chunk() != chunk);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::testing::{fixture, Fixture};

    #[test]
    fn only_custom_blocks_are_remembered() {
        let Fixture {
            registry, ore, stone, ..
        } = fixture();
        let ore = registry.blocks().default_state(ore).unwrap();
        let stone = registry.blocks().default_state(stone).unwrap();
        let position = BlockPosition::new(10, 64, 10);

        let mut cache = BlockCache::new();
        cache.update(&registry, position, ore);
        assert_eq!(cache.real_for(position), ore);
        cache.update(&registry, position, stone);
        assert_eq!(cache.get(position), None);
        assert_eq!(cache.real_for(position), AIR);
    }

    #[test]
    fn unloading_a_chunk_forgets_its_positions() {
        let mut cache = BlockCache::new();
        let inside = [
            BlockPosition::new(-16, -64, 0),
            BlockPosition::new(-1, 319, 15),
        ];
        let outside = BlockPosition::new(0, 70, 0);
        for position in inside {
            cache.insert(position, 5);
        }
        cache.insert(outside, 5);

        cache.unload_chunk(ChunkPosition::new(-1, 0));
        for position in inside {
            assert_eq!(cache.get(position), None);
        }
        assert_eq!(cache.get(outside), Some(5));
        assert_eq!(cache.len(), 1);
    }
}
