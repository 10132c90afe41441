use crate::{
    protocol::item::ItemStack,
    registry::{
        allocator::{leaves_state, mushroom_state, LEAVES_CANONICAL, MUSHROOM_CANONICAL},
        BlockId, BlockRegistry, ItemRegistry, RegistryError,
    },
};
use ahash::{AHashMap, AHashSet};

/// A server-only item and the vanilla stacks that stand in for it.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomItem {
    /// Stable identifier, equal to the item's registry name.
    pub id: String,
    pub item: i32,
    /// Shown while the item sits in the selected hotbar slot or off-hand.
    pub dynamic_material: ItemStack,
    /// Shown everywhere else.
    pub default_material: ItemStack,
    pub tool_type: Option<String>,
}

/// A server-only block and the vanilla state shown in its place.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomBlock {
    pub block: BlockId,
    pub surrogate: i32,
    /// Shown when the block is meant to ignore clicks.
    pub inert_surrogate: Option<i32>,
}

/// The real entity kind of custom projectiles and the kind clients see.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProjectileKinds {
    pub real: i32,
    pub surrogate: i32,
}

/// Vanilla blocks always shown in one canonical state, because their
/// other states are handed out as custom block surrogates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reshaped {
    Mushroom,
    Dispenser,
    Leaves,
    Target,
}

const MUSHROOM_BLOCKS: [&str; 3] = [
    "minecraft:red_mushroom_block",
    "minecraft:brown_mushroom_block",
    "minecraft:mushroom_stem",
];

/// Read-only table of every custom block, item and projectile kind,
/// together with the block and item registries they live in.
#[derive(Debug)]
pub struct SubstitutionRegistry {
    blocks: BlockRegistry,
    items: ItemRegistry,
    custom_items: Vec<CustomItem>,
    custom_item_index: AHashMap<i32, usize>,
    custom_blocks: AHashMap<BlockId, CustomBlock>,
    reshaped: AHashMap<BlockId, Reshaped>,
    mushroom_blocks: Vec<BlockId>,
    mushroom_items: AHashSet<i32>,
    projectile: Option<ProjectileKinds>,
}

impl SubstitutionRegistry {
    pub fn builder(blocks: BlockRegistry, items: ItemRegistry) -> SubstitutionRegistryBuilder {
        SubstitutionRegistryBuilder {
            blocks,
            items,
            custom_items: Vec::new(),
            custom_blocks: Vec::new(),
            projectile: None,
        }
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn items(&self) -> &ItemRegistry {
        &self.items
    }

    pub fn custom_item(&self, item: i32) -> Option<&CustomItem> {
        self.custom_item_index
            .get(&item)
            .map(|&index| &self.custom_items[index])
    }

    pub fn custom_item_by_id(&self, id: &str) -> Option<&CustomItem> {
        self.custom_item(self.items.by_name(id)?)
    }

    /// Custom items in registration order.
    pub fn custom_items(&self) -> &[CustomItem] {
        &self.custom_items
    }

    pub fn custom_block(&self, block: BlockId) -> Option<&CustomBlock> {
        self.custom_blocks.get(&block)
    }

    pub fn is_custom_state(&self, state: i32) -> bool {
        self.blocks
            .block_of(state)
            .is_some_and(|block| self.custom_blocks.contains_key(&block))
    }

    pub fn reshaped(&self, block: BlockId) -> Option<Reshaped> {
        self.reshaped.get(&block).copied()
    }

    pub fn mushroom_blocks(&self) -> &[BlockId] {
        &self.mushroom_blocks
    }

    pub fn is_mushroom_block(&self, block: BlockId) -> bool {
        self.reshaped(block) == Some(Reshaped::Mushroom)
    }

    pub fn is_mushroom_item(&self, item: i32) -> bool {
        self.mushroom_items.contains(&item)
    }

    pub fn projectile(&self) -> Option<ProjectileKinds> {
        self.projectile
    }

    /// The state clients are shown in place of `state`, or `None` when
    /// the state is shown as is.
    pub fn surrogate_for(&self, state: i32) -> Option<i32> {
        let block = self.blocks.block_of(state)?;
        if let Some(custom) = self.custom_blocks.get(&block) {
            return Some(custom.surrogate);
        }
        let surrogate = match self.reshaped(block)? {
            Reshaped::Mushroom => mushroom_state(&self.blocks, state, MUSHROOM_CANONICAL),
            Reshaped::Dispenser => self.blocks.with_property(state, "triggered", "false"),
            Reshaped::Leaves => leaves_state(&self.blocks, state, LEAVES_CANONICAL),
            Reshaped::Target => self.blocks.with_property(state, "power", "0"),
        };
        if surrogate.is_none() {
            tracing::error!(
                "Reshaped block {} lacks the properties of its canonical state",
                self.blocks.get(block).map_or("?", |b| b.name.as_str())
            );
        }
        surrogate
    }
}

pub struct SubstitutionRegistryBuilder {
    blocks: BlockRegistry,
    items: ItemRegistry,
    custom_items: Vec<CustomItem>,
    custom_blocks: Vec<CustomBlock>,
    projectile: Option<ProjectileKinds>,
}

impl SubstitutionRegistryBuilder {
    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn items(&self) -> &ItemRegistry {
        &self.items
    }

    pub fn custom_item(&mut self, item: CustomItem) -> &mut Self {
        self.custom_items.push(item);
        self
    }

    pub fn custom_block(&mut self, block: CustomBlock) -> &mut Self {
        self.custom_blocks.push(block);
        self
    }

    pub fn projectile(&mut self, kinds: ProjectileKinds) -> &mut Self {
        self.projectile = Some(kinds);
        self
    }

    pub fn build(self) -> Result<SubstitutionRegistry, RegistryError> {
        let mut custom_item_index = AHashMap::new();
        for (index, custom) in self.custom_items.iter().enumerate() {
            if self.items.by_name(&custom.id) != Some(custom.item) {
                return Err(RegistryError::UnknownItem(custom.id.clone()));
            }
            if custom_item_index.insert(custom.item, index).is_some() {
                return Err(RegistryError::DuplicateName(custom.id.clone()));
            }
        }

        let mut custom_blocks = AHashMap::new();
        for custom in self.custom_blocks {
            if self.blocks.get(custom.block).is_none() {
                return Err(RegistryError::UnknownBlock(format!("{:?}", custom.block)));
            }
            custom_blocks.insert(custom.block, custom);
        }

        let mut reshaped = AHashMap::new();
        let mut mushroom_blocks = Vec::new();
        let mut mushroom_items = AHashSet::new();
        for name in MUSHROOM_BLOCKS {
            if let Some(block) = self.blocks.by_name(name) {
                reshaped.insert(block, Reshaped::Mushroom);
                mushroom_blocks.push(block);
            }
            if let Some(item) = self.items.by_name(name) {
                mushroom_items.insert(item);
            }
        }
        for (name, kind) in [
            ("minecraft:dropper", Reshaped::Dispenser),
            ("minecraft:dispenser", Reshaped::Dispenser),
            ("minecraft:pale_oak_leaves", Reshaped::Leaves),
            ("minecraft:target", Reshaped::Target),
        ] {
            if let Some(block) = self.blocks.by_name(name) {
                reshaped.insert(block, kind);
            }
        }

        Ok(SubstitutionRegistry {
            blocks: self.blocks,
            items: self.items,
            custom_items: self.custom_items,
            custom_item_index,
            custom_blocks,
            reshaped,
            mushroom_blocks,
            mushroom_items,
            projectile: self.projectile,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::testing::{fixture, Fixture};

    #[test]
    fn custom_blocks_use_their_descriptor() {
        let Fixture {
            registry, ore, ore_surrogate, ..
        } = fixture();
        let ore_state = registry.blocks().default_state(ore).unwrap();
        assert_eq!(registry.surrogate_for(ore_state), Some(ore_surrogate));
        assert!(registry.is_custom_state(ore_state));
    }

    #[test]
    fn reshaped_blocks_collapse_to_canonical_state() {
        let Fixture { registry, .. } = fixture();
        let blocks = registry.blocks();

        let stem = blocks.by_name("minecraft:mushroom_stem").unwrap();
        let stem_state = blocks.state_with(stem, &[("up", "false")]).unwrap();
        let canonical = registry.surrogate_for(stem_state).unwrap();
        for face in ["north", "east", "south", "west", "up", "down"] {
            assert_eq!(blocks.property(canonical, face), Some("true"));
        }

        let target = blocks.by_name("minecraft:target").unwrap();
        let powered = blocks.state_with(target, &[("power", "9")]).unwrap();
        let quiet = registry.surrogate_for(powered).unwrap();
        assert_eq!(blocks.property(quiet, "power"), Some("0"));

        let leaves = blocks.by_name("minecraft:pale_oak_leaves").unwrap();
        let leaves_state = blocks.default_state(leaves).unwrap();
        let surrogate = registry.surrogate_for(leaves_state).unwrap();
        assert_eq!(blocks.property(surrogate, "distance"), Some("7"));
        assert_eq!(blocks.property(surrogate, "persistent"), Some("true"));

        let dropper = blocks.by_name("minecraft:dropper").unwrap();
        let triggered = blocks.state_with(dropper, &[("triggered", "true")]).unwrap();
        let surrogate = registry.surrogate_for(triggered).unwrap();
        assert_eq!(blocks.property(surrogate, "triggered"), Some("false"));
    }

    #[test]
    fn plain_vanilla_blocks_have_no_surrogate() {
        let Fixture {
            registry, stone, ..
        } = fixture();
        let stone_state = registry.blocks().default_state(stone).unwrap();
        assert_eq!(registry.surrogate_for(stone_state), None);
        assert!(!registry.is_custom_state(stone_state));
    }

    #[test]
    fn surrogates_are_deterministic() {
        let Fixture { registry, .. } = fixture();
        for state in 0..registry.blocks().state_count() as i32 {
            assert_eq!(registry.surrogate_for(state), registry.surrogate_for(state));
        }
    }
}
