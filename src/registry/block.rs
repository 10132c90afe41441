//! Block definitions and their contiguous state id ranges.
//!
//! Each block owns the states `first_state .. first_state + state_count()`.
//! Within that range a state's properties are laid out mixed-radix in
//! declaration order, with the last property varying fastest.

use crate::registry::RegistryError;
use ahash::{AHashMap, AHashSet};

/// The state id of air. Registries must register air first.
pub const AIR: i32 = 0;

/// Index of a block in the [`BlockRegistry`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn as_i32(self) -> i32 {
        self.0 as i32
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertySchema {
    pub name: String,
    pub values: Vec<String>,
}

impl PropertySchema {
    pub fn new(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            values: values.iter().map(|v| (*v).to_owned()).collect(),
        }
    }

    /// A `true`/`false` property.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, &["true", "false"])
    }

    /// An integer property over `min..=max`.
    pub fn range(name: &str, min: i32, max: i32) -> Self {
        Self {
            name: name.to_owned(),
            values: (min..=max).map(|v| v.to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockDefinition {
    /// Namespaced name, e.g. `minecraft:stone`.
    pub name: String,
    pub first_state: i32,
    pub properties: Vec<PropertySchema>,
    pub default_state: i32,
    /// `-1` marks an unbreakable block.
    pub hardness: f32,
    pub requires_correct_tool: bool,
}

impl BlockDefinition {
    pub fn state_count(&self) -> i32 {
        self.properties
            .iter()
            .map(|p| p.values.len() as i32)
            .product()
    }

    fn stride(&self, property: usize) -> i32 {
        self.properties[property + 1..]
            .iter()
            .map(|p| p.values.len() as i32)
            .product()
    }

    fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }
}

/// Registry of every block the server knows, vanilla and custom alike.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    blocks: Vec<BlockDefinition>,
    by_name: AHashMap<String, BlockId>,
    /// `state id -> owning block`
    state_owners: Vec<BlockId>,
    tags: AHashMap<String, AHashSet<BlockId>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a block, assigning it the next free range of state ids.
    /// Its default state is the first one in the range.
    pub fn register(
        &mut self,
        name: &str,
        properties: Vec<PropertySchema>,
        hardness: f32,
        requires_correct_tool: bool,
    ) -> Result<BlockId, RegistryError> {
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_owned()));
        }
        let id = BlockId(self.blocks.len() as u32);
        let first_state = self.state_owners.len() as i32;
        let definition = BlockDefinition {
            name: name.to_owned(),
            first_state,
            properties,
            default_state: first_state,
            hardness,
            requires_correct_tool,
        };
        for _ in 0..definition.state_count() {
            self.state_owners.push(id);
        }
        self.by_name.insert(name.to_owned(), id);
        self.blocks.push(definition);
        Ok(id)
    }

    /// Overrides the default state of a block with the given property values.
    pub fn set_default(
        &mut self,
        block: BlockId,
        properties: &[(&str, &str)],
    ) -> Result<(), RegistryError> {
        let state = self.state_with(block, properties)?;
        self.blocks[block.0 as usize].default_state = state;
        Ok(())
    }

    /// Adds blocks to a tag such as `minecraft:mineable/pickaxe`.
    pub fn tag(&mut self, tag: &str, blocks: impl IntoIterator<Item = BlockId>) {
        self.tags.entry(tag.to_owned()).or_default().extend(blocks);
    }

    pub fn get(&self, block: BlockId) -> Option<&BlockDefinition> {
        self.blocks.get(block.0 as usize)
    }

    pub fn by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn block_of(&self, state: i32) -> Option<BlockId> {
        self.state_owners.get(usize::try_from(state).ok()?).copied()
    }

    /// Definition of the block owning `state`.
    pub fn state(&self, state: i32) -> Option<&BlockDefinition> {
        self.get(self.block_of(state)?)
    }

    pub fn default_state(&self, block: BlockId) -> Option<i32> {
        self.get(block).map(|b| b.default_state)
    }

    pub fn property(&self, state: i32, name: &str) -> Option<&str> {
        let block = self.state(state)?;
        let index = block.property_index(name)?;
        let schema = &block.properties[index];
        let offset = state - block.first_state;
        let value = (offset / block.stride(index)) % schema.values.len() as i32;
        Some(&schema.values[value as usize])
    }

    /// The state equal to `state` except for one property value.
    pub fn with_property(&self, state: i32, name: &str, value: &str) -> Option<i32> {
        let block = self.state(state)?;
        let index = block.property_index(name)?;
        let schema = &block.properties[index];
        let new_value = schema.values.iter().position(|v| v == value)? as i32;
        let stride = block.stride(index);
        let offset = state - block.first_state;
        let old_value = (offset / stride) % schema.values.len() as i32;
        Some(state + (new_value - old_value) * stride)
    }

    /// The block's default state with some properties replaced.
    pub fn state_with(
        &self,
        block: BlockId,
        properties: &[(&str, &str)],
    ) -> Result<i32, RegistryError> {
        let definition = self
            .get(block)
            .ok_or_else(|| RegistryError::UnknownBlock(format!("{block:?}")))?;
        let mut state = definition.default_state;
        for &(name, value) in properties {
            state = self
                .with_property(state, name, value)
                .ok_or_else(|| RegistryError::UnknownProperty {
                    block: definition.name.clone(),
                    property: format!("{name}={value}"),
                })?;
        }
        Ok(state)
    }

    pub fn tag_contains(&self, tag: &str, block: BlockId) -> bool {
        self.tags.get(tag).is_some_and(|members| members.contains(&block))
    }

    /// Members of a tag in id order.
    pub fn tag_members(&self, tag: &str) -> Vec<BlockId> {
        let mut members: Vec<BlockId> = self
            .tags
            .get(tag)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }

    pub fn state_count(&self) -> usize {
        self.state_owners.len()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
