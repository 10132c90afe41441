//! Item stacks and the data components this crate interprets.
//!
//! Stacks use the length-prefixed component form: every added
//! component value is preceded by its VarInt byte length, which lets
//! components we do not understand travel as opaque bytes.

use crate::protocol::{nbt::Compound, Decode, DecodeError, Decoder, Encode, Encoder};
use minecraft_surrogate_macros::{Decode, Encode};
use std::collections::{BTreeMap, BTreeSet};

/// Registry ids of the data component types we interpret.
pub mod component_type {
    pub const CUSTOM_DATA: i32 = 0;
    pub const TOOL: i32 = 25;
    pub const REPAIRABLE: i32 = 29;
    pub const BLOCK_STATE: i32 = 67;
    pub const PAINTING_VARIANT: i32 = 85;
}

/// A stack of items. A count of zero or less is the empty stack,
/// which carries no item id or components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemStack {
    pub count: i32,
    pub item: i32,
    pub components: ComponentPatch,
}

impl ItemStack {
    pub fn new(item: i32, count: i32) -> Self {
        Self {
            count,
            item,
            components: ComponentPatch::default(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.count <= 0
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.set(component);
        self
    }

    /// Reads a string from the custom data component.
    pub fn custom_string(&self, key: &str) -> Option<&str> {
        match self.components.get(component_type::CUSTOM_DATA)? {
            Component::CustomData(data) => data.get(key)?.as_str(),
            _ => None,
        }
    }
}

impl Decode for ItemStack {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let count = decoder.read_var_int()?;
        if count <= 0 {
            return Ok(Self::empty());
        }
        let item = decoder.read_var_int()?;
        let components = ComponentPatch::decode(decoder)?;
        Ok(Self {
            count,
            item,
            components,
        })
    }
}

impl Encode for ItemStack {
    fn encode(&self, encoder: &mut Encoder) {
        if self.is_empty() {
            encoder.write_var_int(0);
            return;
        }
        encoder.write_var_int(self.count);
        encoder.write_var_int(self.item);
        self.components.encode(encoder);
    }
}

/// Difference between a stack's components and its item's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentPatch {
    pub added: BTreeMap<i32, Component>,
    pub removed: BTreeSet<i32>,
}

impl ComponentPatch {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn get(&self, kind: i32) -> Option<&Component> {
        self.added.get(&kind)
    }

    pub fn get_mut(&mut self, kind: i32) -> Option<&mut Component> {
        self.added.get_mut(&kind)
    }

    /// Adds or replaces a component, undoing any removal of its type.
    pub fn set(&mut self, component: Component) {
        let kind = component.kind();
        self.removed.remove(&kind);
        self.added.insert(kind, component);
    }

    /// Marks a component type as removed from the item's defaults.
    pub fn remove(&mut self, kind: i32) {
        self.added.remove(&kind);
        self.removed.insert(kind);
    }

    /// Drops any override of `kind`, falling back to the item's default.
    pub fn reset(&mut self, kind: i32) {
        self.added.remove(&kind);
        self.removed.remove(&kind);
    }

    /// Applies `other` on top of this patch.
    pub fn apply(&mut self, other: &ComponentPatch) {
        for component in other.added.values() {
            self.set(component.clone());
        }
        for &kind in &other.removed {
            self.remove(kind);
        }
    }
}

impl Decode for ComponentPatch {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let added_count = decoder.read_var_int()?;
        let removed_count = decoder.read_var_int()?;
        let mut patch = ComponentPatch::default();
        for _ in 0..added_count {
            let kind = decoder.read_var_int()?;
            let value = decoder.read_byte_array()?;
            patch.added.insert(kind, Component::from_bytes(kind, value)?);
        }
        for _ in 0..removed_count {
            patch.removed.insert(decoder.read_var_int()?);
        }
        Ok(patch)
    }
}

impl Encode for ComponentPatch {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_var_int(self.added.len() as i32);
        encoder.write_var_int(self.removed.len() as i32);
        for (&kind, component) in &self.added {
            encoder.write_var_int(kind);
            encoder.write_length_prefixed(component);
        }
        for &kind in &self.removed {
            encoder.write_var_int(kind);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    CustomData(Compound),
    Tool(Tool),
    BlockState(BlockStateProperties),
    /// Holder reference: registry id plus one.
    PaintingVariant(i32),
    Opaque { kind: i32, data: Vec<u8> },
}

impl Component {
    pub fn kind(&self) -> i32 {
        match self {
            Component::CustomData(_) => component_type::CUSTOM_DATA,
            Component::Tool(_) => component_type::TOOL,
            Component::BlockState(_) => component_type::BLOCK_STATE,
            Component::PaintingVariant(_) => component_type::PAINTING_VARIANT,
            Component::Opaque { kind, .. } => *kind,
        }
    }

    fn from_bytes(kind: i32, bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut decoder = Decoder::new(bytes);
        let component = match kind {
            component_type::CUSTOM_DATA => Component::CustomData(Compound::decode(&mut decoder)?),
            component_type::TOOL => Component::Tool(Tool::decode(&mut decoder)?),
            component_type::BLOCK_STATE => {
                Component::BlockState(BlockStateProperties::decode(&mut decoder)?)
            }
            component_type::PAINTING_VARIANT => {
                let holder = decoder.read_var_int()?;
                if holder == 0 {
                    // Inline variant definitions are carried untouched.
                    return Ok(Component::Opaque {
                        kind,
                        data: bytes.to_vec(),
                    });
                }
                Component::PaintingVariant(holder)
            }
            _ => {
                return Ok(Component::Opaque {
                    kind,
                    data: bytes.to_vec(),
                })
            }
        };
        if !decoder.is_finished() {
            return Err(DecodeError::TrailingBytes(decoder.buffer().len()));
        }
        Ok(component)
    }
}

impl Encode for Component {
    fn encode(&self, encoder: &mut Encoder) {
        match self {
            Component::CustomData(data) => data.encode(encoder),
            Component::Tool(tool) => tool.encode(encoder),
            Component::BlockState(properties) => properties.encode(encoder),
            Component::PaintingVariant(holder) => {
                encoder.write_var_int(*holder);
            }
            Component::Opaque { data, .. } => encoder.write_slice(data),
        }
    }
}

/// A set of blocks referenced either by tag or by explicit ids.
#[derive(Debug, Clone, PartialEq)]
pub enum HolderSet {
    Tag(String),
    Direct(Vec<i32>),
}

impl Decode for HolderSet {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let size = decoder.read_var_int()?;
        if size == 0 {
            return Ok(HolderSet::Tag(decoder.read_string()?.to_owned()));
        }
        let mut ids = Vec::new();
        for _ in 0..size - 1 {
            ids.push(decoder.read_var_int()?);
        }
        Ok(HolderSet::Direct(ids))
    }
}

impl Encode for HolderSet {
    fn encode(&self, encoder: &mut Encoder) {
        match self {
            HolderSet::Tag(tag) => {
                encoder.write_var_int(0);
                encoder.write_string(tag);
            }
            HolderSet::Direct(ids) => {
                encoder.write_var_int(ids.len() as i32 + 1);
                for &id in ids {
                    encoder.write_var_int(id);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ToolRule {
    pub blocks: HolderSet,
    #[encoding(bool_prefixed)]
    pub speed: Option<f32>,
    #[encoding(bool_prefixed)]
    pub correct_for_drops: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Tool {
    #[encoding(length_prefix = "varint")]
    pub rules: Vec<ToolRule>,
    pub default_mining_speed: f32,
    #[encoding(varint)]
    pub damage_per_block: i32,
    pub can_destroy_blocks_in_creative: bool,
}

/// Block state properties applied when an item is placed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockStateProperties {
    pub properties: BTreeMap<String, String>,
}

impl BlockStateProperties {
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            properties: pairs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        }
    }
}

impl Decode for BlockStateProperties {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let count = decoder.read_var_int()?;
        let mut properties = BTreeMap::new();
        for _ in 0..count {
            let name = decoder.read_string()?.to_owned();
            let value = decoder.read_string()?.to_owned();
            properties.insert(name, value);
        }
        Ok(Self { properties })
    }
}

impl Encode for BlockStateProperties {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_var_int(self.properties.len() as i32);
        for (name, value) in &self.properties {
            encoder.write_string(name);
            encoder.write_string(value);
        }
    }
}
