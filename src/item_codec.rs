//! Disguising item stacks on the way to the client and restoring them
//! on the way back.
//!
//! A custom item travels as one of its vanilla materials with every
//! component copied over and its real identifier hidden in custom data.
//! Tools additionally lose their rules for blocks the client never sees,
//! and gain a slow rule for the mushroom family so those blocks still
//! behave as mineable.

use crate::{
    protocol::{
        item::{
            component_type, BlockStateProperties, Component, ComponentPatch, HolderSet,
            ItemStack, Tool, ToolRule,
        },
        nbt::{Compound, Tag},
    },
    registry::{BlockId, SubstitutionRegistry},
};
use once_cell::sync::Lazy;

/// Custom data key under which the real item's identifier travels.
pub const HIDDEN_ID_KEY: &str = "lost_engine_id";

/// Placement properties stamped on mushroom-family items so they place
/// in the canonical all-faces state.
pub static MUSHROOM_MARKER: Lazy<BlockStateProperties> = Lazy::new(|| {
    BlockStateProperties::new([
        ("down", "true"),
        ("east", "true"),
        ("north", "true"),
        ("south", "true"),
        ("up", "true"),
        ("west", "true"),
    ])
});

#[derive(Debug, Clone, Copy)]
pub struct ItemCodec<'a> {
    registry: &'a SubstitutionRegistry,
    tool_rule_speed: f32,
}

impl<'a> ItemCodec<'a> {
    pub fn new(registry: &'a SubstitutionRegistry, tool_rule_speed: f32) -> Self {
        Self {
            registry,
            tool_rule_speed,
        }
    }

    /// Disguises `stack` for the client.
    ///
    /// `dynamic` selects the in-hand material of a custom item. Returns
    /// `None` when the stack can be sent as is.
    pub fn to_wire(&self, stack: &ItemStack, dynamic: bool) -> Option<ItemStack> {
        if stack.is_empty() {
            return None;
        }
        let mut wire = stack.clone();

        if self.registry.is_mushroom_item(stack.item)
            && stack.components.get(component_type::BLOCK_STATE).is_none()
        {
            wire.components
                .set(Component::BlockState(MUSHROOM_MARKER.clone()));
        }

        if let Some(custom) = self.registry.custom_item(stack.item) {
            let material = if dynamic {
                &custom.dynamic_material
            } else {
                &custom.default_material
            };
            let mut surrogate = material.clone();
            surrogate.count = stack.count;
            if let Some(definition) = self.registry.items().get(stack.item) {
                for component in definition.default_components.values() {
                    surrogate.components.set(component.clone());
                }
            }
            surrogate.components.apply(&stack.components);
            surrogate.components.remove(component_type::REPAIRABLE);
            let mut data = match surrogate.components.get(component_type::CUSTOM_DATA) {
                Some(Component::CustomData(data)) => data.clone(),
                _ => Compound::new(),
            };
            data.insert(HIDDEN_ID_KEY, Tag::String(custom.id.clone()));
            surrogate.components.set(Component::CustomData(data));
            wire = surrogate;
        }

        let tool = self.effective_tool(&wire);
        let rewritten = match tool {
            Some(tool) => self.filter_tool(tool),
            None => Tool {
                rules: vec![self.synthetic_rule()],
                default_mining_speed: 1.0,
                damage_per_block: 1,
                can_destroy_blocks_in_creative: true,
            },
        };
        if tool != Some(&rewritten) {
            wire.components.set(Component::Tool(rewritten));
        }

        (wire != *stack).then_some(wire)
    }

    /// Restores the real stack from a client-supplied one.
    /// Returns `None` when the stack is already real.
    pub fn to_real(&self, stack: &ItemStack) -> Option<ItemStack> {
        if stack.is_empty() {
            return None;
        }
        let mut wire = stack.clone();

        if let Some(id) = stack.custom_string(HIDDEN_ID_KEY) {
            match self.registry.items().by_name(id) {
                Some(real_item) => return Some(self.restore(stack, real_item)),
                None => {
                    tracing::warn!("Client sent an item tagged with unknown id {id}");
                    strip_hidden_id(&mut wire.components);
                }
            }
        }

        if matches!(
            wire.components.get(component_type::TOOL),
            Some(Component::Tool(tool)) if tool.rules.contains(&self.synthetic_rule())
        ) {
            wire.components.reset(component_type::TOOL);
        }
        if matches!(
            wire.components.get(component_type::BLOCK_STATE),
            Some(Component::BlockState(properties)) if *properties == *MUSHROOM_MARKER
        ) {
            wire.components.reset(component_type::BLOCK_STATE);
        }

        (wire != *stack).then_some(wire)
    }

    fn restore(&self, wire: &ItemStack, real_item: i32) -> ItemStack {
        let mut components = wire.components.clone();
        strip_hidden_id(&mut components);
        for kind in [
            component_type::TOOL,
            component_type::BLOCK_STATE,
            component_type::REPAIRABLE,
        ] {
            components.reset(kind);
        }
        if let Some(definition) = self.registry.items().get(real_item) {
            let defaults = &definition.default_components;
            components
                .added
                .retain(|kind, component| defaults.get(kind) != Some(component));
            components.removed.retain(|kind| defaults.contains_key(kind));
        }
        ItemStack {
            count: wire.count,
            item: real_item,
            components,
        }
    }

    fn effective_tool<'s>(&self, stack: &'s ItemStack) -> Option<&'s Tool>
    where
        'a: 's,
    {
        let component = match self.registry.items().get(stack.item) {
            Some(definition) => definition.effective(&stack.components, component_type::TOOL),
            None => stack.components.get(component_type::TOOL),
        };
        match component? {
            Component::Tool(tool) => Some(tool),
            _ => None,
        }
    }

    /// Slow rule covering the mushroom family.
    pub fn synthetic_rule(&self) -> ToolRule {
        ToolRule {
            blocks: HolderSet::Direct(
                self.registry
                    .mushroom_blocks()
                    .iter()
                    .map(|b| b.as_i32())
                    .collect(),
            ),
            speed: Some(self.tool_rule_speed),
            correct_for_drops: None,
        }
    }

    fn hidden_from_tools(&self, block: BlockId) -> bool {
        self.registry.custom_block(block).is_some() || self.registry.is_mushroom_block(block)
    }

    /// Removes hidden blocks from every rule, dropping rules left empty,
    /// then appends the synthetic rule.
    fn filter_tool(&self, tool: &Tool) -> Tool {
        let blocks = self.registry.blocks();
        let mut rules = Vec::with_capacity(tool.rules.len() + 1);
        for rule in &tool.rules {
            let kept = match &rule.blocks {
                HolderSet::Direct(ids) => {
                    let kept: Vec<i32> = ids
                        .iter()
                        .copied()
                        .filter(|&id| {
                            u32::try_from(id).map_or(true, |id| !self.hidden_from_tools(BlockId(id)))
                        })
                        .collect();
                    if kept.len() == ids.len() {
                        rule.blocks.clone()
                    } else {
                        HolderSet::Direct(kept)
                    }
                }
                HolderSet::Tag(tag) => {
                    let members = blocks.tag_members(tag);
                    if members.iter().any(|&b| self.hidden_from_tools(b)) {
                        HolderSet::Direct(
                            members
                                .into_iter()
                                .filter(|&b| !self.hidden_from_tools(b))
                                .map(BlockId::as_i32)
                                .collect(),
                        )
                    } else {
                        rule.blocks.clone()
                    }
                }
            };
            if matches!(&kept, HolderSet::Direct(ids) if ids.is_empty()) {
                continue;
            }
            rules.push(ToolRule {
                blocks: kept,
                ..rule.clone()
            });
        }
        rules.push(self.synthetic_rule());
        Tool {
            rules,
            ..tool.clone()
        }
    }
}

fn strip_hidden_id(components: &mut ComponentPatch) {
    if let Some(Component::CustomData(data)) = components.get_mut(component_type::CUSTOM_DATA) {
        data.remove(HIDDEN_ID_KEY);
        if data.is_empty() {
            components.reset(component_type::CUSTOM_DATA);
        }
    }
}
