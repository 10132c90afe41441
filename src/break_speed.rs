//! Mining speed, computed the way the server does, so the client's
//! break-speed attribute can be scaled when it mines a surrogate.

use crate::{
    protocol::{
        item::{component_type, Component, HolderSet, ItemStack, Tool},
        packet::server::play::AttributeProperty,
    },
    registry::{BlockId, BlockRegistry, SubstitutionRegistry},
};

/// Registry id of the `minecraft:block_break_speed` attribute.
pub const BLOCK_BREAK_SPEED: i32 = 5;

fn holder_set_contains(blocks: &BlockRegistry, set: &HolderSet, block: BlockId) -> bool {
    match set {
        HolderSet::Direct(ids) => ids.contains(&block.as_i32()),
        HolderSet::Tag(tag) => blocks.tag_contains(tag, block),
    }
}

fn tool_of<'a>(registry: &'a SubstitutionRegistry, item: &'a ItemStack) -> Option<&'a Tool> {
    if item.is_empty() {
        return None;
    }
    let component = match registry.items().get(item.item) {
        Some(definition) => definition.effective(&item.components, component_type::TOOL),
        None => item.components.get(component_type::TOOL),
    };
    match component? {
        Component::Tool(tool) => Some(tool),
        _ => None,
    }
}

/// Progress per tick of mining `state` with `item` in hand;
/// zero when the block cannot be broken.
pub fn destroy_speed(registry: &SubstitutionRegistry, state: i32, item: &ItemStack) -> f32 {
    let blocks = registry.blocks();
    let (Some(block), Some(definition)) = (blocks.block_of(state), blocks.state(state)) else {
        return 0.0;
    };
    if definition.hardness == -1.0 {
        return 0.0;
    }

    let tool = tool_of(registry, item);
    let speed = tool.map_or(1.0, |tool| {
        tool.rules
            .iter()
            .find_map(|rule| {
                rule.speed
                    .filter(|_| holder_set_contains(blocks, &rule.blocks, block))
            })
            .unwrap_or(tool.default_mining_speed)
    });
    let correct = tool.is_some_and(|tool| {
        tool.rules
            .iter()
            .find_map(|rule| {
                rule.correct_for_drops
                    .filter(|_| holder_set_contains(blocks, &rule.blocks, block))
            })
            .unwrap_or(false)
    });

    let divisor = if !definition.requires_correct_tool || correct {
        30.0
    } else {
        100.0
    };
    speed / definition.hardness / divisor
}

/// Factor to apply to the client's break speed so that mining at
/// `client` speed finishes when mining at `real` speed would.
/// `None` when no correction is needed or possible.
pub fn correction(real: f32, client: f32) -> Option<f64> {
    if client <= 0.0 || !client.is_finite() || real == client {
        return None;
    }
    Some(f64::from(real) / f64::from(client))
}

/// The attribute with its base value multiplied by `ratio`.
pub fn scaled(attribute: &AttributeProperty, ratio: f64) -> AttributeProperty {
    AttributeProperty {
        base: attribute.base * ratio,
        ..attribute.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        item_codec::ItemCodec,
        registry::{
            testing::{fixture, Fixture},
            ItemRegistry,
        },
    };

    #[test]
    fn pickaxe_on_stone() {
        let Fixture {
            registry,
            stone,
            pickaxe,
            ..
        } = fixture();
        let stone = registry.blocks().default_state(stone).unwrap();
        let speed = destroy_speed(&registry, stone, &ItemStack::new(pickaxe, 1));
        assert!((speed - 2.0 / 1.5 / 30.0).abs() < 1e-6);

        let by_hand = destroy_speed(&registry, stone, &ItemStack::empty());
        assert!((by_hand - 1.0 / 1.5 / 100.0).abs() < 1e-6);
    }

    #[test]
    fn unbreakable_and_unknown_blocks_have_zero_speed() {
        let mut blocks = BlockRegistry::new();
        blocks.register("minecraft:air", vec![], 0.0, false).unwrap();
        let bedrock = blocks.register("minecraft:bedrock", vec![], -1.0, false).unwrap();
        let bedrock = blocks.default_state(bedrock).unwrap();
        let registry = SubstitutionRegistry::builder(blocks, ItemRegistry::new())
            .build()
            .unwrap();
        assert_eq!(destroy_speed(&registry, bedrock, &ItemStack::empty()), 0.0);
        assert_eq!(destroy_speed(&registry, 99, &ItemStack::empty()), 0.0);
    }

    #[test]
    fn equal_speeds_need_no_correction() {
        assert_eq!(correction(0.5, 0.5), None);
        assert_eq!(correction(0.5, 0.0), None);
        assert_eq!(correction(0.25, 0.5), Some(0.5));
    }

    #[test]
    fn disguised_pickaxe_mines_surrogate_at_vanilla_speed() {
        let Fixture {
            registry,
            ore,
            pickaxe,
            ore_surrogate,
            ..
        } = fixture();
        let codec = ItemCodec::new(&registry, 0.01);
        let real_item = ItemStack::new(pickaxe, 1);
        let wire_item = codec.to_wire(&real_item, true).unwrap();

        let ore = registry.blocks().default_state(ore).unwrap();
        let real = destroy_speed(&registry, ore, &real_item);
        let client = destroy_speed(&registry, ore_surrogate, &wire_item);
        assert!((real - 2.0 / 3.0 / 30.0).abs() < 1e-6);
        assert!((client - 2.0 / 1.5 / 30.0).abs() < 1e-6);
        let ratio = correction(real, client).unwrap();
        assert!((ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn scaling_keeps_modifiers() {
        let attribute = AttributeProperty {
            attribute: BLOCK_BREAK_SPEED,
            base: 1.0,
            modifiers: vec![crate::protocol::packet::server::play::AttributeModifier {
                id: "minecraft:effect.haste".to_owned(),
                amount: 0.2,
                operation: 2,
            }],
        };
        let scaled = scaled(&attribute, 0.5);
        assert_eq!(scaled.base, 0.5);
        assert_eq!(scaled.modifiers, attribute.modifiers);
    }
}
