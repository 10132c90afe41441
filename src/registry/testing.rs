//! A small vanilla world plus a handful of custom content for unit tests.

use crate::{
    protocol::item::{Component, HolderSet, ItemStack, Tool, ToolRule},
    registry::{
        BlockId, BlockRegistry, CustomBlock, CustomItem, ItemRegistry, ProjectileKinds,
        PropertySchema, SubstitutionRegistry, SurrogateAllocator, SurrogateGroup,
    },
};
use std::sync::Arc;

pub const TRIDENT_ENTITY: i32 = 131;
pub const ITEM_DISPLAY_ENTITY: i32 = 71;

pub fn vanilla_blocks() -> BlockRegistry {
    let mut blocks = BlockRegistry::new();
    blocks.register("minecraft:air", vec![], 0.0, false).unwrap();
    let stone = blocks.register("minecraft:stone", vec![], 1.5, true).unwrap();
    let faces = || {
        ["down", "east", "north", "south", "up", "west"]
            .into_iter()
            .map(PropertySchema::boolean)
            .collect::<Vec<_>>()
    };
    for name in [
        "minecraft:red_mushroom_block",
        "minecraft:brown_mushroom_block",
        "minecraft:mushroom_stem",
    ] {
        let block = blocks.register(name, faces(), 0.2, false).unwrap();
        blocks.tag("minecraft:mineable/axe", [block]);
    }
    for name in ["minecraft:dispenser", "minecraft:dropper"] {
        let block = blocks
            .register(
                name,
                vec![
                    PropertySchema::new(
                        "facing",
                        &["north", "east", "south", "west", "up", "down"],
                    ),
                    PropertySchema::boolean("triggered"),
                ],
                3.5,
                true,
            )
            .unwrap();
        blocks
            .set_default(block, &[("triggered", "false")])
            .unwrap();
        blocks.tag("minecraft:mineable/pickaxe", [block]);
    }
    blocks
        .register(
            "minecraft:target",
            vec![PropertySchema::range("power", 0, 15)],
            0.5,
            false,
        )
        .unwrap();
    let leaves = blocks
        .register(
            "minecraft:pale_oak_leaves",
            vec![
                PropertySchema::range("distance", 1, 7),
                PropertySchema::boolean("persistent"),
                PropertySchema::boolean("waterlogged"),
            ],
            0.2,
            false,
        )
        .unwrap();
    blocks
        .set_default(
            leaves,
            &[("distance", "7"), ("persistent", "false"), ("waterlogged", "false")],
        )
        .unwrap();
    blocks.tag("minecraft:mineable/pickaxe", [stone]);
    blocks
}

pub struct Fixture {
    pub registry: Arc<SubstitutionRegistry>,
    pub stone: BlockId,
    /// Custom block shown as stone.
    pub ore: BlockId,
    pub ore_surrogate: i32,
    /// Custom block shown as a mushroom face combination.
    pub ruby_block: BlockId,
    pub pickaxe: i32,
    pub ruby: i32,
    pub diamond: i32,
    pub emerald: i32,
    pub painting: i32,
    pub mushroom_item: i32,
    pub stick: i32,
}

pub fn pickaxe_tool() -> Tool {
    Tool {
        rules: vec![ToolRule {
            blocks: HolderSet::Tag("minecraft:mineable/pickaxe".to_owned()),
            speed: Some(2.0),
            correct_for_drops: Some(true),
        }],
        default_mining_speed: 1.0,
        damage_per_block: 1,
        can_destroy_blocks_in_creative: true,
    }
}

pub fn fixture() -> Fixture {
    let mut blocks = vanilla_blocks();
    let stone = blocks.by_name("minecraft:stone").unwrap();
    let ore = blocks.register("lost:ruby_ore", vec![], 3.0, true).unwrap();
    blocks.tag("minecraft:mineable/pickaxe", [ore]);
    let ruby_block = blocks.register("lost:ruby_block", vec![], 5.0, true).unwrap();

    let mut items = ItemRegistry::new();
    items.register("minecraft:air", "Air", []).unwrap();
    items.register("minecraft:stone", "Stone", []).unwrap();
    let pickaxe = items
        .register(
            "minecraft:wooden_pickaxe",
            "Wooden Pickaxe",
            [Component::Tool(pickaxe_tool())],
        )
        .unwrap();
    let diamond = items.register("minecraft:diamond", "Diamond", []).unwrap();
    let emerald = items.register("minecraft:emerald", "Emerald", []).unwrap();
    let painting = items.register("minecraft:painting", "Painting", []).unwrap();
    let mushroom_item = items
        .register("minecraft:red_mushroom_block", "Red Mushroom Block", [])
        .unwrap();
    let stick = items.register("minecraft:stick", "Stick", []).unwrap();
    let ruby = items.register("lost:ruby", "Ruby", []).unwrap();

    let ore_surrogate = blocks.default_state(stone).unwrap();
    let ruby_block_surrogate = SurrogateAllocator::new(&blocks)
        .allocate(SurrogateGroup::Wood)
        .unwrap();

    let mut builder = SubstitutionRegistry::builder(blocks, items);
    builder
        .custom_item(CustomItem {
            id: "lost:ruby".to_owned(),
            item: ruby,
            dynamic_material: ItemStack::new(diamond, 1),
            default_material: ItemStack::new(emerald, 1),
            tool_type: None,
        })
        .custom_block(CustomBlock {
            block: ore,
            surrogate: ore_surrogate,
            inert_surrogate: None,
        })
        .custom_block(CustomBlock {
            block: ruby_block,
            surrogate: ruby_block_surrogate,
            inert_surrogate: None,
        })
        .projectile(ProjectileKinds {
            real: TRIDENT_ENTITY,
            surrogate: ITEM_DISPLAY_ENTITY,
        });

    Fixture {
        registry: Arc::new(builder.build().unwrap()),
        stone,
        ore,
        ore_surrogate,
        ruby_block,
        pickaxe,
        ruby,
        diamond,
        emerald,
        painting,
        mushroom_item,
        stick,
    }
}
