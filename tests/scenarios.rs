use minecraft_surrogate::{
    entity_id::EntityId,
    host::{BridgeDetector, GameMode, Outgoing, PlayerHandle, Scheduler, TokioScheduler},
    position::BlockPosition,
    projectile::ProjectileTracker,
    protocol::{
        item::{Component, HolderSet, ItemStack, Tool, ToolRule},
        packet::{
            client, server,
            server::play::{
                AttributeProperty, BlockUpdate, Bundle, EntityPositionSync, Login,
                SetContainerContents, SetEntityVelocity, SpawnEntity, UpdateAttributes,
            },
            side, state, UnknownPacket,
        },
    },
    registry::{
        BlockRegistry, CustomBlock, CustomItem, ItemRegistry, ProjectileKinds,
        SubstitutionRegistry,
    },
    Config, ConnectionTranslator, TranslatePacket, TranslatorContext,
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use uuid::Uuid;

const PLAYER_ENTITY: i32 = 1;
const TRIDENT: i32 = 131;
const ITEM_DISPLAY: i32 = 71;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

struct World {
    registry: Arc<SubstitutionRegistry>,
    ore: i32,
    stone: i32,
    pickaxe: i32,
    wand: i32,
    wand_held: i32,
    wand_stored: i32,
}

fn world() -> World {
    init_logging();
    let mut blocks = BlockRegistry::new();
    blocks.register("minecraft:air", vec![], 0.0, false).unwrap();
    let stone = blocks.register("minecraft:stone", vec![], 1.5, true).unwrap();
    let ore = blocks.register("lost:deep_ore", vec![], 3.0, true).unwrap();
    blocks.tag("minecraft:mineable/pickaxe", [stone, ore]);

    let mut items = ItemRegistry::new();
    items.register("minecraft:air", "Air", []).unwrap();
    let pickaxe = items
        .register(
            "minecraft:iron_pickaxe",
            "Iron Pickaxe",
            [Component::Tool(Tool {
                rules: vec![ToolRule {
                    blocks: HolderSet::Tag("minecraft:mineable/pickaxe".to_owned()),
                    speed: Some(6.0),
                    correct_for_drops: Some(true),
                }],
                default_mining_speed: 1.0,
                damage_per_block: 1,
                can_destroy_blocks_in_creative: true,
            })],
        )
        .unwrap();
    let wand_held = items.register("minecraft:blaze_rod", "Blaze Rod", []).unwrap();
    let wand_stored = items.register("minecraft:stick", "Stick", []).unwrap();
    let wand = items.register("lost:wand", "Wand", []).unwrap();

    let stone_state = blocks.default_state(stone).unwrap();
    let ore_state = blocks.default_state(ore).unwrap();
    let mut builder = SubstitutionRegistry::builder(blocks, items);
    builder
        .custom_block(CustomBlock {
            block: ore,
            surrogate: stone_state,
            inert_surrogate: None,
        })
        .custom_item(CustomItem {
            id: "lost:wand".to_owned(),
            item: wand,
            dynamic_material: ItemStack::new(wand_held, 1),
            default_material: ItemStack::new(wand_stored, 1),
            tool_type: None,
        })
        .projectile(ProjectileKinds {
            real: TRIDENT,
            surrogate: ITEM_DISPLAY,
        });

    World {
        registry: Arc::new(builder.build().unwrap()),
        ore: ore_state,
        stone: stone_state,
        pickaxe,
        wand,
        wand_held,
        wand_stored,
    }
}

struct Player {
    inventory: HashMap<usize, ItemStack>,
}

impl PlayerHandle for Player {
    fn profile(&self) -> Option<Uuid> {
        Some(Uuid::from_u128(0xA11CE))
    }

    fn entity_id(&self) -> i32 {
        PLAYER_ENTITY
    }

    fn game_mode(&self) -> Option<GameMode> {
        Some(GameMode::Survival)
    }

    fn inventory_item(&self, slot: usize) -> Option<ItemStack> {
        self.inventory.get(&slot).cloned()
    }

    fn is_immobile(&self) -> bool {
        false
    }

    fn break_speed_attribute(&self) -> Option<AttributeProperty> {
        Some(AttributeProperty {
            attribute: 5,
            base: 1.0,
            modifiers: vec![],
        })
    }

    fn destroy_progress(&self, _state: i32, _position: BlockPosition) -> f32 {
        0.05
    }

    fn resync_inventory_after(&self, _ticks: u32) {}
}

struct NoBridge;

impl BridgeDetector for NoBridge {
    fn is_bridged(&self, _player: Uuid) -> bool {
        false
    }
}

struct Connection {
    context: TranslatorContext,
    translator: ConnectionTranslator,
    outbox: flume::Receiver<Outgoing>,
}

impl Connection {
    fn open(
        world: &World,
        inventory: HashMap<usize, ItemStack>,
        projectiles: ProjectileTracker,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let context = TranslatorContext {
            registry: Arc::clone(&world.registry),
            config: Arc::new(Config::default()),
            bridge: Arc::new(NoBridge),
            scheduler,
            projectiles,
        };
        let (sender, outbox) = flume::unbounded();
        let translator =
            ConnectionTranslator::new(context.clone(), Arc::new(Player { inventory }), sender);
        Self {
            context,
            translator,
            outbox,
        }
    }

    fn clientbound(&mut self, packet: server::play::Packet) -> Option<server::play::Packet> {
        TranslatePacket::<side::Server, state::Play>::translate_packet(&mut self.translator, packet)
    }

    fn serverbound(&mut self, packet: client::play::Packet) -> Option<client::play::Packet> {
        TranslatePacket::<side::Client, state::Play>::translate_packet(&mut self.translator, packet)
    }

    fn drain(&self) -> Vec<Outgoing> {
        self.outbox.drain().collect()
    }
}

struct Idle;

impl Scheduler for Idle {
    fn run_later(&self, _delay: Duration, _task: Box<dyn FnOnce() + Send>) {}
}

fn login() -> server::play::Packet {
    server::play::Packet::Login(Login {
        entity_id: PLAYER_ENTITY,
        min_y: -64,
        height: 384,
        rest: vec![],
    })
}

#[test]
fn digging_custom_block_scales_break_speed() {
    let world = world();
    let inventory = HashMap::from([(0, ItemStack::new(world.pickaxe, 1))]);
    let mut connection = Connection::open(&world, inventory, ProjectileTracker::new(), Arc::new(Idle));
    connection.clientbound(login());

    let position = BlockPosition::new(10, 64, 10);
    let shown = connection.clientbound(server::play::Packet::BlockUpdate(BlockUpdate {
        position,
        state: world.ore,
    }));
    assert_eq!(
        shown,
        Some(server::play::Packet::BlockUpdate(BlockUpdate {
            position,
            state: world.stone,
        }))
    );

    let dig = client::play::Packet::PlayerAction(client::play::PlayerAction {
        status: client::play::action::START_DESTROY_BLOCK,
        position,
        face: 1,
        sequence: 4,
    });
    assert_eq!(connection.serverbound(dig.clone()), Some(dig));

    // 6 / 3.0 / 30 for real versus 6 / 1.5 / 30 for what the client sees
    let sent = connection.drain();
    let [Outgoing::Play(server::play::Packet::UpdateAttributes(UpdateAttributes {
        entity_id,
        properties,
    }))] = sent.as_slice()
    else {
        panic!("expected a single attribute update, got {sent:?}");
    };
    assert_eq!(*entity_id, PLAYER_ENTITY);
    assert_eq!(properties.len(), 1);
    assert!((properties[0].base - 0.5).abs() < 1e-6);

    let stop = client::play::Packet::PlayerAction(client::play::PlayerAction {
        status: client::play::action::ABORT_DESTROY_BLOCK,
        position,
        face: 1,
        sequence: 5,
    });
    connection.serverbound(stop);
    let sent = connection.drain();
    let [Outgoing::Play(server::play::Packet::UpdateAttributes(restored))] = sent.as_slice() else {
        panic!("expected the attribute to be restored, got {sent:?}");
    };
    assert_eq!(restored.properties[0].base, 1.0);
}

#[test]
fn only_held_slot_shows_dynamic_material() {
    let world = world();
    let mut connection = Connection::open(
        &world,
        HashMap::new(),
        ProjectileTracker::new(),
        Arc::new(Idle),
    );
    let wand = ItemStack::new(world.wand, 1);
    let mut slots = vec![ItemStack::empty(); 46];
    for slot in [9, 36, 40] {
        slots[slot] = wand.clone();
    }

    let Some(server::play::Packet::SetContainerContents(contents)) =
        connection.clientbound(server::play::Packet::SetContainerContents(SetContainerContents {
            window_id: 0,
            state_id: 1,
            slots,
            carried: ItemStack::empty(),
        }))
    else {
        panic!("inventory snapshot was suppressed");
    };

    assert_eq!(contents.slots[36].item, world.wand_held);
    assert_eq!(contents.slots[9].item, world.wand_stored);
    assert_eq!(contents.slots[40].item, world.wand_stored);
    assert!(contents.slots[0].is_empty());
    assert!(contents.carried.is_empty());
    for slot in [9, 36, 40] {
        assert_eq!(contents.slots[slot].count, 1);
    }
}

#[test]
fn bundle_rewrites_only_what_needs_it() {
    let world = world();
    let mut connection = Connection::open(
        &world,
        HashMap::new(),
        ProjectileTracker::new(),
        Arc::new(Idle),
    );
    let first = server::play::Packet::Other(UnknownPacket {
        id: 0x26,
        data: vec![1, 2, 3],
    });
    let third = server::play::Packet::Other(UnknownPacket {
        id: 0x6b,
        data: vec![9],
    });
    let position = BlockPosition::new(-3, 12, 40);
    let bundle = server::play::Packet::Bundle(Bundle {
        packets: vec![
            first.clone(),
            server::play::Packet::BlockUpdate(BlockUpdate {
                position,
                state: world.ore,
            }),
            third.clone(),
        ],
    });

    let Some(server::play::Packet::Bundle(translated)) = connection.clientbound(bundle) else {
        panic!("bundle was suppressed");
    };
    assert_eq!(
        translated.packets,
        [
            first,
            server::play::Packet::BlockUpdate(BlockUpdate {
                position,
                state: world.stone,
            }),
            third,
        ]
    );
    assert_eq!(connection.translator.cache().get(position), Some(world.ore));
}

#[tokio::test(start_paused = true)]
async fn projectile_lives_as_display_until_evicted() {
    let world = world();
    let projectiles = ProjectileTracker::new();
    let mut connection = Connection::open(
        &world,
        HashMap::new(),
        projectiles.clone(),
        Arc::new(TokioScheduler::current()),
    );
    let id = EntityId::new(77);
    projectiles.track(id, ItemStack::new(world.wand, 1));

    let mut forwarded = Vec::new();
    let spawn = server::play::Packet::SpawnEntity(SpawnEntity {
        entity_id: id.as_i32(),
        uuid: Uuid::from_u128(77),
        entity_type: TRIDENT,
        x: 0.5,
        y: 80.0,
        z: 0.5,
        pitch: 0.0,
        yaw: 45.0,
        head_yaw: 0.0,
        data: 0,
        velocity_x: 0,
        velocity_y: 0,
        velocity_z: 0,
    });
    assert_eq!(connection.clientbound(spawn), None);

    for _ in 0..5 {
        forwarded.extend(connection.clientbound(server::play::Packet::EntityPositionSync(
            EntityPositionSync {
                entity_id: id.as_i32(),
                x: 0.5,
                y: 80.0,
                z: 0.5,
                velocity_x: 0.0,
                velocity_y: 0.0,
                velocity_z: 0.0,
                yaw: 45.0,
                pitch: 0.0,
                on_ground: false,
            },
        )));
        forwarded.extend(connection.clientbound(server::play::Packet::SetEntityVelocity(
            SetEntityVelocity {
                entity_id: id.as_i32(),
                velocity_x: 0,
                velocity_y: 0,
                velocity_z: 0,
            },
        )));
    }

    let sent = connection.drain();
    let [Outgoing::Play(server::play::Packet::Bundle(replacement))] = sent.as_slice() else {
        panic!("expected one replacement spawn, got {sent:?}");
    };
    assert!(matches!(
        &replacement.packets[0],
        server::play::Packet::SpawnEntity(display)
            if display.entity_type == ITEM_DISPLAY && display.yaw == 135.0
    ));

    assert_eq!(forwarded.len(), 5);
    for packet in &forwarded {
        match packet {
            server::play::Packet::EntityPositionSync(sync) => assert_eq!(sync.yaw, 135.0),
            other => panic!("unexpected packet {other:?}"),
        }
    }

    connection.context.projectile_removed(id);
    assert!(projectiles.contains(id));
    let delay = Config::default().projectile_eviction_delay();
    tokio::time::sleep(delay - Duration::from_millis(1)).await;
    assert!(projectiles.contains(id));
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(!projectiles.contains(id));
}
