use crate::{
    block_cache::BlockCache,
    break_speed::{self, BLOCK_BREAK_SPEED},
    chat,
    chunk_rewrite::{rewrite_chunk, WorldBounds},
    classification::{Classification, ClientKind},
    config::Config,
    entity_id::EntityId,
    host::{BridgeDetector, GameMode, Outgoing, PlayerHandle, Scheduler},
    item_codec::ItemCodec,
    painting::{self, PaintingIndex},
    position::{BlockPosition, ChunkPosition},
    projectile::{self, ProjectileTracker},
    protocol::{
        item::ItemStack,
        metadata::{Metadata, MetadataValue},
        packet,
        packet::{
            client, server,
            server::play::{
                AttributeProperty, ParticleOptions, SetPlayerInventory, UpdateAttributes,
                WorldEvent,
            },
            side, state, ProtocolState, Side,
        },
        ConnectionState,
    },
    registry::SubstitutionRegistry,
    resource_pack::{FinishAction, ResourcePackHandshake},
};
use std::sync::Arc;

/// Player inventory slot of the off-hand.
const OFF_HAND: i32 = 40;
/// Slot of the off-hand in the player's own inventory menu.
const MENU_OFF_HAND: usize = 45;
/// First hotbar slot in the player's own inventory menu.
const MENU_HOTBAR: usize = 36;
const HOTBAR_SIZE: i32 = 9;

const BLOCK_BREAK_EVENT: i32 = 2001;
const BRUSH_FINISHED_EVENT: i32 = 3008;

/// First hotbar slot of an open menu, by menu type registry id.
/// Menus are laid out as their own slots, then the 27 main inventory
/// slots, then the hotbar.
fn menu_hotbar_start(menu_type: i32) -> Option<usize> {
    let container_slots = match menu_type {
        // generic_9x1 ..= generic_9x6
        0..=5 => 9 * (menu_type as usize + 1),
        // generic_3x3
        6 => 9,
        // anvil, blast_furnace, furnace, grindstone, merchant, smoker, cartography_table
        8 | 10 | 14 | 15 | 19 | 22 | 23 => 3,
        // beacon
        9 => 1,
        // brewing_stand, hopper
        11 | 16 => 5,
        // crafting
        12 => 10,
        // enchantment, stonecutter
        13 | 24 => 2,
        // loom, smithing
        18 | 21 => 4,
        // shulker_box
        20 => 27,
        _ => return None,
    };
    Some(container_slots + 27)
}

/// Process-wide services shared by every connection's translator.
#[derive(Clone)]
pub struct TranslatorContext {
    pub registry: Arc<SubstitutionRegistry>,
    pub config: Arc<Config>,
    pub bridge: Arc<dyn BridgeDetector>,
    pub scheduler: Arc<dyn Scheduler>,
    pub projectiles: ProjectileTracker,
}

impl TranslatorContext {
    /// Called by the host when a tracked projectile entity is removed.
    /// Its entry outlives the entity by the configured eviction delay,
    /// so packets still in flight for it are translated.
    pub fn projectile_removed(&self, entity: EntityId) {
        self.projectiles.schedule_removal(
            self.scheduler.as_ref(),
            entity,
            self.config.projectile_eviction_delay(),
        );
    }
}

/// Rewrites the packets of one connection so the client only ever sees
/// vanilla blocks, items and entities, and restores the real items in
/// what the client sends back.
///
/// Packets the translator makes up itself (attribute corrections,
/// projectile spawns, slot refreshes, the delayed configuration finish)
/// go to the outbox and must be sent to the client without passing
/// through the translator again. Drain the outbox before forwarding the
/// packet returned from the same call: a replacement projectile spawn
/// has to reach the client ahead of the rest of its bundle.
pub struct ConnectionTranslator {
    context: TranslatorContext,
    player: Arc<dyn PlayerHandle>,
    outbox: flume::Sender<Outgoing>,

    classification: Classification,
    cache: BlockCache,
    /// Selected hotbar slot.
    held_slot: i32,
    bounds: Option<WorldBounds>,
    handshake: ResourcePackHandshake,
    paintings: PaintingIndex,
    /// Menu type of the open container, if any.
    open_menu: Option<i32>,
}

impl ConnectionTranslator {
    pub fn new(
        context: TranslatorContext,
        player: Arc<dyn PlayerHandle>,
        outbox: flume::Sender<Outgoing>,
    ) -> Self {
        Self {
            context,
            player,
            outbox,
            classification: Classification::new(),
            cache: BlockCache::new(),
            held_slot: 0,
            bounds: None,
            handshake: ResourcePackHandshake::new(),
            paintings: PaintingIndex::default(),
            open_menu: None,
        }
    }

    pub fn cache(&self) -> &BlockCache {
        &self.cache
    }

    pub fn bounds(&self) -> Option<WorldBounds> {
        self.bounds
    }

    pub fn held_slot(&self) -> i32 {
        self.held_slot
    }

    fn is_secondary(&mut self) -> bool {
        self.classification
            .classify(self.player.as_ref(), self.context.bridge.as_ref())
            == ClientKind::Secondary
    }

    fn codec(&self) -> ItemCodec<'_> {
        ItemCodec::new(&self.context.registry, self.context.config.tool_rule_speed)
    }

    fn send(&self, packet: Outgoing) {
        if self.outbox.send(packet).is_err() {
            tracing::debug!("Outbox closed, dropping synthetic packet");
        }
    }

    fn disguise(&self, item: &mut ItemStack, dynamic: bool) -> bool {
        match self.codec().to_wire(item, dynamic) {
            Some(wire) => {
                *item = wire;
                true
            }
            None => false,
        }
    }

    fn restore(&self, item: &mut ItemStack) {
        if let Some(real) = self.codec().to_real(item) {
            *item = real;
        }
    }

    /// Intercepts a serverbound frame before it is decoded. Returns the
    /// replacement frame, or `None` to let the original through.
    pub fn translate_raw_serverbound(
        &mut self,
        state: ConnectionState,
        frame: &[u8],
    ) -> Option<Vec<u8>> {
        if state != ConnectionState::Play || self.paintings.is_empty() || self.is_secondary() {
            return None;
        }
        let painting_item = self
            .context
            .registry
            .items()
            .by_name("minecraft:painting")?;
        match painting::rewrite_creative_slot(frame, painting_item, &self.paintings) {
            Ok(Some(rewritten)) => {
                self.player.resync_inventory_after(1);
                Some(rewritten)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to inspect raw creative slot packet: {e}");
                None
            }
        }
    }

    fn enter_world(&mut self, min_y: i32, height: i32) {
        self.bounds = Some(WorldBounds::new(min_y, height));
        self.cache.clear();
    }

    fn substitute_block(&mut self, position: BlockPosition, state: &mut i32) {
        let registry = &self.context.registry;
        self.cache.update(registry, position, *state);
        if let Some(surrogate) = registry.surrogate_for(*state) {
            *state = surrogate;
        }
    }

    /// Whether a slot of the given window shows the held or off-hand item.
    fn is_dynamic_slot(&self, window_id: i32, slot: usize) -> bool {
        let hotbar_start = if window_id == 0 {
            if slot == MENU_OFF_HAND {
                return true;
            }
            MENU_HOTBAR
        } else {
            match self.open_menu.and_then(menu_hotbar_start) {
                Some(start) => start,
                None => return false,
            }
        };
        slot.checked_sub(hotbar_start)
            .is_some_and(|hotbar| hotbar as i32 == self.held_slot)
    }

    /// Refreshes the previous and new held items, whose materials differ.
    fn select_slot(&mut self, slot: i32) {
        let previous = std::mem::replace(&mut self.held_slot, slot);
        if previous == slot {
            return;
        }
        for (slot, dynamic) in [(previous, false), (slot, true)] {
            let Some(item) = usize::try_from(slot)
                .ok()
                .and_then(|index| self.player.inventory_item(index))
            else {
                continue;
            };
            if let Some(item) = self.codec().to_wire(&item, dynamic) {
                self.send(Outgoing::Play(server::play::Packet::SetPlayerInventory(
                    SetPlayerInventory { slot, item },
                )));
            }
        }
    }

    fn block_break_speed(&self) -> AttributeProperty {
        self.player
            .break_speed_attribute()
            .unwrap_or_else(|| AttributeProperty {
                attribute: BLOCK_BREAK_SPEED,
                base: 1.0,
                modifiers: Vec::new(),
            })
    }

    fn send_break_speed(&self, attribute: AttributeProperty) {
        self.send(Outgoing::Play(server::play::Packet::UpdateAttributes(
            UpdateAttributes {
                entity_id: self.player.entity_id(),
                properties: vec![attribute],
            },
        )));
    }

    /// The real state at `position` if it is one whose break speed the
    /// client gets wrong.
    fn mismatched_block(&self, position: BlockPosition) -> Option<i32> {
        let registry = &self.context.registry;
        let state = self.cache.real_for(position);
        let block = registry.blocks().block_of(state)?;
        (registry.custom_block(block).is_some() || registry.is_mushroom_block(block))
            .then_some(state)
    }

    fn on_player_action(&mut self, dig: &client::play::PlayerAction) {
        use client::play::action;

        if self.player.game_mode() != Some(GameMode::Survival) {
            return;
        }
        let Some(real_state) = self.mismatched_block(dig.position) else {
            return;
        };
        let registry = Arc::clone(&self.context.registry);
        match dig.status {
            action::START_DESTROY_BLOCK => {
                let surrogate = registry.surrogate_for(real_state).unwrap_or(real_state);
                if self.player.destroy_progress(real_state, dig.position) >= 1.0 {
                    self.send(Outgoing::Play(server::play::Packet::WorldEvent(WorldEvent {
                        event: BLOCK_BREAK_EVENT,
                        position: dig.position,
                        data: surrogate,
                        disable_relative_volume: false,
                    })));
                    return;
                }

                let held = usize::try_from(self.held_slot)
                    .ok()
                    .and_then(|slot| self.player.inventory_item(slot))
                    .unwrap_or_default();
                let shown = self.codec().to_wire(&held, true).unwrap_or_else(|| held.clone());
                let client_speed = break_speed::destroy_speed(&registry, surrogate, &shown);
                let real_speed = break_speed::destroy_speed(&registry, real_state, &held);
                if let Some(ratio) = break_speed::correction(real_speed, client_speed) {
                    tracing::debug!(
                        "Scaling break speed by {ratio} for state {real_state} at {:?}",
                        dig.position
                    );
                    let scaled = break_speed::scaled(&self.block_break_speed(), ratio);
                    self.send_break_speed(scaled);
                }
            }
            action::ABORT_DESTROY_BLOCK | action::STOP_DESTROY_BLOCK => {
                self.send_break_speed(self.block_break_speed());
            }
            _ => {}
        }
    }

    fn translate_metadata(&self, entity: EntityId, metadata: &mut Metadata) -> bool {
        let mut changed = false;
        if self.context.projectiles.contains(entity) {
            projectile::filter_metadata(metadata);
            changed = true;
        }
        let registry = &self.context.registry;
        for entry in &mut metadata.0 {
            changed |= match &mut entry.value {
                MetadataValue::ItemStack(item) => self.disguise(item, false),
                MetadataValue::BlockState(state) => match registry.surrogate_for(*state) {
                    Some(surrogate) => {
                        *state = surrogate;
                        true
                    }
                    None => false,
                },
                MetadataValue::OptionalBlockState(state) if *state != 0 => {
                    match registry.surrogate_for(*state) {
                        Some(surrogate) => {
                            *state = surrogate;
                            true
                        }
                        None => false,
                    }
                }
                _ => false,
            };
        }
        changed
    }

    fn translate_clientbound_play(
        &mut self,
        packet: server::play::Packet,
    ) -> Option<server::play::Packet> {
        use server::play::Packet;

        let registry = Arc::clone(&self.context.registry);
        let projectiles = self.context.projectiles.clone();

        match packet {
            Packet::Bundle(mut bundle) => {
                bundle.packets = bundle
                    .packets
                    .into_iter()
                    .filter_map(|packet| self.translate_clientbound_play(packet))
                    .collect();
                if bundle.packets.is_empty() {
                    return None;
                }
                Some(Packet::Bundle(bundle))
            }
            Packet::Login(login) => {
                self.enter_world(login.min_y, login.height);
                Some(Packet::Login(login))
            }
            Packet::Respawn(respawn) => {
                self.enter_world(respawn.min_y, respawn.height);
                Some(Packet::Respawn(respawn))
            }
            Packet::UnloadChunk(unload) => {
                self.cache
                    .unload_chunk(ChunkPosition::new(unload.chunk_x, unload.chunk_z));
                Some(Packet::UnloadChunk(unload))
            }
            Packet::BlockUpdate(mut update) => {
                self.substitute_block(update.position, &mut update.state);
                Some(Packet::BlockUpdate(update))
            }
            Packet::UpdateSectionBlocks(mut update) => {
                let section = update.section;
                for block in &mut update.blocks {
                    self.substitute_block(section.relative(block.offset), &mut block.state);
                }
                Some(Packet::UpdateSectionBlocks(update))
            }
            Packet::ChunkAndLightData(mut chunk) => {
                let Some(bounds) = self.bounds else {
                    return Some(Packet::ChunkAndLightData(chunk));
                };
                let position = ChunkPosition::new(chunk.chunk_x, chunk.chunk_z);
                match rewrite_chunk(&registry, &mut self.cache, position, bounds, &chunk.data) {
                    Ok(Some(data)) => chunk.data = data,
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(
                            "Failed to rewrite chunk ({}, {}): {e:?}",
                            position.x,
                            position.z
                        );
                        if e.leaks_custom_identity() {
                            return None;
                        }
                    }
                }
                Some(Packet::ChunkAndLightData(chunk))
            }
            Packet::OpenScreen(screen) => {
                self.open_menu = Some(screen.menu_type);
                Some(Packet::OpenScreen(screen))
            }
            Packet::CloseContainer(close) => {
                self.open_menu = None;
                Some(Packet::CloseContainer(close))
            }
            Packet::SetContainerContents(mut contents) => {
                let window_id = contents.window_id;
                for (slot, item) in contents.slots.iter_mut().enumerate() {
                    let dynamic = self.is_dynamic_slot(window_id, slot);
                    self.disguise(item, dynamic);
                }
                self.disguise(&mut contents.carried, false);
                Some(Packet::SetContainerContents(contents))
            }
            Packet::SetContainerSlot(mut set) => {
                let dynamic = usize::try_from(set.slot)
                    .is_ok_and(|slot| self.is_dynamic_slot(set.window_id, slot));
                self.disguise(&mut set.item, dynamic);
                Some(Packet::SetContainerSlot(set))
            }
            Packet::SetCursorItem(mut cursor) => {
                self.disguise(&mut cursor.item, false);
                Some(Packet::SetCursorItem(cursor))
            }
            Packet::SetPlayerInventory(mut set) => {
                let dynamic = set.slot == OFF_HAND || set.slot == self.held_slot;
                self.disguise(&mut set.item, dynamic);
                Some(Packet::SetPlayerInventory(set))
            }
            Packet::SetEquipment(mut equipment) => {
                for entry in &mut equipment.equipment {
                    let dynamic = entry.slot.is_hand();
                    self.disguise(&mut entry.item, dynamic);
                }
                Some(Packet::SetEquipment(equipment))
            }
            Packet::SetHeldItem(held) => {
                self.select_slot(held.slot);
                Some(Packet::SetHeldItem(held))
            }
            Packet::SetEntityMetadata(mut update) => {
                self.translate_metadata(EntityId::new(update.entity_id), &mut update.metadata);
                if update.metadata.0.is_empty() {
                    return None;
                }
                Some(Packet::SetEntityMetadata(update))
            }
            Packet::Particle(mut particle) => {
                match &mut particle.options {
                    ParticleOptions::Block { state, .. } => {
                        if let Some(surrogate) = registry.surrogate_for(*state) {
                            *state = surrogate;
                        }
                    }
                    ParticleOptions::Item { item, .. } => {
                        self.disguise(item, false);
                    }
                    ParticleOptions::Other { .. } => {}
                }
                Some(Packet::Particle(particle))
            }
            Packet::WorldEvent(mut event)
                if event.event == BLOCK_BREAK_EVENT || event.event == BRUSH_FINISHED_EVENT =>
            {
                let blocks = registry.blocks();
                if let Some(surrogate) = blocks
                    .block_of(event.data)
                    .and_then(|block| blocks.default_state(block))
                    .and_then(|state| registry.surrogate_for(state))
                {
                    event.data = surrogate;
                }
                Some(Packet::WorldEvent(event))
            }
            Packet::SpawnEntity(spawn) => {
                let id = EntityId::new(spawn.entity_id);
                let kinds = registry.projectile();
                match (kinds, projectiles.get(id)) {
                    (Some(kinds), Some(item)) if spawn.entity_type == kinds.real => {
                        let item = self.codec().to_wire(&item, false).unwrap_or(item);
                        self.send(Outgoing::Play(projectile::surrogate_spawn(
                            &spawn,
                            kinds.surrogate,
                            item,
                        )));
                        None
                    }
                    _ => Some(Packet::SpawnEntity(spawn)),
                }
            }
            Packet::TeleportEntity(mut teleport)
                if projectiles.contains(EntityId::new(teleport.entity_id)) =>
            {
                teleport.yaw = projectile::remap_yaw(teleport.yaw);
                Some(Packet::TeleportEntity(teleport))
            }
            Packet::EntityPositionSync(mut sync)
                if projectiles.contains(EntityId::new(sync.entity_id)) =>
            {
                sync.yaw = projectile::remap_yaw(sync.yaw);
                Some(Packet::EntityPositionSync(sync))
            }
            Packet::UpdateEntityPositionAndRotation(mut moved)
                if projectiles.contains(EntityId::new(moved.entity_id)) =>
            {
                moved.yaw = projectile::remap_yaw(moved.yaw);
                Some(Packet::UpdateEntityPositionAndRotation(moved))
            }
            Packet::UpdateEntityRotation(mut rotated)
                if projectiles.contains(EntityId::new(rotated.entity_id)) =>
            {
                rotated.yaw = projectile::remap_yaw(rotated.yaw);
                Some(Packet::UpdateEntityRotation(rotated))
            }
            Packet::SetEntityVelocity(velocity)
                if projectiles.contains(EntityId::new(velocity.entity_id)) =>
            {
                None
            }
            Packet::SystemChatMessage(mut message) => {
                if let Some(content) = chat::strip_custom_item_hovers(&registry, &message.content)
                {
                    message.content = content;
                }
                Some(Packet::SystemChatMessage(message))
            }
            Packet::UpdateRecipes(mut recipes) => {
                for set in &mut recipes.property_sets {
                    set.items
                        .retain(|item| registry.custom_item(item.0).is_none());
                }
                Some(Packet::UpdateRecipes(recipes))
            }
            packet => Some(packet),
        }
    }

    fn translate_serverbound_play(
        &mut self,
        packet: client::play::Packet,
    ) -> Option<client::play::Packet> {
        use client::play::Packet;

        match packet {
            Packet::ClickContainer(mut click) => {
                for changed in &mut click.changed_slots {
                    self.restore(&mut changed.item);
                }
                self.restore(&mut click.carried);
                Some(Packet::ClickContainer(click))
            }
            Packet::SetCreativeModeSlot(mut set) => {
                self.restore(&mut set.item);
                Some(Packet::SetCreativeModeSlot(set))
            }
            Packet::PlayerAction(action) => {
                self.on_player_action(&action);
                Some(Packet::PlayerAction(action))
            }
            Packet::SetHeldItem(held) => {
                let slot = i32::from(held.slot);
                if !self.player.is_immobile() && (0..HOTBAR_SIZE).contains(&slot) {
                    self.select_slot(slot);
                }
                Some(Packet::SetHeldItem(held))
            }
            packet => Some(packet),
        }
    }

    fn translate_clientbound_configuration(
        &mut self,
        packet: server::configuration::Packet,
    ) -> Option<server::configuration::Packet> {
        use server::configuration::Packet;

        match packet {
            Packet::FinishConfiguration(finish) => {
                let config = Arc::clone(&self.context.config);
                match self
                    .handshake
                    .on_finish_configuration(config.resource_pack.as_ref())
                {
                    FinishAction::Forward => Some(Packet::FinishConfiguration(finish)),
                    FinishAction::PushPack(push) => Some(Packet::AddResourcePack(push)),
                }
            }
            Packet::RegistryData(mut data) => {
                if let Some(index) = painting::append_custom_variants(
                    &self.context.registry,
                    &mut data,
                    &self.context.config.painting_author,
                ) {
                    self.paintings = index;
                }
                Some(Packet::RegistryData(data))
            }
            packet => Some(packet),
        }
    }

    fn translate_serverbound_configuration(
        &mut self,
        packet: client::configuration::Packet,
    ) -> Option<client::configuration::Packet> {
        use client::configuration::Packet;

        if let Packet::ResourcePackResponse(response) = &packet {
            if let Some(finish) = self.handshake.on_pack_status(response.status) {
                self.send(Outgoing::Configuration(
                    server::configuration::Packet::FinishConfiguration(finish),
                ));
            }
        }
        Some(packet)
    }
}

/// Implemented by [`ConnectionTranslator`] for each side and state.
pub trait TranslatePacket<Side: packet::Side, State: ProtocolState> {
    /// Returns the packet to forward, rewritten if needed, or `None`
    /// if it must not be forwarded.
    fn translate_packet(
        &mut self,
        packet: Side::SendPacket<State>,
    ) -> Option<Side::SendPacket<State>>;
}

impl TranslatePacket<side::Server, state::Play> for ConnectionTranslator {
    fn translate_packet(
        &mut self,
        packet: <side::Server as Side>::SendPacket<state::Play>,
    ) -> Option<<side::Server as Side>::SendPacket<state::Play>> {
        if self.is_secondary() {
            return Some(packet);
        }
        let name = tracing::enabled!(tracing::Level::TRACE).then(|| packet.as_ref().to_owned());
        let translated = self.translate_clientbound_play(packet);
        if let (None, Some(name)) = (&translated, name) {
            tracing::trace!("Suppressed clientbound {name}");
        }
        translated
    }
}

impl TranslatePacket<side::Client, state::Play> for ConnectionTranslator {
    fn translate_packet(
        &mut self,
        packet: <side::Client as Side>::SendPacket<state::Play>,
    ) -> Option<<side::Client as Side>::SendPacket<state::Play>> {
        if self.is_secondary() {
            return Some(packet);
        }
        self.translate_serverbound_play(packet)
    }
}

impl TranslatePacket<side::Server, state::Configuration> for ConnectionTranslator {
    fn translate_packet(
        &mut self,
        packet: <side::Server as Side>::SendPacket<state::Configuration>,
    ) -> Option<<side::Server as Side>::SendPacket<state::Configuration>> {
        if self.is_secondary() {
            return Some(packet);
        }
        self.translate_clientbound_configuration(packet)
    }
}

impl TranslatePacket<side::Client, state::Configuration> for ConnectionTranslator {
    fn translate_packet(
        &mut self,
        packet: <side::Client as Side>::SendPacket<state::Configuration>,
    ) -> Option<<side::Client as Side>::SendPacket<state::Configuration>> {
        if self.is_secondary() {
            return Some(packet);
        }
        self.translate_serverbound_configuration(packet)
    }
}
