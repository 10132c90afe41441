//! Custom projectiles, shown to clients as item displays.
//!
//! The real entity kind is kept server side. On the wire its spawn is
//! replaced by an item display carrying the projectile's item, and
//! every rotation it later receives is remapped so the display faces
//! the way the real entity would.

use crate::{
    entity_id::EntityId,
    host::Scheduler,
    protocol::{
        item::ItemStack,
        metadata::{Metadata, MetadataEntry, MetadataValue},
        packet::server::play::{Bundle, Packet, SetEntityMetadata, SpawnEntity},
    },
};
use ahash::AHashMap;
use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

/// Live custom projectiles and the item each one carries.
///
/// Cloning is cheap; all clones share the same map. Entries are added
/// by the host when a custom projectile is created, which may happen on
/// a different thread than the one translating a given connection.
#[derive(Debug, Clone, Default)]
pub struct ProjectileTracker {
    entries: Arc<RwLock<AHashMap<EntityId, ItemStack>>>,
}

impl ProjectileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, entity: EntityId, item: ItemStack) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity, item);
    }

    pub fn get(&self, entity: EntityId) -> Option<ItemStack> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entity)
            .cloned()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops tracking `entity` once `delay` has passed, so metadata
    /// still in flight for it is translated.
    pub fn schedule_removal(&self, scheduler: &dyn Scheduler, entity: EntityId, delay: Duration) {
        let entries = Arc::clone(&self.entries);
        scheduler.run_later(
            delay,
            Box::new(move || {
                entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&entity);
                tracing::debug!("Stopped tracking projectile {entity}");
            }),
        );
    }
}

/// Wraps an angle to `[-180, 180)`.
fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees % 360.0;
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else if wrapped < -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Mirrors a yaw around 90 degrees. The display model points along the
/// opposite axis from the real projectile model.
pub fn remap_yaw(yaw: f32) -> f32 {
    wrap_degrees(yaw - (yaw - 90.0) * 2.0)
}

/// Metadata indices an item display understands; everything else the
/// real projectile sends is dropped.
fn is_display_field(entry: &MetadataEntry) -> bool {
    match (entry.index, &entry.value) {
        (10, MetadataValue::VarInt(_))
        | (11 | 12, MetadataValue::Vector3(_))
        | (13, MetadataValue::Quaternion(_))
        | (23, MetadataValue::ItemStack(_))
        | (24, MetadataValue::Byte(_)) => true,
        (index, _) => index < 8,
    }
}

/// Drops the real projectile's own fields from a metadata update.
pub fn filter_metadata(metadata: &mut Metadata) {
    metadata.0.retain(is_display_field);
}

/// Display fields for a projectile carrying `item`, already disguised.
pub fn display_metadata(item: ItemStack) -> Metadata {
    Metadata(vec![
        // interpolation duration
        MetadataEntry::new(10, MetadataValue::VarInt(1)),
        // translation
        MetadataEntry::new(11, MetadataValue::Vector3([0.0, -0.03125, 0.6875])),
        // scale
        MetadataEntry::new(12, MetadataValue::Vector3([2.0, 2.0, 1.0])),
        // left rotation: -90 degrees about X, then 90 about Y
        MetadataEntry::new(13, MetadataValue::Quaternion([-0.5, 0.5, -0.5, 0.5])),
        MetadataEntry::new(23, MetadataValue::ItemStack(item)),
        // item display context: fixed
        MetadataEntry::new(24, MetadataValue::Byte(8)),
    ])
}

/// Replacement for the spawn of a tracked projectile: the item display
/// spawn followed by its metadata, in one bundle.
pub fn surrogate_spawn(spawn: &SpawnEntity, surrogate_kind: i32, item: ItemStack) -> Packet {
    let display = SpawnEntity {
        entity_type: surrogate_kind,
        yaw: remap_yaw(spawn.yaw),
        ..spawn.clone()
    };
    Packet::Bundle(Bundle {
        packets: vec![
            Packet::SpawnEntity(display),
            Packet::SetEntityMetadata(SetEntityMetadata {
                entity_id: spawn.entity_id,
                metadata: display_metadata(item),
            }),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TokioScheduler;
    use uuid::Uuid;

    #[test]
    fn yaw_is_mirrored_around_ninety() {
        assert_eq!(remap_yaw(90.0), 90.0);
        assert_eq!(remap_yaw(0.0), 180.0 - 360.0);
        assert_eq!(remap_yaw(45.0), 135.0);
        assert_eq!(remap_yaw(-90.0), -90.0);
        for yaw in [-179.0, -12.5, 0.0, 33.0, 179.0] {
            let remapped = remap_yaw(yaw);
            assert!((-180.0..180.0).contains(&remapped));
        }
    }

    #[test]
    fn metadata_keeps_base_and_display_fields() {
        let mut metadata = Metadata(vec![
            MetadataEntry::new(0, MetadataValue::Byte(0)),
            MetadataEntry::new(8, MetadataValue::Byte(1)),
            MetadataEntry::new(10, MetadataValue::Byte(3)),
            MetadataEntry::new(11, MetadataValue::Byte(1)),
            MetadataEntry::new(12, MetadataValue::Vector3([1.0, 1.0, 1.0])),
            MetadataEntry::new(23, MetadataValue::ItemStack(ItemStack::new(4, 1))),
        ]);
        filter_metadata(&mut metadata);
        let indices: Vec<u8> = metadata.0.iter().map(|entry| entry.index).collect();
        assert_eq!(indices, [0, 12, 23]);
    }

    #[test]
    fn spawn_is_replaced_by_display_bundle() {
        let spawn = SpawnEntity {
            entity_id: 40,
            uuid: Uuid::from_u128(40),
            entity_type: 131,
            x: 1.0,
            y: 65.0,
            z: -3.0,
            pitch: 10.0,
            yaw: 30.0,
            head_yaw: 0.0,
            data: 7,
            velocity_x: 100,
            velocity_y: 0,
            velocity_z: 0,
        };
        let Packet::Bundle(bundle) = surrogate_spawn(&spawn, 71, ItemStack::new(5, 1)) else {
            panic!("expected a bundle");
        };
        let [Packet::SpawnEntity(display), Packet::SetEntityMetadata(metadata)] =
            bundle.packets.as_slice()
        else {
            panic!("unexpected bundle contents: {:?}", bundle.packets);
        };
        assert_eq!(display.entity_type, 71);
        assert_eq!(display.yaw, 150.0);
        assert_eq!(display.uuid, spawn.uuid);
        assert_eq!(metadata.entity_id, 40);
        assert_eq!(metadata.metadata.0.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn removal_waits_for_delay() {
        let tracker = ProjectileTracker::new();
        let id = EntityId::new(9);
        tracker.track(id, ItemStack::new(1, 1));

        tracker.schedule_removal(&TokioScheduler::current(), id, Duration::from_millis(1000));
        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(tracker.contains(id));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!tracker.contains(id));
        assert!(tracker.is_empty());
    }
}
