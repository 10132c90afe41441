use crate::host::{BridgeDetector, PlayerHandle};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClientKind {
    /// A Java Edition client, which gets every substitution.
    Primary,
    /// A client bridged from Bedrock Edition. The bridge does its
    /// own translation, so packets pass through untouched.
    Secondary,
}

/// Lazily resolved, per-connection client kind.
#[derive(Debug, Default)]
pub struct Classification {
    resolved: Option<ClientKind>,
}

impl Classification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the client kind on first use. Until the player's profile
    /// is known, the connection is treated as primary without caching.
    pub fn classify(&mut self, player: &dyn PlayerHandle, detector: &dyn BridgeDetector) -> ClientKind {
        if let Some(kind) = self.resolved {
            return kind;
        }
        let Some(profile) = player.profile() else {
            return ClientKind::Primary;
        };
        let kind = if detector.is_bridged(profile) {
            tracing::info!("Connection for {profile} is bridged, disabling substitutions");
            ClientKind::Secondary
        } else {
            ClientKind::Primary
        };
        self.resolved = Some(kind);
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        host::GameMode,
        position::BlockPosition,
        protocol::{item::ItemStack, packet::server::play::AttributeProperty},
    };
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };
    use uuid::Uuid;

    struct Player(Mutex<Option<Uuid>>);

    impl PlayerHandle for Player {
        fn profile(&self) -> Option<Uuid> {
            *self.0.lock().unwrap()
        }
        fn entity_id(&self) -> i32 {
            1
        }
        fn game_mode(&self) -> Option<GameMode> {
            None
        }
        fn inventory_item(&self, _slot: usize) -> Option<ItemStack> {
            None
        }
        fn is_immobile(&self) -> bool {
            false
        }
        fn break_speed_attribute(&self) -> Option<AttributeProperty> {
            None
        }
        fn destroy_progress(&self, _state: i32, _position: BlockPosition) -> f32 {
            0.0
        }
        fn resync_inventory_after(&self, _ticks: u32) {}
    }

    #[derive(Default)]
    struct CountingDetector {
        calls: AtomicUsize,
    }

    impl BridgeDetector for CountingDetector {
        fn is_bridged(&self, _player: Uuid) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn unresolved_profile_is_primary_and_not_cached() {
        let player = Player(Mutex::new(None));
        let detector = CountingDetector::default();
        let mut classification = Classification::new();

        assert_eq!(classification.classify(&player, &detector), ClientKind::Primary);
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);

        *player.0.lock().unwrap() = Some(Uuid::from_u128(7));
        assert_eq!(classification.classify(&player, &detector), ClientKind::Secondary);
        assert_eq!(classification.classify(&player, &detector), ClientKind::Secondary);
        assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    }
}
