//! Services the embedding server provides to each connection.

use crate::{
    position::BlockPosition,
    protocol::{
        item::ItemStack,
        packet::{server, server::play::AttributeProperty},
    },
};
use std::time::Duration;
use tokio::runtime::Handle;
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

/// The server-side player behind a connection.
///
/// Inventory slots use the player inventory layout: hotbar `0..=8`,
/// main inventory `9..=35`, armor `36..=39` and off-hand `40`.
pub trait PlayerHandle: Send + Sync {
    /// The player's profile id, once it is known.
    fn profile(&self) -> Option<Uuid>;

    fn entity_id(&self) -> i32;

    /// `None` until the player has joined the world.
    fn game_mode(&self) -> Option<GameMode>;

    /// Real item in an inventory slot.
    fn inventory_item(&self, slot: usize) -> Option<ItemStack>;

    /// Whether the player is currently unable to change slots.
    fn is_immobile(&self) -> bool;

    /// Current value of the block break speed attribute.
    fn break_speed_attribute(&self) -> Option<AttributeProperty>;

    /// Progress the player makes per tick breaking the real `state`.
    fn destroy_progress(&self, state: i32, position: BlockPosition) -> f32;

    /// Resends the whole inventory after the given number of ticks.
    fn resync_inventory_after(&self, ticks: u32);
}

/// Tells whether a player joined through the Bedrock bridge.
pub trait BridgeDetector: Send + Sync {
    fn is_bridged(&self, player: Uuid) -> bool;
}

/// Runs delayed work without blocking the caller.
pub trait Scheduler: Send + Sync {
    fn run_later(&self, delay: Duration, task: Box<dyn FnOnce() + Send>);
}

/// [`Scheduler`] backed by a Tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime of the calling task.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn run_later(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

/// A packet produced by the translator itself, to be sent to the
/// client as is.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Configuration(server::configuration::Packet),
    Play(server::play::Packet),
}
