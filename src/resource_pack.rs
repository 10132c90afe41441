//! Holds back the end of the configuration phase until the client has
//! loaded the resource pack.

use crate::{
    config::ResourcePackConfig,
    protocol::{
        nbt,
        packet::{
            server::configuration::{AddResourcePack, FinishConfiguration},
            ResourcePackStatus,
        },
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum HandshakeState {
    #[default]
    Idle,
    AwaitingAck,
}

/// What to do with the server's `FinishConfiguration`.
#[derive(Debug, Clone, PartialEq)]
pub enum FinishAction {
    Forward,
    /// Send the pack instead; the finish is replayed after the ack.
    PushPack(AddResourcePack),
}

#[derive(Debug, Default)]
pub struct ResourcePackHandshake {
    state: HandshakeState,
}

impl ResourcePackHandshake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn on_finish_configuration(&mut self, pack: Option<&ResourcePackConfig>) -> FinishAction {
        if self.state == HandshakeState::AwaitingAck {
            self.state = HandshakeState::Idle;
            return FinishAction::Forward;
        }
        let Some(pack) = pack else {
            return FinishAction::Forward;
        };
        self.state = HandshakeState::AwaitingAck;
        tracing::debug!("Pushing resource pack {} before finishing configuration", pack.uuid);
        FinishAction::PushPack(AddResourcePack {
            uuid: pack.uuid,
            url: pack.url.clone(),
            hash: pack.hash.clone(),
            forced: true,
            prompt: Some(nbt::Tag::String(pack.prompt.clone())),
        })
    }

    /// Returns the finish packet to send once the pack is loaded.
    /// Other statuses are left to the server.
    pub fn on_pack_status(&mut self, status: ResourcePackStatus) -> Option<FinishConfiguration> {
        if self.state != HandshakeState::AwaitingAck
            || status != ResourcePackStatus::SuccessfullyLoaded
        {
            return None;
        }
        self.state = HandshakeState::Idle;
        Some(FinishConfiguration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn pack() -> ResourcePackConfig {
        ResourcePackConfig {
            url: "http://localhost/pack.zip".to_owned(),
            hash: "abc".to_owned(),
            uuid: Uuid::from_u128(1),
            prompt: "Prompt".to_owned(),
        }
    }

    #[test]
    fn without_pack_finish_passes() {
        let mut handshake = ResourcePackHandshake::new();
        assert_eq!(handshake.on_finish_configuration(None), FinishAction::Forward);
        assert_eq!(handshake.state(), HandshakeState::Idle);
    }

    #[test]
    fn finish_waits_for_loaded_pack() {
        let mut handshake = ResourcePackHandshake::new();
        let pack = pack();
        let FinishAction::PushPack(push) = handshake.on_finish_configuration(Some(&pack)) else {
            panic!("pack was not pushed");
        };
        assert!(push.forced);
        assert_eq!(push.prompt, Some(nbt::Tag::String("Prompt".to_owned())));
        assert_eq!(handshake.state(), HandshakeState::AwaitingAck);

        assert_eq!(handshake.on_pack_status(ResourcePackStatus::Accepted), None);
        assert_eq!(handshake.on_pack_status(ResourcePackStatus::Downloaded), None);
        assert_eq!(
            handshake.on_pack_status(ResourcePackStatus::SuccessfullyLoaded),
            Some(FinishConfiguration)
        );
        assert_eq!(handshake.state(), HandshakeState::Idle);
        assert_eq!(
            handshake.on_pack_status(ResourcePackStatus::SuccessfullyLoaded),
            None
        );
    }

    #[test]
    fn second_finish_while_waiting_passes_once() {
        let mut handshake = ResourcePackHandshake::new();
        let pack = pack();
        handshake.on_finish_configuration(Some(&pack));
        assert_eq!(
            handshake.on_finish_configuration(Some(&pack)),
            FinishAction::Forward
        );
        assert_eq!(handshake.state(), HandshakeState::Idle);
    }
}
