use crate::protocol::{nbt, packet::UnknownPacket};
use minecraft_surrogate_macros::{Decode, Encode, FromVariants};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Encode, Decode, FromVariants, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x03)]
    FinishConfiguration(FinishConfiguration),
    #[encoding(id = 0x07)]
    RegistryData(RegistryData),
    #[encoding(id = 0x09)]
    AddResourcePack(AddResourcePack),
    #[encoding(fallback)]
    Other(UnknownPacket),
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct FinishConfiguration;

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct RegistryEntry {
    pub id: String,
    #[encoding(bool_prefixed)]
    pub data: Option<nbt::Tag>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct RegistryData {
    pub registry_id: String,
    #[encoding(length_prefix = "varint")]
    pub entries: Vec<RegistryEntry>,
}

/// Shared with the play state, where the packet has a different id.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct AddResourcePack {
    pub uuid: Uuid,
    pub url: String,
    pub hash: String,
    pub forced: bool,
    /// Text component shown in the prompt.
    #[encoding(bool_prefixed)]
    pub prompt: Option<nbt::Tag>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_exact, encode_to_vec, nbt::Compound};

    #[test]
    fn registry_data_entries() {
        let packet = Packet::RegistryData(RegistryData {
            registry_id: "minecraft:painting_variant".to_owned(),
            entries: vec![
                RegistryEntry {
                    id: "minecraft:kebab".to_owned(),
                    data: None,
                },
                RegistryEntry {
                    id: "ruby_painting".to_owned(),
                    data: Some(nbt::Tag::Compound(Compound::from_iter([(
                        "width",
                        nbt::Tag::Int(1),
                    )]))),
                },
            ],
        });
        let bytes = encode_to_vec(&packet);
        assert_eq!(bytes[0], 0x07);
        assert_eq!(decode_exact::<Packet>(&bytes).unwrap(), packet);
    }

    #[test]
    fn finish_configuration_is_bare_id() {
        let bytes = encode_to_vec(&Packet::FinishConfiguration(FinishConfiguration));
        assert_eq!(bytes, [0x03]);
    }
}
