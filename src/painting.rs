//! Painting variants standing in for custom items.
//!
//! Every custom item gets a synthetic painting variant in the registry
//! data sent during configuration. A creative client picking that
//! variant sends a painting stack, which is turned back into the custom
//! item before the server decodes it.

use crate::{
    protocol::{
        item::component_type,
        nbt::{Compound, Tag},
        packet::{
            client::play::SET_CREATIVE_MODE_SLOT_ID,
            server::configuration::{RegistryData, RegistryEntry},
        },
        DecodeError, Decoder, Encoder,
    },
    registry::SubstitutionRegistry,
};
use ahash::AHashMap;

pub const PAINTING_VARIANT_REGISTRY: &str = "minecraft:painting_variant";

/// Painting variant holder ids (registry index plus one) of the
/// synthetic entries, mapped to the custom item they stand for.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PaintingIndex {
    items: AHashMap<i32, i32>,
}

impl PaintingIndex {
    pub fn get(&self, holder: i32) -> Option<i32> {
        self.items.get(&holder).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn variant_data(display_name: &str, author: &str) -> Tag {
    Tag::Compound(Compound::from_iter([
        ("asset_id", Tag::String("minecraft:".to_owned())),
        ("author", Tag::String(author.to_owned())),
        ("height", Tag::Int(1)),
        ("width", Tag::Int(1)),
        ("title", Tag::String(display_name.to_owned())),
    ]))
}

/// Appends one variant per custom item and returns the index built
/// from them. Registries other than paintings yield `None`.
pub fn append_custom_variants(
    registry: &SubstitutionRegistry,
    data: &mut RegistryData,
    author: &str,
) -> Option<PaintingIndex> {
    if data.registry_id != PAINTING_VARIANT_REGISTRY {
        return None;
    }
    let mut index = PaintingIndex::default();
    for custom in registry.custom_items() {
        let display_name = registry
            .items()
            .get(custom.item)
            .map_or(custom.id.as_str(), |definition| definition.display_name.as_str());
        data.entries.push(RegistryEntry {
            id: format!("{}_painting", custom.id),
            data: Some(variant_data(display_name, author)),
        });
        index.items.insert(data.entries.len() as i32, custom.item);
    }
    Some(index)
}

/// Rewrites a raw creative-mode slot frame (packet id included) that
/// selects a synthetic painting variant into one holding the custom
/// item with no components. `Ok(None)` means the frame is left as is.
pub fn rewrite_creative_slot(
    frame: &[u8],
    painting_item: i32,
    index: &PaintingIndex,
) -> Result<Option<Vec<u8>>, DecodeError> {
    let mut decoder = Decoder::new(frame);
    if decoder.read_var_int()? != SET_CREATIVE_MODE_SLOT_ID {
        return Ok(None);
    }
    let slot = decoder.read_i16()?;
    let count = decoder.read_var_int()?;
    if count <= 0 {
        return Ok(None);
    }
    let item = decoder.read_var_int()?;
    let added = decoder.read_var_int()?;
    let removed = decoder.read_var_int()?;
    if item != painting_item || added != 1 || removed != 0 {
        return Ok(None);
    }
    if decoder.read_var_int()? != component_type::PAINTING_VARIANT {
        return Ok(None);
    }
    let length = usize::try_from(decoder.read_var_int()?)?;
    let holder = Decoder::new(decoder.consume_slice(length)?).read_var_int()?;
    let Some(custom_item) = index.get(holder) else {
        return Ok(None);
    };

    let mut rewritten = Vec::new();
    let mut encoder = Encoder::new(&mut rewritten);
    encoder.write_var_int(SET_CREATIVE_MODE_SLOT_ID);
    encoder.write_i16(slot);
    encoder.write_var_int(count);
    encoder.write_var_int(custom_item);
    encoder.write_var_int(0);
    encoder.write_var_int(0);
    Ok(Some(rewritten))
}
