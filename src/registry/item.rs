use crate::{
    protocol::item::{Component, ComponentPatch},
    registry::RegistryError,
};
use ahash::AHashMap;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub struct ItemDefinition {
    /// Namespaced name, e.g. `minecraft:wooden_pickaxe`.
    pub name: String,
    pub display_name: String,
    /// Components every stack of this item carries unless its patch
    /// overrides them.
    pub default_components: BTreeMap<i32, Component>,
}

impl ItemDefinition {
    /// The component of `kind` in effect for a stack with the given patch.
    pub fn effective<'a>(&'a self, patch: &'a ComponentPatch, kind: i32) -> Option<&'a Component> {
        if patch.removed.contains(&kind) {
            return None;
        }
        patch.get(kind).or_else(|| self.default_components.get(&kind))
    }
}

/// Registry of item types; an item's id is its registration index.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    items: Vec<ItemDefinition>,
    by_name: AHashMap<String, i32>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &str,
        display_name: &str,
        default_components: impl IntoIterator<Item = Component>,
    ) -> Result<i32, RegistryError> {
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_owned()));
        }
        let id = self.items.len() as i32;
        self.items.push(ItemDefinition {
            name: name.to_owned(),
            display_name: display_name.to_owned(),
            default_components: default_components
                .into_iter()
                .map(|c| (c.kind(), c))
                .collect(),
        });
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    pub fn get(&self, item: i32) -> Option<&ItemDefinition> {
        self.items.get(usize::try_from(item).ok()?)
    }

    pub fn by_name(&self, name: &str) -> Option<i32> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::item::{component_type, Tool};

    #[test]
    fn patch_overrides_defaults() {
        let mut registry = ItemRegistry::new();
        let tool = Tool {
            rules: vec![],
            default_mining_speed: 1.0,
            damage_per_block: 1,
            can_destroy_blocks_in_creative: true,
        };
        let pickaxe = registry
            .register("minecraft:wooden_pickaxe", "Wooden Pickaxe", [Component::Tool(tool.clone())])
            .unwrap();
        let definition = registry.get(pickaxe).unwrap();

        let mut patch = ComponentPatch::default();
        assert_eq!(
            definition.effective(&patch, component_type::TOOL),
            Some(&Component::Tool(tool))
        );
        patch.remove(component_type::TOOL);
        assert_eq!(definition.effective(&patch, component_type::TOOL), None);
        assert_eq!(registry.by_name("minecraft:wooden_pickaxe"), Some(pickaxe));
        assert!(registry.get(-1).is_none());
    }
}
