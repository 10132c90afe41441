//! Process-wide block, item and substitution tables.
//!
//! These are built once by the registration layer, frozen in an `Arc`,
//! and shared read-only by every connection.

mod allocator;
mod block;
mod item;
mod substitution;
#[cfg(test)]
pub(crate) mod testing;

pub use allocator::{SurrogateAllocator, SurrogateGroup};
pub use block::{BlockDefinition, BlockId, BlockRegistry, PropertySchema, AIR};
pub use item::{ItemDefinition, ItemRegistry};
pub use substitution::{
    CustomBlock, CustomItem, ProjectileKinds, Reshaped, SubstitutionRegistry,
    SubstitutionRegistryBuilder,
};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate registry name: {0}")]
    DuplicateName(String),
    #[error("unknown block {0}")]
    UnknownBlock(String),
    #[error("unknown item {0}")]
    UnknownItem(String),
    #[error("block {block} has no property value {property}")]
    UnknownProperty { block: String, property: String },
    #[error("surrogate group {0:?} is exhausted")]
    Exhausted(SurrogateGroup),
}
