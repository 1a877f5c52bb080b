use log::debug;

use super::types::Material;
use crate::{
    error::Result,
    utils::allocator::{Arena, EntityId},
};

/// Pool of surface materials. [`EntityId::NONE`] resolves to [`Material::DEFAULT`].
#[derive(Debug, Clone)]
pub struct MaterialStore {
    materials: Arena<Material>,
}

impl MaterialStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            materials: Arena::with_capacity("material", capacity),
        }
    }

    pub fn create(&mut self, material: Material) -> Result<EntityId> {
        let id = self.materials.insert(material)?;
        debug!(
            "material {} created (friction {}, restitution {})",
            id.index, material.friction, material.restitution
        );
        Ok(id)
    }

    /// Frees a material. Colliders still referencing it fail to resolve.
    pub fn remove(&mut self, id: EntityId) -> Result<()> {
        if self.materials.remove(id)?.is_some() {
            debug!("material {} released", id.index);
        }
        Ok(())
    }

    pub fn resolve(&self, id: EntityId) -> Result<Material> {
        if id.is_none() {
            return Ok(Material::DEFAULT);
        }
        self.materials.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
