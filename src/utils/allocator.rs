use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};

/// Pool handle with generation tracking to catch stale references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    /// Sentinel meaning "no entity".
    pub const NONE: Self = Self {
        index: u32::MAX,
        generation: 0,
    };

    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn from_index(index: u32) -> Self {
        Self::new(index, 0)
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_none(&self) -> bool {
        self.index == u32::MAX
    }

    pub fn is_some(&self) -> bool {
        !self.is_none()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NONE
    }
}

/// Fixed-capacity slot pool with LIFO reuse of freed indices.
///
/// Indices below the high water mark are "allocated range"; anything beyond
/// it is an invalid handle. A freed slot bumps its generation so handles issued
/// before the free are rejected as stale.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    name: &'static str,
    capacity: usize,
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
}

impl<T> Arena<T> {
    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            items: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free_list: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of indices ever handed out.
    pub fn high_water(&self) -> usize {
        self.items.len()
    }

    pub fn insert(&mut self, item: T) -> Result<EntityId> {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.items[index as usize];
            if slot.is_some() {
                log::error!("{} pool: free list returned occupied slot {index}", self.name);
                return Err(PhysicsError::SlotInUse {
                    pool: self.name,
                    index,
                });
            }
            *slot = Some(item);
            return Ok(EntityId::new(index, self.generations[index as usize]));
        }

        if self.items.len() >= self.capacity {
            log::error!("{} pool exhausted (capacity {})", self.name, self.capacity);
            return Err(PhysicsError::CapacityExhausted {
                pool: self.name,
                capacity: self.capacity,
            });
        }

        let index = self.items.len() as u32;
        self.items.push(Some(item));
        self.generations.push(0);
        Ok(EntityId::new(index, 0))
    }

    pub fn get(&self, id: EntityId) -> Result<&T> {
        self.check(id)?;
        self.items[id.index()].as_ref().ok_or(PhysicsError::StaleHandle {
            pool: self.name,
            index: id.index,
            generation: id.generation,
        })
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut T> {
        self.check(id)?;
        let (name, index, generation) = (self.name, id.index, id.generation);
        self.items[id.index()]
            .as_mut()
            .ok_or(PhysicsError::StaleHandle {
                pool: name,
                index,
                generation,
            })
    }

    /// Like [`get`](Self::get) without logging, for lookups where a missing
    /// entry is expected.
    pub fn try_get(&self, id: EntityId) -> Option<&T> {
        if self.generations.get(id.index()) != Some(&id.generation) {
            return None;
        }
        self.items[id.index()].as_ref()
    }

    pub fn try_get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        if self.generations.get(id.index()) != Some(&id.generation) {
            return None;
        }
        self.items[id.index()].as_mut()
    }

    /// `true` when `id` resolves to a live entry.
    pub fn contains(&self, id: EntityId) -> bool {
        self.try_get(id).is_some()
    }

    /// Mutable access to two distinct entries at once.
    pub fn get2_mut(&mut self, id_a: EntityId, id_b: EntityId) -> Result<(&mut T, &mut T)> {
        self.check(id_a)?;
        self.check(id_b)?;
        if id_a.index == id_b.index {
            return Err(PhysicsError::SlotInUse {
                pool: self.name,
                index: id_a.index,
            });
        }

        let (first, second, flipped) = if id_a.index < id_b.index {
            (id_a, id_b, false)
        } else {
            (id_b, id_a, true)
        };

        let name = self.name;
        let (left, right) = self.items.split_at_mut(second.index());
        let first_slot = left[first.index()].as_mut().ok_or(PhysicsError::StaleHandle {
            pool: name,
            index: first.index,
            generation: first.generation,
        })?;
        let second_slot = right[0].as_mut().ok_or(PhysicsError::StaleHandle {
            pool: name,
            index: second.index,
            generation: second.generation,
        })?;

        if flipped {
            Ok((second_slot, first_slot))
        } else {
            Ok((first_slot, second_slot))
        }
    }

    /// Frees the slot. Freeing an already-freed (or stale) handle is a no-op.
    pub fn remove(&mut self, id: EntityId) -> Result<Option<T>> {
        self.check_range(id)?;
        let index = id.index();
        if self.generations[index] != id.generation {
            return Ok(None);
        }
        let taken = self.items[index].take();
        if taken.is_some() {
            self.generations[index] = self.generations[index].wrapping_add(1);
            self.free_list.push(id.index);
        }
        Ok(taken)
    }

    /// Frees every live slot.
    pub fn clear(&mut self) {
        for index in (0..self.items.len()).rev() {
            if self.items[index].take().is_some() {
                self.generations[index] = self.generations[index].wrapping_add(1);
                self.free_list.push(index as u32);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.items.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|item| (EntityId::new(index as u32, self.generations[index]), item))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> + '_ {
        let generations = &self.generations;
        self.items
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.as_mut()
                    .map(|item| (EntityId::new(index as u32, generations[index]), item))
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Live entries.
    pub fn len(&self) -> usize {
        self.items.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_range(&self, id: EntityId) -> Result<()> {
        if id.index() >= self.items.len() {
            log::error!(
                "{} pool: handle {} beyond high-water mark {}",
                self.name,
                id.index,
                self.items.len()
            );
            return Err(PhysicsError::InvalidHandle {
                pool: self.name,
                index: id.index,
                high_water: self.items.len() as u32,
            });
        }
        Ok(())
    }

    fn check(&self, id: EntityId) -> Result<()> {
        self.check_range(id)?;
        if self.generations[id.index()] != id.generation {
            log::error!(
                "{} pool: stale handle {} (generation {}, slot at {})",
                self.name,
                id.index,
                id.generation,
                self.generations[id.index()]
            );
            return Err(PhysicsError::StaleHandle {
                pool: self.name,
                index: id.index,
                generation: id.generation,
            });
        }
        Ok(())
    }
}

#[cfg(feature = "parallel")]
impl<T: Send> Arena<T> {
    /// Runs `f` over every live entry on the rayon pool.
    pub fn par_for_each_mut<F>(&mut self, f: F)
    where
        F: Fn(EntityId, &mut T) + Sync + Send,
    {
        use rayon::prelude::*;

        let generations = &self.generations;
        self.items
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, slot)| {
                if let Some(item) = slot.as_mut() {
                    f(EntityId::new(index as u32, generations[index]), item);
                }
            });
    }
}
