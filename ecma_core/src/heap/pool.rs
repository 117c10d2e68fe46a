// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::ops::{Index, IndexMut};

use super::indexes::{BaseIndex, MAX_POOL_CAPACITY};

#[derive(Debug)]
struct Slot<T> {
    epoch: u16,
    data: Option<T>,
}

/// Fixed-capacity arena of `T`s handing out epoch-checked handles.
///
/// Freed slots are reused last-in first-out. The backing vector only grows up
/// to the capacity given at construction.
#[derive(Debug)]
pub(crate) struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u16>,
    capacity: usize,
    live: usize,
}

impl<T> Pool<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity <= MAX_POOL_CAPACITY);
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            capacity: capacity.min(MAX_POOL_CAPACITY),
            live: 0,
        }
    }

    /// Place `data` into a free slot. A full pool hands the data back.
    pub(crate) fn alloc(&mut self, data: T) -> Result<BaseIndex<T>, T> {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.data.is_none());
            slot.data = Some(data);
            self.live += 1;
            return Ok(BaseIndex::from_parts(index as usize, slot.epoch));
        }
        if self.slots.len() >= self.capacity {
            return Err(data);
        }
        let index = self.slots.len();
        self.slots.push(Slot {
            epoch: 0,
            data: Some(data),
        });
        self.live += 1;
        Ok(BaseIndex::from_parts(index, 0))
    }

    /// Return the slot behind `index` to the pool, handing back its data.
    pub(crate) fn free(&mut self, index: BaseIndex<T>) -> T {
        let slot = self
            .slots
            .get_mut(index.into_index())
            .filter(|slot| slot.epoch == index.epoch())
            .expect("Freed a stale or out of bounds index");
        let data = slot.data.take().expect("Double free of a pool slot");
        slot.epoch = slot.epoch.wrapping_add(1);
        self.free_list.push(index.into_index() as u16);
        self.live -= 1;
        data
    }

    pub(crate) fn get(&self, index: BaseIndex<T>) -> Option<&T> {
        self.slots
            .get(index.into_index())
            .filter(|slot| slot.epoch == index.epoch())
            .and_then(|slot| slot.data.as_ref())
    }

    pub(crate) fn get_mut(&mut self, index: BaseIndex<T>) -> Option<&mut T> {
        self.slots
            .get_mut(index.into_index())
            .filter(|slot| slot.epoch == index.epoch())
            .and_then(|slot| slot.data.as_mut())
    }

    pub(crate) fn contains(&self, index: BaseIndex<T>) -> bool {
        self.get(index).is_some()
    }

    /// Number of live entities.
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Index<BaseIndex<T>> for Pool<T> {
    type Output = T;

    fn index(&self, index: BaseIndex<T>) -> &Self::Output {
        self.get(index).unwrap_or_else(|| {
            panic!(
                "Invalid {} index {index:?}",
                core::any::type_name::<T>().rsplit("::").next().unwrap_or("")
            )
        })
    }
}

impl<T> IndexMut<BaseIndex<T>> for Pool<T> {
    fn index_mut(&mut self, index: BaseIndex<T>) -> &mut Self::Output {
        match self.get_mut(index) {
            Some(data) => data,
            None => panic!(
                "Invalid {} index {index:?}",
                core::any::type_name::<T>().rsplit("::").next().unwrap_or("")
            ),
        }
    }
}
