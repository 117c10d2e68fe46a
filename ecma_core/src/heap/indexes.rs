// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::{
    fmt::Debug,
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem::size_of,
    num::NonZeroU32,
};

use crate::ecmascript::types::{
    NumberHeapData, ObjectHeapData, PropertyHeapData, StringChunkHeapData, StringHeapData,
};

/// Largest number of slots a single pool may hold. Slot offsets are stored
/// in 16 bits, biased by one so that the handle is never zero.
pub const MAX_POOL_CAPACITY: usize = u16::MAX as usize;

/// A compressed reference into a pool of `T`s.
///
/// The low 16 bits hold the slot offset plus one, the high 16 bits hold the
/// epoch the slot had when it was handed out. Freeing a slot bumps its epoch,
/// so a handle that outlived its entity no longer decodes to the slot's next
/// occupant.
pub struct BaseIndex<T: ?Sized>(NonZeroU32, PhantomData<T>);

const _INDEX_SIZE_IS_U32: () = assert!(size_of::<BaseIndex<()>>() == size_of::<u32>());
const _OPTION_INDEX_SIZE_IS_U32: () =
    assert!(size_of::<Option<BaseIndex<()>>>() == size_of::<u32>());

impl<T: ?Sized> Debug for BaseIndex<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.into_index(), self.epoch())
    }
}

impl<T: ?Sized> Clone for BaseIndex<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for BaseIndex<T> {}

impl<T: ?Sized> PartialEq for BaseIndex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: ?Sized> Eq for BaseIndex<T> {}

impl<T: ?Sized> PartialOrd for BaseIndex<T> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for BaseIndex<T> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: ?Sized> Hash for BaseIndex<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T: ?Sized> BaseIndex<T> {
    pub const fn from_parts(index: usize, epoch: u16) -> Self {
        assert!(index < MAX_POOL_CAPACITY);
        let value = (index as u32 + 1) | ((epoch as u32) << 16);
        // SAFETY: The low half is at least one.
        // This check is done manually to allow const context.
        Self(unsafe { NonZeroU32::new_unchecked(value) }, PhantomData)
    }

    /// Slot offset of the entity in its pool.
    pub const fn into_index(self) -> usize {
        (self.0.get() & 0xFFFF) as usize - 1
    }

    pub const fn epoch(self) -> u16 {
        (self.0.get() >> 16) as u16
    }

    pub const fn into_u32(self) -> u32 {
        self.0.get()
    }

    pub const fn from_u32(value: u32) -> Option<Self> {
        if value & 0xFFFF == 0 {
            return None;
        }
        match NonZeroU32::new(value) {
            Some(value) => Some(Self(value, PhantomData)),
            None => None,
        }
    }
}

pub type ObjectIndex = BaseIndex<ObjectHeapData>;
pub type PropertyIndex = BaseIndex<PropertyHeapData>;
pub type StringIndex = BaseIndex<StringHeapData>;
pub type StringChunkIndex = BaseIndex<StringChunkHeapData>;
pub type NumberIndex = BaseIndex<NumberHeapData>;

#[test]
fn index_packs_slot_and_epoch() {
    let index = ObjectIndex::from_parts(0, 0);
    assert_eq!(index.into_index(), 0);
    assert_eq!(index.epoch(), 0);
    assert_eq!(index.into_u32(), 1);

    let index = ObjectIndex::from_parts(MAX_POOL_CAPACITY - 1, u16::MAX);
    assert_eq!(index.into_index(), MAX_POOL_CAPACITY - 1);
    assert_eq!(index.epoch(), u16::MAX);
    assert_eq!(ObjectIndex::from_u32(index.into_u32()), Some(index));
}

#[test]
fn stale_epoch_is_a_different_handle() {
    let first = StringIndex::from_parts(3, 1);
    let second = StringIndex::from_parts(3, 2);
    assert_ne!(first, second);
    assert_eq!(first.into_index(), second.into_index());
    assert_eq!(StringIndex::from_u32(0x0005_0000), None);
}
