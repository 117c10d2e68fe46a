// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{Heap, ObjectIndex, PropertyIndex, StringIndex};

pub const LCACHE_ROW_BITS: u32 = 8;
pub const LCACHE_ROWS: usize = 1 << LCACHE_ROW_BITS;
pub const LCACHE_ROW_LENGTH: usize = 2;

/// Outcome of probing the lookup cache for an own property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LCacheLookup {
    Hit(PropertyIndex),
    /// The object is known not to have the property.
    NegativeHit,
    Miss,
}

#[derive(Debug, Clone, Copy)]
struct LCacheEntry {
    /// Weak: the collector purges the entry before freeing the object.
    object: ObjectIndex,
    /// Holds a reference.
    name: StringIndex,
    property: Option<PropertyIndex>,
}

type LCacheRow = [Option<LCacheEntry>; LCACHE_ROW_LENGTH];

/// Fixed-size (object, name) to property cache.
#[derive(Debug)]
pub(crate) struct LCache {
    rows: Box<[LCacheRow; LCACHE_ROWS]>,
}

impl LCache {
    pub(crate) fn new() -> Self {
        Self {
            rows: Box::new([[None; LCACHE_ROW_LENGTH]; LCACHE_ROWS]),
        }
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.rows.iter().flatten().filter(|slot| slot.is_some()).count()
    }
}

pub(crate) const fn lcache_row(name_hash: u64) -> usize {
    (name_hash as usize) & (LCACHE_ROWS - 1)
}

impl Heap {
    fn lcache_find_slot(&self, row: usize, object: ObjectIndex, name: StringIndex) -> Option<usize> {
        self.lcache.rows[row].iter().position(|slot| {
            slot.is_some_and(|entry| {
                entry.object == object && self.strings_equal(entry.name, name)
            })
        })
    }

    /// Probe the cache. Names whose hash needs the text materialized are
    /// never cached and always miss.
    pub fn lcache_lookup(&self, object: ObjectIndex, name: StringIndex) -> LCacheLookup {
        let Some(hash) = self.string_cheap_hash(name) else {
            return LCacheLookup::Miss;
        };
        let row = lcache_row(hash);
        match self.lcache_find_slot(row, object, name) {
            Some(slot) => match self.lcache.rows[row][slot] {
                Some(LCacheEntry {
                    property: Some(property),
                    ..
                }) => LCacheLookup::Hit(property),
                _ => LCacheLookup::NegativeHit,
            },
            None => LCacheLookup::Miss,
        }
    }

    /// Remember the result of an own property lookup. A full row is evicted
    /// as a whole.
    pub(crate) fn lcache_insert(
        &mut self,
        object: ObjectIndex,
        name: StringIndex,
        property: Option<PropertyIndex>,
    ) {
        let Some(hash) = self.string_cheap_hash(name) else {
            return;
        };
        let row = lcache_row(hash);
        debug_assert!(self.lcache_find_slot(row, object, name).is_none());
        let slot = match self.lcache.rows[row].iter().position(Option::is_none) {
            Some(slot) => slot,
            None => {
                log::trace!("evicting lookup cache row {row}");
                for slot in 0..LCACHE_ROW_LENGTH {
                    self.lcache_remove_slot(row, slot);
                }
                0
            }
        };
        if let Some(property) = property {
            self.properties[property].property.set_lcached(true);
        }
        let name = self.ref_string(name);
        self.lcache.rows[row][slot] = Some(LCacheEntry {
            object,
            name,
            property,
        });
    }

    /// Clear one slot, keeping the cached property's flag in sync.
    fn lcache_remove_slot(&mut self, row: usize, slot: usize) {
        let Some(entry) = self.lcache.rows[row][slot].take() else {
            return;
        };
        if let Some(property) = entry.property {
            self.properties[property].property.set_lcached(false);
        }
        self.deref_string(entry.name);
    }

    /// Drop the entry for (`object`, `name`), positive or negative, if any.
    pub(crate) fn lcache_invalidate(&mut self, object: ObjectIndex, name: StringIndex) {
        // Entries are only ever inserted under cheap hashes, but those are
        // content hashes, so hashing the full text finds the same row.
        let row = lcache_row(self.string_content_hash(name));
        if let Some(slot) = self.lcache_find_slot(row, object, name) {
            self.lcache_remove_slot(row, slot);
        }
    }

    /// Drop every entry whose object satisfies `predicate`.
    pub(crate) fn lcache_purge(&mut self, predicate: impl Fn(&Heap, ObjectIndex) -> bool) {
        for row in 0..LCACHE_ROWS {
            for slot in 0..LCACHE_ROW_LENGTH {
                if self.lcache.rows[row][slot].is_some_and(|entry| predicate(self, entry.object)) {
                    self.lcache_remove_slot(row, slot);
                }
            }
        }
    }

    pub(crate) fn lcache_flush(&mut self) {
        self.lcache_purge(|_, _| true);
    }

    pub fn is_property_lcached(&self, property: PropertyIndex) -> bool {
        self.properties[property].property.is_lcached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecmascript::types::{ObjectType, Value};

    /// Short names that land in the same cache row.
    fn colliding_names(heap: &Heap, count: usize) -> Vec<std::string::String> {
        let mut by_row = vec![Vec::new(); LCACHE_ROWS];
        for i in 0.. {
            let name = format!("p{i}");
            let row = lcache_row(heap.literals.hash_bytes(name.as_bytes()));
            by_row[row].push(name);
            if by_row[row].len() == count {
                return core::mem::take(&mut by_row[row]);
            }
        }
        unreachable!()
    }

    #[test]
    fn negative_results_are_cached() {
        let mut heap = Heap::default();
        let object = heap.create_object(None, true, ObjectType::General);
        let name = heap.new_string("missing");
        assert_eq!(heap.lcache_lookup(object, name), LCacheLookup::Miss);
        assert_eq!(heap.find_named_property(object, name), None);
        assert_eq!(heap.lcache_lookup(object, name), LCacheLookup::NegativeHit);
        assert_eq!(heap.string_refs(name), 2);

        // Creating the property must not leave the negative entry behind.
        let property =
            heap.create_named_data_property(object, name, Value::UNDEFINED, true, true, true);
        assert_eq!(heap.lcache_lookup(object, name), LCacheLookup::Miss);
        assert_eq!(heap.find_named_property(object, name), Some(property));
        assert_eq!(heap.lcache_lookup(object, name), LCacheLookup::Hit(property));
        assert!(heap.is_property_lcached(property));
    }

    #[test]
    fn full_row_is_evicted_entirely() {
        let mut heap = Heap::default();
        let object = heap.create_object(None, true, ObjectType::General);
        let names = colliding_names(&heap, LCACHE_ROW_LENGTH + 1);
        let mut properties = Vec::new();
        let mut strings = Vec::new();
        for name in &names {
            let string = heap.new_string(name);
            let property =
                heap.create_named_data_property(object, string, Value::NULL, true, true, true);
            assert_eq!(heap.find_named_property(object, string), Some(property));
            strings.push(string);
            properties.push(property);
        }
        let (last, older) = properties.split_last().unwrap();
        assert!(heap.is_property_lcached(*last));
        for (property, string) in older.iter().zip(&strings) {
            assert!(!heap.is_property_lcached(*property));
            assert_eq!(heap.lcache_lookup(object, *string), LCacheLookup::Miss);
        }
        assert_eq!(heap.lcache.len(), 1);
        // Evicted entries give their name reference back.
        assert_eq!(heap.string_refs(strings[0]), 2);
    }

    #[test]
    fn uncheap_names_bypass_the_cache() {
        let mut heap = Heap::default();
        let object = heap.create_object(None, true, ObjectType::General);
        let long = heap.new_string("a name that is stored in heap chunks");
        let property =
            heap.create_named_data_property(object, long, Value::UNDEFINED, true, true, true);
        assert_eq!(heap.find_named_property(object, long), Some(property));
        assert!(!heap.is_property_lcached(property));
        assert_eq!(heap.lcache.len(), 0);
    }

    #[test]
    fn materialized_name_invalidates_cached_negative() {
        let mut heap = Heap::default();
        let object = heap.create_object(None, true, ObjectType::General);
        let inline = heap.new_string("abcd");
        assert_eq!(heap.find_named_property(object, inline), None);
        assert_eq!(heap.lcache_lookup(object, inline), LCacheLookup::NegativeHit);

        let ab = heap.new_string("ab");
        let cd = heap.new_string("cd");
        let concat = heap.concat_strings(ab, cd);
        let property =
            heap.create_named_data_property(object, concat, Value::UNDEFINED, true, true, true);
        assert_eq!(heap.lcache_lookup(object, inline), LCacheLookup::Miss);
        assert_eq!(heap.find_named_property(object, inline), Some(property));
    }

    #[test]
    fn flush_clears_flags() {
        let mut heap = Heap::default();
        let object = heap.create_object(None, true, ObjectType::General);
        let name = heap.new_string("k");
        let property = heap.create_named_data_property(object, name, Value::NULL, true, true, true);
        heap.find_named_property(object, name);
        assert!(heap.is_property_lcached(property));
        heap.lcache_flush();
        assert!(!heap.is_property_lcached(property));
        assert_eq!(heap.lcache.len(), 0);
        assert_eq!(heap.string_refs(name), 2);
    }
}
