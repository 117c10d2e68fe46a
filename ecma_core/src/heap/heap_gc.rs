// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{GC_GENERATION_COUNT, Generation, Heap, ObjectIndex};
use crate::ecmascript::types::ObjectHeapData;

/// How hard the collector tries when giving memory back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GcSeverity {
    /// Collect the youngest generation.
    Low,
    Medium,
    High,
    /// Collect every generation and flush the lookup cache.
    Critical,
}

impl GcSeverity {
    pub const ESCALATION: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Oldest generation a collection at this severity covers.
    pub const fn max_generation(self) -> Generation {
        match self {
            GcSeverity::Low => Generation::from_index(0),
            GcSeverity::Medium => Generation::from_index(1),
            GcSeverity::High => Generation::from_index(2),
            GcSeverity::Critical => Generation::OLDEST,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStatistics {
    pub collections: u64,
    pub objects_freed: u64,
}

/// Objects found while enumerating the direct references of a node.
#[derive(Debug, Default)]
pub(crate) struct WorkQueues {
    pub(crate) objects: Vec<ObjectIndex>,
}

impl WorkQueues {
    pub(crate) fn push_object(&mut self, object: ObjectIndex) {
        self.objects.push(object);
    }
}

pub(crate) trait HeapMark {
    /// Push every object directly referenced by `self`.
    fn mark_values(&self, queues: &mut WorkQueues);
}

impl HeapMark for ObjectIndex {
    fn mark_values(&self, queues: &mut WorkQueues) {
        queues.push_object(*self);
    }
}

impl<T: HeapMark> HeapMark for Option<T> {
    fn mark_values(&self, queues: &mut WorkQueues) {
        if let Some(value) = self {
            value.mark_values(queues);
        }
    }
}

impl Heap {
    /// Direct object references of `object`: its header links and, unless it
    /// is an object-bound environment, everything on its property list.
    fn object_children(&self, object: ObjectIndex, queues: &mut WorkQueues) {
        let ObjectHeapData { kind, .. } = &self.objects[object];
        kind.mark_values(queues);
        for property in self.own_properties(object) {
            self.property(property).mark_values(queues);
        }
    }

    /// Mark everything reachable from `root` through objects no older than
    /// `ceiling`, refreshing the younger-reference flag of every node walked.
    fn mark_from(&mut self, root: ObjectIndex, ceiling: Generation, queues: &mut WorkQueues) {
        let mut stack = vec![root];
        self.objects[root].gc.visited = true;
        while let Some(object) = stack.pop() {
            queues.objects.clear();
            self.object_children(object, queues);
            let generation = self.objects[object].gc.generation;
            let mut refs_younger = false;
            for &child in &queues.objects {
                let gc = &mut self.objects[child].gc;
                refs_younger |= gc.generation < generation;
                if gc.generation <= ceiling && !gc.visited {
                    gc.visited = true;
                    stack.push(child);
                }
            }
            self.objects[object].gc.may_ref_younger_objects = refs_younger;
        }
    }

    /// Check that an object without the younger-reference flag really holds
    /// no reference into a younger generation.
    #[cfg(any(debug_assertions, feature = "verify-gc-flags"))]
    fn verify_younger_flag(&self, object: ObjectIndex, queues: &mut WorkQueues) {
        queues.objects.clear();
        self.object_children(object, queues);
        let generation = self.objects[object].gc.generation;
        assert!(
            queues
                .objects
                .iter()
                .all(|child| self.objects[*child].gc.generation >= generation),
            "Object {object:?} references a younger generation without being flagged"
        );
    }

    /// Give memory back to the pools, collecting the generations `severity`
    /// covers.
    pub fn try_give_memory_back(&mut self, severity: GcSeverity) {
        if severity == GcSeverity::Critical {
            self.lcache_flush();
        }
        self.collect_garbage(severity.max_generation());
    }

    /// Collect generations `0..=max_generation`. Survivors move up one
    /// generation, leaving the youngest generation empty.
    pub fn collect_garbage(&mut self, max_generation: Generation) {
        assert!(!self.gc_in_progress, "Garbage collection is not reentrant");
        self.gc_in_progress = true;
        let collected = 0..=max_generation.as_usize();
        let mut queues = WorkQueues::default();

        for generation in collected.clone() {
            for &object in &self.generations[generation] {
                self.objects[object].gc.visited = false;
            }
        }

        // Objects with external references and everything held in the
        // registers of live frames are roots.
        let mut roots = Vec::new();
        for generation in collected.clone() {
            roots.extend(
                self.generations[generation]
                    .iter()
                    .copied()
                    .filter(|object| self.objects[*object].gc.refs > 0),
            );
        }
        roots.extend(self.stack.register_objects());
        for root in roots {
            if !self.objects[root].gc.visited {
                self.mark_from(root, Generation::OLDEST, &mut queues);
            }
        }

        // Older generations are not traced, except from objects that may
        // reference into the collected range.
        for generation in max_generation.as_usize() + 1..GC_GENERATION_COUNT {
            let objects = self.generations[generation].clone();
            for object in objects {
                if self.objects[object].gc.may_ref_younger_objects {
                    self.mark_from(object, max_generation, &mut queues);
                } else {
                    #[cfg(any(debug_assertions, feature = "verify-gc-flags"))]
                    self.verify_younger_flag(object, &mut queues);
                }
            }
        }

        let mut dead = Vec::new();
        for generation in collected.clone() {
            let objects = &mut self.generations[generation];
            let pool = &self.objects;
            let (live, unreachable): (Vec<_>, Vec<_>) = objects
                .iter()
                .copied()
                .partition(|object| pool[*object].gc.visited);
            *objects = live;
            dead.extend(unreachable);
        }

        // The cache holds dead objects weakly; drop those entries while the
        // properties they point at still exist.
        self.lcache_purge(|heap, object| {
            let gc = &heap.objects[object].gc;
            gc.generation <= max_generation && !gc.visited
        });
        for &object in &dead {
            self.free_object(object);
        }

        for generation in collected.rev() {
            let survivors = core::mem::take(&mut self.generations[generation]);
            let promoted = Generation::from_index(generation).promoted();
            for &object in &survivors {
                self.objects[object].gc.generation = promoted;
            }
            self.generations[promoted.as_usize()].extend(survivors);
        }

        self.gc_statistics.collections += 1;
        self.gc_statistics.objects_freed += dead.len() as u64;
        self.gc_in_progress = false;
        log::debug!(
            "collected generations 0..={}: freed {} objects, {} survive",
            max_generation.get(),
            dead.len(),
            self.objects.len()
        );
    }

    /// Free an unreachable object together with its property list.
    fn free_object(&mut self, object: ObjectIndex) {
        let data = self.objects.free(object);
        let mut next = data.properties();
        while let Some(property) = next {
            let data = self.properties.free(property);
            debug_assert!(!data.property.is_lcached());
            next = data.next;
            self.release_property(data.property);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecmascript::types::{ObjectType, Value};

    #[test]
    fn severity_ceilings() {
        assert_eq!(GcSeverity::Low.max_generation().get(), 0);
        assert_eq!(GcSeverity::Medium.max_generation().get(), 1);
        assert_eq!(GcSeverity::High.max_generation().get(), 2);
        assert_eq!(GcSeverity::Critical.max_generation(), Generation::OLDEST);
    }

    #[test]
    fn unreferenced_cycle_is_collected() {
        let mut heap = Heap::default();
        let a = heap.create_object(None, true, ObjectType::General);
        let env = heap.create_decl_lex_env(None);
        let name = heap.new_string("env");
        heap.create_named_data_property(a, name, Value::Object(env), true, true, true);
        heap.create_named_data_property(env, name, Value::Object(a), true, true, true);
        heap.deref_string(name);

        heap.collect_garbage(Generation::YOUNGEST);
        assert!(heap.is_object_live(a));
        assert!(heap.is_object_live(env));

        heap.deref_object(a);
        heap.deref_object(env);
        heap.try_give_memory_back(GcSeverity::Critical);
        assert!(!heap.is_object_live(a));
        assert!(!heap.is_object_live(env));
        assert_eq!(heap.statistics().properties, 0);
        assert_eq!(heap.statistics().strings, 0);
        assert_eq!(heap.gc_statistics().objects_freed, 2);
    }

    #[test]
    fn survivors_are_promoted() {
        let mut heap = Heap::default();
        let object = heap.create_object(None, true, ObjectType::General);
        for expected in 1..GC_GENERATION_COUNT as u8 {
            heap.try_give_memory_back(GcSeverity::Critical);
            assert_eq!(heap.object_generation(object).get(), expected);
        }
        heap.try_give_memory_back(GcSeverity::Critical);
        assert_eq!(heap.object_generation(object), Generation::OLDEST);
        assert!(heap.generations[0].is_empty());
        assert_eq!(heap.generations[Generation::OLDEST.as_usize()], [object]);
    }

    #[test]
    fn collection_outside_range_leaves_objects_alone() {
        let mut heap = Heap::default();
        let object = heap.create_object(None, true, ObjectType::General);
        heap.collect_garbage(Generation::YOUNGEST);
        heap.deref_object(object);
        // Generation one is not collected at low severity.
        heap.try_give_memory_back(GcSeverity::Low);
        assert!(heap.is_object_live(object));
        heap.try_give_memory_back(GcSeverity::Medium);
        assert!(!heap.is_object_live(object));
    }
}
