// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod gc_header;
mod heap_gc;
pub(crate) mod indexes;
mod lcache;
mod pool;

use core::fmt::Display;

pub use gc_header::{GC_GENERATION_COUNT, Generation};
pub(crate) use gc_header::GcHeader;
pub use heap_gc::{GcSeverity, GcStatistics};
pub(crate) use heap_gc::{HeapMark, WorkQueues};
pub use indexes::{
    BaseIndex, MAX_POOL_CAPACITY, NumberIndex, ObjectIndex, PropertyIndex, StringChunkIndex,
    StringIndex,
};
pub use lcache::{LCACHE_ROW_BITS, LCACHE_ROW_LENGTH, LCACHE_ROWS, LCacheLookup};
pub(crate) use lcache::LCache;
pub(crate) use pool::Pool;

use crate::{
    ecmascript::types::{
        LiteralStorage, NumberHeapData, ObjectHeapData, PropertyHeapData, StringChunkHeapData,
        StringHeapData,
    },
    engine::{DefaultHostHooks, ExecutionStack, Fatal, HostHooks, Options, OptionsError},
};

/// The entity kinds the heap keeps a pool for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Objects,
    Properties,
    Strings,
    StringChunks,
    Numbers,
}

impl Display for PoolKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            PoolKind::Objects => "object",
            PoolKind::Properties => "property",
            PoolKind::Strings => "string",
            PoolKind::StringChunks => "string chunk",
            PoolKind::Numbers => "number",
        })
    }
}

/// Snapshot of how many entities of each kind are currently allocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStatistics {
    pub objects: usize,
    pub properties: usize,
    pub strings: usize,
    pub string_chunks: usize,
    pub numbers: usize,
    /// Interned literals. These live as long as the heap.
    pub literals: usize,
    pub lcache_entries: usize,
}

#[derive(Debug)]
pub struct Heap {
    pub(crate) objects: Pool<ObjectHeapData>,
    pub(crate) properties: Pool<PropertyHeapData>,
    pub(crate) strings: Pool<StringHeapData>,
    pub(crate) string_chunks: Pool<StringChunkHeapData>,
    pub(crate) numbers: Pool<NumberHeapData>,
    pub(crate) literals: LiteralStorage,
    /// Live objects and lexical environments, one list per generation.
    pub(crate) generations: [Vec<ObjectIndex>; GC_GENERATION_COUNT],
    pub(crate) lcache: LCache,
    pub(crate) stack: ExecutionStack,
    pub(crate) gc_statistics: GcStatistics,
    pub(crate) gc_in_progress: bool,
    options: Options,
    host_hooks: &'static dyn HostHooks,
}

impl Default for Heap {
    fn default() -> Self {
        Self::from_valid_options(Options::default(), &DefaultHostHooks)
    }
}

impl Heap {
    /// Create a heap with the given pool capacities.
    pub fn new(options: Options) -> Result<Self, OptionsError> {
        Self::with_host_hooks(options, &DefaultHostHooks)
    }

    /// Create a heap that reports fatal conditions to the given host hooks.
    pub fn with_host_hooks(
        options: Options,
        host_hooks: &'static dyn HostHooks,
    ) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self::from_valid_options(options, host_hooks))
    }

    fn from_valid_options(options: Options, host_hooks: &'static dyn HostHooks) -> Self {
        Self {
            objects: Pool::with_capacity(options.max_objects),
            properties: Pool::with_capacity(options.max_properties),
            strings: Pool::with_capacity(options.max_strings),
            string_chunks: Pool::with_capacity(options.max_string_chunks),
            numbers: Pool::with_capacity(options.max_numbers),
            literals: LiteralStorage::new(),
            generations: Default::default(),
            lcache: LCache::new(),
            stack: ExecutionStack::default(),
            gc_statistics: GcStatistics::default(),
            gc_in_progress: false,
            options,
            host_hooks,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn statistics(&self) -> HeapStatistics {
        HeapStatistics {
            objects: self.objects.len(),
            properties: self.properties.len(),
            strings: self.strings.len(),
            string_chunks: self.string_chunks.len(),
            numbers: self.numbers.len(),
            literals: self.literals.len(),
            lcache_entries: self.lcache.len(),
        }
    }

    pub fn gc_statistics(&self) -> GcStatistics {
        self.gc_statistics
    }

    /// Hand an unrecoverable condition to the embedding host.
    pub(crate) fn fatal(&self, code: Fatal) -> ! {
        self.host_hooks.fatal(&code)
    }

    /// Allocate into one of the pools, giving memory back with increasing
    /// severity while the pool stays full.
    fn alloc_with_pressure<T>(
        &mut self,
        data: T,
        kind: PoolKind,
        pool: fn(&mut Heap) -> &mut Pool<T>,
    ) -> BaseIndex<T> {
        let mut data = match pool(self).alloc(data) {
            Ok(index) => return index,
            Err(data) => data,
        };
        if !self.options.disable_gc && !self.gc_in_progress {
            let capacity = pool(self).capacity();
            for severity in GcSeverity::ESCALATION {
                log::trace!(
                    "{kind} pool full at {capacity} slots, giving memory back at {severity:?} severity"
                );
                self.try_give_memory_back(severity);
                data = match pool(self).alloc(data) {
                    Ok(index) => return index,
                    Err(data) => data,
                };
            }
        }
        self.fatal(Fatal::OutOfMemory(kind))
    }

    pub(crate) fn alloc_object(&mut self, data: ObjectHeapData) -> ObjectIndex {
        self.alloc_with_pressure(data, PoolKind::Objects, |heap| &mut heap.objects)
    }

    pub(crate) fn alloc_property(&mut self, data: PropertyHeapData) -> PropertyIndex {
        self.alloc_with_pressure(data, PoolKind::Properties, |heap| &mut heap.properties)
    }

    pub(crate) fn alloc_string(&mut self, data: StringHeapData) -> StringIndex {
        self.alloc_with_pressure(data, PoolKind::Strings, |heap| &mut heap.strings)
    }

    pub(crate) fn alloc_string_chunk(&mut self, data: StringChunkHeapData) -> StringChunkIndex {
        self.alloc_with_pressure(data, PoolKind::StringChunks, |heap| &mut heap.string_chunks)
    }

    pub(crate) fn alloc_number(&mut self, data: NumberHeapData) -> NumberIndex {
        self.alloc_with_pressure(data, PoolKind::Numbers, |heap| &mut heap.numbers)
    }
}
