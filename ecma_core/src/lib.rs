// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # ecma_core
//!
//! The value, object and memory core of an embeddable ECMAScript engine.
//!
//! All engine entities live in fixed-capacity pools owned by a single
//! [`Heap`] and are referred to by compact 32-bit handles. Strings and numeric
//! boxes are reference counted; objects and lexical environments are reclaimed
//! by a generational mark-and-sweep collector that treats any object with an
//! outstanding reference count as a root. Own-property lookups go through a
//! small inline lookup cache before falling back to walking the property list.
//!
//! The heap is strictly single-threaded and never collects reentrantly.

pub mod ecmascript;
pub mod engine;
pub mod heap;

pub use ecmascript::types::{
    InternalPropertyId, InternalValue, LexicalEnvironmentType, MagicString, ObjectType,
    Property, SimpleValue, Value,
};
pub use engine::{
    DefaultHostHooks, Fatal, HostHooks, Options, OptionsError, STACK_CHUNK_SLOTS,
    STACK_INLINED_SLOTS,
};
pub use heap::{
    GC_GENERATION_COUNT, GcSeverity, GcStatistics, Generation, Heap, HeapStatistics,
    LCACHE_ROW_BITS, LCACHE_ROW_LENGTH, LCACHE_ROWS, LCacheLookup, MAX_POOL_CAPACITY,
    NumberIndex, ObjectIndex, PoolKind, PropertyIndex, StringIndex,
};
