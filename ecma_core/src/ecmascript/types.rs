// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod language;

pub use language::{
    InternalPropertyId, InternalValue, LexicalEnvironmentType, MagicString, NumberHeapData,
    ObjectHeapData, ObjectType, Property, PropertyHeapData, SimpleValue, StringChunkHeapData,
    StringHeapData, Value,
};
pub(crate) use language::LiteralStorage;
