// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod number;
mod object;
mod string;
mod value;

pub(crate) use number::{number_text_len, number_to_text};
pub use number::NumberHeapData;
pub use object::{
    InternalPropertyId, InternalValue, LexicalEnvironmentType, ObjectHeapData, ObjectType,
    Property, PropertyHeapData,
};
pub(crate) use string::LiteralStorage;
pub use string::{MagicString, StringChunkHeapData, StringHeapData};
pub use value::{SimpleValue, Value};
