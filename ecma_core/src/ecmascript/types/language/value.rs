// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::mem::size_of;

use crate::heap::{Heap, HeapMark, NumberIndex, ObjectIndex, StringIndex, WorkQueues};

/// Values that carry no heap payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SimpleValue {
    /// Internal marker for "no value here", never visible to scripts.
    #[default]
    Empty,
    Undefined,
    Null,
    False,
    True,
    /// Marks a hole in an array's element storage.
    ArrayHole,
}

/// An ECMAScript value.
///
/// `Value` is a plain bit alias of its payload. Ownership of the payload is
/// tracked by the heap: a value returned by a constructor or by
/// [`Heap::copy_value`] must be released exactly once with
/// [`Heap::free_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Simple(SimpleValue),
    /// Owns its number box.
    Number(NumberIndex),
    String(StringIndex),
    Object(ObjectIndex),
}

const _VALUE_SIZE_IS_WORD: () = assert!(size_of::<Value>() == 2 * size_of::<u32>());

impl Default for Value {
    fn default() -> Self {
        Self::Simple(SimpleValue::Empty)
    }
}

impl Value {
    pub const EMPTY: Self = Self::Simple(SimpleValue::Empty);
    pub const UNDEFINED: Self = Self::Simple(SimpleValue::Undefined);
    pub const NULL: Self = Self::Simple(SimpleValue::Null);

    pub const fn make_simple(value: SimpleValue) -> Self {
        Self::Simple(value)
    }

    /// Wrap a string handle. The value takes over the caller's reference.
    pub const fn make_string(string: StringIndex) -> Self {
        Self::String(string)
    }

    pub const fn make_object(object: ObjectIndex) -> Self {
        Self::Object(object)
    }

    pub const fn is_simple(self) -> bool {
        matches!(self, Self::Simple(_))
    }

    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Simple(SimpleValue::Empty))
    }

    pub const fn is_undefined(self) -> bool {
        matches!(self, Self::Simple(SimpleValue::Undefined))
    }

    pub const fn is_null(self) -> bool {
        matches!(self, Self::Simple(SimpleValue::Null))
    }

    pub const fn is_boolean(self) -> bool {
        matches!(self, Self::Simple(SimpleValue::True | SimpleValue::False))
    }

    pub const fn is_true(self) -> bool {
        matches!(self, Self::Simple(SimpleValue::True))
    }

    pub const fn is_array_hole(self) -> bool {
        matches!(self, Self::Simple(SimpleValue::ArrayHole))
    }

    pub const fn is_number(self) -> bool {
        matches!(self, Self::Number(_))
    }

    pub const fn is_string(self) -> bool {
        matches!(self, Self::String(_))
    }

    pub const fn is_object(self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub const fn as_number(self) -> Option<NumberIndex> {
        match self {
            Self::Number(number) => Some(number),
            _ => None,
        }
    }

    pub const fn as_string(self) -> Option<StringIndex> {
        match self {
            Self::String(string) => Some(string),
            _ => None,
        }
    }

    pub const fn as_object(self) -> Option<ObjectIndex> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Simple(if value {
            SimpleValue::True
        } else {
            SimpleValue::False
        })
    }
}

impl From<SimpleValue> for Value {
    fn from(value: SimpleValue) -> Self {
        Self::Simple(value)
    }
}

impl From<StringIndex> for Value {
    fn from(value: StringIndex) -> Self {
        Self::String(value)
    }
}

impl From<ObjectIndex> for Value {
    fn from(value: ObjectIndex) -> Self {
        Self::Object(value)
    }
}

impl HeapMark for Value {
    fn mark_values(&self, queues: &mut WorkQueues) {
        match self {
            // Strings and numbers are reference counted or owned, only
            // objects are traced.
            Value::Simple(_) | Value::Number(_) | Value::String(_) => {}
            Value::Object(object) => object.mark_values(queues),
        }
    }
}

impl Heap {
    /// Produce a value with its own claim on the payload of `value`.
    ///
    /// Numbers are deep-copied into a fresh box and strings gain a reference.
    /// Objects gain a reference only if `ref_if_object` is set, otherwise the
    /// copy is a bare alias that relies on the collector tracing the holder.
    pub fn copy_value(&mut self, value: Value, ref_if_object: bool) -> Value {
        match value {
            Value::Simple(_) => value,
            Value::Number(number) => {
                let number = self.numbers[number];
                Value::Number(self.alloc_number(number))
            }
            Value::String(string) => Value::String(self.ref_string(string)),
            Value::Object(object) => {
                if ref_if_object {
                    self.ref_object(object);
                }
                value
            }
        }
    }

    /// Release a claim obtained from a constructor or [`Heap::copy_value`].
    pub fn free_value(&mut self, value: Value, deref_if_object: bool) {
        match value {
            Value::Simple(_) => {}
            Value::Number(number) => {
                self.numbers.free(number);
            }
            Value::String(string) => self.deref_string(string),
            Value::Object(object) => {
                if deref_if_object {
                    self.deref_object(object);
                }
            }
        }
    }
}
