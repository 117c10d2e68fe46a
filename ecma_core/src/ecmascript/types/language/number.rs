// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::Value;
use crate::heap::{Heap, NumberIndex};

/// A boxed IEEE 754 double. Boxes are exclusively owned by whichever value,
/// string or property holds their index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberHeapData(pub(crate) f64);

impl From<f64> for NumberHeapData {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

/// Shortest round-tripping ECMAScript text of a number.
pub(crate) fn number_to_text(value: f64, out: &mut std::string::String) {
    if value == 0.0 {
        // Both zeroes print as "0".
        out.push('0');
        return;
    }
    let mut buffer = ryu_js::Buffer::new();
    out.push_str(buffer.format(value));
}

/// Byte length of [`number_to_text`]'s output, without allocating.
pub(crate) fn number_text_len(value: f64) -> u32 {
    if value == 0.0 {
        return 1;
    }
    ryu_js::Buffer::new().format(value).len() as u32
}

impl Heap {
    /// Box `value` into a number value owned by the caller.
    pub fn make_number_value(&mut self, value: f64) -> Value {
        Value::Number(self.alloc_number(NumberHeapData(value)))
    }

    pub fn get_number(&self, number: NumberIndex) -> f64 {
        self.numbers[number].0
    }

    /// Overwrite an owned number box in place.
    pub fn set_number(&mut self, number: NumberIndex, value: f64) {
        self.numbers[number].0 = value;
    }
}
