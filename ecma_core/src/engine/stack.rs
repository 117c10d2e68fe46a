// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    ecmascript::types::Value,
    heap::{Heap, ObjectIndex},
};

/// Value slots stored directly in a frame before chunks are needed.
pub const STACK_INLINED_SLOTS: usize = 8;
/// Value slots per overflow chunk.
pub const STACK_CHUNK_SLOTS: usize = 16;

#[derive(Debug)]
struct StackChunk {
    values: [Value; STACK_CHUNK_SLOTS],
}

#[derive(Debug)]
struct StackFrame {
    inlined: [Value; STACK_INLINED_SLOTS],
    chunks: Vec<Box<StackChunk>>,
    len: usize,
    /// Always roots for the collector. Objects here hold no reference.
    registers: Box<[Value]>,
}

impl StackFrame {
    fn new(register_count: usize) -> Self {
        Self {
            inlined: [Value::EMPTY; STACK_INLINED_SLOTS],
            chunks: Vec::new(),
            len: 0,
            registers: vec![Value::EMPTY; register_count].into_boxed_slice(),
        }
    }

    fn slot(&mut self, index: usize) -> &mut Value {
        if index < STACK_INLINED_SLOTS {
            return &mut self.inlined[index];
        }
        let index = index - STACK_INLINED_SLOTS;
        &mut self.chunks[index / STACK_CHUNK_SLOTS].values[index % STACK_CHUNK_SLOTS]
    }

    fn push(&mut self, value: Value) {
        let index = self.len;
        if index >= STACK_INLINED_SLOTS && (index - STACK_INLINED_SLOTS) % STACK_CHUNK_SLOTS == 0 {
            self.chunks.push(Box::new(StackChunk {
                values: [Value::EMPTY; STACK_CHUNK_SLOTS],
            }));
        }
        *self.slot(index) = value;
        self.len += 1;
    }

    fn pop(&mut self) -> Option<Value> {
        self.len = self.len.checked_sub(1)?;
        let value = core::mem::take(self.slot(self.len));
        if self.len >= STACK_INLINED_SLOTS && (self.len - STACK_INLINED_SLOTS) % STACK_CHUNK_SLOTS == 0
        {
            self.chunks.pop();
        }
        Some(value)
    }

    fn top(&self) -> Option<Value> {
        let index = self.len.checked_sub(1)?;
        if index < STACK_INLINED_SLOTS {
            return Some(self.inlined[index]);
        }
        let index = index - STACK_INLINED_SLOTS;
        Some(self.chunks[index / STACK_CHUNK_SLOTS].values[index % STACK_CHUNK_SLOTS])
    }
}

/// Frames of the running code, innermost last.
#[derive(Debug, Default)]
pub(crate) struct ExecutionStack {
    frames: Vec<StackFrame>,
}

impl ExecutionStack {
    fn current(&self) -> &StackFrame {
        let Some(frame) = self.frames.last() else {
            panic!("No stack frame");
        };
        frame
    }

    fn current_mut(&mut self) -> &mut StackFrame {
        let Some(frame) = self.frames.last_mut() else {
            panic!("No stack frame");
        };
        frame
    }

    /// Objects in the registers of every live frame.
    pub(crate) fn register_objects(&self) -> impl Iterator<Item = ObjectIndex> {
        self.frames
            .iter()
            .flat_map(|frame| frame.registers.iter())
            .filter_map(|value| value.as_object())
    }
}

impl Heap {
    /// Enter a frame with `register_count` empty registers.
    pub fn add_frame(&mut self, register_count: usize) {
        self.stack.frames.push(StackFrame::new(register_count));
    }

    /// Leave the innermost frame, freeing every value it still holds.
    pub fn free_frame(&mut self) {
        let Some(mut frame) = self.stack.frames.pop() else {
            panic!("No stack frame to free");
        };
        while let Some(value) = frame.pop() {
            self.free_value(value, true);
        }
        for &value in frame.registers.iter() {
            self.free_value(value, false);
        }
    }

    pub fn stack_frame_count(&self) -> usize {
        self.stack.frames.len()
    }

    /// Number of values on the innermost frame's value stack.
    pub fn stack_depth(&self) -> usize {
        self.stack.current().len
    }

    /// Number of overflow chunks the innermost frame currently holds.
    pub fn stack_chunk_count(&self) -> usize {
        self.stack.current().chunks.len()
    }

    /// Push `value`, handing the stack the caller's claim on it, including
    /// one reference if it is an object.
    pub fn push_value(&mut self, value: Value) {
        self.stack.current_mut().push(value);
    }

    /// Bit alias of the top value.
    pub fn stack_top_value(&self) -> Option<Value> {
        self.stack.current().top()
    }

    /// Pop the top value and free it.
    pub fn pop_value(&mut self) {
        if let Some(value) = self.stack.current_mut().pop() {
            self.free_value(value, true);
        }
    }

    pub fn pop_values(&mut self, count: usize) {
        for _ in 0..count {
            self.pop_value();
        }
    }

    /// Pop the top value, handing its claim to the caller.
    pub fn take_value(&mut self) -> Option<Value> {
        self.stack.current_mut().pop()
    }

    pub fn frame_register(&self, index: usize) -> Value {
        self.stack.current().registers[index]
    }

    /// Store a copy of `value` in a register, freeing the previous occupant.
    /// Registers are roots, so objects are held without a reference.
    pub fn set_frame_register(&mut self, index: usize, value: Value) {
        let value = self.copy_value(value, false);
        let previous = core::mem::replace(&mut self.stack.current_mut().registers[index], value);
        self.free_value(previous, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_follow_the_stack_depth() {
        let mut heap = Heap::default();
        heap.add_frame(0);
        for i in 0..STACK_INLINED_SLOTS {
            heap.push_value(Value::from(i % 2 == 0));
        }
        assert_eq!(heap.stack_chunk_count(), 0);
        heap.push_value(Value::NULL);
        assert_eq!(heap.stack_chunk_count(), 1);
        for _ in 0..STACK_CHUNK_SLOTS {
            heap.push_value(Value::UNDEFINED);
        }
        assert_eq!(heap.stack_chunk_count(), 2);
        assert_eq!(heap.stack_depth(), STACK_INLINED_SLOTS + STACK_CHUNK_SLOTS + 1);

        heap.pop_value();
        assert_eq!(heap.stack_chunk_count(), 1);
        heap.pop_values(STACK_CHUNK_SLOTS - 1);
        assert_eq!(heap.stack_chunk_count(), 1);
        assert_eq!(heap.stack_top_value(), Some(Value::NULL));
        heap.pop_value();
        assert_eq!(heap.stack_chunk_count(), 0);
        assert_eq!(heap.stack_top_value(), Some(Value::from(false)));
        heap.free_frame();
        assert_eq!(heap.stack_frame_count(), 0);
    }

    #[test]
    fn frames_free_what_they_hold() {
        let mut heap = Heap::default();
        heap.add_frame(2);
        assert!(heap.frame_register(0).is_empty());
        assert!(heap.frame_register(1).is_empty());
        let number = heap.make_number_value(3.0);
        heap.set_frame_register(0, number);
        heap.free_value(number, false);
        for _ in 0..STACK_INLINED_SLOTS + 3 {
            let string = heap.new_string("a string long enough for chunks");
            heap.push_value(Value::String(string));
        }
        let other = heap.new_string("register");
        heap.set_frame_register(0, Value::String(other));
        heap.set_frame_register(1, Value::String(other));
        assert_eq!(heap.statistics().numbers, 0);
        assert_eq!(heap.string_refs(other), 3);
        heap.deref_string(other);

        let top = heap.take_value().unwrap();
        assert_eq!(heap.stack_depth(), STACK_INLINED_SLOTS + 2);
        heap.free_value(top, true);

        heap.free_frame();
        assert_eq!(heap.statistics().strings, 0);
        assert_eq!(heap.statistics().string_chunks, 0);
        assert_eq!(heap.statistics().numbers, 0);
    }
}
