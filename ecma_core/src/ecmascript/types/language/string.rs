// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod data;
mod literal_storage;

use core::cmp::Ordering;
use std::borrow::Cow;

use hashbrown::HashMap;

pub use data::{StringChunkHeapData, StringHeapData};
pub(crate) use literal_storage::LiteralStorage;
pub use literal_storage::MagicString;

use data::{InlineString, STRING_CHUNK_SIZE, StringContainer, split_into_chunks};
use literal_storage::Interned;

use super::{NumberHeapData, number_text_len, number_to_text};
use crate::{
    engine::Fatal,
    heap::{Heap, PoolKind, StringChunkIndex, StringIndex},
};

impl Heap {
    /// Create a string holding `text`.
    ///
    /// Engine names resolve to their magic string, short text is stored
    /// inline and anything longer goes into a chain of heap chunks.
    pub fn new_string(&mut self, text: &str) -> StringIndex {
        let container = if let Some(magic) = self.literals.find_magic(text) {
            StringContainer::Magic(magic)
        } else if let Some(inline) = InlineString::new(text) {
            StringContainer::Inline(inline)
        } else {
            self.alloc_chunks(text)
        };
        self.alloc_string(StringHeapData::new(container))
    }

    fn alloc_chunks(&mut self, text: &str) -> StringContainer {
        let pieces = split_into_chunks(text).collect::<Vec<_>>();
        let mut next = None;
        // Link back to front so every chunk is allocated with its successor
        // already known.
        for piece in pieces.iter().rev() {
            let mut bytes = [0; STRING_CHUNK_SIZE];
            bytes[..piece.len()].copy_from_slice(piece.as_bytes());
            next = Some(self.alloc_string_chunk(StringChunkHeapData {
                next,
                len: piece.len() as u8,
                bytes,
            }));
        }
        let Some(head) = next else {
            unreachable!("Chunked strings are never empty")
        };
        StringContainer::Chunks {
            head,
            size: text.len() as u32,
            length: text.encode_utf16().count() as u32,
        }
    }

    /// Create a string for a source literal. Equal literals share one
    /// interned entry for the heap's lifetime.
    pub fn new_string_from_literal(&mut self, text: &str) -> StringIndex {
        let container = match self.literals.intern(text) {
            Interned::Magic(magic) => StringContainer::Magic(magic),
            Interned::Literal(index) => StringContainer::Literal(index),
        };
        self.alloc_string(StringHeapData::new(container))
    }

    pub fn new_string_from_magic(&mut self, magic: MagicString) -> StringIndex {
        self.alloc_string(StringHeapData::new(StringContainer::Magic(magic)))
    }

    /// Create a string whose text is the ECMAScript rendering of `value`.
    pub fn new_string_from_number(&mut self, value: f64) -> StringIndex {
        let number = self.alloc_number(NumberHeapData(value));
        self.alloc_string(StringHeapData::new(StringContainer::Number(number)))
    }

    /// Lazily concatenate two strings. The result holds its own reference to
    /// both halves; the caller keeps theirs.
    pub fn concat_strings(&mut self, left: StringIndex, right: StringIndex) -> StringIndex {
        let right_size = self.string_size(right);
        if right_size == 0 {
            return self.ref_string(left);
        }
        let left_size = self.string_size(left);
        if left_size == 0 {
            return self.ref_string(right);
        }
        let size = self.string_measure_sum(left_size, right_size);
        let length = self
            .known_string_length(left)
            .zip(self.known_string_length(right))
            .map(|(left, right)| self.string_measure_sum(left, right));
        self.ref_string(left);
        self.ref_string(right);
        self.alloc_string(StringHeapData::new(StringContainer::Concatenation {
            left,
            right,
            size,
            length,
        }))
    }

    /// A string whose size or length does not fit in 32 bits cannot be
    /// stored either.
    fn string_measure_sum(&self, left: u32, right: u32) -> u32 {
        match left.checked_add(right) {
            Some(sum) => sum,
            None => self.fatal(Fatal::OutOfMemory(PoolKind::Strings)),
        }
    }

    pub fn ref_string(&mut self, string: StringIndex) -> StringIndex {
        let data = &mut self.strings[string];
        match data.refs.checked_add(1) {
            Some(refs) => data.refs = refs,
            None => self.fatal(Fatal::RefCountLimit),
        }
        string
    }

    /// Drop one reference. The last reference frees the string together with
    /// everything it owns.
    pub fn deref_string(&mut self, string: StringIndex) {
        let mut pending = vec![string];
        while let Some(string) = pending.pop() {
            let data = &mut self.strings[string];
            debug_assert!(data.refs > 0, "String reference count underflow");
            data.refs -= 1;
            if data.refs > 0 {
                continue;
            }
            match self.strings.free(string).container {
                StringContainer::Inline(_)
                | StringContainer::Magic(_)
                | StringContainer::Literal(_) => {}
                StringContainer::Chunks { head, .. } => {
                    let mut chunk = Some(head);
                    while let Some(index) = chunk {
                        chunk = self.string_chunks.free(index).next;
                    }
                }
                StringContainer::Number(number) => {
                    self.numbers.free(number);
                }
                StringContainer::Concatenation { left, right, .. } => {
                    pending.push(right);
                    pending.push(left);
                }
            }
        }
    }

    pub fn string_refs(&self, string: StringIndex) -> u32 {
        self.strings[string].refs
    }

    pub fn string_as_magic(&self, string: StringIndex) -> Option<MagicString> {
        match self.strings[string].container {
            StringContainer::Magic(magic) => Some(magic),
            _ => None,
        }
    }

    /// Text of strings that are stored whole, `None` for number and
    /// concatenation strings.
    fn stored_str(&self, string: StringIndex) -> Option<&str> {
        match &self.strings[string].container {
            StringContainer::Inline(inline) => Some(inline.as_str()),
            StringContainer::Magic(magic) => Some(magic.as_str()),
            StringContainer::Literal(index) => Some(self.literals.literal_str(*index)),
            StringContainer::Chunks { .. }
            | StringContainer::Number(_)
            | StringContainer::Concatenation { .. } => None,
        }
    }

    fn chunks(&self, head: StringChunkIndex) -> impl Iterator<Item = &str> {
        let mut chunk = Some(head);
        core::iter::from_fn(move || {
            let data = &self.string_chunks[chunk?];
            chunk = data.next;
            Some(data.as_str())
        })
    }

    /// Append the text of `string` to `out`.
    pub(crate) fn write_string(&self, string: StringIndex, out: &mut std::string::String) {
        let mut pending = vec![string];
        while let Some(string) = pending.pop() {
            match &self.strings[string].container {
                StringContainer::Chunks { head, .. } => {
                    self.chunks(*head).for_each(|chunk| out.push_str(chunk));
                }
                StringContainer::Number(number) => number_to_text(self.numbers[*number].0, out),
                StringContainer::Concatenation { left, right, .. } => {
                    pending.push(*right);
                    pending.push(*left);
                }
                _ => {
                    if let Some(text) = self.stored_str(string) {
                        out.push_str(text);
                    }
                }
            }
        }
    }

    /// Borrow the text of `string`, materializing it if it is not stored
    /// whole.
    pub(crate) fn string_text(&self, string: StringIndex) -> Cow<'_, str> {
        if let Some(text) = self.stored_str(string) {
            return Cow::Borrowed(text);
        }
        let mut out = std::string::String::new();
        self.write_string(string, &mut out);
        Cow::Owned(out)
    }

    pub fn string_to_std(&self, string: StringIndex) -> std::string::String {
        self.string_text(string).into_owned()
    }

    /// Write the UTF-8 text of `string` followed by a NUL byte into `buffer`.
    ///
    /// Returns the number of text bytes written, or the negated buffer size
    /// required if `buffer` is too small. Nothing is written in that case.
    pub fn string_to_zt(&self, string: StringIndex, buffer: &mut [u8]) -> isize {
        let required = self.string_size(string) as usize + 1;
        if buffer.len() < required {
            return -(required as isize);
        }
        let text = self.string_text(string);
        buffer[..text.len()].copy_from_slice(text.as_bytes());
        buffer[text.len()] = 0;
        text.len() as isize
    }

    fn known_string_length(&self, string: StringIndex) -> Option<u32> {
        match &self.strings[string].container {
            StringContainer::Chunks { length, .. } => Some(*length),
            StringContainer::Concatenation { length, .. } => *length,
            StringContainer::Number(_) => None,
            _ => self
                .stored_str(string)
                .map(|text| text.encode_utf16().count() as u32),
        }
    }

    /// Length in UTF-16 code units.
    pub fn string_length(&self, string: StringIndex) -> u32 {
        self.measure_string_length(string, &mut HashMap::new())
    }

    /// Sum the length of `string` from its leaves where no concatenation
    /// along the way knows it. Every node measured is memoized in `lengths`,
    /// so shared children are walked once.
    fn measure_string_length(
        &self,
        string: StringIndex,
        lengths: &mut HashMap<StringIndex, u32>,
    ) -> u32 {
        if let Some(length) = self.known_string_length(string) {
            return length;
        }
        let mut pending = vec![(string, false)];
        while let Some((node, children_measured)) = pending.pop() {
            if lengths.contains_key(&node) {
                continue;
            }
            if let Some(length) = self.known_string_length(node) {
                lengths.insert(node, length);
                continue;
            }
            let length = match self.strings[node].container {
                StringContainer::Concatenation { left, right, .. } => {
                    if !children_measured {
                        pending.push((node, true));
                        pending.push((right, false));
                        pending.push((left, false));
                        continue;
                    }
                    self.string_measure_sum(lengths[&left], lengths[&right])
                }
                // Number text is ASCII.
                StringContainer::Number(number) => number_text_len(self.numbers[number].0),
                _ => unreachable!("Stored strings know their length"),
            };
            lengths.insert(node, length);
        }
        lengths[&string]
    }

    /// Size of the UTF-8 text in bytes.
    pub fn string_size(&self, string: StringIndex) -> u32 {
        match &self.strings[string].container {
            StringContainer::Chunks { size, .. } | StringContainer::Concatenation { size, .. } => {
                *size
            }
            StringContainer::Number(number) => number_text_len(self.numbers[*number].0),
            _ => self.stored_str(string).map_or(0, str::len) as u32,
        }
    }

    /// UTF-16 code unit at `index`, `None` past the end.
    pub fn string_char_at(&self, string: StringIndex, index: u32) -> Option<u16> {
        let mut lengths = HashMap::new();
        let mut string = string;
        let mut index = index;
        while let StringContainer::Concatenation { left, right, .. } =
            self.strings[string].container
        {
            let left_length = self.measure_string_length(left, &mut lengths);
            if index < left_length {
                string = left;
            } else {
                index -= left_length;
                string = right;
            }
        }
        self.string_text(string)
            .encode_utf16()
            .nth(index as usize)
    }

    pub fn strings_equal(&self, a: StringIndex, b: StringIndex) -> bool {
        if a == b {
            return true;
        }
        match (&self.strings[a].container, &self.strings[b].container) {
            (StringContainer::Magic(a), StringContainer::Magic(b)) => return a == b,
            (StringContainer::Literal(a), StringContainer::Literal(b)) => return a == b,
            // Interning resolves magic text to the magic string first.
            (StringContainer::Magic(_), StringContainer::Literal(_))
            | (StringContainer::Literal(_), StringContainer::Magic(_)) => return false,
            (StringContainer::Inline(a), StringContainer::Inline(b)) => return a == b,
            (StringContainer::Number(a), StringContainer::Number(b)) => {
                let (a, b) = (self.numbers[*a].0, self.numbers[*b].0);
                return a == b || (a.is_nan() && b.is_nan());
            }
            _ => {}
        }
        self.string_size(a) == self.string_size(b) && self.string_text(a) == self.string_text(b)
    }

    /// Order two strings by their UTF-16 code units.
    pub fn compare_strings(&self, a: StringIndex, b: StringIndex) -> Ordering {
        if self.strings_equal(a, b) {
            return Ordering::Equal;
        }
        self.string_text(a)
            .encode_utf16()
            .cmp(self.string_text(b).encode_utf16())
    }

    /// Content hash when it is available without materializing the text.
    pub(crate) fn string_cheap_hash(&self, string: StringIndex) -> Option<u64> {
        match &self.strings[string].container {
            StringContainer::Inline(inline) => {
                Some(self.literals.hash_bytes(inline.as_str().as_bytes()))
            }
            StringContainer::Magic(magic) => Some(self.literals.magic_hash(*magic)),
            StringContainer::Literal(index) => Some(self.literals.literal_hash(*index)),
            _ => None,
        }
    }

    pub(crate) fn string_content_hash(&self, string: StringIndex) -> u64 {
        self.string_cheap_hash(string).unwrap_or_else(|| {
            self.literals
                .hash_bytes(self.string_text(string).as_bytes())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_text(heap: &Heap, string: StringIndex, text: &str) {
        assert_eq!(heap.string_to_std(string), text);
        assert_eq!(heap.string_size(string) as usize, text.len());
        assert_eq!(
            heap.string_length(string) as usize,
            text.encode_utf16().count()
        );
    }

    #[test]
    fn constructors_pick_containers() {
        let mut heap = Heap::default();
        let magic = heap.new_string("prototype");
        let inline = heap.new_string("abc");
        let chunks = heap.new_string("a string that does not fit inline or in one chunk");
        let literal = heap.new_string_from_literal("hello there");
        let number = heap.new_string_from_number(0.5);

        assert_eq!(heap.string_as_magic(magic), Some(MagicString::Prototype));
        assert!(matches!(
            heap.strings[inline].container,
            StringContainer::Inline(_)
        ));
        assert!(matches!(
            heap.strings[chunks].container,
            StringContainer::Chunks { .. }
        ));
        assert_eq!(heap.statistics().string_chunks, 2);
        assert!(matches!(
            heap.strings[literal].container,
            StringContainer::Literal(_)
        ));
        assert_text(&heap, number, "0.5");
        assert_text(&heap, chunks, "a string that does not fit inline or in one chunk");

        for string in [magic, inline, chunks, literal, number] {
            heap.deref_string(string);
        }
        assert_eq!(heap.statistics().strings, 0);
        assert_eq!(heap.statistics().string_chunks, 0);
        assert_eq!(heap.statistics().numbers, 0);
    }

    #[test]
    fn zero_terminated_output() {
        let mut heap = Heap::default();
        let string = heap.new_string("h\u{00e9}llo");
        let mut small = [0xAA; 4];
        assert_eq!(heap.string_to_zt(string, &mut small), -7);
        assert_eq!(small, [0xAA; 4]);
        let mut buffer = [0xAA; 8];
        assert_eq!(heap.string_to_zt(string, &mut buffer), 6);
        assert_eq!(&buffer[..7], "h\u{00e9}llo\0".as_bytes());
        heap.deref_string(string);
    }

    #[test]
    fn char_at_counts_utf16_units() {
        let mut heap = Heap::default();
        let left = heap.new_string("a\u{1F600}");
        let right = heap.new_string("bc");
        let both = heap.concat_strings(left, right);
        assert_eq!(heap.string_length(both), 5);
        assert_eq!(heap.string_char_at(both, 0), Some(u16::from(b'a')));
        assert_eq!(heap.string_char_at(both, 1), Some(0xD83D));
        assert_eq!(heap.string_char_at(both, 2), Some(0xDE00));
        assert_eq!(heap.string_char_at(both, 4), Some(u16::from(b'c')));
        assert_eq!(heap.string_char_at(both, 5), None);
        for string in [left, right, both] {
            heap.deref_string(string);
        }
    }

    #[test]
    fn equality_across_containers() {
        let mut heap = Heap::default();
        let literal = heap.new_string_from_literal("abcd");
        let inline = heap.new_string("abcd");
        let ab = heap.new_string("ab");
        let cd = heap.new_string("cd");
        let concat = heap.concat_strings(ab, cd);
        let nan = heap.new_string_from_number(f64::NAN);
        let other_nan = heap.new_string_from_number(f64::NAN);
        let nan_text = heap.new_string("NaN");

        assert!(heap.strings_equal(literal, inline));
        assert!(heap.strings_equal(inline, concat));
        assert!(heap.strings_equal(nan, other_nan));
        assert!(heap.strings_equal(nan, nan_text));
        assert!(!heap.strings_equal(ab, cd));
        assert_eq!(heap.compare_strings(ab, cd), Ordering::Less);
        assert_eq!(heap.compare_strings(concat, inline), Ordering::Equal);
        assert_eq!(heap.compare_strings(cd, concat), Ordering::Greater);

        for string in [literal, inline, ab, cd, concat, nan, other_nan, nan_text] {
            heap.deref_string(string);
        }
        assert_eq!(heap.statistics().strings, 0);
    }

    #[test]
    fn concatenation_with_unknown_length() {
        let mut heap = Heap::default();
        let number = heap.new_string_from_number(12.5);
        let suffix = heap.new_string("px");
        let concat = heap.concat_strings(number, suffix);
        assert!(matches!(
            heap.strings[concat].container,
            StringContainer::Concatenation { length: None, .. }
        ));
        assert_text(&heap, concat, "12.5px");
        for string in [number, suffix, concat] {
            heap.deref_string(string);
        }
    }

    #[test]
    fn concatenating_empty_reuses_other_half() {
        let mut heap = Heap::default();
        let empty = heap.new_string("");
        let text = heap.new_string("text");
        let concat = heap.concat_strings(text, empty);
        assert_eq!(concat, text);
        assert_eq!(heap.string_refs(text), 2);
        heap.deref_string(concat);
        heap.deref_string(text);
        heap.deref_string(empty);
    }

    #[test]
    fn deep_concatenation_frees_iteratively() {
        let mut heap = Heap::default();
        let mut string = heap.new_string("x");
        for _ in 0..5_000 {
            let piece = heap.new_string("y");
            let next = heap.concat_strings(string, piece);
            heap.deref_string(string);
            heap.deref_string(piece);
            string = next;
        }
        assert_eq!(heap.string_length(string), 5_001);
        heap.deref_string(string);
        assert_eq!(heap.statistics().strings, 0);
    }

    #[test]
    fn shared_halves_are_measured_once() {
        let mut heap = Heap::default();
        // Number text leaves every length unknown up the tree.
        let mut string = heap.new_string_from_number(1.5);
        for _ in 0..30 {
            let doubled = heap.concat_strings(string, string);
            heap.deref_string(string);
            string = doubled;
        }
        assert!(matches!(
            heap.strings[string].container,
            StringContainer::Concatenation { length: None, .. }
        ));
        assert_eq!(heap.string_size(string), 3 << 30);
        assert_eq!(heap.string_length(string), 3 << 30);
        assert_eq!(heap.string_char_at(string, 0), Some(u16::from(b'1')));
        assert_eq!(heap.string_char_at(string, (3 << 30) - 1), Some(u16::from(b'5')));
        assert_eq!(heap.string_char_at(string, 3 << 30), None);
        heap.deref_string(string);
        assert_eq!(heap.statistics().strings, 0);
        assert_eq!(heap.statistics().numbers, 0);
    }

    #[test]
    #[should_panic(expected = "out of memory: string pool is exhausted")]
    fn oversized_concatenation_is_out_of_memory() {
        let mut heap = Heap::default();
        let mut string = heap.new_string("x");
        for _ in 0..32 {
            string = heap.concat_strings(string, string);
        }
    }

    #[test]
    #[should_panic(expected = "reference count limit reached")]
    fn ref_count_overflow_is_fatal() {
        let mut heap = Heap::default();
        let string = heap.new_string("x");
        heap.strings[string].refs = u32::MAX;
        heap.ref_string(string);
    }
}
