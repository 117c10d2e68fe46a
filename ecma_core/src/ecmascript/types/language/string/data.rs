// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{MagicString, literal_storage::LiteralIndex};
use crate::heap::{NumberIndex, StringChunkIndex, StringIndex};

/// Longest UTF-8 text stored directly in a string descriptor.
pub(crate) const INLINE_STRING_CAPACITY: usize = 7;

/// Payload bytes of one heap chunk of a long string.
pub(crate) const STRING_CHUNK_SIZE: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct InlineString {
    bytes: [u8; INLINE_STRING_CAPACITY],
    len: u8,
}

impl core::fmt::Debug for InlineString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl InlineString {
    pub(crate) fn new(text: &str) -> Option<Self> {
        if text.len() > INLINE_STRING_CAPACITY {
            return None;
        }
        let mut bytes = [0; INLINE_STRING_CAPACITY];
        bytes[..text.len()].copy_from_slice(text.as_bytes());
        Some(Self {
            bytes,
            len: text.len() as u8,
        })
    }

    pub(crate) fn as_str(&self) -> &str {
        // SAFETY: The bytes were copied from a `str` in `new`.
        unsafe { core::str::from_utf8_unchecked(&self.bytes[..self.len as usize]) }
    }
}

/// One link of a chunked string. Chunks are cut on character boundaries so
/// every chunk holds valid UTF-8 on its own.
#[derive(Debug, Clone, Copy)]
pub struct StringChunkHeapData {
    pub(crate) next: Option<StringChunkIndex>,
    pub(crate) len: u8,
    pub(crate) bytes: [u8; STRING_CHUNK_SIZE],
}

impl StringChunkHeapData {
    pub(crate) fn as_str(&self) -> &str {
        // SAFETY: Chunks are only filled from whole characters of a `str`.
        unsafe { core::str::from_utf8_unchecked(&self.bytes[..self.len as usize]) }
    }
}

/// Split `text` into pieces of at most [`STRING_CHUNK_SIZE`] bytes without
/// cutting a character in half.
pub(crate) fn split_into_chunks(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    core::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let mut end = rest.len().min(STRING_CHUNK_SIZE);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum StringContainer {
    Inline(InlineString),
    Chunks {
        head: StringChunkIndex,
        /// Size in UTF-8 bytes.
        size: u32,
        /// Length in UTF-16 code units.
        length: u32,
    },
    /// Owns the number box; the text is produced when needed.
    Number(NumberIndex),
    Magic(MagicString),
    Literal(LiteralIndex),
    /// Lazy concatenation holding a reference to both halves. Never empty.
    /// `None` length means it has to be summed from the children.
    Concatenation {
        left: StringIndex,
        right: StringIndex,
        size: u32,
        length: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct StringHeapData {
    pub(crate) refs: u32,
    pub(crate) container: StringContainer,
}

impl StringHeapData {
    pub(crate) const fn new(container: StringContainer) -> Self {
        Self { refs: 1, container }
    }
}

#[test]
fn chunks_split_on_char_boundaries() {
    let text = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\u{00e9}bbbb";
    let chunks = split_into_chunks(text).collect::<Vec<_>>();
    assert_eq!(chunks, ["aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "\u{00e9}bbbb"]);
    assert_eq!(split_into_chunks("").count(), 0);
}

#[test]
fn inline_string_capacity() {
    assert_eq!(InlineString::new("1234567").unwrap().as_str(), "1234567");
    assert!(InlineString::new("12345678").is_none());
    assert_eq!(InlineString::new("").unwrap().as_str(), "");
}
