// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use hashbrown::HashTable;

macro_rules! magic_strings {
    ($($name:ident => $text:literal,)*) => {
        /// Names the engine itself needs. Each has exactly one interned form.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum MagicString {
            $($name,)*
        }

        impl MagicString {
            pub const ALL: &'static [MagicString] = &[$(MagicString::$name,)*];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(MagicString::$name => $text,)*
                }
            }
        }
    };
}

magic_strings! {
    Empty => "",
    Arguments => "arguments",
    ArgumentsClass => "Arguments",
    Array => "Array",
    Boolean => "Boolean",
    Callee => "callee",
    Caller => "caller",
    Configurable => "configurable",
    Constructor => "constructor",
    Date => "Date",
    Enumerable => "enumerable",
    Error => "Error",
    False => "false",
    Function => "Function",
    Get => "get",
    Infinity => "Infinity",
    Length => "length",
    Message => "message",
    Name => "name",
    NaN => "NaN",
    Null => "null",
    Number => "Number",
    Object => "Object",
    Prototype => "prototype",
    RegExp => "RegExp",
    Set => "set",
    String => "String",
    ToString => "toString",
    True => "true",
    Undefined => "undefined",
    Value => "value",
    ValueOf => "valueOf",
    Writable => "writable",
}

impl core::fmt::Display for MagicString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index into the heap's table of de-duplicated string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct LiteralIndex(u32);

/// The canonical interned form of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interned {
    Magic(MagicString),
    Literal(LiteralIndex),
}

#[derive(Debug)]
struct Literal {
    text: Box<str>,
    hash: u64,
}

/// Append-only table of literal strings, also the home of the content hash
/// every string-keyed structure of the heap shares.
#[derive(Debug)]
pub(crate) struct LiteralStorage {
    hasher: ahash::RandomState,
    literals: Vec<Literal>,
    literal_table: HashTable<LiteralIndex>,
    magic_hashes: Box<[u64]>,
    magic_table: HashTable<MagicString>,
}

impl Default for LiteralStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl LiteralStorage {
    pub(crate) fn new() -> Self {
        // Fixed seeds keep row placement in the lookup cache reproducible.
        let hasher = ahash::RandomState::with_seeds(
            0x243f_6a88_85a3_08d3,
            0x1319_8a2e_0370_7344,
            0xa409_3822_299f_31d0,
            0x082e_fa98_ec4e_6c89,
        );
        let magic_hashes = MagicString::ALL
            .iter()
            .map(|magic| hasher.hash_one(magic.as_str().as_bytes()))
            .collect::<Box<[u64]>>();
        let mut magic_table = HashTable::with_capacity(MagicString::ALL.len());
        for &magic in MagicString::ALL {
            magic_table.insert_unique(magic_hashes[magic as usize], magic, |magic| {
                magic_hashes[*magic as usize]
            });
        }
        Self {
            hasher,
            literals: Vec::new(),
            literal_table: HashTable::new(),
            magic_hashes,
            magic_table,
        }
    }

    pub(crate) fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        self.hasher.hash_one(bytes)
    }

    pub(crate) fn magic_hash(&self, magic: MagicString) -> u64 {
        self.magic_hashes[magic as usize]
    }

    pub(crate) fn literal_hash(&self, index: LiteralIndex) -> u64 {
        self.literals[index.0 as usize].hash
    }

    pub(crate) fn literal_str(&self, index: LiteralIndex) -> &str {
        &self.literals[index.0 as usize].text
    }

    pub(crate) fn find_magic(&self, text: &str) -> Option<MagicString> {
        self.find_magic_with_hash(text, self.hash_bytes(text.as_bytes()))
    }

    fn find_magic_with_hash(&self, text: &str, hash: u64) -> Option<MagicString> {
        self.magic_table
            .find(hash, |magic| magic.as_str() == text)
            .copied()
    }

    /// Canonical interned form of `text`, registering a new literal if the
    /// text has not been seen before.
    pub(crate) fn intern(&mut self, text: &str) -> Interned {
        let hash = self.hash_bytes(text.as_bytes());
        if let Some(magic) = self.find_magic_with_hash(text, hash) {
            return Interned::Magic(magic);
        }
        let literals = &self.literals;
        if let Some(index) = self
            .literal_table
            .find(hash, |index| &*literals[index.0 as usize].text == text)
        {
            return Interned::Literal(*index);
        }
        let index = LiteralIndex(self.literals.len() as u32);
        self.literals.push(Literal {
            text: text.into(),
            hash,
        });
        let literals = &self.literals;
        self.literal_table
            .insert_unique(hash, index, |index| literals[index.0 as usize].hash);
        Interned::Literal(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.literals.len()
    }
}
