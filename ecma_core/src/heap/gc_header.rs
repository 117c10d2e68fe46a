// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Number of age cohorts the collector keeps objects in.
pub const GC_GENERATION_COUNT: usize = 4;

/// Age cohort of an object. Zero is the youngest generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u8);

impl Generation {
    pub const YOUNGEST: Self = Self(0);
    pub const OLDEST: Self = Self(GC_GENERATION_COUNT as u8 - 1);

    pub const fn new(value: u8) -> Option<Self> {
        if (value as usize) < GC_GENERATION_COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index < GC_GENERATION_COUNT);
        Self(index as u8)
    }

    pub(crate) const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// The generation a survivor of this generation moves into.
    pub const fn promoted(self) -> Self {
        if self.0 == Self::OLDEST.0 {
            self
        } else {
            Self(self.0 + 1)
        }
    }
}

/// Collector bookkeeping shared by ordinary objects and lexical environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GcHeader {
    /// Outstanding external handles. Nonzero makes the object a root.
    pub(crate) refs: u32,
    pub(crate) generation: Generation,
    /// Transient mark bit, cleared at the start of every collection that
    /// covers this object's generation.
    pub(crate) visited: bool,
    /// Conservative: set whenever this object might hold a reference into a
    /// strictly younger generation.
    pub(crate) may_ref_younger_objects: bool,
}

impl GcHeader {
    pub(crate) const fn new() -> Self {
        Self {
            refs: 1,
            generation: Generation::YOUNGEST,
            visited: false,
            may_ref_younger_objects: false,
        }
    }
}

#[test]
fn promotion_saturates_at_oldest() {
    let mut generation = Generation::YOUNGEST;
    for expected in 1..GC_GENERATION_COUNT as u8 {
        generation = generation.promoted();
        assert_eq!(generation.get(), expected);
    }
    assert_eq!(generation, Generation::OLDEST);
    assert_eq!(generation.promoted(), Generation::OLDEST);
    assert_eq!(Generation::new(GC_GENERATION_COUNT as u8), None);
}
