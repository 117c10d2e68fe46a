// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::heap::{MAX_POOL_CAPACITY, PoolKind};

const DEFAULT_POOL_CAPACITY: usize = 16 * 1024;

/// Heap construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub max_objects: usize,
    pub max_properties: usize,
    pub max_strings: usize,
    pub max_string_chunks: usize,
    pub max_numbers: usize,
    /// Never collect: a full pool is immediately fatal.
    pub disable_gc: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_objects: DEFAULT_POOL_CAPACITY,
            max_properties: DEFAULT_POOL_CAPACITY,
            max_strings: DEFAULT_POOL_CAPACITY,
            max_string_chunks: DEFAULT_POOL_CAPACITY,
            max_numbers: DEFAULT_POOL_CAPACITY,
            disable_gc: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("{0} pool must have room for at least one entity")]
    EmptyPool(PoolKind),
    #[error(
        "{kind} pool capacity {capacity} exceeds the limit of {max}",
        max = MAX_POOL_CAPACITY
    )]
    PoolTooLarge { kind: PoolKind, capacity: usize },
}

impl Options {
    pub(crate) fn pool_capacities(&self) -> [(PoolKind, usize); 5] {
        [
            (PoolKind::Objects, self.max_objects),
            (PoolKind::Properties, self.max_properties),
            (PoolKind::Strings, self.max_strings),
            (PoolKind::StringChunks, self.max_string_chunks),
            (PoolKind::Numbers, self.max_numbers),
        ]
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        for (kind, capacity) in self.pool_capacities() {
            if capacity == 0 {
                return Err(OptionsError::EmptyPool(kind));
            }
            if capacity > MAX_POOL_CAPACITY {
                return Err(OptionsError::PoolTooLarge { kind, capacity });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert_eq!(Options::default().validate(), Ok(()));
    }

    #[test]
    fn oversized_pool_is_rejected() {
        let options = Options {
            max_numbers: MAX_POOL_CAPACITY + 1,
            ..Default::default()
        };
        let error = options.validate().unwrap_err();
        assert_eq!(
            error,
            OptionsError::PoolTooLarge {
                kind: PoolKind::Numbers,
                capacity: MAX_POOL_CAPACITY + 1
            }
        );
        assert_eq!(
            error.to_string(),
            "number pool capacity 65536 exceeds the limit of 65535"
        );
    }
}
