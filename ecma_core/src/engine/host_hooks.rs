// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::heap::PoolKind;

/// Conditions the heap cannot recover from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Fatal {
    #[error("out of memory: {0} pool is exhausted")]
    OutOfMemory(PoolKind),
    #[error("reference count limit reached")]
    RefCountLimit,
}

/// Hooks the embedding host provides to the heap.
pub trait HostHooks: core::fmt::Debug {
    /// Called when the heap hits a [`Fatal`] condition. The heap is in no
    /// state to continue afterwards, so this never returns.
    fn fatal(&self, code: &Fatal) -> !;
}

#[derive(Debug)]
pub struct DefaultHostHooks;

impl HostHooks for DefaultHostHooks {
    fn fatal(&self, code: &Fatal) -> ! {
        log::error!("fatal heap condition: {code}");
        panic!("{code}")
    }
}
