// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod host_hooks;
mod options;
mod stack;

pub use host_hooks::{DefaultHostHooks, Fatal, HostHooks};
pub use options::{Options, OptionsError};
pub use stack::{STACK_CHUNK_SLOTS, STACK_INLINED_SLOTS};
pub(crate) use stack::ExecutionStack;
