// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel Synchronization Primitives
//!
//! # Primitives
//!
//! - **SpinMutex**: interrupt-safe spinlock for short critical sections
//! - **Channel**: wait-condition token for `sleep`/`wakeup`
//!
//! Sleeping is a process-table operation (the sleeper's state lives in its
//! PCB), so `sleep` and `wakeup` are methods of [`Kernel`](crate::Kernel);
//! this module holds their implementation.

pub mod spinlock;
pub mod wait_queue;

// Re-exports
pub use spinlock::{InterruptNesting, SpinMutex, SpinMutexGuard};
pub use wait_queue::Channel;
