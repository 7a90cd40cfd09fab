// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduler and per-CPU state
//!
//! # Example
//! ```ignore
//! use rustux_cfs::Kernel;
//!
//! // On every CPU, after its own setup:
//! kernel.scheduler();
//!
//! // From the timer interrupt:
//! if kernel.tick() {
//!     kernel.yield_cpu();
//! }
//! ```

pub mod cpu;
pub mod scheduler;

pub use cpu::Cpu;
pub use scheduler::Dispatch;
