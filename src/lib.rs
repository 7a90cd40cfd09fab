// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! # Rustux CFS - process table and weighted-fair scheduling core
//!
//! This crate is the process-scheduling and lifecycle core of the Rustux
//! teaching kernel. It provides:
//!
//! - **Process table**: a fixed-size table of process control blocks guarded
//!   by a single interrupt-safe spinlock
//! - **Weighted-fair scheduler**: per-core dispatch by minimum normalized
//!   runtime, with timeslices proportional to the nice-derived weight
//! - **Lifecycle**: fork, first-process bootstrap, exit, wait, kill
//! - **Sleep/wakeup**: channel-based blocking that gives woken processes a
//!   slight edge over the existing ready queue
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── kernel.rs          # Kernel context object (table lock, per-CPU state)
//! ├── process/           # PCB, process table, lifecycle, nice control
//! ├── sched/             # Per-CPU state, dispatch loop, tick accounting
//! ├── sync/              # Interrupt-safe spinlock, sleep/wakeup
//! ├── inspect.rs         # ps / procdump
//! ├── traits.rs          # Collaborator traits (context switch, memory, files)
//! └── arch/              # x86_64 interrupt control
//! ```
//!
//! There is no hidden global state: every operation goes through a
//! [`Kernel`], which owns the process table and its lock, and is generic
//! over the [`Platform`] that supplies context switching, address spaces and
//! descriptor tables.
//!
//! ## Usage
//!
//! ```ignore
//! use rustux_cfs::Kernel;
//!
//! static KERNEL: Kernel<MyPlatform> = Kernel::new(MyPlatform::new());
//!
//! KERNEL.userinit();
//! KERNEL.scheduler(); // never returns
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// Compile-time configuration
pub mod config;

// Error types
pub mod error;

// Collaborator traits
pub mod traits;

// Architecture-specific support
pub mod arch;

// Synchronization primitives
pub mod sync;

// Process management
pub mod process;

// Scheduler and per-CPU state
pub mod sched;

// Kernel context object
pub mod kernel;

// Diagnostics
pub mod inspect;

// Host test platform
#[cfg(test)]
pub mod testing;

pub use error::{KernelError, KResult};
pub use kernel::Kernel;
pub use traits::{CpuControl, ContextSwitch, FileManager, MemoryManager, Platform};

pub use sync::{Channel, InterruptNesting, SpinMutex, SpinMutexGuard};

pub use process::{
    Pid, PID_INVALID,
    Pcb, ProcFlags, ProcessState,
    ProcessTable,
    WEIGHTS, weight_of,
};

pub use sched::{Cpu, Dispatch};
