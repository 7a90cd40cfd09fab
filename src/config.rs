// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel configuration constants.
//!
//! Compile-time limits and scheduling parameters. Changing a value here
//! changes the layout of [`ProcessTable`](crate::ProcessTable) and the
//! per-CPU array of [`Kernel`](crate::Kernel).

/// Maximum number of processes (process table capacity).
pub const NPROC: usize = 64;

/// Maximum number of CPUs supported.
pub const NCPU: usize = 8;

/// Ticks handed out per scheduling round, split among runnable processes
/// in proportion to their weight.
pub const BASE_QUANTUM: u64 = 10;

/// Lowest (most favoured) nice level.
pub const NICE_MIN: u8 = 0;

/// Highest (least favoured) nice level.
pub const NICE_MAX: u8 = 39;

/// Nice level given to every new process.
pub const NICE_DEFAULT: u8 = 20;

/// Weight of a process at [`NICE_DEFAULT`]; the unit of one tick of
/// virtual runtime.
pub const NICE_0_WEIGHT: u64 = 1024;

/// Process name capacity in bytes, including the terminating NUL the
/// syscall layer copies out.
pub const PROC_NAME_LEN: usize = 16;

/// Name of the bootstrap process.
pub const ROOT_PROC_NAME: &str = "initcode";

/// Page size used for the first process image (4 KB).
pub const PAGE_SIZE: usize = 4096;
