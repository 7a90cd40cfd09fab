// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel error types
//!
//! Recoverable failures of process-table operations. Broken invariants
//! (lock discipline, scheduling a running process, the root process
//! exiting) are not errors; they panic.

use core::fmt;

/// Process-table error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// The process table is full, or a collaborator could not allocate
    /// memory for the new process.
    ResourceExhausted,
    /// No live process has the requested PID.
    NotFound,
    /// A nice value outside `0..=39`.
    OutOfRange,
    /// `wait` was called by a process with no children.
    NoChildren,
    /// `wait` was called by a process that has been killed.
    Killed,
}

impl KernelError {
    /// Value returned to user space for this error.
    ///
    /// Every failure is reported as `-1`, matching the rest of the
    /// syscall surface.
    pub const fn as_errno(self) -> isize {
        -1
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::ResourceExhausted => write!(f, "resource exhausted"),
            KernelError::NotFound => write!(f, "no such process"),
            KernelError::OutOfRange => write!(f, "nice value out of range"),
            KernelError::NoChildren => write!(f, "no children"),
            KernelError::Killed => write!(f, "process killed"),
        }
    }
}

/// Result type for process-table operations.
pub type KResult<T> = Result<T, KernelError>;
