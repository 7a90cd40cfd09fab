// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel context object
//!
//! [`Kernel`] owns the process table, its lock, the per-CPU state and the
//! tick counter. Every process operation is a method on it; the methods
//! are spread over the modules that implement them.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::config::NCPU;
use crate::process::{Pid, ProcessTable, PID_INVALID};
use crate::sched::Cpu;
use crate::sync::{SpinMutex, SpinMutexGuard};
use crate::traits::Platform;

/// Process-management state of one kernel instance
pub struct Kernel<P: Platform> {
    /// The process table and the lock serializing all of its transitions
    pub(crate) table: SpinMutex<ProcessTable>,

    /// Per-CPU state, indexed by [`CpuControl::cpu_id`](crate::CpuControl::cpu_id)
    pub(crate) cpus: [Cpu; NCPU],

    /// Timer ticks since boot
    pub(crate) ticks: SpinMutex<u64>,

    /// The bootstrap process, which adopts orphans
    pub(crate) root: AtomicU64,

    pub(crate) platform: P,
}

impl<P: Platform> Kernel<P> {
    /// Create a kernel with an empty process table
    pub const fn new(platform: P) -> Self {
        Self {
            table: SpinMutex::new(ProcessTable::new()),
            cpus: [const { Cpu::new() }; NCPU],
            ticks: SpinMutex::new(0),
            root: AtomicU64::new(PID_INVALID),
            platform,
        }
    }

    /// Lock the process table
    ///
    /// Interrupts stay disabled on this CPU until the guard is dropped.
    pub fn table(&self) -> SpinMutexGuard<'_, ProcessTable> {
        self.table.lock(self)
    }

    /// The lock guarding the process table
    pub fn table_lock(&self) -> &SpinMutex<ProcessTable> {
        &self.table
    }

    /// The platform this kernel runs on
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// PID of the bootstrap process, once [`userinit`](Self::userinit) ran
    pub fn root_pid(&self) -> Option<Pid> {
        match self.root.load(Ordering::Acquire) {
            PID_INVALID => None,
            pid => Some(pid),
        }
    }

    /// Timer ticks since boot
    pub fn ticks(&self) -> u64 {
        *self.ticks.lock(self)
    }

    /// State of CPU `id`
    pub fn cpu(&self, id: usize) -> &Cpu {
        &self.cpus[id]
    }
}
