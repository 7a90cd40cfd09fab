// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Per-CPU state
//!
//! Each CPU records the process it is running and the interrupt nesting
//! depth of the spinlocks it holds. Only the owning CPU touches its entry,
//! and only with interrupts disabled, so relaxed atomics suffice.

use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::kernel::Kernel;
use crate::process::{Pid, PID_INVALID};
use crate::sync::InterruptNesting;
use crate::traits::Platform;

/// Per-CPU state
#[derive(Debug)]
pub struct Cpu {
    /// Process running on this CPU, [`PID_INVALID`] when idle
    proc: AtomicU64,
    /// Depth of `push_off` nesting
    depth: AtomicUsize,
    /// Were interrupts enabled before the outermost `push_off`?
    intena: AtomicBool,
}

impl Cpu {
    /// Create an idle CPU with no locks held
    pub const fn new() -> Self {
        Self {
            proc: AtomicU64::new(PID_INVALID),
            depth: AtomicUsize::new(0),
            intena: AtomicBool::new(false),
        }
    }

    /// Process running on this CPU
    pub fn current(&self) -> Option<Pid> {
        match self.proc.load(Ordering::Relaxed) {
            PID_INVALID => None,
            pid => Some(pid),
        }
    }

    pub(crate) fn set_current(&self, pid: Option<Pid>) {
        self.proc.store(pid.unwrap_or(PID_INVALID), Ordering::Relaxed);
    }

    /// Number of spinlocks (and other `push_off`s) held on this CPU
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    pub(crate) fn intena(&self) -> bool {
        self.intena.load(Ordering::Relaxed)
    }

    pub(crate) fn set_intena(&self, enabled: bool) {
        self.intena.store(enabled, Ordering::Relaxed);
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> Kernel<P> {
    /// State of the current CPU
    ///
    /// # Panics
    /// If interrupts are enabled: the caller could migrate to another CPU
    /// before using the result.
    pub fn mycpu(&self) -> &Cpu {
        assert!(
            !self.platform.interrupts_enabled(),
            "mycpu called with interrupts enabled"
        );
        &self.cpus[self.platform.cpu_id()]
    }

    /// PID of the process running on this CPU
    pub fn current_pid(&self) -> Option<Pid> {
        self.push_off();
        let pid = self.mycpu().current();
        self.pop_off();
        pid
    }
}

impl<P: Platform> InterruptNesting for Kernel<P> {
    fn push_off(&self) -> usize {
        let old = self.platform.interrupts_enabled();
        self.platform.disable_interrupts();

        let id = self.platform.cpu_id();
        let cpu = &self.cpus[id];
        if cpu.depth.load(Ordering::Relaxed) == 0 {
            cpu.set_intena(old);
        }
        cpu.depth.fetch_add(1, Ordering::Relaxed);
        id
    }

    fn pop_off(&self) {
        let cpu = self.mycpu();
        let depth = cpu.depth();
        assert!(depth >= 1, "pop_off without push_off");

        cpu.depth.store(depth - 1, Ordering::Relaxed);
        if depth == 1 && cpu.intena() {
            self.platform.enable_interrupts();
        }
    }
}
