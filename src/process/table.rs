// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Process Table
//!
//! Fixed-capacity table of process control blocks. The table itself is
//! plain data; [`Kernel`](crate::Kernel) wraps it in the single
//! interrupt-safe lock that serializes every state transition.

use core::ops::{Index, IndexMut};

use crate::config::{NICE_0_WEIGHT, NICE_DEFAULT, NPROC};
use crate::error::{KResult, KernelError};
use crate::process::{Pcb, Pid, ProcFlags, ProcessState, PID_INVALID};

/// ============================================================================
/// Process Table
/// ============================================================================

/// Process table
///
/// Slots are addressed by index; a slot returns to `Unused` only when its
/// zombie is reaped (or when a half-built process is rolled back).
pub struct ProcessTable {
    /// Process slots
    procs: [Pcb; NPROC],

    /// Next PID to allocate (PID 0 is never handed out)
    next_pid: Pid,
}

impl ProcessTable {
    /// Create an empty process table
    pub const fn new() -> Self {
        Self {
            procs: [const { Pcb::new() }; NPROC],
            next_pid: 1,
        }
    }

    /// Claim the first unused slot
    ///
    /// The slot becomes `Embryo` with a fresh PID, nice 20 and all time
    /// accounting zeroed.
    ///
    /// # Returns
    /// * `Ok(slot)` - Index of the claimed slot
    /// * `Err(KernelError::ResourceExhausted)` - Every slot is in use
    pub fn allocate(&mut self) -> KResult<usize> {
        let slot = self
            .procs
            .iter()
            .position(|p| p.state == ProcessState::Unused)
            .ok_or(KernelError::ResourceExhausted)?;

        let pid = self.next_pid;
        self.next_pid += 1;

        let pcb = &mut self.procs[slot];
        *pcb = Pcb::new();
        pcb.pid = pid;
        pcb.state = ProcessState::Embryo;
        debug_assert_eq!(pcb.nice(), NICE_DEFAULT);
        debug_assert_eq!(pcb.weight(), NICE_0_WEIGHT);

        Ok(slot)
    }

    /// Return a slot to `Unused`
    pub fn release(&mut self, slot: usize) {
        self.procs[slot] = Pcb::new();
    }

    /// Find the live process with this PID
    pub fn find(&self, pid: Pid) -> Option<&Pcb> {
        self.slot_of(pid).map(|slot| &self.procs[slot])
    }

    /// Find the live process with this PID (mutable)
    pub fn find_mut(&mut self, pid: Pid) -> Option<&mut Pcb> {
        self.slot_of(pid).map(move |slot| &mut self.procs[slot])
    }

    /// Slot index of the live process with this PID
    pub fn slot_of(&self, pid: Pid) -> Option<usize> {
        if pid == PID_INVALID {
            return None;
        }
        self.procs
            .iter()
            .position(|p| p.state != ProcessState::Unused && p.pid == pid)
    }

    /// Get a slot by index
    pub fn get(&self, slot: usize) -> Option<&Pcb> {
        self.procs.get(slot)
    }

    /// Get a slot by index (mutable)
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Pcb> {
        self.procs.get_mut(slot)
    }

    /// Iterate over every slot, in scan order
    pub fn iter(&self) -> impl Iterator<Item = &Pcb> {
        self.procs.iter()
    }

    /// Iterate over every slot (mutable), in scan order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pcb> {
        self.procs.iter_mut()
    }

    /// Sum of the weights of every runnable process
    pub fn total_weight(&self) -> u64 {
        self.procs
            .iter()
            .filter(|p| p.state == ProcessState::Runnable)
            .map(|p| p.weight())
            .sum()
    }

    /// Mark a process killed, making it runnable if it sleeps
    pub fn kill(&mut self, pid: Pid) -> KResult<()> {
        let pcb = self.find_mut(pid).ok_or(KernelError::NotFound)?;
        pcb.flags.insert(ProcFlags::KILLED);
        if pcb.state == ProcessState::Sleeping {
            pcb.state = ProcessState::Runnable;
            pcb.channel = None;
        }
        Ok(())
    }

    /// Number of live processes
    pub fn count(&self) -> usize {
        self.procs
            .iter()
            .filter(|p| p.state != ProcessState::Unused)
            .count()
    }
}

impl Index<usize> for ProcessTable {
    type Output = Pcb;

    fn index(&self, slot: usize) -> &Pcb {
        &self.procs[slot]
    }
}

impl IndexMut<usize> for ProcessTable {
    fn index_mut(&mut self, slot: usize) -> &mut Pcb {
        &mut self.procs[slot]
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
