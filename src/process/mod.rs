// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Process Management
//!
//! Process control blocks, the process table that owns them, and the
//! lifecycle and nice-control operations of [`Kernel`](crate::Kernel).
//!
//! # Process States
//!
//! ```text
//! Unused -> Embryo -> Runnable <-> Running -> Zombie -> Unused
//!                        ^            |
//!                        +- Sleeping <+
//! ```
//!
//! Every transition happens with the process-table lock held.

pub mod lifecycle;
pub mod nice;
pub mod table;

pub use nice::{weight_of, WEIGHTS};
pub use table::ProcessTable;

use bitflags::bitflags;

use crate::config::{NICE_0_WEIGHT, NICE_DEFAULT, PROC_NAME_LEN};
use crate::error::KResult;
use crate::sync::Channel;

/// ============================================================================
/// Process ID
/// ============================================================================

/// Process ID type
pub type Pid = u64;

/// Invalid process ID, held by unused slots
pub const PID_INVALID: Pid = 0;

/// ============================================================================
/// Process State
/// ============================================================================

/// Process state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Slot is free
    Unused = 0,
    /// Slot is allocated, setup not complete
    Embryo = 1,
    /// Blocked on a channel
    Sleeping = 2,
    /// Ready to be dispatched
    Runnable = 3,
    /// Currently on a CPU
    Running = 4,
    /// Exited, waiting to be reaped by its parent
    Zombie = 5,
}

impl ProcessState {
    /// Fixed-width label used by `ps`
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unused => "UNUSED",
            Self::Embryo => "EMBRYO",
            Self::Sleeping => "SLEEPING",
            Self::Runnable => "RUNNABLE",
            Self::Running => "RUNNING",
            Self::Zombie => "ZOMBIE",
        }
    }
}

bitflags! {
    /// Per-process flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ProcFlags: u32 {
        /// Terminate at the next safe point
        const KILLED = 1 << 0;
    }
}

/// ============================================================================
/// Process Control Block
/// ============================================================================

/// Process control block
///
/// One slot of the process table. `nice` and `weight` are private so that
/// `weight == WEIGHTS[nice]` holds at every observation.
#[derive(Debug, Clone)]
pub struct Pcb {
    /// Process ID ([`PID_INVALID`] while unused)
    pub pid: Pid,

    /// Process state
    pub state: ProcessState,

    /// Parent process (back-reference only)
    pub parent: Option<Pid>,

    /// Channel the process sleeps on; meaningful only while Sleeping
    pub channel: Option<Channel>,

    /// Flags
    pub flags: ProcFlags,

    /// Virtual runtime: fair-share time consumed, normalized by weight
    pub vruntime: u64,

    /// Total ticks spent running
    pub runtime: u64,

    /// Ticks spent running since the last dispatch
    pub last_runtime: u64,

    /// Ticks granted for the current dispatch
    pub timeslice: u64,

    /// Size of the user image in bytes
    pub size: usize,

    nice: u8,
    weight: u64,
    name: [u8; PROC_NAME_LEN],
    name_len: usize,
}

impl Pcb {
    /// Create an unused slot
    pub const fn new() -> Self {
        Self {
            pid: PID_INVALID,
            state: ProcessState::Unused,
            parent: None,
            channel: None,
            flags: ProcFlags::empty(),
            vruntime: 0,
            runtime: 0,
            last_runtime: 0,
            timeslice: 0,
            size: 0,
            nice: NICE_DEFAULT,
            weight: NICE_0_WEIGHT,
            name: [0; PROC_NAME_LEN],
            name_len: 0,
        }
    }

    /// Nice level, `0..=39`
    pub fn nice(&self) -> u8 {
        self.nice
    }

    /// Scheduling weight derived from the nice level
    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Change the nice level and recompute the weight
    ///
    /// # Returns
    /// * `Err(KernelError::OutOfRange)` - `nice` is above 39; nothing changes
    pub fn set_nice(&mut self, nice: u8) -> KResult<()> {
        self.weight = weight_of(nice)?;
        self.nice = nice;
        Ok(())
    }

    /// Process name
    pub fn name(&self) -> &str {
        core::str::from_utf8(&self.name[..self.name_len]).unwrap_or("???")
    }

    /// Set the process name, truncated to `PROC_NAME_LEN - 1` bytes
    pub fn set_name(&mut self, name: &str) {
        let mut len = name.len().min(PROC_NAME_LEN - 1);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        self.name = [0; PROC_NAME_LEN];
        self.name[..len].copy_from_slice(&name.as_bytes()[..len]);
        self.name_len = len;
    }

    /// Take over what a forked child inherits from its parent
    ///
    /// Name, nice level (with its weight), vruntime and image size.
    pub(crate) fn inherit_from(&mut self, parent: &Pcb) {
        self.name = parent.name;
        self.name_len = parent.name_len;
        self.nice = parent.nice;
        self.weight = parent.weight;
        self.vruntime = parent.vruntime;
        self.size = parent.size;
    }

    /// Whether the process has been killed
    pub fn killed(&self) -> bool {
        self.flags.contains(ProcFlags::KILLED)
    }

    /// Key the scheduler minimizes: recent runtime normalized by weight
    ///
    /// The same charge costs a heavy process less than a light one, so at
    /// equal recent runtime the lower nice level is dispatched first.
    pub fn selection_key(&self) -> u64 {
        self.last_runtime * NICE_0_WEIGHT / self.weight
    }
}

impl Default for Pcb {
    fn default() -> Self {
        Self::new()
    }
}
