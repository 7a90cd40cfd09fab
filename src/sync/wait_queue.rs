// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Sleep and wakeup
//!
//! A process blocks by recording a [`Channel`] in its PCB and giving up
//! the CPU; a wakeup on the same channel makes every such sleeper runnable.
//! There are no per-channel queues: wakeup scans the whole table.
//!
//! Woken processes are placed just ahead of the ready queue. Their
//! vruntime becomes one less than the smallest vruntime among processes
//! that were already runnable (or zero when none were), so a process that
//! slept for a long time neither starves the others nor waits behind them.

use crate::config::NPROC;
use crate::kernel::Kernel;
use crate::process::{Pid, ProcessState, ProcessTable};
use crate::sync::SpinMutexGuard;
use crate::traits::Platform;

/// What a sleeping process is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// A child of this process changing state
    Proc(Pid),
    /// The global tick counter advancing
    Ticks,
    /// Any other kernel object, usually its address
    Token(usize),
}

impl Channel {
    /// Channel identified by the address of a kernel object
    pub fn of<T>(object: &T) -> Self {
        Channel::Token(object as *const T as usize)
    }
}

impl ProcessTable {
    /// Wake every process sleeping on `chan`
    ///
    /// All processes woken by one call get the same vruntime.
    ///
    /// # Returns
    /// The number of processes woken
    pub fn wakeup(&mut self, chan: Channel) -> usize {
        let mut woken = [0usize; NPROC];
        let mut count = 0;
        let mut min_vruntime: Option<u64> = None;

        // Sleepers flipped to Runnable here are not counted as already
        // runnable: every slot is visited exactly once.
        for (slot, p) in self.iter_mut().enumerate() {
            match p.state {
                ProcessState::Runnable => {
                    min_vruntime = Some(min_vruntime.map_or(p.vruntime, |m| m.min(p.vruntime)));
                }
                ProcessState::Sleeping if p.channel == Some(chan) => {
                    p.state = ProcessState::Runnable;
                    p.channel = None;
                    woken[count] = slot;
                    count += 1;
                }
                _ => {}
            }
        }

        if count == 0 {
            return 0;
        }

        let vruntime = min_vruntime.map_or(0, |m| m.saturating_sub(1));
        for &slot in &woken[..count] {
            if let Some(p) = self.get_mut(slot) {
                p.vruntime = vruntime;
            }
        }

        log::trace!("wakeup: {:?} woke {} (vruntime={})", chan, count, vruntime);
        count
    }
}

impl<P: Platform> Kernel<P> {
    /// Atomically release `guard` and sleep on `chan`
    ///
    /// The table lock is taken before `guard` is released, so a wakeup
    /// issued by another CPU under `guard` cannot be missed. The caller's
    /// lock is held again when this returns.
    ///
    /// # Panics
    /// If `guard` is the process-table lock; use
    /// [`sleep_locked`](Self::sleep_locked) for that.
    pub fn sleep<'g, T>(&self, chan: Channel, guard: SpinMutexGuard<'g, T>) -> SpinMutexGuard<'g, T> {
        assert!(
            !guard.guards(&self.table),
            "sleep: process table guard passed to sleep"
        );

        let mut table = self.table();
        let (lock, irq) = SpinMutexGuard::unlock(guard);

        self.sleep_locked(chan, &mut table);

        drop(table);
        lock.lock(irq)
    }

    /// Sleep on `chan` while already holding the process-table lock
    ///
    /// The lock is held again when this returns.
    pub fn sleep_locked(&self, chan: Channel, table: &mut SpinMutexGuard<'_, ProcessTable>) {
        let Some(pid) = self.current_pid() else {
            panic!("sleep: no current process");
        };
        let Some(slot) = table.slot_of(pid) else {
            panic!("sleep: current process {} not in table", pid);
        };

        if let Some(p) = table.get_mut(slot) {
            p.channel = Some(chan);
            p.state = ProcessState::Sleeping;
        }

        self.sched(table);

        if let Some(p) = table.get_mut(slot) {
            p.channel = None;
        }
    }

    /// Wake every process sleeping on `chan`
    ///
    /// # Returns
    /// The number of processes woken
    pub fn wakeup(&self, chan: Channel) -> usize {
        self.table().wakeup(chan)
    }
}
