// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Weighted-fair scheduler
//!
//! Each CPU runs its own dispatch loop over the shared process table. A
//! round picks the runnable process with the smallest recent runtime
//! normalized by its weight, and grants it a share of [`BASE_QUANTUM`]
//! proportional to its weight among all runnable processes.
//!
//! Selection is a linear scan. The table is small, and the scan needs no
//! ordered structure to keep consistent across sleep, wakeup and nice
//! changes.

use crate::config::{BASE_QUANTUM, NICE_0_WEIGHT};
use crate::error::{KResult, KernelError};
use crate::kernel::Kernel;
use crate::process::{Pid, ProcessState, ProcessTable};
use crate::sync::{Channel, SpinMutexGuard};
use crate::traits::Platform;

/// Result of one scheduling decision
///
/// Captures the chosen process, so every field read after the scan comes
/// from the candidate itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Table slot of the chosen process
    pub slot: usize,
    /// PID of the chosen process
    pub pid: Pid,
    /// Weight of the chosen process
    pub weight: u64,
    /// Ticks granted for this dispatch
    pub timeslice: u64,
    /// Total weight of the runnable set the choice was made from
    pub total_weight: u64,
}

impl ProcessTable {
    /// Choose the next process and mark it running
    ///
    /// Candidates are compared by `last_runtime * 1024 / weight`, each
    /// normalized by its own weight rather than the runnable total, so a
    /// heavier process wins at equal `last_runtime`. Ties go to the first
    /// candidate in scan order.
    ///
    /// # Returns
    /// `None` when no process is runnable; the table is left untouched.
    pub fn pick_next(&mut self) -> Option<Dispatch> {
        let total_weight = self.total_weight();

        let mut best: Option<(usize, u64)> = None;
        for (slot, p) in self.iter().enumerate() {
            if p.state != ProcessState::Runnable {
                continue;
            }
            let key = p.selection_key();
            if best.map_or(true, |(_, best_key)| key < best_key) {
                best = Some((slot, key));
            }
        }

        let (slot, _) = best?;
        let p = self.get_mut(slot)?;
        let weight = p.weight();
        let timeslice = BASE_QUANTUM * weight / total_weight;

        p.last_runtime = 0;
        p.timeslice = timeslice;
        p.state = ProcessState::Running;

        Some(Dispatch {
            slot,
            pid: p.pid,
            weight,
            timeslice,
            total_weight,
        })
    }
}

impl<P: Platform> Kernel<P> {
    /// Per-CPU scheduler loop
    ///
    /// Each CPU calls this after setting itself up. It never returns: it
    /// repeatedly picks a process, switches to it, and regains control when
    /// that process gives up the CPU.
    pub fn scheduler(&self) -> ! {
        loop {
            self.schedule_round();
        }
    }

    /// Run one scheduling round on the current CPU
    ///
    /// # Returns
    /// `true` if a process was dispatched
    pub fn schedule_round(&self) -> bool {
        // Let devices interrupt a CPU with nothing to run
        self.platform.enable_interrupts();

        let mut table = self.table();
        let Some(dispatch) = table.pick_next() else {
            return false;
        };

        let cpu_id = self.platform.cpu_id();
        let cpu = &self.cpus[cpu_id];
        cpu.set_current(Some(dispatch.pid));

        log::trace!(
            "cpu {}: dispatch pid {} weight={} timeslice={} total_weight={}",
            cpu_id,
            dispatch.pid,
            dispatch.weight,
            dispatch.timeslice,
            dispatch.total_weight
        );

        // The process releases the lock, and takes it again before
        // switching back.
        self.platform.switch_to_process(cpu_id, dispatch.pid);

        // It changed its own state before coming back
        self.mycpu().set_current(None);
        drop(table);
        true
    }

    /// Give up the CPU and enter the scheduler
    ///
    /// The caller must hold only the process-table lock and must already
    /// have changed its own state away from `Running`. Returns when the
    /// process is dispatched again, with the lock still held.
    pub fn sched(&self, table: &SpinMutexGuard<'_, ProcessTable>) {
        assert!(table.guards(&self.table), "sched: not the process table lock");
        assert!(
            !self.platform.interrupts_enabled(),
            "sched interruptible"
        );

        let cpu_id = self.platform.cpu_id();
        let cpu = &self.cpus[cpu_id];
        assert!(self.table.holding(cpu_id), "sched: table lock not held");
        assert_eq!(cpu.depth(), 1, "sched locks");

        let Some(pid) = cpu.current() else {
            panic!("sched: no current process");
        };
        assert!(
            table.find(pid).map_or(true, |p| p.state != ProcessState::Running),
            "sched running"
        );

        // The interrupt-enable flag belongs to this kernel thread, not
        // to the CPU it happens to resume on.
        let intena = cpu.intena();
        self.platform.switch_to_scheduler(cpu_id, pid);
        self.mycpu().set_intena(intena);
    }

    /// Give up the CPU for one scheduling round
    pub fn yield_cpu(&self) {
        let mut table = self.table();
        if let Some(p) = self.current_pid().and_then(|pid| table.find_mut(pid)) {
            p.state = ProcessState::Runnable;
        }
        self.sched(&table);
    }

    /// First code a new process runs on its first dispatch
    ///
    /// The scheduler that dispatched it still holds the table lock in a
    /// frame this process will never return to.
    pub fn fork_return(&self) {
        // SAFETY: the lock was taken by the scheduler for this dispatch,
        // and that scheduler frame only drops its guard after a later
        // switch back, which reacquires on its behalf.
        unsafe { self.table.force_unlock(self) };
    }

    /// Timer tick on the current CPU
    ///
    /// Advances the tick counter, wakes tick sleepers, and charges the
    /// running process one tick.
    ///
    /// # Returns
    /// `true` when the running process has used up its timeslice and
    /// should yield.
    pub fn tick(&self) -> bool {
        let mut ticks = self.ticks.lock(self);
        *ticks += 1;
        self.wakeup(Channel::Ticks);
        drop(ticks);

        let Some(pid) = self.current_pid() else {
            return false;
        };

        let mut table = self.table();
        let Some(p) = table.find_mut(pid) else {
            return false;
        };
        if p.state != ProcessState::Running {
            return false;
        }

        p.runtime += 1;
        p.last_runtime += 1;
        p.vruntime += (NICE_0_WEIGHT / p.weight()).max(1);
        p.last_runtime >= p.timeslice
    }

    /// Sleep for `n` ticks
    ///
    /// # Returns
    /// * `Err(KernelError::Killed)` - The process was killed while sleeping
    pub fn sleep_ticks(&self, n: u64) -> KResult<()> {
        let mut ticks = self.ticks.lock(self);
        let start = *ticks;
        while *ticks - start < n {
            if self.current_killed() {
                return Err(KernelError::Killed);
            }
            ticks = self.sleep(Channel::Ticks, ticks);
        }
        Ok(())
    }

    /// Whether the current process has been killed
    pub fn current_killed(&self) -> bool {
        let table = self.table();
        self.current_pid()
            .and_then(|pid| table.find(pid))
            .map_or(false, |p| p.killed())
    }
}
