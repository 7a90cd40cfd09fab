// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Process listings
//!
//! `ps` is the user-facing listing with scheduling statistics. `procdump`
//! is the console dump for a wedged machine: it never waits for the
//! table lock.
//!
//! Time columns are scaled by 1000 so that fractional ratios survive
//! integer division.

use core::fmt;

use crate::kernel::Kernel;
use crate::process::{Pcb, Pid, ProcessState, PID_INVALID};
use crate::traits::Platform;

/// Write the `ps` header
fn write_header(sink: &mut dyn fmt::Write, ticks: u64) -> fmt::Result {
    writeln!(
        sink,
        "name\tpid\tstate   \tpriority\truntime/weight\truntime\tvruntime\ttick {}",
        ticks * 1000
    )
}

/// Write one `ps` row
fn write_row(sink: &mut dyn fmt::Write, p: &Pcb) -> fmt::Result {
    let runtime = p.runtime * 1000;
    writeln!(
        sink,
        "{}\t{}\t{:<8}\t{}\t{}\t{}\t{}",
        p.name(),
        p.pid,
        p.state.label(),
        p.nice(),
        runtime / p.weight(),
        runtime,
        p.vruntime * 1000
    )
}

impl<P: Platform> Kernel<P> {
    /// List processes with their scheduling statistics
    ///
    /// `pid == 0` lists every live process. Any other `pid` lists just
    /// that process, or writes nothing at all if it does not exist.
    pub fn ps(&self, pid: Pid, sink: &mut dyn fmt::Write) -> fmt::Result {
        // Tick lock before table lock, as in the timer path
        let ticks = self.ticks();
        let table = self.table();

        if pid == PID_INVALID {
            write_header(sink, ticks)?;
            for p in table.iter().filter(|p| p.state != ProcessState::Unused) {
                write_row(sink, p)?;
            }
            return Ok(());
        }

        if let Some(p) = table.find(pid) {
            write_header(sink, ticks)?;
            write_row(sink, p)?;
        }
        Ok(())
    }

    /// Dump the process table to the console
    ///
    /// Skips the dump rather than spin if another CPU holds the table.
    pub fn procdump(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        let Some(table) = self.table_lock().try_lock(self) else {
            return writeln!(sink, "procdump: process table busy");
        };

        for p in table.iter() {
            let state = match p.state {
                ProcessState::Unused => continue,
                ProcessState::Embryo => "embryo",
                ProcessState::Sleeping => "sleep ",
                ProcessState::Runnable => "runble",
                ProcessState::Running => "run   ",
                ProcessState::Zombie => "zombie",
            };
            writeln!(sink, "{} {} {}", p.pid, state, p.name())?;
        }
        Ok(())
    }
}
