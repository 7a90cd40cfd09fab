// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Nice levels and scheduling weights
//!
//! Each of the 40 nice levels maps to a fixed weight. One step of nice is
//! roughly a 1.25x change in weight, so a process one level nicer than
//! another receives about 10% less CPU when both compete.

use alloc::string::String;

use crate::config::{NICE_MAX, NICE_MIN};
use crate::error::{KResult, KernelError};
use crate::kernel::Kernel;
use crate::process::Pid;
use crate::traits::Platform;

/// Weight of each nice level, indexed by nice
pub const WEIGHTS: [u64; 40] = [
    /* 0 */ 88761, 71755, 56483, 46273, 36291,
    /* 5 */ 29154, 23254, 18705, 14949, 11916,
    /* 10 */ 9548, 7620, 6100, 4984, 3906,
    /* 15 */ 3121, 2501, 1991, 1586, 1277,
    /* 20 */ 1024, 820, 655, 526, 423,
    /* 25 */ 335, 272, 215, 172, 137,
    /* 30 */ 110, 87, 70, 56, 45,
    /* 35 */ 36, 29, 23, 18, 15,
];

/// Look up the weight of a nice level
pub fn weight_of(nice: u8) -> KResult<u64> {
    if !(NICE_MIN..=NICE_MAX).contains(&nice) {
        return Err(KernelError::OutOfRange);
    }
    Ok(WEIGHTS[nice as usize])
}

impl<P: Platform> Kernel<P> {
    /// Get the nice level of a process
    pub fn getnice(&self, pid: Pid) -> KResult<u8> {
        let table = self.table();
        table.find(pid).map(|p| p.nice()).ok_or(KernelError::NotFound)
    }

    /// Set the nice level of a process
    ///
    /// The weight is recomputed in the same critical section, so no other
    /// CPU can observe the new nice with the old weight.
    ///
    /// # Returns
    /// * `Err(KernelError::NotFound)` - No live process has this PID
    /// * `Err(KernelError::OutOfRange)` - `value` is outside `0..=39`
    pub fn setnice(&self, pid: Pid, value: i32) -> KResult<()> {
        let mut table = self.table();
        let pcb = table.find_mut(pid).ok_or(KernelError::NotFound)?;

        let nice = u8::try_from(value).map_err(|_| KernelError::OutOfRange)?;
        pcb.set_nice(nice).map_err(|err| {
            log::warn!("setnice: pid {} rejected nice {}", pid, value);
            err
        })?;

        log::debug!("setnice: pid {} nice={} weight={}", pid, nice, pcb.weight());
        Ok(())
    }

    /// Get the name of a process
    pub fn getpname(&self, pid: Pid) -> KResult<String> {
        let table = self.table();
        table
            .find(pid)
            .map(|p| String::from(p.name()))
            .ok_or(KernelError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessState;
    use crate::testing::Sim;

    #[test]
    fn test_weight_table_shape() {
        assert_eq!(WEIGHTS.len(), 40);
        assert_eq!(WEIGHTS[0], 88761);
        assert_eq!(WEIGHTS[20], 1024);
        assert_eq!(WEIGHTS[39], 15);
        assert!(WEIGHTS.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_weight_of_bounds() {
        assert_eq!(weight_of(0), Ok(88761));
        assert_eq!(weight_of(39), Ok(15));
        assert_eq!(weight_of(40), Err(KernelError::OutOfRange));
    }

    #[test]
    fn test_nice_queries_on_absent_pid() {
        let sim = Sim::new();
        let kernel = sim.kernel();
        assert_eq!(kernel.getnice(42), Err(KernelError::NotFound));
        assert_eq!(kernel.setnice(42, 10), Err(KernelError::NotFound));
        assert_eq!(kernel.getpname(42), Err(KernelError::NotFound));
    }

    #[test]
    fn test_setnice_accepts_range_edges() {
        let sim = Sim::new();
        let kernel = sim.kernel();
        let pid = sim.spawn("worker", 20, ProcessState::Runnable);

        kernel.setnice(pid, 0).unwrap();
        assert_eq!(kernel.getnice(pid), Ok(0));
        assert_eq!(kernel.table().find(pid).unwrap().weight(), 88761);

        kernel.setnice(pid, 39).unwrap();
        assert_eq!(kernel.getnice(pid), Ok(39));
        assert_eq!(kernel.table().find(pid).unwrap().weight(), 15);
    }

    #[test]
    fn test_setnice_rejects_out_of_range_without_mutation() {
        let sim = Sim::new();
        let kernel = sim.kernel();
        let pid = sim.spawn("worker", 7, ProcessState::Runnable);

        assert_eq!(kernel.setnice(pid, -1), Err(KernelError::OutOfRange));
        assert_eq!(kernel.setnice(pid, 40), Err(KernelError::OutOfRange));
        assert_eq!(kernel.setnice(pid, 1000), Err(KernelError::OutOfRange));

        let table = kernel.table();
        let pcb = table.find(pid).unwrap();
        assert_eq!(pcb.nice(), 7);
        assert_eq!(pcb.weight(), WEIGHTS[7]);
    }

    #[test]
    fn test_setnice_checks_pid_before_range() {
        let sim = Sim::new();
        assert_eq!(sim.kernel().setnice(99, 40), Err(KernelError::NotFound));
    }

    #[test]
    fn test_getpname() {
        let sim = Sim::new();
        let pid = sim.spawn("editor", 20, ProcessState::Sleeping);
        assert_eq!(sim.kernel().getpname(pid).as_deref(), Ok("editor"));
    }
}
