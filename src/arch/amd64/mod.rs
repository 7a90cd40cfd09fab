// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! x86_64 interrupt control
//!
//! [`CpuControl`] on top of the RFLAGS.IF bit. Enabling or disabling
//! interrupts is privileged; reading the flag is not.

use x86_64::instructions::interrupts;

use crate::traits::CpuControl;

/// Interrupt control for an x86_64 CPU
///
/// The CPU index is supplied by the kernel (typically by mapping the local
/// APIC id), since discovering it needs the APIC driver.
#[derive(Debug, Clone, Copy)]
pub struct Amd64Cpu {
    cpu_id: fn() -> usize,
}

fn boot_cpu() -> usize {
    0
}

impl Amd64Cpu {
    /// Create interrupt control with a CPU-index lookup
    pub const fn new(cpu_id: fn() -> usize) -> Self {
        Self { cpu_id }
    }

    /// Interrupt control for a single-CPU system
    pub const fn uniprocessor() -> Self {
        Self::new(boot_cpu)
    }
}

impl CpuControl for Amd64Cpu {
    fn cpu_id(&self) -> usize {
        (self.cpu_id)()
    }

    #[inline]
    fn interrupts_enabled(&self) -> bool {
        interrupts::are_enabled()
    }

    #[inline]
    fn enable_interrupts(&self) {
        interrupts::enable();
    }

    #[inline]
    fn disable_interrupts(&self) {
        interrupts::disable();
    }
}
