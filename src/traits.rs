// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Collaborator traits
//!
//! The process core does not own memory, files or register state. It
//! reaches those through the traits in this module, which the embedding
//! kernel implements once per architecture:
//!
//! - [`CpuControl`]: current CPU id and the interrupt-enable flag
//! - [`ContextSwitch`]: the opaque "suspend here, resume there" primitive
//! - [`MemoryManager`]: kernel stacks and user address spaces
//! - [`FileManager`]: open descriptors and the working directory
//!
//! Resources are keyed by PID; the collaborator owns them until the
//! process core asks for them to be released during `wait`.

use crate::error::KResult;
use crate::process::Pid;

/// Trait for per-CPU interrupt control
///
/// Implementations must report the CPU the caller is running on. The
/// answer is only stable while interrupts are disabled.
pub trait CpuControl {
    /// Index of the current CPU, `0..NCPU`
    fn cpu_id(&self) -> usize;

    /// Whether interrupts are enabled on the current CPU
    fn interrupts_enabled(&self) -> bool;

    /// Enable interrupts on the current CPU
    fn enable_interrupts(&self);

    /// Disable interrupts on the current CPU
    fn disable_interrupts(&self);
}

/// Trait for the low-level context transfer
///
/// Both calls are made with the process-table lock held and interrupts
/// disabled. The lock stays held across the transfer: whichever side
/// resumes is responsible for releasing it.
pub trait ContextSwitch {
    /// Suspend the scheduler of `cpu` and resume process `pid`
    ///
    /// The first time a process is resumed it must start in
    /// [`Kernel::fork_return`](crate::Kernel::fork_return). Returns when
    /// `pid` hands the CPU back through
    /// [`switch_to_scheduler`](Self::switch_to_scheduler).
    fn switch_to_process(&self, cpu: usize, pid: Pid);

    /// Suspend process `pid` and resume the scheduler of `cpu`
    ///
    /// Returns when a scheduler dispatches `pid` again, possibly on a
    /// different CPU.
    fn switch_to_scheduler(&self, cpu: usize, pid: Pid);
}

/// Trait for kernel stacks and user address spaces
pub trait MemoryManager {
    /// Allocate the kernel stack of a new process and arrange for its first
    /// dispatch to enter `fork_return`
    fn alloc_kernel_stack(&self, pid: Pid) -> KResult<()>;

    /// Free the kernel stack of a reaped or abandoned process
    fn free_kernel_stack(&self, pid: Pid);

    /// Build the address space of the first process
    ///
    /// # Returns
    /// * `Ok(size)` - Size of the loaded image in bytes
    fn setup_first_image(&self, pid: Pid) -> KResult<usize>;

    /// Duplicate the address space of `parent` for `child`
    fn copy_image(&self, parent: Pid, child: Pid, size: usize) -> KResult<()>;

    /// Grow (positive `delta`) or shrink (negative `delta`) an image
    ///
    /// # Returns
    /// * `Ok(size)` - The new image size in bytes
    fn resize_image(&self, pid: Pid, size: usize, delta: isize) -> KResult<usize>;

    /// Free the address space of a reaped process
    fn free_image(&self, pid: Pid, size: usize);
}

/// Trait for descriptor tables and the working directory
pub trait FileManager {
    /// Duplicate every open descriptor of `parent` into `child`
    fn dup_files(&self, parent: Pid, child: Pid);

    /// Close every open descriptor of `pid`
    fn close_files(&self, pid: Pid);

    /// Set the working directory of the first process to `/`
    fn root_cwd(&self, pid: Pid);

    /// Give `child` a reference to the working directory of `parent`
    fn dup_cwd(&self, parent: Pid, child: Pid);

    /// Drop the working-directory reference of `pid`
    fn release_cwd(&self, pid: Pid);
}

/// Everything the process core needs from the rest of the kernel
pub trait Platform: CpuControl + ContextSwitch + MemoryManager + FileManager + Send + Sync {}

impl<T> Platform for T where T: CpuControl + ContextSwitch + MemoryManager + FileManager + Send + Sync {}
