// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Process lifecycle
//!
//! Creation (`userinit`, `fork`), termination (`exit`, `kill`) and reaping
//! (`wait`). Memory and descriptors belong to the platform; this module
//! only tells it when to create, copy and free them.
//!
//! A process's kernel stack and image stay allocated after it exits. They
//! are freed when its parent reaps it, so a zombie still owns them.

use crate::config::{NICE_0_WEIGHT, ROOT_PROC_NAME};
use crate::error::{KResult, KernelError};
use crate::kernel::Kernel;
use crate::process::{Pid, ProcessState};
use crate::sync::Channel;
use crate::traits::Platform;

impl<P: Platform> Kernel<P> {
    /// Claim a slot and give it a kernel stack
    ///
    /// On failure nothing stays allocated.
    fn alloc_process(&self) -> KResult<(usize, Pid)> {
        let (slot, pid) = {
            let mut table = self.table();
            let slot = table.allocate()?;
            (slot, table[slot].pid)
        };

        if let Err(err) = self.platform.alloc_kernel_stack(pid) {
            log::warn!("alloc_process: no kernel stack for pid {}", pid);
            self.table().release(slot);
            return Err(err);
        }

        Ok((slot, pid))
    }

    fn current_or_panic(&self, op: &str) -> Pid {
        match self.current_pid() {
            Some(pid) => pid,
            None => panic!("{}: no current process", op),
        }
    }

    /// Set up the first process
    ///
    /// The root process has no parent. It starts at nice 20 with a vruntime
    /// of one tick at its weight, and adopts every orphan from then on.
    ///
    /// # Panics
    /// If a root process already exists, or its first image cannot be set
    /// up.
    pub fn userinit(&self) -> Pid {
        assert!(self.root_pid().is_none(), "userinit: root process already exists");

        let Ok((slot, pid)) = self.alloc_process() else {
            panic!("userinit: out of memory?");
        };
        let Ok(size) = self.platform.setup_first_image(pid) else {
            panic!("userinit: out of memory?");
        };
        self.platform.root_cwd(pid);

        let mut table = self.table();
        let p = &mut table[slot];
        p.set_name(ROOT_PROC_NAME);
        p.size = size;
        p.vruntime = NICE_0_WEIGHT / p.weight();
        p.state = ProcessState::Runnable;
        self.root.store(pid, core::sync::atomic::Ordering::Release);

        log::debug!("userinit: pid {} vruntime={}", pid, p.vruntime);
        pid
    }

    /// Create a copy of the current process
    ///
    /// The child shares the parent's name, nice level and vruntime, so
    /// forking neither boosts nor penalizes it. Its runtime starts at zero.
    ///
    /// # Returns
    /// * `Ok(pid)` - PID of the child
    /// * `Err(KernelError::ResourceExhausted)` - No free slot, or the
    ///   platform could not allocate memory; nothing is left allocated
    pub fn fork(&self) -> KResult<Pid> {
        let parent = self.current_or_panic("fork");
        let (slot, pid) = self.alloc_process()?;

        let size = self.table().find(parent).map_or(0, |p| p.size);
        if let Err(err) = self.platform.copy_image(parent, pid, size) {
            log::warn!("fork: cannot copy image of pid {} into pid {}", parent, pid);
            self.platform.free_kernel_stack(pid);
            self.table().release(slot);
            return Err(err);
        }
        self.platform.dup_files(parent, pid);
        self.platform.dup_cwd(parent, pid);

        let mut table = self.table();
        let Some(source) = table.find(parent).cloned() else {
            panic!("fork: parent {} vanished", parent);
        };
        let child = &mut table[slot];
        child.inherit_from(&source);
        child.runtime = 0;
        child.last_runtime = 0;
        child.parent = Some(parent);
        child.state = ProcessState::Runnable;

        log::debug!(
            "fork: pid {} -> pid {} nice={} vruntime={}",
            parent,
            pid,
            child.nice(),
            child.vruntime
        );
        Ok(pid)
    }

    /// Exit the current process
    ///
    /// The process stays a zombie until its parent reaps it with
    /// [`wait`](Self::wait). Its children are handed to the root process.
    ///
    /// # Panics
    /// If the current process is the root process.
    pub fn exit(&self) -> ! {
        let pid = self.current_or_panic("exit");
        let root = self.root_pid();
        if root == Some(pid) {
            panic!("init exiting");
        }

        self.platform.close_files(pid);
        self.platform.release_cwd(pid);

        let mut table = self.table();

        // Parent might be sleeping in wait()
        if let Some(parent) = table.find(pid).and_then(|p| p.parent) {
            table.wakeup(Channel::Proc(parent));
        }

        let mut orphaned_zombie = false;
        for p in table.iter_mut() {
            if p.state != ProcessState::Unused && p.parent == Some(pid) {
                p.parent = root;
                orphaned_zombie |= p.state == ProcessState::Zombie;
            }
        }
        if let (true, Some(root)) = (orphaned_zombie, root) {
            table.wakeup(Channel::Proc(root));
        }

        match table.find_mut(pid) {
            Some(p) => p.state = ProcessState::Zombie,
            None => panic!("exit: current process {} not in table", pid),
        }
        log::debug!("exit: pid {}", pid);

        self.sched(&table);
        panic!("zombie exit");
    }

    /// Wait for a child to exit and reap it
    ///
    /// # Returns
    /// * `Ok(pid)` - PID of the reaped child
    /// * `Err(KernelError::NoChildren)` - The caller has no children
    /// * `Err(KernelError::Killed)` - The caller was killed while waiting
    pub fn wait(&self) -> KResult<Pid> {
        let pid = self.current_or_panic("wait");
        let mut table = self.table();

        loop {
            let mut have_kids = false;
            let mut zombie = None;
            for (slot, p) in table.iter().enumerate() {
                if p.state == ProcessState::Unused || p.parent != Some(pid) {
                    continue;
                }
                have_kids = true;
                if p.state == ProcessState::Zombie {
                    zombie = Some((slot, p.pid, p.size));
                    break;
                }
            }

            if let Some((slot, child, size)) = zombie {
                self.platform.free_kernel_stack(child);
                self.platform.free_image(child, size);
                table.release(slot);
                log::debug!("wait: pid {} reaped pid {}", pid, child);
                return Ok(child);
            }

            if !have_kids {
                return Err(KernelError::NoChildren);
            }
            if table.find(pid).map_or(false, |p| p.killed()) {
                log::warn!("wait: pid {} killed while waiting", pid);
                return Err(KernelError::Killed);
            }

            // Woken by a child's exit
            self.sleep_locked(Channel::Proc(pid), &mut table);
        }
    }

    /// Kill a process
    ///
    /// The victim exits the next time it checks its killed flag; a
    /// sleeping victim is made runnable so that it does.
    pub fn kill(&self, pid: Pid) -> KResult<()> {
        self.table().kill(pid)?;
        log::debug!("kill: pid {}", pid);
        Ok(())
    }

    /// Grow or shrink the image of the current process by `delta` bytes
    pub fn grow(&self, delta: isize) -> KResult<()> {
        let pid = self.current_or_panic("grow");
        let size = self
            .table()
            .find(pid)
            .map(|p| p.size)
            .ok_or(KernelError::NotFound)?;

        if delta == 0 {
            return Ok(());
        }
        let new_size = self.platform.resize_image(pid, size, delta)?;

        if let Some(p) = self.table().find_mut(pid) {
            p.size = new_size;
        }
        Ok(())
    }
}
