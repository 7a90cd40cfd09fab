// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Interrupt-safe Spinlock
//!
//! A [`spin::Mutex`] that also disables interrupts on the current CPU for
//! as long as it is held. Interrupts are disabled *before* spinning, so an
//! interrupt handler on the same CPU can never spin on a lock its own CPU
//! already holds.
//!
//! Disabling nests: the CPU only re-enables interrupts when the last lock
//! it holds is released, and only if they were enabled when the first one
//! was taken. The nesting bookkeeping lives with the per-CPU state, behind
//! [`InterruptNesting`].
//!
//! A held guard may be left on a suspended stack while another stack runs
//! with the lock logically transferred to it (see
//! [`ContextSwitch`](crate::ContextSwitch)). The raw lock has no owner
//! check, so whichever side drops a guard releases the lock.

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicUsize, Ordering};

/// Owner value meaning "not held by any CPU"
const NO_OWNER: usize = usize::MAX;

/// Per-CPU interrupt nesting, the `push_off`/`pop_off` pair
pub trait InterruptNesting {
    /// Disable interrupts and record one more level of nesting
    ///
    /// # Returns
    /// The id of the current CPU
    fn push_off(&self) -> usize;

    /// Drop one level of nesting, re-enabling interrupts when the outermost
    /// level is dropped and they were enabled before it
    fn pop_off(&self);
}

/// A spinlock that disables interrupts while held
pub struct SpinMutex<T> {
    inner: spin::Mutex<T>,
    /// CPU currently holding the lock
    owner: AtomicUsize,
}

impl<T> SpinMutex<T> {
    /// Create a new spinlock
    pub const fn new(data: T) -> Self {
        Self {
            inner: spin::Mutex::new(data),
            owner: AtomicUsize::new(NO_OWNER),
        }
    }

    /// Acquire the lock, spinning until it becomes available
    ///
    /// Interrupts on the current CPU stay disabled until the guard (or the
    /// guard that inherits this acquisition) is dropped.
    pub fn lock<'a>(&'a self, irq: &'a dyn InterruptNesting) -> SpinMutexGuard<'a, T> {
        let cpu = irq.push_off();
        assert!(!self.holding(cpu), "acquire: lock already held by this cpu");
        let guard = self.inner.lock();
        self.owner.store(cpu, Ordering::Relaxed);
        SpinMutexGuard {
            mutex: self,
            irq,
            guard: ManuallyDrop::new(guard),
        }
    }

    /// Try to acquire the lock without spinning
    pub fn try_lock<'a>(&'a self, irq: &'a dyn InterruptNesting) -> Option<SpinMutexGuard<'a, T>> {
        let cpu = irq.push_off();
        match self.inner.try_lock() {
            Some(guard) => {
                self.owner.store(cpu, Ordering::Relaxed);
                Some(SpinMutexGuard {
                    mutex: self,
                    irq,
                    guard: ManuallyDrop::new(guard),
                })
            }
            None => {
                irq.pop_off();
                None
            }
        }
    }

    /// Check whether `cpu` holds this lock
    ///
    /// Only meaningful with interrupts disabled on `cpu`.
    pub fn holding(&self, cpu: usize) -> bool {
        self.inner.is_locked() && self.owner.load(Ordering::Relaxed) == cpu
    }

    /// Check if the lock is currently held by any CPU
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Release a lock whose guard lives on another stack
    ///
    /// A freshly created process is entered with the table lock held by
    /// the scheduler that dispatched it, but it never returns into the
    /// scheduler's frame to drop that guard.
    ///
    /// # Safety
    ///
    /// The lock must be held on behalf of the caller, and the guard that
    /// acquired it must never be dropped.
    pub unsafe fn force_unlock(&self, irq: &dyn InterruptNesting) {
        self.owner.store(NO_OWNER, Ordering::Relaxed);
        self.inner.force_unlock();
        irq.pop_off();
    }
}

/// RAII guard for a SpinMutex
pub struct SpinMutexGuard<'a, T> {
    mutex: &'a SpinMutex<T>,
    irq: &'a dyn InterruptNesting,
    guard: ManuallyDrop<spin::MutexGuard<'a, T>>,
}

impl<'a, T> SpinMutexGuard<'a, T> {
    /// Release the lock, keeping what is needed to take it again
    ///
    /// # Returns
    /// The mutex and the interrupt nesting it was locked with
    pub fn unlock(guard: Self) -> (&'a SpinMutex<T>, &'a dyn InterruptNesting) {
        let parts = (guard.mutex, guard.irq);
        drop(guard);
        parts
    }

    /// Check whether this guard holds `other`
    ///
    /// Compares lock addresses, so locks over different types can be
    /// compared.
    pub fn guards<U>(&self, other: &SpinMutex<U>) -> bool {
        core::ptr::eq(
            self.mutex as *const SpinMutex<T> as *const (),
            other as *const SpinMutex<U> as *const (),
        )
    }
}

impl<'a, T> Drop for SpinMutexGuard<'a, T> {
    fn drop(&mut self) {
        self.mutex.owner.store(NO_OWNER, Ordering::Relaxed);
        // SAFETY: the guard is dropped exactly once, here.
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        self.irq.pop_off();
    }
}

impl<'a, T> Deref for SpinMutexGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<'a, T> DerefMut for SpinMutexGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

// ============================================================================
// Tests
// ============================================================================
