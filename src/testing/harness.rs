// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Simulated platform and scheduler driver
//!
//! [`SimPlatform`] implements every collaborator trait. Memory and file
//! operations are recorded as [`Event`]s; context switches hand a baton
//! between the test thread (the scheduler) and one OS thread per process.

use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread;
use std::time::Duration;

use crate::config::PAGE_SIZE;
use crate::error::{KResult, KernelError};
use crate::kernel::Kernel;
use crate::process::{Pid, ProcessState};
use crate::sync::Channel;
use crate::traits::{ContextSwitch, CpuControl, FileManager, MemoryManager};

/// Code a simulated process runs after its first dispatch
pub type Program = Box<dyn FnOnce(&Kernel<SimPlatform>) + Send>;

/// Box a closure as a [`Program`]
pub fn program<F>(f: F) -> Program
where
    F: FnOnce(&Kernel<SimPlatform>) + Send + 'static,
{
    Box::new(f)
}

/// A collaborator call made by the process core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    AllocKernelStack(Pid),
    FreeKernelStack(Pid),
    SetupFirstImage(Pid),
    CopyImage { parent: Pid, child: Pid, size: usize },
    ResizeImage { pid: Pid, size: usize, delta: isize },
    FreeImage { pid: Pid, size: usize },
    DupFiles { parent: Pid, child: Pid },
    CloseFiles(Pid),
    RootCwd(Pid),
    DupCwd { parent: Pid, child: Pid },
    ReleaseCwd(Pid),
}

/// Who may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Scheduler,
    Process(Pid),
}

/// Where the root process waits once its program is done
const PARK: Channel = Channel::Token(usize::MAX);

/// How long the scheduler waits for a process to give the CPU back
const SCHEDULER_TIMEOUT: Duration = Duration::from_secs(10);

/// Single-CPU platform backed by OS threads
pub struct SimPlatform {
    kernel: Weak<Kernel<SimPlatform>>,
    interrupts: AtomicBool,
    baton: Mutex<Holder>,
    turn: Condvar,
    failure: Mutex<Option<(Pid, String)>>,
    started: Mutex<HashSet<Pid>>,
    programs: Mutex<HashMap<Pid, Program>>,
    fork_programs: Mutex<VecDeque<Program>>,
    events: Mutex<Vec<Event>>,
    fail_copy: AtomicBool,
    fail_kstack: AtomicBool,
    switches: AtomicUsize,
}

impl SimPlatform {
    fn new(kernel: Weak<Kernel<SimPlatform>>) -> Self {
        Self {
            kernel,
            interrupts: AtomicBool::new(false),
            baton: Mutex::new(Holder::Scheduler),
            turn: Condvar::new(),
            failure: Mutex::new(None),
            started: Mutex::new(HashSet::new()),
            programs: Mutex::new(HashMap::new()),
            fork_programs: Mutex::new(VecDeque::new()),
            events: Mutex::new(Vec::new()),
            fail_copy: AtomicBool::new(false),
            fail_kstack: AtomicBool::new(false),
            switches: AtomicUsize::new(0),
        }
    }

    /// Make the next image copies fail
    pub fn set_fail_copy(&self, fail: bool) {
        self.fail_copy.store(fail, Ordering::SeqCst);
    }

    /// Make the next kernel stack allocations fail
    pub fn set_fail_kstack(&self, fail: bool) {
        self.fail_kstack.store(fail, Ordering::SeqCst);
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn pass(&self, holder: Holder) {
        *self.baton.lock().unwrap() = holder;
        self.turn.notify_all();
    }

    fn wait_process_turn(&self, pid: Pid) {
        let mut baton = self.baton.lock().unwrap();
        while *baton != Holder::Process(pid) {
            baton = self.turn.wait(baton).unwrap();
        }
    }

    fn wait_scheduler_turn(&self, pid: Pid) {
        let mut baton = self.baton.lock().unwrap();
        while *baton != Holder::Scheduler {
            if let Some((failed, msg)) = self.failure.lock().unwrap().clone() {
                drop(baton);
                panic!("process {} panicked: {}", failed, msg);
            }
            let (guard, wait) = self.turn.wait_timeout(baton, SCHEDULER_TIMEOUT).unwrap();
            baton = guard;
            if wait.timed_out() && *baton != Holder::Scheduler {
                drop(baton);
                panic!("process {} never gave the CPU back", pid);
            }
        }
    }

    fn start(&self, pid: Pid) {
        let kernel = self.kernel.upgrade().expect("kernel dropped while running");
        let program = self.programs.lock().unwrap().remove(&pid);
        thread::Builder::new()
            .name(format!("pid-{}", pid))
            .spawn(move || run_process(kernel, pid, program))
            .expect("spawn process thread");
    }
}

/// Body of a process thread
fn run_process(kernel: Arc<Kernel<SimPlatform>>, pid: Pid, program: Option<Program>) {
    let platform = kernel.platform();
    platform.wait_process_turn(pid);
    kernel.fork_return();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        if let Some(program) = program {
            program(&kernel);
        }
    }));

    if let Err(payload) = result {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("unknown panic"));

        // Come back the way `sched` would, holding the table lock, so the
        // scheduler can unwind cleanly.
        std::mem::forget(kernel.table());

        *platform.failure.lock().unwrap() = Some((pid, msg));
        let _baton = platform.baton.lock().unwrap();
        platform.turn.notify_all();
        return;
    }

    if kernel.root_pid() == Some(pid) {
        let mut table = kernel.table();
        loop {
            kernel.sleep_locked(PARK, &mut table);
        }
    }
    kernel.exit();
}

impl CpuControl for SimPlatform {
    fn cpu_id(&self) -> usize {
        0
    }

    fn interrupts_enabled(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst)
    }

    fn enable_interrupts(&self) {
        self.interrupts.store(true, Ordering::SeqCst);
    }

    fn disable_interrupts(&self) {
        self.interrupts.store(false, Ordering::SeqCst);
    }
}

impl ContextSwitch for SimPlatform {
    fn switch_to_process(&self, _cpu: usize, pid: Pid) {
        self.switches.fetch_add(1, Ordering::SeqCst);
        let first = self.started.lock().unwrap().insert(pid);
        self.pass(Holder::Process(pid));
        if first {
            self.start(pid);
        }
        self.wait_scheduler_turn(pid);
    }

    fn switch_to_scheduler(&self, _cpu: usize, pid: Pid) {
        self.pass(Holder::Scheduler);
        self.wait_process_turn(pid);
    }
}

impl MemoryManager for SimPlatform {
    fn alloc_kernel_stack(&self, pid: Pid) -> KResult<()> {
        if self.fail_kstack.load(Ordering::SeqCst) {
            return Err(KernelError::ResourceExhausted);
        }
        self.record(Event::AllocKernelStack(pid));
        Ok(())
    }

    fn free_kernel_stack(&self, pid: Pid) {
        self.record(Event::FreeKernelStack(pid));
    }

    fn setup_first_image(&self, pid: Pid) -> KResult<usize> {
        self.record(Event::SetupFirstImage(pid));
        Ok(PAGE_SIZE)
    }

    fn copy_image(&self, parent: Pid, child: Pid, size: usize) -> KResult<()> {
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(KernelError::ResourceExhausted);
        }
        self.record(Event::CopyImage { parent, child, size });
        if let Some(program) = self.fork_programs.lock().unwrap().pop_front() {
            self.programs.lock().unwrap().insert(child, program);
        }
        Ok(())
    }

    fn resize_image(&self, pid: Pid, size: usize, delta: isize) -> KResult<usize> {
        let new_size = size
            .checked_add_signed(delta)
            .ok_or(KernelError::ResourceExhausted)?;
        self.record(Event::ResizeImage { pid, size, delta });
        Ok(new_size)
    }

    fn free_image(&self, pid: Pid, size: usize) {
        self.record(Event::FreeImage { pid, size });
    }
}

impl FileManager for SimPlatform {
    fn dup_files(&self, parent: Pid, child: Pid) {
        self.record(Event::DupFiles { parent, child });
    }

    fn close_files(&self, pid: Pid) {
        self.record(Event::CloseFiles(pid));
    }

    fn root_cwd(&self, pid: Pid) {
        self.record(Event::RootCwd(pid));
    }

    fn dup_cwd(&self, parent: Pid, child: Pid) {
        self.record(Event::DupCwd { parent, child });
    }

    fn release_cwd(&self, pid: Pid) {
        self.record(Event::ReleaseCwd(pid));
    }
}

/// A kernel on a [`SimPlatform`], driven from the test thread
pub struct Sim {
    kernel: Arc<Kernel<SimPlatform>>,
}

impl Sim {
    /// Create a kernel with an empty process table
    pub fn new() -> Self {
        Self {
            kernel: Arc::new_cyclic(|weak| Kernel::new(SimPlatform::new(weak.clone()))),
        }
    }

    pub fn kernel(&self) -> &Kernel<SimPlatform> {
        &self.kernel
    }

    pub fn platform(&self) -> &SimPlatform {
        self.kernel.platform()
    }

    /// Create the root process, which will run `program`
    pub fn boot(&self, program: Program) -> Pid {
        let pid = self.kernel.userinit();
        self.platform().programs.lock().unwrap().insert(pid, program);
        pid
    }

    /// Queue `program` for the next child created by `fork`
    pub fn on_fork(&self, program: Program) {
        self.platform().fork_programs.lock().unwrap().push_back(program);
    }

    /// Put a process straight into the table, bypassing `fork`
    pub fn spawn(&self, name: &str, nice: u8, state: ProcessState) -> Pid {
        let mut table = self.kernel.table();
        let slot = table.allocate().unwrap();
        let p = &mut table[slot];
        p.set_name(name);
        p.set_nice(nice).unwrap();
        p.state = state;
        p.pid
    }

    /// Pretend `pid` is running on CPU 0
    pub fn set_current(&self, pid: Option<Pid>) {
        self.kernel.cpu(0).set_current(pid);
    }

    /// Number of switches into a process so far
    pub fn switches(&self) -> usize {
        self.platform().switches.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<Event> {
        self.platform().events.lock().unwrap().clone()
    }

    /// Run `rounds` scheduling rounds
    ///
    /// # Returns
    /// How many of them dispatched a process
    pub fn run_rounds(&self, rounds: usize) -> usize {
        (0..rounds).filter(|_| self.kernel.schedule_round()).count()
    }

    /// Run scheduling rounds until `done` holds
    ///
    /// # Panics
    /// If `done` still does not hold after `max_rounds` rounds.
    pub fn run_until(&self, mut done: impl FnMut() -> bool, max_rounds: usize) {
        for _ in 0..max_rounds {
            if done() {
                return;
            }
            self.kernel.schedule_round();
        }
        assert!(done(), "condition not reached after {} rounds", max_rounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_runs_on_first_dispatch() {
        let sim = Sim::new();
        let ran = Arc::new(AtomicBool::new(false));

        let r = ran.clone();
        let pid = sim.boot(program(move |k| {
            assert_eq!(k.current_pid(), Some(1));
            r.store(true, Ordering::SeqCst);
        }));

        assert_eq!(sim.run_rounds(1), 1);
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(sim.switches(), 1);

        // The root parks instead of exiting
        let table = sim.kernel().table();
        assert_eq!(table.find(pid).unwrap().state, ProcessState::Sleeping);
    }

    #[test]
    #[should_panic(expected = "process 1 panicked: boom")]
    fn test_process_panic_reaches_test_thread() {
        let sim = Sim::new();
        sim.boot(program(|_| panic!("boom")));
        sim.run_rounds(1);
    }

    #[test]
    fn test_resize_rejects_underflow() {
        let sim = Sim::new();
        assert_eq!(
            sim.platform().resize_image(1, 10, -20),
            Err(KernelError::ResourceExhausted)
        );
    }
}
