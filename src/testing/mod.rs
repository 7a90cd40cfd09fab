// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Host test platform
//!
//! Runs the process core under `cargo test`. Every simulated process gets
//! its own OS thread; a baton decides which thread (a process, or the
//! scheduler running on the test thread) may execute, so exactly one runs
//! at a time, as on a single CPU.
//!
//! # Usage
//! ```ignore
//! let sim = Sim::new();
//! sim.boot(program(|k| {
//!     let child = k.fork().unwrap();
//!     assert_eq!(k.wait(), Ok(child));
//! }));
//! sim.on_fork(program(|_| {}));
//! sim.run_rounds(4);
//! ```

pub mod harness;

pub use harness::{program, Event, Program, Sim, SimPlatform};
