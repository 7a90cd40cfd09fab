// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Architecture-specific support
//!
//! Only the pieces the process core needs live here: the interrupt-enable
//! flag behind [`CpuControl`](crate::CpuControl). Context switching and
//! page tables stay with the embedding kernel.

#[cfg(target_arch = "x86_64")]
pub mod amd64;

#[cfg(target_arch = "x86_64")]
pub use amd64::Amd64Cpu;
