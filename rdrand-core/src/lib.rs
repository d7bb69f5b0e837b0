// SPDX-License-Identifier: MIT
//
// RDRAND Entropy: Unbiased Integers Straight from the CPU
// Copyright (c) 2025 Valer Bocan, PhD, CSSLP
// Email: valer.bocan@upt.ro
//
// Department of Computer and Information Technology
// Politehnica University of Timisoara
//
// https://github.com/vbocan/qrng-data-diode

//! RDRAND Core Library
//!
//! This crate turns the x86 RDRAND / RDSEED instructions into unbiased random integers
//! without any software PRNG or operating-system entropy pool in between. When the
//! CPU does not provide the instruction, operations fail; there is no fallback.
//!
//! # Architecture
//!
//! The library is organized into modules representing core concerns:
//! - `capability`: CPUID-based detection of vendor and instruction support
//! - `source`: single hardware draws (`EntropySource`, `CpuSource`)
//! - `retry`: bounded retry on underflow and multi-word block harvesting
//! - `sampler`: uniform integers in a range by rejection sampling
//! - `distinct`: lottery-style sets of distinct values from `0..=90`
//! - `rng`: the `HwRng` facade and process-wide helpers
//! - `config`, `metrics`, `error`: configuration, counters and the error taxonomy
//!
//! # Example
//!
//! ```no_run
//! let roll = rdrand_core::random_int(1, 6)?;
//! let ticket = rdrand_core::random_distinct_set(6)?;
//! # Ok::<(), rdrand_core::Error>(())
//! ```

pub mod capability;
pub mod config;
pub mod distinct;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod rng;
pub mod sampler;
pub mod source;

#[cfg(test)]
mod testing;

pub use capability::Capability;
pub use config::SamplerConfig;
pub use error::{Error, Result};
pub use rng::{random_distinct_set, random_int, system, HwRng};
pub use source::{CpuSource, EntropySource, HwWord, Instruction, Width};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
