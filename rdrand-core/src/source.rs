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

//! Single-step access to the hardware RNG
//!
//! [`EntropySource`] is the only seam through which the rest of the crate touches
//! the hardware. One call is one instruction: `Some(word)` on success, `None` when the
//! conditioner had nothing ready (underflow). Underflow is expected and retryable, so
//! nothing at this layer logs it.

use crate::capability::Capability;
use crate::metrics::Metrics;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware RNG instruction family
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Instruction {
    /// DRBG output, reseeded by the hardware conditioner
    #[default]
    RdRand,
    /// Conditioned seed-grade output, underflows more often
    RdSeed,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::RdRand => f.write_str("RDRAND"),
            Instruction::RdSeed => f.write_str("RDSEED"),
        }
    }
}

/// Operand width of a single draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W16,
    W32,
    W64,
}

impl Width {
    pub fn bits(self) -> u32 {
        match self {
            Width::W16 => 16,
            Width::W32 => 32,
            Width::W64 => 64,
        }
    }
}

impl TryFrom<u32> for Width {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            16 => Ok(Width::W16),
            32 => Ok(Width::W32),
            64 => Ok(Width::W64),
            other => Err(Error::invalid(format!(
                "unsupported word width {} (expected 16, 32 or 64)",
                other
            ))),
        }
    }
}

/// One hardware draw per call
pub trait EntropySource {
    fn step_u16(&self) -> Option<u16>;
    fn step_u32(&self) -> Option<u32>;
    fn step_u64(&self) -> Option<u64>;
}

impl<S: EntropySource + ?Sized> EntropySource for &S {
    fn step_u16(&self) -> Option<u16> {
        (**self).step_u16()
    }

    fn step_u32(&self) -> Option<u32> {
        (**self).step_u32()
    }

    fn step_u64(&self) -> Option<u64> {
        (**self).step_u64()
    }
}

/// Unsigned word types a source can produce
pub trait HwWord: Copy + Default + fmt::LowerHex + Send + 'static {
    const WIDTH: Width;

    fn step<S: EntropySource + ?Sized>(source: &S) -> Option<Self>;
}

impl HwWord for u16 {
    const WIDTH: Width = Width::W16;

    fn step<S: EntropySource + ?Sized>(source: &S) -> Option<Self> {
        source.step_u16()
    }
}

impl HwWord for u32 {
    const WIDTH: Width = Width::W32;

    fn step<S: EntropySource + ?Sized>(source: &S) -> Option<Self> {
        source.step_u32()
    }
}

impl HwWord for u64 {
    const WIDTH: Width = Width::W64;

    fn step<S: EntropySource + ?Sized>(source: &S) -> Option<Self> {
        source.step_u64()
    }
}

/// The CPU's own RDRAND / RDSEED instruction
///
/// Can only be constructed once [`Capability`] confirms the instruction exists, which
/// is what makes the intrinsic calls below sound.
#[derive(Debug, Clone, Copy)]
pub struct CpuSource {
    instruction: Instruction,
}

impl CpuSource {
    pub fn new(instruction: Instruction) -> Result<Self> {
        Capability::get().require(instruction)?;
        Ok(Self { instruction })
    }

    pub fn instruction(&self) -> Instruction {
        self.instruction
    }
}

impl EntropySource for CpuSource {
    #[inline]
    fn step_u16(&self) -> Option<u16> {
        native::step16(self.instruction)
    }

    #[inline]
    fn step_u32(&self) -> Option<u32> {
        native::step32(self.instruction)
    }

    #[inline]
    fn step_u64(&self) -> Option<u64> {
        native::step64(self.instruction)
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod native {
    use super::Instruction;

    #[cfg(target_arch = "x86")]
    use core::arch::x86 as arch;
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64 as arch;

    // SAFETY (all functions): only reachable through `CpuSource`, whose constructor
    // verified the instruction via CPUID.

    pub(super) fn step16(instruction: Instruction) -> Option<u16> {
        let mut word = 0u16;
        let ok = unsafe {
            match instruction {
                Instruction::RdRand => arch::_rdrand16_step(&mut word),
                Instruction::RdSeed => arch::_rdseed16_step(&mut word),
            }
        };
        (ok == 1).then_some(word)
    }

    pub(super) fn step32(instruction: Instruction) -> Option<u32> {
        let mut word = 0u32;
        let ok = unsafe {
            match instruction {
                Instruction::RdRand => arch::_rdrand32_step(&mut word),
                Instruction::RdSeed => arch::_rdseed32_step(&mut word),
            }
        };
        (ok == 1).then_some(word)
    }

    #[cfg(target_arch = "x86_64")]
    pub(super) fn step64(instruction: Instruction) -> Option<u64> {
        let mut word = 0u64;
        let ok = unsafe {
            match instruction {
                Instruction::RdRand => arch::_rdrand64_step(&mut word),
                Instruction::RdSeed => arch::_rdseed64_step(&mut word),
            }
        };
        (ok == 1).then_some(word)
    }

    // No 64-bit operand on 32-bit x86: both halves must succeed.
    #[cfg(target_arch = "x86")]
    pub(super) fn step64(instruction: Instruction) -> Option<u64> {
        let lo = step32(instruction)?;
        let hi = step32(instruction)?;
        Some((u64::from(hi) << 32) | u64::from(lo))
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
mod native {
    use super::Instruction;

    pub(super) fn step16(_: Instruction) -> Option<u16> {
        None
    }

    pub(super) fn step32(_: Instruction) -> Option<u32> {
        None
    }

    pub(super) fn step64(_: Instruction) -> Option<u64> {
        None
    }
}

/// Source adapter that counts every step and underflow into [`Metrics`]
pub struct Metered<'a, S: ?Sized> {
    inner: &'a S,
    metrics: &'a Metrics,
}

impl<'a, S: EntropySource + ?Sized> Metered<'a, S> {
    pub fn new(inner: &'a S, metrics: &'a Metrics) -> Self {
        Self { inner, metrics }
    }

    fn observe<T>(&self, word: Option<T>) -> Option<T> {
        self.metrics.record_step(word.is_some());
        word
    }
}

impl<S: EntropySource + ?Sized> EntropySource for Metered<'_, S> {
    fn step_u16(&self) -> Option<u16> {
        self.observe(self.inner.step_u16())
    }

    fn step_u32(&self) -> Option<u32> {
        self.observe(self.inner.step_u32())
    }

    fn step_u64(&self) -> Option<u64> {
        self.observe(self.inner.step_u64())
    }
}
