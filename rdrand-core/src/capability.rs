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

//! CPU capability detection
//!
//! Reads the CPUID vendor leaf and feature leaves once per process and answers
//! whether RDRAND / RDSEED may be executed. The register query lives behind a
//! build-time switch: x86 and x86_64 targets compile the native CPUID probe, every
//! other target compiles a stub that reports nothing supported.

use crate::source::Instruction;
use crate::{Error, Result};
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

const VENDOR_INTEL: &[u8; 12] = b"GenuineIntel";
const VENDOR_AMD: &[u8; 12] = b"AuthenticAMD";

/// CPUID.01H:ECX bit 30
const RDRAND_ECX_BIT: u32 = 1 << 30;
/// CPUID.(EAX=07H, ECX=0H):EBX bit 18
const RDSEED_EBX_BIT: u32 = 1 << 18;

/// Immutable record of the hardware RNG features of the running CPU
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capability {
    /// Raw 12-character vendor identification string (empty when CPUID is unavailable)
    pub vendor: String,
    pub vendor_is_intel: bool,
    pub vendor_is_amd: bool,
    pub rdrand_supported: bool,
    pub rdseed_supported: bool,
}

impl Capability {
    /// Query the CPU. Side-effect free; prefer [`Capability::get`] which caches the result.
    pub fn detect() -> Self {
        let capability = platform::detect();
        debug!(
            vendor = %capability.vendor,
            rdrand = capability.rdrand_supported,
            rdseed = capability.rdseed_supported,
            "CPU capability detected"
        );
        capability
    }

    /// Process-wide capability, detected on first use
    pub fn get() -> &'static Capability {
        static CAPABILITY: OnceLock<Capability> = OnceLock::new();
        CAPABILITY.get_or_init(Self::detect)
    }

    /// Capability of a machine without any hardware RNG
    pub fn unsupported() -> Self {
        Self {
            vendor: String::new(),
            vendor_is_intel: false,
            vendor_is_amd: false,
            rdrand_supported: false,
            rdseed_supported: false,
        }
    }

    /// Build the record from raw CPUID register values.
    ///
    /// `max_leaf` is EAX of leaf 0; leaf 7 is only trusted when `max_leaf >= 7`.
    /// An instruction counts as supported only on an Intel or AMD part that also
    /// sets the corresponding feature bit.
    pub fn from_registers(vendor: [u8; 12], max_leaf: u32, leaf1_ecx: u32, leaf7_ebx: u32) -> Self {
        let vendor_is_intel = &vendor == VENDOR_INTEL;
        let vendor_is_amd = &vendor == VENDOR_AMD;
        let known_vendor = vendor_is_intel || vendor_is_amd;

        let rdrand_flag = max_leaf >= 1 && leaf1_ecx & RDRAND_ECX_BIT != 0;
        let rdseed_flag = max_leaf >= 7 && leaf7_ebx & RDSEED_EBX_BIT != 0;

        Self {
            vendor: String::from_utf8_lossy(&vendor).into_owned(),
            vendor_is_intel,
            vendor_is_amd,
            rdrand_supported: known_vendor && rdrand_flag,
            rdseed_supported: known_vendor && rdseed_flag,
        }
    }

    pub fn supports(&self, instruction: Instruction) -> bool {
        match instruction {
            Instruction::RdRand => self.rdrand_supported,
            Instruction::RdSeed => self.rdseed_supported,
        }
    }

    /// Gate an instruction: `Err(Error::Unsupported)` when it may not be executed
    pub fn require(&self, instruction: Instruction) -> Result<()> {
        if self.supports(instruction) {
            Ok(())
        } else {
            Err(Error::Unsupported(instruction))
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod platform {
    use super::Capability;

    #[cfg(target_arch = "x86")]
    use core::arch::x86::{__cpuid, __cpuid_count, has_cpuid};
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::{__cpuid, __cpuid_count};

    pub(super) fn detect() -> Capability {
        #[cfg(target_arch = "x86")]
        if !has_cpuid() {
            return Capability::unsupported();
        }

        // SAFETY: CPUID exists on every x86_64 CPU and was probed above on x86.
        let leaf0 = unsafe { __cpuid(0) };

        let mut vendor = [0u8; 12];
        vendor[0..4].copy_from_slice(&leaf0.ebx.to_le_bytes());
        vendor[4..8].copy_from_slice(&leaf0.edx.to_le_bytes());
        vendor[8..12].copy_from_slice(&leaf0.ecx.to_le_bytes());

        let max_leaf = leaf0.eax;
        let leaf1_ecx = if max_leaf >= 1 {
            unsafe { __cpuid(1) }.ecx
        } else {
            0
        };
        let leaf7_ebx = if max_leaf >= 7 {
            unsafe { __cpuid_count(7, 0) }.ebx
        } else {
            0
        };

        Capability::from_registers(vendor, max_leaf, leaf1_ecx, leaf7_ebx)
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
mod platform {
    use super::Capability;

    pub(super) fn detect() -> Capability {
        Capability::unsupported()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intel_with_both_instructions() {
        let cap = Capability::from_registers(*b"GenuineIntel", 0x16, RDRAND_ECX_BIT, RDSEED_EBX_BIT);
        assert!(cap.vendor_is_intel);
        assert!(!cap.vendor_is_amd);
        assert!(cap.rdrand_supported);
        assert!(cap.rdseed_supported);
        assert_eq!(cap.vendor, "GenuineIntel");
    }

    #[test]
    fn test_amd_rdrand_only() {
        let cap = Capability::from_registers(*b"AuthenticAMD", 0x10, RDRAND_ECX_BIT, 0);
        assert!(cap.vendor_is_amd);
        assert!(cap.supports(Instruction::RdRand));
        assert!(!cap.supports(Instruction::RdSeed));
        assert!(matches!(
            cap.require(Instruction::RdSeed),
            Err(Error::Unsupported(Instruction::RdSeed))
        ));
    }

    #[test]
    fn test_leaf7_ignored_below_max_leaf() {
        let cap = Capability::from_registers(*b"GenuineIntel", 5, RDRAND_ECX_BIT, RDSEED_EBX_BIT);
        assert!(cap.rdrand_supported);
        assert!(!cap.rdseed_supported);
    }

    #[test]
    fn test_unknown_vendor_not_supported() {
        let cap = Capability::from_registers(*b"CentaurHauls", 0x16, RDRAND_ECX_BIT, RDSEED_EBX_BIT);
        assert!(!cap.vendor_is_intel);
        assert!(!cap.vendor_is_amd);
        assert!(!cap.rdrand_supported);
        assert!(!cap.rdseed_supported);
    }

    #[test]
    fn test_unsupported_stub() {
        let cap = Capability::unsupported();
        assert!(cap.require(Instruction::RdRand).is_err());
        assert!(cap.vendor.is_empty());
    }

    #[test]
    fn test_cached_detection_is_stable() {
        let first = Capability::get();
        let second = Capability::get();
        assert!(std::ptr::eq(first, second));
        assert_eq!(*first, Capability::detect());
    }
}
