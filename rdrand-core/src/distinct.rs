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

//! Lottery-style draws: distinct values from `0..=90` without replacement

use crate::sampler::Sampler;
use crate::source::EntropySource;
use crate::{Error, Result};

/// Largest value in the draw domain
pub const DOMAIN_MAX: u8 = 90;

/// Longest set that may be requested
pub const MAX_SET_LEN: i64 = 90;

/// Membership of already accepted values, one bit per domain value
#[derive(Debug, Default, Clone, Copy)]
struct Presence(u128);

impl Presence {
    fn contains(&self, value: u8) -> bool {
        self.0 & (1u128 << value) != 0
    }

    fn insert(&mut self, value: u8) {
        self.0 |= 1u128 << value;
    }
}

/// Argument check for [`Sampler::distinct`], done before any hardware access
pub fn check_length(length: i64) -> Result<usize> {
    if (0..=MAX_SET_LEN).contains(&length) {
        Ok(length as usize)
    } else {
        Err(Error::invalid("length out of range"))
    }
}

impl<S: EntropySource + ?Sized> Sampler<'_, S> {
    /// `length` distinct values from `0..=90`, in the order they were drawn
    ///
    /// A value already in the set is a rejected draw and counts against the
    /// rejection ceiling of the element being drawn.
    pub fn distinct(&self, length: i64) -> Result<Vec<u8>> {
        let length = check_length(length)?;

        let mut drawn = Vec::with_capacity(length);
        let mut seen = Presence::default();

        while drawn.len() < length {
            let value = self.draw_until(u64::from(DOMAIN_MAX), |v| !seen.contains(v as u8))? as u8;
            seen.insert(value);
            drawn.push(value);
        }

        Ok(drawn)
    }
}
