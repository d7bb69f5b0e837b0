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

//! Rejection sampling of uniform integers from hardware words
//!
//! Every value is produced the same way: draw a word, mask it to the bit length of
//! the target ceiling, and throw it away if it lands above the ceiling or outside the
//! requested window. No modulo reduction happens anywhere, so the output is exactly
//! as uniform as the hardware words.

use crate::config::SamplerConfig;
use crate::retry::{step_word_retry, RetryPolicy};
use crate::source::EntropySource;
use crate::{Error, Result};
use std::cell::Cell;
use tracing::{debug, warn};

/// Draws values from a source under one retry policy and rejection ceiling
pub struct Sampler<'a, S: ?Sized> {
    source: &'a S,
    retry: RetryPolicy,
    max_rejections: Option<u64>,
    rejections: Cell<u64>,
}

impl<'a, S: EntropySource + ?Sized> Sampler<'a, S> {
    pub fn new(source: &'a S, config: &SamplerConfig) -> Self {
        Self::with_policy(source, config.retry_policy(), config.rejection_ceiling())
    }

    /// `max_rejections: None` loops until a draw is accepted
    pub fn with_policy(source: &'a S, retry: RetryPolicy, max_rejections: Option<u64>) -> Self {
        Self {
            source,
            retry,
            max_rejections,
            rejections: Cell::new(0),
        }
    }

    /// Draws discarded so far by this sampler
    pub fn rejections(&self) -> u64 {
        self.rejections.get()
    }

    /// Uniform integer in `[min, max]`
    ///
    /// Both bounds negative is rejected. The draw is an offset in
    /// `[0, max - min]`, so the acceptance rate depends only on the width of
    /// the range and never on how far it sits from zero.
    pub fn range(&self, min: i64, max: i64) -> Result<i64> {
        check_range(min, max)?;

        let ceiling = (i128::from(max) - i128::from(min)) as u64;
        let offset = self.draw_until(ceiling, |_| true)?;
        Ok((i128::from(min) + i128::from(offset)) as i64)
    }

    /// Uniform integer in `[0, n)`
    pub fn below(&self, n: u64) -> Result<u64> {
        if n == 0 {
            return Err(Error::invalid("empty range"));
        }
        self.draw_until(n - 1, |_| true)
    }

    /// Uniform choice from `start, start + step, ...` stopping before `stop`
    ///
    /// Negative steps walk downwards; `stop` is always exclusive.
    pub fn range_step(&self, start: i64, stop: i64, step: i64) -> Result<i64> {
        if step == 0 {
            return Err(Error::invalid("zero step"));
        }

        let width = i128::from(stop) - i128::from(start);
        let step = i128::from(step);
        let count = if step > 0 {
            floor_div(width + step - 1, step)
        } else {
            floor_div(width + step + 1, step)
        };

        if count <= 0 {
            return Err(Error::invalid("empty range"));
        }

        let pick = self.below(count as u64)?;
        Ok((i128::from(start) + step * i128::from(pick)) as i64)
    }

    /// Draw values in `[0, ceiling]` until `accept` takes one
    ///
    /// Masked words above the ceiling and values refused by `accept` both count as
    /// rejections. A hardware failure ends the loop immediately.
    pub(crate) fn draw_until<F>(&self, ceiling: u64, mut accept: F) -> Result<u64>
    where
        F: FnMut(u64) -> bool,
    {
        let mut rejected = 0u64;

        let outcome = loop {
            match self.masked_draw(ceiling) {
                Ok(Some(value)) if accept(value) => break Ok(value),
                Ok(_) => {}
                Err(e) => break Err(e),
            }

            rejected += 1;
            if let Some(limit) = self.max_rejections {
                if rejected >= limit {
                    warn!(ceiling, rejected, "Rejection limit reached");
                    break Err(Error::RejectionLimit { rejections: rejected });
                }
            }
        };

        self.rejections.set(self.rejections.get() + rejected);
        if rejected > 0 {
            debug!(ceiling, rejected, "Rejection sampling discarded draws");
        }
        outcome
    }

    /// One word masked to the bit length of `ceiling`; `None` if it lands above it
    fn masked_draw(&self, ceiling: u64) -> Result<Option<u64>> {
        let word = if ceiling <= u64::from(u32::MAX) {
            u64::from(step_word_retry::<u32, _>(self.source, &self.retry)?)
        } else {
            step_word_retry::<u64, _>(self.source, &self.retry)?
        };

        let value = word & mask_for(ceiling);
        Ok((value <= ceiling).then_some(value))
    }
}

/// Argument checks for [`Sampler::range`], done before any hardware access
pub fn check_range(min: i64, max: i64) -> Result<()> {
    if min > max {
        return Err(Error::invalid("min greater than max"));
    }
    if min < 0 && max < 0 {
        return Err(Error::invalid("unsupported negative range"));
    }
    Ok(())
}

/// Smallest all-ones mask covering `ceiling`
fn mask_for(ceiling: u64) -> u64 {
    if ceiling == 0 {
        0
    } else {
        u64::MAX >> ceiling.leading_zeros()
    }
}

fn floor_div(a: i128, b: i128) -> i128 {
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}
