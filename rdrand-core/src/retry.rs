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

//! Bounded retry for transient hardware underflow, and block harvesting

use crate::source::{EntropySource, HwWord};
use crate::{Error, Result};
use tracing::{debug, warn};

/// Retries recommended by Intel's DRNG guide before declaring the unit failed
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub retry_limit: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }
}

impl RetryPolicy {
    pub fn new(retry_limit: u32) -> Self {
        Self { retry_limit }
    }

    /// Total attempts this policy allows
    pub fn max_attempts(&self) -> u64 {
        u64::from(self.retry_limit) + 1
    }

    /// Execute a step until it yields a value or attempts run out
    ///
    /// Retries only while the step has not succeeded and attempts remain; the first
    /// success is returned immediately.
    pub fn execute<T, F>(&self, mut step: F) -> Result<T>
    where
        F: FnMut() -> Option<T>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        while attempt < max_attempts {
            attempt += 1;

            if let Some(value) = step() {
                if attempt > 1 {
                    debug!("Hardware step succeeded after {} attempts", attempt);
                }
                return Ok(value);
            }

            std::hint::spin_loop();
        }

        warn!("Hardware step failed after {} attempts", attempt);
        Err(Error::Exhausted { attempts: attempt })
    }
}

/// One word from `source`, retried per `policy`
pub fn step_word_retry<W, S>(source: &S, policy: &RetryPolicy) -> Result<W>
where
    W: HwWord,
    S: EntropySource + ?Sized,
{
    policy.execute(|| W::step(source))
}

/// Harvest `n` words, each with its own retry budget
///
/// Fails fast on the first exhausted word; nothing harvested before the failure
/// is returned. A block that cannot be allocated is an invalid argument and no
/// word is drawn.
pub fn harvest_block<W, S>(source: &S, n: usize, policy: &RetryPolicy) -> Result<Vec<W>>
where
    W: HwWord,
    S: EntropySource + ?Sized,
{
    let mut block = Vec::new();
    block
        .try_reserve_exact(n)
        .map_err(|_| Error::invalid(format!("block of {} words too large", n)))?;
    block.resize(n, W::default());

    harvest_into(source, &mut block, policy)?;
    Ok(block)
}

/// Fill `dest` in place. On error the contents of `dest` are unspecified.
pub fn harvest_into<W, S>(source: &S, dest: &mut [W], policy: &RetryPolicy) -> Result<()>
where
    W: HwWord,
    S: EntropySource + ?Sized,
{
    for (i, slot) in dest.iter_mut().enumerate() {
        *slot = step_word_retry(source, policy).map_err(|e| {
            debug!(index = i, width = W::WIDTH.bits(), "Block harvest aborted");
            e
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSource;

    #[test]
    fn test_retry_success() {
        let policy = RetryPolicy::default();
        let mut attempts = 0;

        let result = policy.execute(|| {
            attempts += 1;
            if attempts < 3 {
                None
            } else {
                Some(42)
            }
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_retry_exhausted() {
        let policy = RetryPolicy::new(2);
        let mut attempts = 0;

        let result = policy.execute(|| {
            attempts += 1;
            None::<u32>
        });

        assert!(matches!(result, Err(Error::Exhausted { attempts: 3 })));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_first_success_stops_retrying() {
        let source = ScriptedSource::words([5, 6, 7]);
        let word: u32 = step_word_retry(&source, &RetryPolicy::new(10)).unwrap();
        assert_eq!(word, 5);
        assert_eq!(source.accesses(), 1);
    }

    #[test]
    fn test_success_on_last_attempt() {
        let source = ScriptedSource::new([None, None, None, Some(99)]);
        let word: u64 = step_word_retry(&source, &RetryPolicy::new(3)).unwrap();
        assert_eq!(word, 99);
        assert_eq!(source.accesses(), 4);
    }

    #[test]
    fn test_zero_retry_limit_tries_once() {
        let source = ScriptedSource::new([None, Some(1)]);
        let result: Result<u16> = step_word_retry(&source, &RetryPolicy::new(0));
        assert!(matches!(result, Err(Error::Exhausted { attempts: 1 })));
        assert_eq!(source.accesses(), 1);
    }

    #[test]
    fn test_harvest_block() {
        let source = ScriptedSource::new([Some(1), None, Some(2), Some(3)]);
        let block: Vec<u32> = harvest_block(&source, 3, &RetryPolicy::new(1)).unwrap();
        assert_eq!(block, vec![1, 2, 3]);
        assert_eq!(source.accesses(), 4);
    }

    #[test]
    fn test_harvest_block_fails_fast() {
        // Second word never arrives: 1 step for the first, 3 for the second, none after.
        let source = ScriptedSource::new([Some(1), None, None, None, Some(4), Some(5)]);
        let result: Result<Vec<u64>> = harvest_block(&source, 4, &RetryPolicy::new(2));
        assert!(matches!(result, Err(Error::Exhausted { attempts: 3 })));
        assert_eq!(source.accesses(), 4);
    }

    #[test]
    fn test_oversized_block_is_invalid() {
        let source = ScriptedSource::words([1, 2, 3]);
        let result: Result<Vec<u64>> = harvest_block(&source, usize::MAX, &RetryPolicy::default());
        assert!(result.unwrap_err().is_invalid_argument());
        assert_eq!(source.accesses(), 0);
    }

    #[test]
    fn test_harvest_into_slice() {
        let source = ScriptedSource::new([Some(0x1_0001), None, Some(0x2_0002)]);
        let mut dest = [0u16; 2];
        harvest_into(&source, &mut dest, &RetryPolicy::new(1)).unwrap();
        assert_eq!(dest, [1, 2]);
        assert_eq!(source.accesses(), 3);
    }

    #[test]
    fn test_harvest_empty_block() {
        let source = ScriptedSource::dead();
        let block: Vec<u32> = harvest_block(&source, 0, &RetryPolicy::default()).unwrap();
        assert!(block.is_empty());
        assert_eq!(source.accesses(), 0);
    }
}
