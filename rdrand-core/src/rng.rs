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

//! Hardware generator facade
//!
//! [`HwRng`] owns a source, its configuration and its metrics, and is what callers
//! normally hold on to. The crate-level [`random_int`] and [`random_distinct_set`]
//! go through a process-wide instance created on first use.

use crate::config::SamplerConfig;
use crate::distinct::check_length;
use crate::metrics::Metrics;
use crate::retry::harvest_block;
use crate::sampler::{check_range, Sampler};
use crate::source::{CpuSource, EntropySource, HwWord, Instruction, Metered};
use crate::{Error, Result};
use std::sync::OnceLock;
use tracing::{info, instrument};

/// Random integers straight from a hardware source
pub struct HwRng<S = CpuSource> {
    source: S,
    config: SamplerConfig,
    metrics: Metrics,
}

impl HwRng<CpuSource> {
    /// Generator on the CPU's RDRAND with default settings
    ///
    /// Fails with [`Error::Unsupported`] when the CPU lacks the instruction.
    pub fn new() -> Result<Self> {
        Self::with_config(SamplerConfig::default())
    }

    pub fn with_config(config: SamplerConfig) -> Result<Self> {
        let source = CpuSource::new(config.instruction)?;
        let rng = Self::from_source(source, config)?;
        info!(
            instruction = %rng.config.instruction,
            retry_limit = rng.config.retry_limit,
            max_rejections = rng.config.max_rejections,
            "Hardware generator ready"
        );
        Ok(rng)
    }
}

impl<S: EntropySource> HwRng<S> {
    pub fn from_source(source: S, config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            config,
            metrics: Metrics::new(),
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Uniform integer in `[min, max]`
    #[instrument(skip(self), level = "debug")]
    pub fn random_int(&self, min: i64, max: i64) -> Result<i64> {
        self.sample(|s| s.range(min, max), |_| 1)
    }

    /// `length` distinct values from `0..=90`, in draw order
    #[instrument(skip(self), level = "debug")]
    pub fn random_distinct_set(&self, length: i64) -> Result<Vec<u8>> {
        self.sample(|s| s.distinct(length), Vec::len)
    }

    /// Uniform integer in `[0, n)`
    pub fn below(&self, n: u64) -> Result<u64> {
        self.sample(|s| s.below(n), |_| 1)
    }

    /// Uniform choice from `start, start + step, ...` before `stop`
    pub fn range_step(&self, start: i64, stop: i64, step: i64) -> Result<i64> {
        self.sample(|s| s.range_step(start, stop, step), |_| 1)
    }

    /// `n` raw hardware words
    #[instrument(skip(self), level = "debug")]
    pub fn harvest<W: HwWord>(&self, n: usize) -> Result<Vec<W>> {
        let metered = Metered::new(&self.source, &self.metrics);
        let block = harvest_block(&metered, n, &self.config.retry_policy());
        match &block {
            Ok(words) => self.metrics.record_harvest(words.len()),
            Err(e) => self.record_failure(e),
        }
        block
    }

    fn sample<T, F, C>(&self, op: F, count: C) -> Result<T>
    where
        F: FnOnce(&Sampler<'_, Metered<'_, S>>) -> Result<T>,
        C: FnOnce(&T) -> usize,
    {
        let metered = Metered::new(&self.source, &self.metrics);
        let sampler = Sampler::new(&metered, &self.config);

        let result = op(&sampler);
        let values = match &result {
            Ok(value) => count(value),
            Err(e) => {
                self.record_failure(e);
                0
            }
        };
        self.metrics.record_samples(values, sampler.rejections());
        result
    }

    fn record_failure(&self, e: &Error) {
        if matches!(e, Error::Exhausted { .. }) {
            self.metrics.record_exhausted();
        }
    }
}

/// Process-wide generator on the CPU's RDRAND, created on first use
pub fn system() -> Result<&'static HwRng> {
    static SYSTEM: OnceLock<Option<HwRng>> = OnceLock::new();
    SYSTEM
        .get_or_init(|| HwRng::new().ok())
        .as_ref()
        .ok_or(Error::Unsupported(Instruction::RdRand))
}

/// Uniform integer in `[min, max]` from the process-wide generator
///
/// Arguments are checked before the generator is created, so a bad range is
/// reported as such even on a CPU without RDRAND.
pub fn random_int(min: i64, max: i64) -> Result<i64> {
    check_range(min, max)?;
    system()?.random_int(min, max)
}

/// `length` distinct values from `0..=90` from the process-wide generator
pub fn random_distinct_set(length: i64) -> Result<Vec<u8>> {
    check_length(length)?;
    system()?.random_distinct_set(length)
}
