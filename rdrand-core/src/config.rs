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

//! Configuration management for hardware samplers

use crate::retry::{RetryPolicy, DEFAULT_RETRY_LIMIT};
use crate::source::Instruction;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Upper bound for `retry_limit`
pub const MAX_RETRY_LIMIT: u32 = 1024;

/// Default ceiling on rejected draws per sampled value
pub const DEFAULT_MAX_REJECTIONS: u64 = 1 << 24;

/// Sampler configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Hardware instruction to draw from
    #[serde(default)]
    pub instruction: Instruction,

    /// Retries per word after an underflow
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Rejected draws tolerated per sampled value (0 = unbounded)
    #[serde(default = "default_max_rejections")]
    pub max_rejections: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            instruction: Instruction::default(),
            retry_limit: default_retry_limit(),
            max_rejections: default_max_rejections(),
        }
    }
}

impl SamplerConfig {
    /// Load configuration from `RDRAND_*` environment variables
    pub fn from_env() -> Result<Self> {
        let config: Self = envy::prefixed("RDRAND_").from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, overlaid with `RDRAND_*` environment variables
    ///
    /// The format is picked from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("RDRAND").try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.retry_limit > MAX_RETRY_LIMIT {
            return Err(Error::Config(format!(
                "retry_limit must be between 0 and {}",
                MAX_RETRY_LIMIT
            )));
        }

        if self.max_rejections == 0 {
            warn!("max_rejections is 0, range sampling may busy-wait indefinitely");
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_limit)
    }

    /// Rejection ceiling, `None` when unbounded
    pub fn rejection_ceiling(&self) -> Option<u64> {
        (self.max_rejections > 0).then_some(self.max_rejections)
    }
}

// Default value functions
fn default_retry_limit() -> u32 {
    DEFAULT_RETRY_LIMIT
}

fn default_max_rejections() -> u64 {
    DEFAULT_MAX_REJECTIONS
}
