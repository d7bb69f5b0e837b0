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

//! Error types for hardware entropy operations
//!
//! Provides a unified error taxonomy using `thiserror` for ergonomic error handling.
//! A transient underflow of the instruction is not an error and never shows up here;
//! it is absorbed by the retry controller.

use crate::source::Instruction;

pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for hardware entropy operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller-supplied bounds or length violate a precondition
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Every attempt of a bounded retry underflowed
    #[error("hardware entropy unavailable: no output after {attempts} attempts")]
    Exhausted { attempts: u64 },

    /// The CPU does not provide the requested instruction
    #[error("hardware entropy unavailable: {0} not supported by this CPU")]
    Unsupported(Instruction),

    /// The configured rejection ceiling was reached before a value was accepted
    #[error("Rejection limit reached after {rejections} rejected draws")]
    RejectionLimit { rejections: u64 },

    /// Configuration validation failed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Check if error means the hardware could not deliver entropy at all
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Exhausted { .. } | Error::Unsupported(_))
    }

    /// Check if error was caused by the caller's arguments
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }
}

impl From<envy::Error> for Error {
    fn from(e: envy::Error) -> Self {
        Error::Config(format!("Failed to parse environment variables: {}", e))
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
