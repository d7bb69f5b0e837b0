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

//! Deterministic stand-ins for the hardware, test builds only

use crate::source::EntropySource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Replays a fixed script of step results, then underflows forever
pub struct ScriptedSource {
    script: RefCell<VecDeque<Option<u64>>>,
    accesses: Cell<usize>,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Option<u64>>) -> Self {
        Self {
            script: RefCell::new(script.into_iter().collect()),
            accesses: Cell::new(0),
        }
    }

    /// Every step underflows
    pub fn dead() -> Self {
        Self::new([])
    }

    /// Successful steps yielding `words` in order
    pub fn words(words: impl IntoIterator<Item = u64>) -> Self {
        Self::new(words.into_iter().map(Some))
    }

    pub fn accesses(&self) -> usize {
        self.accesses.get()
    }

    fn next(&self) -> Option<u64> {
        self.accesses.set(self.accesses.get() + 1);
        self.script.borrow_mut().pop_front().flatten()
    }
}

impl EntropySource for ScriptedSource {
    fn step_u16(&self) -> Option<u16> {
        self.next().map(|w| w as u16)
    }

    fn step_u32(&self) -> Option<u32> {
        self.next().map(|w| w as u32)
    }

    fn step_u64(&self) -> Option<u64> {
        self.next()
    }
}

/// Pseudo-random words with an occasional underflow
pub struct SeededSource {
    rng: RefCell<StdRng>,
    underflow_rate: f64,
    accesses: Cell<usize>,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self::with_underflow(seed, 0.0)
    }

    pub fn with_underflow(seed: u64, underflow_rate: f64) -> Self {
        Self {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
            underflow_rate,
            accesses: Cell::new(0),
        }
    }

    pub fn accesses(&self) -> usize {
        self.accesses.get()
    }

    fn next(&self) -> Option<u64> {
        self.accesses.set(self.accesses.get() + 1);
        let mut rng = self.rng.borrow_mut();
        if self.underflow_rate > 0.0 && rng.gen_bool(self.underflow_rate) {
            None
        } else {
            Some(rng.gen())
        }
    }
}

impl EntropySource for SeededSource {
    fn step_u16(&self) -> Option<u16> {
        self.next().map(|w| w as u16)
    }

    fn step_u32(&self) -> Option<u32> {
        self.next().map(|w| w as u32)
    }

    fn step_u64(&self) -> Option<u64> {
        self.next()
    }
}
