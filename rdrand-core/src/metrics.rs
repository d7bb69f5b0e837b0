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

//! Metrics collection and reporting

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Harvest metrics collector
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    start_time: Instant,

    // Hardware steps
    steps_total: AtomicU64,
    underflows_total: AtomicU64,
    exhausted_total: AtomicU64,

    // Sampling
    samples_total: AtomicU64,
    rejections_total: AtomicU64,
    words_harvested: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                start_time: Instant::now(),
                steps_total: AtomicU64::new(0),
                underflows_total: AtomicU64::new(0),
                exhausted_total: AtomicU64::new(0),
                samples_total: AtomicU64::new(0),
                rejections_total: AtomicU64::new(0),
                words_harvested: AtomicU64::new(0),
            }),
        }
    }

    // Step metrics
    pub fn record_step(&self, success: bool) {
        self.inner.steps_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.inner.underflows_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_exhausted(&self) {
        self.inner.exhausted_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn steps_total(&self) -> u64 {
        self.inner.steps_total.load(Ordering::Relaxed)
    }

    pub fn underflows_total(&self) -> u64 {
        self.inner.underflows_total.load(Ordering::Relaxed)
    }

    pub fn exhausted_total(&self) -> u64 {
        self.inner.exhausted_total.load(Ordering::Relaxed)
    }

    // Sampling metrics
    pub fn record_samples(&self, values: usize, rejections: u64) {
        self.inner.samples_total.fetch_add(values as u64, Ordering::Relaxed);
        self.inner.rejections_total.fetch_add(rejections, Ordering::Relaxed);
    }

    pub fn record_harvest(&self, words: usize) {
        self.inner.words_harvested.fetch_add(words as u64, Ordering::Relaxed);
    }

    pub fn samples_total(&self) -> u64 {
        self.inner.samples_total.load(Ordering::Relaxed)
    }

    pub fn rejections_total(&self) -> u64 {
        self.inner.rejections_total.load(Ordering::Relaxed)
    }

    pub fn words_harvested(&self) -> u64 {
        self.inner.words_harvested.load(Ordering::Relaxed)
    }

    // Derived metrics
    pub fn uptime_seconds(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    /// Fraction of hardware steps that underflowed (0.0 - 1.0)
    pub fn underflow_rate(&self) -> f64 {
        let steps = self.steps_total();
        if steps > 0 {
            self.underflows_total() as f64 / steps as f64
        } else {
            0.0
        }
    }

    /// Generate Prometheus-compatible metrics output
    pub fn prometheus_format(&self) -> String {
        let mut output = String::new();

        let counters = [
            ("rdrand_steps_total", "Hardware instruction executions", self.steps_total()),
            ("rdrand_underflows_total", "Executions that returned no data", self.underflows_total()),
            ("rdrand_exhausted_total", "Words abandoned after all retries", self.exhausted_total()),
            ("rdrand_samples_total", "Values returned by the samplers", self.samples_total()),
            ("rdrand_rejections_total", "Draws discarded by rejection sampling", self.rejections_total()),
            ("rdrand_words_harvested_total", "Raw words returned by block harvests", self.words_harvested()),
        ];

        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, value));
        }

        output.push_str("# HELP rdrand_underflow_ratio Fraction of executions that underflowed\n");
        output.push_str("# TYPE rdrand_underflow_ratio gauge\n");
        output.push_str(&format!("rdrand_underflow_ratio {:.6}\n", self.underflow_rate()));

        output.push_str("# HELP rdrand_uptime_seconds Generator uptime in seconds\n");
        output.push_str("# TYPE rdrand_uptime_seconds gauge\n");
        output.push_str(&format!("rdrand_uptime_seconds {}\n", self.uptime_seconds()));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.record_step(true);
        metrics.record_step(false);
        metrics.record_step(true);
        metrics.record_exhausted();
        metrics.record_samples(2, 5);
        metrics.record_harvest(16);

        assert_eq!(metrics.steps_total(), 3);
        assert_eq!(metrics.underflows_total(), 1);
        assert_eq!(metrics.exhausted_total(), 1);
        assert_eq!(metrics.samples_total(), 2);
        assert_eq!(metrics.rejections_total(), 5);
        assert_eq!(metrics.words_harvested(), 16);
    }

    #[test]
    fn test_underflow_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.underflow_rate(), 0.0);

        for i in 0..100 {
            metrics.record_step(i % 4 != 0);
        }
        assert!((metrics.underflow_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();
        clone.record_step(true);
        assert_eq!(metrics.steps_total(), 1);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = Metrics::new();
        metrics.record_step(false);

        let text = metrics.prometheus_format();
        assert!(text.contains("# TYPE rdrand_steps_total counter"));
        assert!(text.contains("rdrand_underflows_total 1\n"));
        assert!(text.contains("rdrand_underflow_ratio 1.000000\n"));
    }
}
