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

//! rdrand - Command-line front end for hardware random integers
//!
//! Draws integers, lottery sets and raw words straight from the CPU's RDRAND or
//! RDSEED instruction. Nothing is buffered or mixed; every value printed comes from
//! fresh hardware draws.
//!
//! # Configuration
//!
//! Settings come from `--config <file>` when given, otherwise from `RDRAND_*`
//! environment variables (`RDRAND_INSTRUCTION`, `RDRAND_RETRY_LIMIT`,
//! `RDRAND_MAX_REJECTIONS`). Missing values fall back to the library defaults.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rdrand_core::{Capability, HwRng, HwWord, SamplerConfig, Width};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "rdrand")]
#[command(about = "Random integers straight from the CPU's hardware RNG", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Configuration file (any format the `config` crate recognises)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print Prometheus-format metrics to stderr on exit
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the CPU's hardware RNG capabilities as JSON
    Probe,

    /// Print uniform integers in [min, max]
    Randint {
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        min: i64,

        #[arg(short = 'M', long, default_value = "100", allow_negative_numbers = true)]
        max: i64,

        #[arg(short, long, default_value = "1")]
        count: usize,
    },

    /// Print lottery draws of distinct numbers from 0..=90
    Draw {
        #[arg(short, long, default_value = "6", allow_negative_numbers = true)]
        length: i64,

        #[arg(short, long, default_value = "1")]
        count: usize,
    },

    /// Print raw hardware words as hex, one per line
    Harvest {
        #[arg(short, long, default_value = "8")]
        words: usize,

        /// Word width in bits (16, 32 or 64)
        #[arg(long, default_value = "64")]
        width: u32,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<SamplerConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from file: {:?}", path);
            SamplerConfig::from_file(path).context("Failed to load configuration from file")
        }
        None => {
            info!("Loading configuration from environment variables");
            SamplerConfig::from_env().context("Failed to load configuration from environment")
        }
    }
}

fn print_words<W: HwWord>(rng: &HwRng, n: usize) -> Result<()> {
    let words: Vec<W> = rng.harvest(n).context("Failed to harvest words")?;
    let digits = W::WIDTH.bits() as usize / 4;
    for word in words {
        println!("{:0width$x}", word, width = digits);
    }
    Ok(())
}

fn print_capability() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(Capability::get())?);
    Ok(())
}

fn run(command: &Command, rng: &HwRng) -> Result<()> {
    match command {
        Command::Probe => print_capability()?,
        Command::Randint { min, max, count } => {
            for _ in 0..*count {
                let value = rng
                    .random_int(*min, *max)
                    .context("Failed to draw random integer")?;
                println!("{}", value);
            }
        }
        Command::Draw { length, count } => {
            for i in 1..=*count {
                let numbers = rng
                    .random_distinct_set(*length)
                    .context("Failed to draw distinct set")?;
                let line = numbers
                    .iter()
                    .map(|n| format!("{:2}", n))
                    .collect::<Vec<_>>()
                    .join(" ");
                if *count > 1 {
                    println!("Draw {}: {}", i, line);
                } else {
                    println!("{}", line);
                }
            }
        }
        Command::Harvest { words, width } => match Width::try_from(*width)? {
            Width::W16 => print_words::<u16>(rng, *words)?,
            Width::W32 => print_words::<u32>(rng, *words)?,
            Width::W64 => print_words::<u64>(rng, *words)?,
        },
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize tracing
    let log_level = args
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!("rdrand v{}", env!("CARGO_PKG_VERSION"));

    // Probing must work on machines without the instruction
    if matches!(args.command, Command::Probe) {
        return print_capability();
    }

    let config = load_config(args.config.as_ref())?;
    let rng = HwRng::with_config(config).context("Hardware RNG unavailable")?;

    let result = run(&args.command, &rng);

    if args.metrics {
        eprint!("{}", rng.metrics().prometheus_format());
    }
    if rng.metrics().exhausted_total() > 0 {
        warn!(
            exhausted = rng.metrics().exhausted_total(),
            "Hardware RNG ran out of retries"
        );
    }

    result
}
