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

use clap::Parser;

#[derive(Parser)]
#[command(about = "Generate random integers using the CPU's RDRAND instruction")]
struct Args {
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    min: i64,

    #[arg(short = 'M', long, default_value = "100", allow_negative_numbers = true)]
    max: i64,

    #[arg(short, long, default_value = "1")]
    count: usize,
}

fn main() {
    let args = Args::parse();

    for _ in 0..args.count {
        match rdrand_core::random_int(args.min, args.max) {
            Ok(value) => println!("{}", value),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
