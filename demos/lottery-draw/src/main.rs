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
#[command(about = "Perform lottery draws from 0..=90 using the CPU's RDRAND instruction")]
struct Args {
    #[arg(short, long, default_value = "6", help = "Numbers to draw")]
    draw: i64,

    #[arg(short, long, default_value = "1", help = "Number of draws")]
    count: usize,

    #[arg(short, long, help = "Print numbers in ascending order instead of draw order")]
    sorted: bool,
}

fn main() {
    let args = Args::parse();

    println!("Lottery Draw: {} numbers from 0..=90\n", args.draw);

    for i in 1..=args.count {
        let mut numbers = match rdrand_core::random_distinct_set(args.draw) {
            Ok(numbers) => numbers,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };

        if args.sorted {
            numbers.sort_unstable();
        }

        if args.count > 1 {
            println!("Draw {}: {}", i, format_numbers(&numbers));
        } else {
            println!("Winning numbers: {}", format_numbers(&numbers));
        }
    }
}

fn format_numbers(numbers: &[u8]) -> String {
    numbers.iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" ")
}
