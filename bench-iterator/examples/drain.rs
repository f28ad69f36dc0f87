use anyhow::{Context, Result};
use bench_iterator::RandomBufferSequence;
use std::env;
use std::time::Instant;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage:");
        println!(" cargo run --example drain <num_elements> <element_size>");
        return Ok(());
    }

    let num_elements: usize = args[1]
        .parse()
        .with_context(|| format!("invalid num_elements: {}", args[1]))?;
    let element_size: usize = args[2]
        .parse()
        .with_context(|| format!("invalid element_size: {}", args[2]))?;

    let started = Instant::now();
    let mut sequence = RandomBufferSequence::new(num_elements, element_size);
    let generated_in = started.elapsed();

    let started = Instant::now();
    let mut histogram = [0u64; 256];
    let mut first = None;
    while sequence.has_more() {
        let buffer = sequence.next_buffer()?;
        if first.is_none() {
            first = Some(buffer.to_vec());
        }
        for &byte in buffer {
            histogram[byte as usize] += 1;
        }
    }
    let drained_in = started.elapsed();

    let total: u64 = histogram.iter().sum();
    println!(
        "generated {} x {} bytes in {:?}, drained in {:?}",
        num_elements, element_size, generated_in, drained_in
    );
    if total > 0 {
        let sum: u64 = histogram
            .iter()
            .enumerate()
            .map(|(value, count)| value as u64 * count)
            .sum();
        let (min, max) = (
            histogram.iter().min().copied().unwrap_or(0),
            histogram.iter().max().copied().unwrap_or(0),
        );
        println!(
            "mean byte {:.2} (uniform is 127.50), bucket counts {}..{}",
            sum as f64 / total as f64,
            min,
            max
        );
    }
    if let Some(first) = first {
        let preview: String = first
            .iter()
            .take(32)
            .map(|byte| format!("{:02x}", byte))
            .collect();
        println!("first buffer: {}", preview);
    }
    Ok(())
}
