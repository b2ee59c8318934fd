//! Generate sample integer streams and encode them.

use clap::Parser;
use rand::Rng;
use runpack::Encoder;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rp-gen")]
#[command(about = "Generate sample integer data and encode it with runpack")]
struct Args {
    /// Output file path for the encoded bytes
    output: PathBuf,

    /// Number of values to generate
    #[arg(short, long, default_value = "10000")]
    count: usize,

    /// Data shape: walk, ramp, repeat or noise
    #[arg(short, long, default_value = "walk")]
    pattern: String,

    /// Include occasional large outliers (roughly 1% of values)
    #[arg(long)]
    spikes: bool,

    /// Treat values as unsigned
    #[arg(long)]
    unsigned: bool,

    /// Starting value
    #[arg(long, default_value = "0")]
    base: i64,
}

fn generate(args: &Args) -> Vec<i64> {
    let mut rng = rand::rng();
    let mut values = Vec::with_capacity(args.count);
    let mut current = args.base;

    for i in 0..args.count {
        let value = match args.pattern.as_str() {
            "ramp" => args.base + i as i64 * 3,
            "repeat" => args.base + (i as i64 / 64) % 8,
            "noise" => args.base + rng.random_range(-1000..=1000),
            // random walk with small steps
            _ => {
                current += rng.random_range(-4..=4);
                current
            }
        };

        if args.spikes && rng.random_range(0..100) == 0 {
            values.push(value + rng.random_range(1 << 20..1 << 24));
        } else {
            values.push(value);
        }
    }
    values
}

fn main() {
    let args = Args::parse();

    let values = generate(&args);

    let mut encoder = Encoder::new(Vec::new(), !args.unsigned);
    encoder.write_all(&values);
    if let Err(e) = encoder.flush() {
        eprintln!("Error: encoding failed: {e}");
        std::process::exit(1);
    }
    let bytes = encoder.into_sink();

    let mut file = File::create(&args.output).expect("Failed to create output file");
    file.write_all(&bytes).expect("Failed to write data");

    println!("Generated {} values ({})", values.len(), args.pattern);
    println!("Output: {} ({} bytes)", args.output.display(), bytes.len());
    println!(
        "Compression: {:.1}x ({:.2} bits/value)",
        (values.len() * 8) as f64 / bytes.len() as f64,
        bytes.len() as f64 * 8.0 / values.len() as f64
    );
}
