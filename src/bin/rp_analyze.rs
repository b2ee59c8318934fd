//! Walk an encoded stream and report how the encoder carved it into blocks.

use clap::Parser;
use runpack::{closest_fixed_bits, decode_bit_width, SubEncoding};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rp-analyze")]
#[command(about = "Report the block structure of a runpack-encoded stream")]
struct Args {
    /// File containing the encoded bytes
    input: PathBuf,

    /// Print every block, not just the summary
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Default)]
struct BlockStats {
    blocks: u64,
    values: u64,
    bytes: u64,
}

struct Walker<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Walker<'a> {
    fn byte(&mut self) -> Result<u8, String> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| format!("truncated stream at byte {}", self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn skip_varint(&mut self) -> Result<(), String> {
        for _ in 0..10 {
            if self.byte()? < 0x80 {
                return Ok(());
            }
        }
        Err(format!("varint too long at byte {}", self.pos))
    }

    fn skip_packed(&mut self, count: u64, bits: u32) -> Result<(), String> {
        let bytes = (count * u64::from(bits) + 7) / 8;
        self.pos += bytes as usize;
        if self.pos > self.data.len() {
            return Err("truncated packed payload".into());
        }
        Ok(())
    }

    /// Parse one block header (and step over its payload), returning the
    /// sub-encoding, value count, and total block size in bytes.
    fn next_block(&mut self) -> Result<(SubEncoding, u64, u64), String> {
        let start = self.pos;
        let first = self.byte()?;
        let kind = SubEncoding::from_header(first);
        let values = match kind {
            SubEncoding::ShortRepeat => {
                let width = u64::from((first >> 3) & 0x07) + 1;
                self.pos += width as usize;
                u64::from(first & 0x07) + 3
            }
            SubEncoding::Direct => {
                let bits = decode_bit_width(u32::from(first >> 1) & 0x1f);
                let len = (u64::from(first & 0x01) << 8 | u64::from(self.byte()?)) + 1;
                self.skip_packed(len, bits)?;
                len
            }
            SubEncoding::PatchedBase => {
                let bits = decode_bit_width(u32::from(first >> 1) & 0x1f);
                let len = (u64::from(first & 0x01) << 8 | u64::from(self.byte()?)) + 1;
                let third = self.byte()?;
                let base_bytes = u64::from((third >> 5) & 0x07) + 1;
                let patch_bits = decode_bit_width(u32::from(third & 0x1f));
                let fourth = self.byte()?;
                let gap_bits = u32::from((fourth >> 5) & 0x07) + 1;
                let patch_len = u64::from(fourth & 0x1f);
                self.pos += base_bytes as usize;
                self.skip_packed(len, bits)?;
                self.skip_packed(patch_len, closest_fixed_bits(gap_bits + patch_bits))?;
                len
            }
            SubEncoding::Delta => {
                let width_index = u32::from(first >> 1) & 0x1f;
                let len = (u64::from(first & 0x01) << 8 | u64::from(self.byte()?)) + 1;
                self.skip_varint()?; // base value
                self.skip_varint()?; // first delta
                if width_index != 0 {
                    if len < 2 {
                        return Err(format!("delta block of {len} values with packed deltas"));
                    }
                    self.skip_packed(len - 2, decode_bit_width(width_index))?;
                }
                len
            }
        };
        if self.pos > self.data.len() {
            return Err("truncated block payload".into());
        }
        Ok((kind, values, (self.pos - start) as u64))
    }
}

fn label(kind: SubEncoding) -> &'static str {
    match kind {
        SubEncoding::ShortRepeat => "short_repeat",
        SubEncoding::Direct => "direct",
        SubEncoding::PatchedBase => "patched_base",
        SubEncoding::Delta => "delta",
    }
}

fn main() {
    let args = Args::parse();

    let data = match fs::read(&args.input) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: cannot read {}: {e}", args.input.display());
            std::process::exit(1);
        }
    };

    let mut walker = Walker { data: &data, pos: 0 };
    let mut stats = [
        BlockStats::default(),
        BlockStats::default(),
        BlockStats::default(),
        BlockStats::default(),
    ];

    while walker.pos < walker.data.len() {
        let at = walker.pos;
        match walker.next_block() {
            Ok((kind, values, bytes)) => {
                if args.verbose {
                    println!(
                        "{at:>8}  {:<12} {values:>4} values  {bytes:>5} bytes",
                        label(kind)
                    );
                }
                let s = &mut stats[kind as usize];
                s.blocks += 1;
                s.values += values;
                s.bytes += bytes;
            }
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }

    let total_values: u64 = stats.iter().map(|s| s.values).sum();
    let total_blocks: u64 = stats.iter().map(|s| s.blocks).sum();

    println!("{} bytes, {total_blocks} blocks, {total_values} values", data.len());
    for kind in [
        SubEncoding::ShortRepeat,
        SubEncoding::Direct,
        SubEncoding::PatchedBase,
        SubEncoding::Delta,
    ] {
        let s = &stats[kind as usize];
        if s.blocks == 0 {
            continue;
        }
        println!(
            "  {:<12} {:>6} blocks  {:>8} values  {:>8} bytes  ({:.2} bits/value)",
            label(kind),
            s.blocks,
            s.values,
            s.bytes,
            s.bytes as f64 * 8.0 / s.values as f64
        );
    }
    if total_values > 0 {
        println!(
            "  overall      {:.1}x vs raw i64 ({:.2} bits/value)",
            (total_values * 8) as f64 / data.len() as f64,
            data.len() as f64 * 8.0 / total_values as f64
        );
    }
}
