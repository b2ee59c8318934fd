//! Encoder: literal buffering, run detection, per-block encoding selection,
//! and the four sub-encoding writers.

use crate::constants::{
    closest_aligned_fixed_bits, closest_fixed_bits, decode_bit_width, encode_bit_width,
    find_closest_num_bits, SubEncoding, HIST_LEN, MAX_LITERAL_SIZE, MAX_SHORT_REPEAT_LENGTH,
    MIN_REPEAT,
};
use crate::error::Result;
use crate::io::{OutputStream, StreamPosition};
use crate::packing::{write_ints, write_vslong, write_vulong, zigzag_encode};

/// Per-block decision record filled in by `determine_encoding`.
///
/// The scratch arrays it describes (`zigzag_literals`, `base_reduced_literals`,
/// `adjacent_deltas`, `gap_patch_list`) live on the encoder so they are
/// allocated once and reused for every block.
#[derive(Debug)]
struct BlockPlan {
    kind: SubEncoding,
    fixed_delta: i64,
    is_fixed_delta: bool,
    min: i64,
    zz_bits_100p: u32,
    zz_bits_90p: u32,
    br_bits_100p: u32,
    br_bits_95p: u32,
    bits_delta_max: u32,
    patch_width: u32,
    patch_gap_width: u32,
    patch_length: u32,
}

impl Default for BlockPlan {
    fn default() -> Self {
        BlockPlan {
            kind: SubEncoding::Direct,
            fixed_delta: 0,
            is_fixed_delta: false,
            min: 0,
            zz_bits_100p: 0,
            zz_bits_90p: 0,
            br_bits_100p: 0,
            br_bits_95p: 0,
            bits_delta_max: 0,
            patch_width: 0,
            patch_gap_width: 0,
            patch_length: 0,
        }
    }
}

/// RLEv2 encoder over a byte sink.
///
/// Values are buffered up to 512 at a time; runs of identical or
/// constant-delta values are detected as they arrive and each full block is
/// written with whichever of the four sub-encodings packs it tightest.
/// [`write`](Self::write) never fails; call [`flush`](Self::flush) once at
/// the end to emit the remaining buffered values.
///
/// # Example
/// ```
/// use runpack::{Encoder, decode};
///
/// let mut encoder = Encoder::new(Vec::new(), true);
/// for v in [100, 110, 120, 130, 140] {
///     encoder.write(v);
/// }
/// encoder.flush().unwrap();
/// let bytes = encoder.into_sink();
/// assert_eq!(decode(&bytes, 5, true).unwrap(), [100, 110, 120, 130, 140]);
/// ```
pub struct Encoder<S: OutputStream> {
    sink: S,
    signed: bool,
    aligned_bit_packing: bool,
    literals: Vec<i64>,
    fixed_run_length: u32,
    variable_run_length: u32,
    prev_delta: i64,
    histogram: [i64; HIST_LEN],
    // Scratch for determine_encoding, reused across blocks.
    zigzag_literals: Vec<i64>,
    base_reduced_literals: Vec<i64>,
    adjacent_deltas: Vec<i64>,
    gap_patch_list: Vec<i64>,
}

impl<S: OutputStream> Encoder<S> {
    /// Create an encoder with aligned bit packing enabled (the default the
    /// reference writers use).
    ///
    /// `signed` selects whether values are zig-zagged before width analysis;
    /// it must match the decoder's flag.
    #[must_use]
    pub fn new(sink: S, signed: bool) -> Self {
        Self::with_options(sink, signed, true)
    }

    /// Create an encoder, choosing whether DIRECT and DELTA widths of a byte
    /// or more round up to whole bytes.
    #[must_use]
    pub fn with_options(sink: S, signed: bool, aligned_bit_packing: bool) -> Self {
        Encoder {
            sink,
            signed,
            aligned_bit_packing,
            literals: Vec::with_capacity(MAX_LITERAL_SIZE),
            fixed_run_length: 0,
            variable_run_length: 0,
            prev_delta: 0,
            histogram: [0; HIST_LEN],
            zigzag_literals: Vec::with_capacity(MAX_LITERAL_SIZE),
            base_reduced_literals: Vec::with_capacity(MAX_LITERAL_SIZE),
            adjacent_deltas: Vec::with_capacity(MAX_LITERAL_SIZE),
            gap_patch_list: Vec::with_capacity(MAX_LITERAL_SIZE / 16),
        }
    }

    /// Append one value. May emit a block when a run completes or the
    /// literal buffer fills.
    pub fn write(&mut self, value: i64) {
        if self.literals.is_empty() {
            self.initialize_literals(value);
            return;
        }

        if self.literals.len() == 1 {
            self.prev_delta = value.wrapping_sub(self.literals[0]);
            if value == self.literals[0] {
                self.fixed_run_length = 2;
                self.variable_run_length = 0;
            } else {
                self.fixed_run_length = 0;
                self.variable_run_length = 2;
            }
            self.literals.push(value);
            return;
        }

        let current_delta = value.wrapping_sub(self.literals[self.literals.len() - 1]);
        if self.prev_delta == 0 && current_delta == 0 {
            // still inside a run of identical values
            self.literals.push(value);

            if self.variable_run_length > 0 {
                // a repeat surfacing at the end of a variable run always
                // starts over at length two
                self.fixed_run_length = 2;
            }
            self.fixed_run_length += 1;

            // once the trailing repeat is long enough, flush everything in
            // front of it and keep only the repeat in the buffer
            if self.fixed_run_length >= MIN_REPEAT as u32 && self.variable_run_length > 0 {
                let keep = self.literals.len() - MIN_REPEAT;
                self.literals.truncate(keep);
                self.variable_run_length -= MIN_REPEAT as u32 - 1;

                let plan = self.determine_encoding();
                self.write_values(&plan);

                for _ in 0..MIN_REPEAT {
                    self.literals.push(value);
                }
            }

            if self.fixed_run_length == MAX_LITERAL_SIZE as u32 {
                let plan = BlockPlan {
                    kind: SubEncoding::Delta,
                    is_fixed_delta: true,
                    ..BlockPlan::default()
                };
                self.write_values(&plan);
            }
            return;
        }

        // the repeat (if any) just broke; flush it as its own block
        if self.fixed_run_length >= MIN_REPEAT as u32 {
            let mut plan = BlockPlan::default();
            if self.fixed_run_length <= MAX_SHORT_REPEAT_LENGTH as u32 {
                plan.kind = SubEncoding::ShortRepeat;
            } else {
                plan.kind = SubEncoding::Delta;
                plan.is_fixed_delta = true;
            }
            self.write_values(&plan);
        }

        // a repeat too short to stand alone folds into a variable run
        if self.fixed_run_length > 0
            && self.fixed_run_length < MIN_REPEAT as u32
            && value != self.literals[self.literals.len() - 1]
        {
            self.variable_run_length = self.fixed_run_length;
            self.fixed_run_length = 0;
        }

        if self.literals.is_empty() {
            self.initialize_literals(value);
        } else {
            self.prev_delta = value.wrapping_sub(self.literals[self.literals.len() - 1]);
            self.literals.push(value);
            self.variable_run_length += 1;

            if self.variable_run_length == MAX_LITERAL_SIZE as u32 {
                let plan = self.determine_encoding();
                self.write_values(&plan);
            }
        }
    }

    /// Append a slice of values.
    pub fn write_all(&mut self, values: &[i64]) {
        for &value in values {
            self.write(value);
        }
    }

    /// Emit any buffered values, flush the sink, and return the total number
    /// of bytes written. Flushing twice writes nothing the second time.
    pub fn flush(&mut self) -> Result<u64> {
        if !self.literals.is_empty() {
            if self.variable_run_length != 0 {
                let plan = self.determine_encoding();
                self.write_values(&plan);
            } else if self.fixed_run_length != 0 {
                if self.fixed_run_length < MIN_REPEAT as u32 {
                    self.variable_run_length = self.fixed_run_length;
                    self.fixed_run_length = 0;
                    let plan = self.determine_encoding();
                    self.write_values(&plan);
                } else if self.fixed_run_length <= MAX_SHORT_REPEAT_LENGTH as u32 {
                    let plan = BlockPlan {
                        kind: SubEncoding::ShortRepeat,
                        ..BlockPlan::default()
                    };
                    self.write_values(&plan);
                } else {
                    let plan = BlockPlan {
                        kind: SubEncoding::Delta,
                        is_fixed_delta: true,
                        ..BlockPlan::default()
                    };
                    self.write_values(&plan);
                }
            }
        }
        self.sink.flush()
    }

    /// Current seek point: bytes already emitted plus the number of buffered
    /// values a reader must skip to land on the next value written.
    #[must_use]
    pub fn position(&self) -> StreamPosition {
        StreamPosition {
            byte_offset: self.sink.bytes_written(),
            values_to_skip: self.literals.len() as u64,
        }
    }

    /// Number of values buffered but not yet emitted.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.literals.len()
    }

    /// Borrow the sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the encoder and hand back the sink. Call
    /// [`flush`](Self::flush) first or buffered values are dropped.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn initialize_literals(&mut self, value: i64) {
        self.literals.push(value);
        self.fixed_run_length = 1;
        self.variable_run_length = 1;
        self.prev_delta = 0;
    }

    /// Pick the sub-encoding for the buffered literals.
    ///
    /// Order of the checks: fixed delta, then DIRECT when the 90th and 100th
    /// percentile widths agree (no outliers), then DELTA for monotone runs
    /// whose packed deltas are narrower than the values, then PATCHED_BASE
    /// behind the percentile-spread gates, else DIRECT.
    fn determine_encoding(&mut self) -> BlockPlan {
        let mut plan = BlockPlan::default();

        // not worth analyzing runs this short
        if self.literals.len() <= MIN_REPEAT {
            self.compute_zigzag_literals();
            plan.zz_bits_100p =
                percentile_bits(&self.zigzag_literals, 1.0, &mut self.histogram, false);
            return plan;
        }

        let mut is_increasing = true;
        let mut is_decreasing = true;
        plan.is_fixed_delta = true;

        plan.min = self.literals[0];
        let mut max = self.literals[0];
        let initial_delta = self.literals[1].wrapping_sub(self.literals[0]);
        let mut current_delta = initial_delta;
        let mut delta_max = 0i64;
        self.adjacent_deltas.clear();
        self.adjacent_deltas.push(initial_delta);

        for i in 1..self.literals.len() {
            let l1 = self.literals[i];
            let l0 = self.literals[i - 1];
            current_delta = l1.wrapping_sub(l0);
            plan.min = plan.min.min(l1);
            max = max.max(l1);

            is_increasing &= l0 <= l1;
            is_decreasing &= l0 >= l1;

            plan.is_fixed_delta &= current_delta == initial_delta;
            if i > 1 {
                // the first delta travels as a varint; only the rest are
                // bit-packed, so only they count toward the packed width
                self.adjacent_deltas.push(current_delta.wrapping_abs());
                delta_max = delta_max.max(self.adjacent_deltas[i - 1]);
            }
        }

        // subtraction overflow anywhere in the spread rules out every
        // base-reduced form; DIRECT costs less than finding out later
        if max.checked_sub(plan.min).is_none() {
            self.compute_zigzag_literals();
            plan.zz_bits_100p =
                percentile_bits(&self.zigzag_literals, 1.0, &mut self.histogram, false);
            return plan;
        }

        // a constant run longer than a short repeat can hold
        if plan.min == max {
            debug_assert!(plan.is_fixed_delta && current_delta == 0);
            plan.kind = SubEncoding::Delta;
            plan.fixed_delta = 0;
            return plan;
        }

        if plan.is_fixed_delta {
            plan.kind = SubEncoding::Delta;
            plan.fixed_delta = current_delta;
            return plan;
        }

        self.compute_zigzag_literals();
        plan.zz_bits_100p = percentile_bits(&self.zigzag_literals, 1.0, &mut self.histogram, false);
        plan.zz_bits_90p = percentile_bits(&self.zigzag_literals, 0.9, &mut self.histogram, true);

        // no outliers: everything already fits the common width
        if plan.zz_bits_100p == plan.zz_bits_90p {
            return plan;
        }

        // an initial delta of zero leaves the run's direction ambiguous, and
        // a sign flip anywhere cannot be expressed on the wire
        if initial_delta != 0 && (is_increasing || is_decreasing) {
            plan.bits_delta_max = find_closest_num_bits(delta_max);
            if plan.bits_delta_max <= plan.zz_bits_90p {
                plan.kind = SubEncoding::Delta;
                return plan;
            }
        }

        // the sign-magnitude base must fit eight bytes
        if plan.zz_bits_100p - plan.zz_bits_90p > 1 && plan.min.unsigned_abs() < 1 << 56 {
            self.base_reduced_literals.clear();
            for &value in &self.literals {
                self.base_reduced_literals.push(value - plan.min);
            }
            plan.br_bits_95p =
                percentile_bits(&self.base_reduced_literals, 0.95, &mut self.histogram, false);
            plan.br_bits_100p =
                percentile_bits(&self.base_reduced_literals, 1.0, &mut self.histogram, true);

            // patching pays off only if base reduction still leaves outliers
            if plan.br_bits_100p != plan.br_bits_95p {
                plan.kind = SubEncoding::PatchedBase;
                self.prepare_patched_blob(&mut plan);
                return plan;
            }
        }
        plan
    }

    fn compute_zigzag_literals(&mut self) {
        self.zigzag_literals.clear();
        if self.signed {
            for &value in &self.literals {
                self.zigzag_literals.push(zigzag_encode(value) as i64);
            }
        } else {
            self.zigzag_literals.extend_from_slice(&self.literals);
        }
    }

    /// Strip the high bits off the outliers among the base-reduced literals
    /// and build the (gap, patch) list carrying them.
    fn prepare_patched_blob(&mut self, plan: &mut BlockPlan) {
        let mut mask = (1i64 << plan.br_bits_95p) - 1;

        plan.patch_width = closest_fixed_bits(plan.br_bits_100p - plan.br_bits_95p);
        if plan.patch_width == 64 {
            // gap and patch must share one 64-bit entry
            plan.patch_width = 56;
            plan.br_bits_95p = 8;
            mask = (1i64 << plan.br_bits_95p) - 1;
        }

        let mut gaps: Vec<u64> = Vec::new();
        let mut patches: Vec<u64> = Vec::new();
        let mut prev = 0usize;
        let mut max_gap = 0usize;
        for i in 0..self.base_reduced_literals.len() {
            if self.base_reduced_literals[i] > mask {
                let gap = i - prev;
                max_gap = max_gap.max(gap);
                prev = i;
                gaps.push(gap as u64);
                patches.push((self.base_reduced_literals[i] >> plan.br_bits_95p) as u64);
                self.base_reduced_literals[i] &= mask;
            }
        }

        // a lone patch at index zero still needs one bit for its gap
        plan.patch_gap_width = if max_gap == 0 && !gaps.is_empty() {
            1
        } else {
            find_closest_num_bits(max_gap as i64)
        };
        if plan.patch_gap_width > 8 {
            // the header has three bits for the gap width; wider gaps split
            // into (255, 0) filler entries instead
            plan.patch_gap_width = 8;
        }

        self.gap_patch_list.clear();
        for (&gap, &patch) in gaps.iter().zip(&patches) {
            let mut gap = gap;
            while gap > 255 {
                // a real patch is never zero, so (255, 0) is unambiguous
                self.gap_patch_list.push((255u64 << plan.patch_width) as i64);
                gap -= 255;
            }
            self.gap_patch_list
                .push(((gap << plan.patch_width) | patch) as i64);
        }
        plan.patch_length = self.gap_patch_list.len() as u32;
    }

    fn write_values(&mut self, plan: &BlockPlan) {
        if self.literals.is_empty() {
            return;
        }
        match plan.kind {
            SubEncoding::ShortRepeat => self.write_short_repeat_values(),
            SubEncoding::Direct => self.write_direct_values(plan),
            SubEncoding::PatchedBase => self.write_patched_base_values(plan),
            SubEncoding::Delta => self.write_delta_values(plan),
        }
        self.literals.clear();
        self.prev_delta = 0;
    }

    fn write_short_repeat_values(&mut self) {
        let repeat_value = if self.signed {
            zigzag_encode(self.literals[0])
        } else {
            self.literals[0] as u64
        };

        let repeat_bits = find_closest_num_bits(repeat_value as i64);
        let repeat_bytes = if repeat_bits % 8 == 0 {
            repeat_bits / 8
        } else {
            repeat_bits / 8 + 1
        };

        self.fixed_run_length -= MIN_REPEAT as u32;
        let header = SubEncoding::ShortRepeat.opcode()
            | ((repeat_bytes - 1) << 3) as u8
            | self.fixed_run_length as u8;
        self.sink.write_byte(header);

        for i in (0..repeat_bytes).rev() {
            self.sink.write_byte((repeat_value >> (i * 8)) as u8);
        }

        self.fixed_run_length = 0;
    }

    fn write_direct_values(&mut self, plan: &BlockPlan) {
        let mut width = plan.zz_bits_100p;
        if self.aligned_bit_packing {
            width = closest_aligned_fixed_bits(width);
        }
        let encoded_width = encode_bit_width(width) << 1;

        // stored run lengths are one off
        self.variable_run_length -= 1;
        let tail_bit = ((self.variable_run_length & 0x100) >> 8) as u8;

        self.sink
            .write_byte(SubEncoding::Direct.opcode() | encoded_width as u8 | tail_bit);
        self.sink.write_byte((self.variable_run_length & 0xff) as u8);

        write_ints(&mut self.sink, &self.zigzag_literals, width);

        self.variable_run_length = 0;
    }

    fn write_patched_base_values(&mut self, plan: &BlockPlan) {
        // Aligned packing never applies here: the patch is spliced back with
        // a shift of exactly br_bits_95p, so the packed width must match it.
        let encoded_width = encode_bit_width(plan.br_bits_95p) << 1;

        self.variable_run_length -= 1;
        let tail_bit = ((self.variable_run_length & 0x100) >> 8) as u8;

        let first = SubEncoding::PatchedBase.opcode() | encoded_width as u8 | tail_bit;
        let second = (self.variable_run_length & 0xff) as u8;

        // sign-magnitude base: high bit of the leading byte carries the sign
        let negative = plan.min < 0;
        let magnitude = plan.min.unsigned_abs();
        let base_width = find_closest_num_bits(magnitude as i64) + 1;
        let base_bytes = if base_width % 8 == 0 {
            base_width / 8
        } else {
            base_width / 8 + 1
        };
        let mut base = magnitude;
        if negative {
            base |= 1 << (base_bytes * 8 - 1);
        }

        let third = (((base_bytes - 1) << 5) | encode_bit_width(plan.patch_width)) as u8;
        let fourth = (((plan.patch_gap_width - 1) << 5) | plan.patch_length) as u8;

        self.sink.write_byte(first);
        self.sink.write_byte(second);
        self.sink.write_byte(third);
        self.sink.write_byte(fourth);
        for i in (0..base_bytes).rev() {
            self.sink.write_byte((base >> (i * 8)) as u8);
        }

        write_ints(
            &mut self.sink,
            &self.base_reduced_literals,
            closest_fixed_bits(plan.br_bits_95p),
        );
        write_ints(
            &mut self.sink,
            &self.gap_patch_list,
            closest_fixed_bits(plan.patch_gap_width + plan.patch_width),
        );

        self.variable_run_length = 0;
    }

    fn write_delta_values(&mut self, plan: &BlockPlan) {
        let mut width = plan.bits_delta_max;
        if self.aligned_bit_packing {
            width = closest_aligned_fixed_bits(width);
        }

        let len;
        let mut encoded_width = 0u32;
        if plan.is_fixed_delta {
            if self.fixed_run_length > MIN_REPEAT as u32 {
                // a plain repeat too long for SHORT_REPEAT
                len = self.fixed_run_length - 1;
                self.fixed_run_length = 0;
            } else {
                // a constant-delta sequence out of the variable buffer
                len = self.variable_run_length - 1;
                self.variable_run_length = 0;
            }
        } else {
            // width index zero marks fixed delta, so one-bit deltas pack at two
            if width == 1 {
                width = 2;
            }
            encoded_width = encode_bit_width(width) << 1;
            len = self.variable_run_length - 1;
            self.variable_run_length = 0;
        }

        let tail_bit = ((len & 0x100) >> 8) as u8;
        self.sink
            .write_byte(SubEncoding::Delta.opcode() | encoded_width as u8 | tail_bit);
        self.sink.write_byte((len & 0xff) as u8);

        if self.signed {
            write_vslong(&mut self.sink, self.literals[0]);
        } else {
            write_vulong(&mut self.sink, self.literals[0] as u64);
        }

        if plan.is_fixed_delta {
            write_vslong(&mut self.sink, plan.fixed_delta);
        } else {
            // the first delta rides as a varint and carries the run's sign;
            // the remaining deltas are bit-packed magnitudes
            write_vslong(&mut self.sink, self.adjacent_deltas[0]);
            write_ints(&mut self.sink, &self.adjacent_deltas[1..], width);
        }
    }
}

/// Smallest ladder width covering at least `fraction` of `data`, computed
/// from a 32-bucket histogram of per-value widths. `reuse_histogram` skips
/// the rebuild when the previous call binned the same data.
fn percentile_bits(
    data: &[i64],
    fraction: f64,
    histogram: &mut [i64; HIST_LEN],
    reuse_histogram: bool,
) -> u32 {
    if !reuse_histogram {
        histogram.fill(0);
        for &value in data {
            histogram[encode_bit_width(find_closest_num_bits(value)) as usize] += 1;
        }
    }

    let mut allowed = (data.len() as f64 * (1.0 - fraction)) as i64;
    for bucket in (0..HIST_LEN).rev() {
        allowed -= histogram[bucket];
        if allowed < 0 {
            return decode_bit_width(bucket as u32);
        }
    }
    0
}
