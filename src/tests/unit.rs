use crate::{
    decode, encode, Decoder, Encoder, Error, SliceInput, StreamPosition, SubEncoding,
};

fn decode_signed(bytes: &[u8], count: usize) -> Vec<i64> {
    decode(bytes, count, true).unwrap()
}

#[test]
fn test_short_repeat_wire_bytes() {
    // five sevens: one SHORT_REPEAT block, one value byte, zig-zag of 7
    let bytes = encode(&[7, 7, 7, 7, 7], true).unwrap();
    assert_eq!(bytes, [0x02, 0x0e]);
    assert_eq!(decode_signed(&bytes, 5), [7; 5]);
}

#[test]
fn test_short_repeat_wire_bytes_unsigned() {
    // the ORC reference stream for five 10000s
    let bytes = encode(&[10000, 10000, 10000, 10000, 10000], false).unwrap();
    assert_eq!(bytes, [0x0a, 0x27, 0x10]);
    assert_eq!(decode(&bytes, 5, false).unwrap(), [10000; 5]);
}

#[test]
fn test_direct_wire_bytes_unsigned() {
    // the ORC reference stream for four 16-bit values
    let values = [23713, 43806, 57005, 48879];
    let bytes = encode(&values, false).unwrap();
    assert_eq!(
        bytes,
        [0x5e, 0x03, 0x5c, 0xa1, 0xab, 0x1e, 0xde, 0xad, 0xbe, 0xef]
    );
    assert_eq!(decode(&bytes, 4, false).unwrap(), values);
}

#[test]
fn test_direct_outlier_width_unaligned() {
    // zig-zag of 1000000 needs 21 bits; the deltas are wider than the
    // values' 90th percentile, so the outlier forces DIRECT at 21 bits
    let values = [1, 2, 3, 1_000_000];
    let mut encoder = Encoder::with_options(Vec::new(), true, false);
    encoder.write_all(&values);
    encoder.flush().unwrap();
    let bytes = encoder.into_sink();

    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::Direct);
    assert_eq!(crate::decode_bit_width(u32::from(bytes[0] >> 1) & 0x1f), 21);
    assert_eq!(decode_signed(&bytes, 4), values);
}

#[test]
fn test_direct_outlier_width_aligned_rounds_to_bytes() {
    let values = [1, 2, 3, 1_000_000];
    let bytes = encode(&values, true).unwrap();
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::Direct);
    assert_eq!(crate::decode_bit_width(u32::from(bytes[0] >> 1) & 0x1f), 24);
    assert_eq!(decode_signed(&bytes, 4), values);
}

#[test]
fn test_fixed_delta_wire_bytes() {
    // constant step of 10: two varints and no payload
    let values = [100, 110, 120, 130, 140];
    let bytes = encode(&values, true).unwrap();
    assert_eq!(bytes, [0xc0, 0x04, 0xc8, 0x01, 0x14]);
    assert_eq!(decode_signed(&bytes, 5), values);
}

#[test]
fn test_variable_delta_wire_bytes() {
    // primes: monotone, deltas much narrower than the values
    let values = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    let bytes = encode(&values, true).unwrap();
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::Delta);
    // packed delta width is never stored as index zero
    assert!((bytes[0] >> 1) & 0x1f >= 1);
    assert_eq!(
        bytes,
        [0xc6, 0x0b, 0x04, 0x02, 0x22, 0x42, 0x42, 0x46, 0x26]
    );
    assert_eq!(decode_signed(&bytes, 12), values);
}

#[test]
fn test_delta_decreasing_run() {
    let values: Vec<i64> = vec![500, 460, 450, 420, 400, 376, 351, 350, 310, 300];
    let bytes = encode(&values, true).unwrap();
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::Delta);
    assert_eq!(decode_signed(&bytes, values.len()), values);
}

#[test]
fn test_delta_reference_vector_decodes() {
    let bytes = [0xc6, 0x09, 0x02, 0x02, 0x22, 0x42, 0x42, 0x46];
    assert_eq!(
        decode(&bytes, 10, false).unwrap(),
        [2, 3, 5, 7, 11, 13, 17, 19, 23, 29]
    );
}

#[test]
fn test_patched_base_selection() {
    // a tight cluster with one huge outlier: direct packing would cost 26
    // bits per value, base reduction plus one patch keeps it at 4
    let mut values: Vec<i64> = (0..100).map(|i| 10 + (i % 10)).collect();
    values.push(10_000_000);
    let bytes = encode(&values, true).unwrap();
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::PatchedBase);
    assert_eq!(decode_signed(&bytes, values.len()), values);
}

#[test]
fn test_patched_base_outlier_first() {
    let mut values: Vec<i64> = vec![10_000_000];
    values.extend((0..100).map(|i| 10 + (i % 10)));
    let bytes = encode(&values, true).unwrap();
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::PatchedBase);
    assert_eq!(decode_signed(&bytes, values.len()), values);
}

#[test]
fn test_patched_base_negative_base() {
    // negative minimum exercises the sign-magnitude base bytes
    let mut values: Vec<i64> = (0..100).map(|i| -50 + (i % 7)).collect();
    values.push(9_999_999);
    values.push(-50);
    let bytes = encode(&values, true).unwrap();
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::PatchedBase);
    assert_eq!(decode_signed(&bytes, values.len()), values);
}

#[test]
fn test_patched_base_multiple_patches() {
    let mut values: Vec<i64> = (0..400).map(|i| 100 + (i % 50)).collect();
    values[13] = 1 << 30;
    values[200] = 1 << 31;
    values[399] = (1 << 30) + 7;
    let bytes = encode(&values, true).unwrap();
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::PatchedBase);
    assert_eq!(decode_signed(&bytes, values.len()), values);
}

#[test]
fn test_patched_base_wide_gap_uses_filler_entries() {
    // outliers 300 apart force a (255, 0) filler in the patch list
    let mut values: Vec<i64> = (0..500).map(|i| 1 + (i % 3)).collect();
    values[10] = 1 << 25;
    values[450] = 1 << 26;
    let bytes = encode(&values, true).unwrap();
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::PatchedBase);
    assert_eq!(decode_signed(&bytes, values.len()), values);
}

#[test]
fn test_nulls_consume_nothing() {
    let bytes = encode(&[5, 5, 5, 5, 5], true).unwrap();
    let mut decoder = Decoder::new(SliceInput::new(&bytes), true);
    let not_null = [true, false, true, true, false, true, true];
    let mut out = [99i64; 7];
    decoder.next(&mut out, Some(&not_null)).unwrap();
    assert_eq!(out, [5, 99, 5, 5, 99, 5, 5]);
}

#[test]
fn test_nulls_across_sub_encodings() {
    let mut values: Vec<i64> = Vec::new();
    values.extend([42; 6]); // short repeat
    values.extend([3, 1, 4, 1, 5, 9, 2, 6]); // direct
    values.extend((0..20).map(|i| 1000 + 25 * i)); // delta
    let bytes = encode(&values, true).unwrap();

    // every odd output slot is null
    let n = values.len() * 2;
    let not_null: Vec<bool> = (0..n).map(|i| i % 2 == 0).collect();
    let mut out = vec![-1i64; n];
    let mut decoder = Decoder::new(SliceInput::new(&bytes), true);
    decoder.next(&mut out, Some(&not_null)).unwrap();
    for (i, slot) in out.iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(*slot, values[i / 2], "slot {i}");
        } else {
            assert_eq!(*slot, -1, "slot {i} should be untouched");
        }
    }
}

#[test]
fn test_leading_nulls_only_batch() {
    let bytes = encode(&[1, 2, 3], true).unwrap();
    let mut decoder = Decoder::new(SliceInput::new(&bytes), true);
    let mut out = [7i64; 4];
    // an all-null batch must not touch the stream at all
    decoder.next(&mut out, Some(&[false; 4])).unwrap();
    assert_eq!(out, [7; 4]);
    let mut rest = [0i64; 3];
    decoder.next(&mut rest, None).unwrap();
    assert_eq!(rest, [1, 2, 3]);
}

#[test]
fn test_flush_is_idempotent() {
    let mut encoder = Encoder::new(Vec::new(), true);
    encoder.write_all(&[9, 12, 1, 4, 4, 4, 4, 4]);
    let first = encoder.flush().unwrap();
    let second = encoder.flush().unwrap();
    assert_eq!(first, second);
    assert_eq!(encoder.sink().len() as u64, first);
}

#[test]
fn test_repeat_breaking_a_variable_run() {
    // the trailing repeat flushes the varied prefix as its own block
    let values = [9, 12, 1, 4, 7, 7, 7, 7, 7, 7, 2, 8];
    let bytes = encode(&values, true).unwrap();
    assert_eq!(decode_signed(&bytes, values.len()), values);
    // prefix block is DIRECT, and the repeat became a SHORT_REPEAT block
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::Direct);
}

#[test]
fn test_long_fixed_run_spans_blocks() {
    let values = vec![-3i64; 600];
    let bytes = encode(&values, true).unwrap();
    // 512-value DELTA block, then the 88 remaining as a second DELTA block
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::Delta);
    assert_eq!(decode_signed(&bytes, 600), values);
}

#[test]
fn test_full_variable_block_boundary() {
    let values: Vec<i64> = (0..1000).map(|i| (i * 37) % 1009 - 500).collect();
    let bytes = encode(&values, true).unwrap();
    assert_eq!(decode_signed(&bytes, 1000), values);
}

#[test]
fn test_partial_reads_across_one_run() {
    let values: Vec<i64> = (0..50).map(|i| 10 * i).collect();
    let bytes = encode(&values, true).unwrap();
    let mut decoder = Decoder::new(SliceInput::new(&bytes), true);
    let mut out = Vec::new();
    let mut chunk = [0i64; 7];
    let mut remaining = 50usize;
    while remaining > 0 {
        let step = remaining.min(chunk.len());
        decoder.next(&mut chunk[..step], None).unwrap();
        out.extend_from_slice(&chunk[..step]);
        remaining -= step;
    }
    assert_eq!(out, values);
}

#[test]
fn test_skip_matches_sequential_read() {
    let mut values: Vec<i64> = (0..300).map(|i| (i * i) % 977).collect();
    values.extend([8; 40]);
    values.push(1 << 40);
    let bytes = encode(&values, true).unwrap();

    let mut reference = Decoder::new(SliceInput::new(&bytes), true);
    let mut all = vec![0i64; values.len()];
    reference.next(&mut all, None).unwrap();

    let mut skipper = Decoder::new(SliceInput::new(&bytes), true);
    let mut head = vec![0i64; 100];
    skipper.next(&mut head, None).unwrap();
    skipper.skip(141).unwrap();
    let mut tail = vec![0i64; values.len() - 241];
    skipper.next(&mut tail, None).unwrap();

    assert_eq!(head, all[..100]);
    assert_eq!(tail, all[241..]);
}

#[test]
fn test_skip_through_patched_run_keeps_patches_aligned() {
    let mut values: Vec<i64> = (0..200).map(|i| 5 + (i % 4)).collect();
    values[50] = 1 << 20;
    values[150] = 1 << 21;
    let bytes = encode(&values, true).unwrap();

    let mut decoder = Decoder::new(SliceInput::new(&bytes), true);
    decoder.skip(151).unwrap();
    let mut tail = vec![0i64; 49];
    decoder.next(&mut tail, None).unwrap();
    assert_eq!(tail, values[151..]);
}

#[test]
fn test_seek_to_recorded_positions() {
    let values: Vec<i64> = (0..400).map(|i| (i * 13) % 257).collect();
    let mut encoder = Encoder::new(Vec::new(), true);
    let mut positions = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if i % 50 == 0 {
            positions.push((i, encoder.position()));
        }
        encoder.write(v);
    }
    encoder.flush().unwrap();
    let bytes = encoder.into_sink();

    for (logical, position) in positions {
        let mut decoder = Decoder::new(SliceInput::new(&bytes), true);
        decoder.seek(position).unwrap();
        let mut tail = vec![0i64; values.len() - logical];
        decoder.next(&mut tail, None).unwrap();
        assert_eq!(tail, values[logical..], "seek to value {logical}");
    }
}

#[test]
fn test_seek_back_after_reading_ahead() {
    let values: Vec<i64> = (0..100).map(|i| i * 3).collect();
    let bytes = encode(&values, true).unwrap();
    let mut decoder = Decoder::new(SliceInput::new(&bytes), true);
    let mut out = vec![0i64; 100];
    decoder.next(&mut out, None).unwrap();

    decoder.seek(StreamPosition::default()).unwrap();
    let mut again = vec![0i64; 100];
    decoder.next(&mut again, None).unwrap();
    assert_eq!(again, values);
}

#[test]
fn test_seek_past_end_is_out_of_range() {
    let bytes = encode(&[1, 2, 3], true).unwrap();
    let mut decoder = Decoder::new(SliceInput::new(&bytes), true);
    let position = StreamPosition {
        byte_offset: bytes.len() as u64 + 1,
        values_to_skip: 0,
    };
    assert_eq!(
        decoder.seek(position),
        Err(Error::OutOfRange {
            offset: bytes.len() as u64 + 1,
            len: bytes.len() as u64,
        })
    );
}

#[test]
fn test_unsigned_values_with_high_bit() {
    let values = [u64::MAX as i64, 0, u64::MAX as i64, 1, (1u64 << 63) as i64];
    let bytes = encode(&values, false).unwrap();
    assert_eq!(decode(&bytes, values.len(), false).unwrap(), values);
}

#[test]
fn test_extreme_signed_values() {
    let values = [i64::MIN, i64::MAX, 0, -1, i64::MIN, i64::MAX, 12, -12];
    let bytes = encode(&values, true).unwrap();
    assert_eq!(decode_signed(&bytes, values.len()), values);
}

#[test]
fn test_single_value_stream() {
    let bytes = encode(&[-42], true).unwrap();
    assert_eq!(SubEncoding::from_header(bytes[0]), SubEncoding::Direct);
    assert_eq!(decode_signed(&bytes, 1), [-42]);
}

#[test]
fn test_empty_stream() {
    let bytes = encode(&[], true).unwrap();
    assert!(bytes.is_empty());
    assert!(decode(&bytes, 0, true).unwrap().is_empty());
}

#[test]
fn test_reading_past_the_stream_fails() {
    let bytes = encode(&[1, 2, 3], true).unwrap();
    let mut out = [0i64; 4];
    let mut decoder = Decoder::new(SliceInput::new(&bytes), true);
    assert!(matches!(decoder.next(&mut out, None), Err(Error::Parse(_))));
}

#[test]
fn test_patched_base_long_reference_vector() {
    // signed PATCHED_BASE stream produced by the ORC Java writer
    let bytes = vec![
        144u8, 109, 4, 164, 141, 16, 131, 194, 0, 240, 112, 64, 60, 84, 24, 3, 193, 201, 128,
        120, 60, 33, 4, 244, 3, 193, 192, 224, 128, 56, 32, 15, 22, 131, 129, 225, 0, 112, 84,
        86, 14, 8, 106, 193, 192, 228, 160, 64, 32, 14, 213, 131, 193, 192, 240, 121, 124, 30,
        18, 9, 132, 67, 0, 224, 120, 60, 28, 14, 32, 132, 65, 192, 240, 160, 56, 61, 91, 7, 3,
        193, 192, 240, 120, 76, 29, 23, 7, 3, 220, 192, 240, 152, 60, 52, 15, 7, 131, 129, 225,
        0, 144, 56, 30, 14, 44, 140, 129, 194, 224, 120, 0, 28, 15, 8, 6, 129, 198, 144, 128,
        104, 36, 27, 11, 38, 131, 33, 48, 224, 152, 60, 111, 6, 183, 3, 112, 0, 1, 78, 5, 46,
        2, 1, 1, 141, 3, 1, 1, 138, 22, 0, 65, 1, 4, 0, 225, 16, 209, 192, 4, 16, 8, 36, 16, 3,
        48, 1, 3, 13, 33, 0, 176, 0, 1, 94, 18, 0, 68, 0, 33, 1, 143, 0, 1, 7, 93, 0, 25, 0, 5,
        0, 2, 0, 4, 0, 1, 0, 1, 0, 2, 0, 16, 0, 1, 11, 150, 0, 3, 0, 1, 0, 1, 99, 157, 0, 1,
        140, 54, 0, 162, 1, 130, 0, 16, 112, 67, 66, 0, 2, 4, 0, 0, 224, 0, 1, 0, 16, 64, 16,
        91, 198, 1, 2, 0, 32, 144, 64, 0, 12, 2, 8, 24, 0, 64, 0, 1, 0, 0, 8, 48, 51, 128, 0,
        2, 12, 16, 32, 32, 71, 128, 19, 76,
    ];
    let expected = vec![
        20i64, 2, 3, 2, 1, 3, 17, 71, 35, 2, 1, 139, 2, 2, 3, 1783, 475, 2, 1, 1, 3, 1, 3, 2,
        32, 1, 2, 3, 1, 8, 30, 1, 3, 414, 1, 1, 135, 3, 3, 1, 414, 2, 1, 2, 2, 594, 2, 5, 6, 4,
        11, 1, 2, 2, 1, 1, 52, 4, 1, 2, 7, 1, 17, 334, 1, 2, 1, 2, 2, 6, 1, 266, 1, 2, 217, 2,
        6, 2, 13, 2, 2, 1, 2, 3, 5, 1, 2, 1, 7244, 11813, 1, 33, 2, -13, 1, 2, 3, 13, 1, 92, 3,
        13, 5, 14, 9, 141, 12, 6, 15, 25, -1, -1, -1, 23, 1, -1, -1, -71, -2, -1, -1, -1, -1,
        2, 1, 4, 34, 5, 78, 8, 1, 2, 2, 1, 9, 10, 2, 1, 4, 13, 1, 5, 4, 4, 19, 5, -1, -1, -1,
        34, -17, -200, -1, -943, -13, -3, 1, 2, -1, -1, 1, 8, -1, 1483, -2, -1, -1, -12751, -1,
        -1, -1, 66, 1, 3, 8, 131, 14, 5, 1, 2, 2, 1, 1, 8, 1, 1, 2, 1, 5, 9, 2, 3, 112, 13, 2,
        2, 1, 5, 10, 3, 1, 1, 13, 2, 3, 4, 1, 3, 1, 1, 2, 1, 1, 2, 4, 2, 207, 1, 1, 2, 4, 3, 3,
        2, 2, 16,
    ];
    assert_eq!(decode_signed(&bytes, expected.len()), expected);
}

#[test]
fn test_round_trip_of_long_reference_values() {
    // re-encoding the reference values must still round-trip, whatever
    // blocks our own writer picks for them
    let values = [
        20i64, 2, 3, 2, 1, 3, 17, 71, 35, 2, 1, 139, 2, 2, 3, 1783, 475, 2, 1, 1, 3, 1, 3, 2,
        32, 1, 2, 3, 1, 8, 30, 1, 3, 414, 1, 1, 135, 3, 3, 1, 414, 2, 1, 2, 2, 594, -943, -13,
        -3, 1, 2, -1, -1, 1, 8, -1, 1483, -2, -1, -1, -12751, -1, -1, -1, 66,
    ];
    let bytes = encode(&values, true).unwrap();
    assert_eq!(decode_signed(&bytes, values.len()), values);
}
