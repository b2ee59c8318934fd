#![no_main]

use libfuzzer_sys::fuzz_target;
use runpack::{decode, encode};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the mode, the rest packs into values. Runs of equal
    // bytes become runs of equal values, so all four sub-encodings fire.
    let signed = data[0] & 1 == 1;
    let values: Vec<i64> = data[1..]
        .chunks(2)
        .map(|chunk| {
            let lo = i64::from(chunk[0]);
            let hi = chunk.get(1).map_or(0, |&b| i64::from(b));
            // spread a few values far out to trigger patching
            if hi == 0xff {
                (lo << 40) | (lo << 13)
            } else {
                (hi << 8 | lo) - 0x8000
            }
        })
        .collect();

    let bytes = encode(&values, signed).expect("encode cannot fail on a vec sink");
    let decoded = decode(&bytes, values.len(), signed).expect("own output must decode");
    assert_eq!(decoded, values, "round trip mismatch");
});
