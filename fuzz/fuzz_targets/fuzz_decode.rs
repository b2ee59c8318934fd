#![no_main]

use libfuzzer_sys::fuzz_target;
use runpack::{Decoder, SliceInput};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode or fail cleanly, never panic. Exercise
    // both signed modes and a skip-heavy path.
    for signed in [false, true] {
        let mut decoder = Decoder::new(SliceInput::new(data), signed);
        let mut out = [0i64; 777];
        let _ = decoder.next(&mut out, None);

        let mut decoder = Decoder::new(SliceInput::new(data), signed);
        let _ = decoder.skip(2048);
    }
});
