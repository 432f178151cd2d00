#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed input must produce an error or a partial forest, never a panic.
    let _ = icboost::persist::binary::from_bytes(data);
});
