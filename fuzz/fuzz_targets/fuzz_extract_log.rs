#![no_main]

use libfuzzer_sys::fuzz_target;
use texmill_engine::diagnostics;

fuzz_target!(|data: &[u8]| {
    let excerpt = diagnostics::extract(data);

    // Extraction is idempotent and never grows a log that has an error.
    assert_eq!(diagnostics::extract(&excerpt), excerpt);
    if data.split(|&b| b == b'\n').any(|line| line.starts_with(b"!")) {
        assert!(excerpt.starts_with(b"!"));
        assert!(excerpt.len() <= data.len() + 1);
    }
});
