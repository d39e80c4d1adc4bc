//! Fuzz target for path normalization
//!
//! Every raw path from the driver passes through the normalizer, so it must
//! never panic, must be idempotent on its own output, and must never emit a
//! `..` segment or a backslash.
//!
//! Run with: cargo +nightly fuzz run path_fuzz -- -max_total_time=300

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 4096 {
        return;
    }

    if let Ok(path) = dokankit::normalize(input) {
        let again = dokankit::normalize(path.as_str());
        assert_eq!(again.as_ref(), Ok(&path), "not idempotent for {input:?}");
        assert!(!path.as_str().contains('\\'));
        assert!(path.as_str().split('/').all(|segment| segment != ".."));
    }
    let _ = dokankit::normalize_directory(input);
});
