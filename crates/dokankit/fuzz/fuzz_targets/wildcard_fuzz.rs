//! Fuzz target for the wildcard matcher
//!
//! The input is split at the first newline into a pattern and a name. The
//! matcher backtracks, so this target looks for panics and runaway inputs.
//!
//! Run with: cargo +nightly fuzz run wildcard_fuzz -- -max_total_time=300

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 1024 {
        return;
    }
    let (pattern, name) = input.split_once('\n').unwrap_or((input, ""));

    let sensitive = dokankit::matches(Some(name), Some(pattern), true);
    let insensitive = dokankit::matches(Some(name), Some(pattern), false);
    // Ignoring case can only widen the match.
    assert!(!sensitive || insensitive);
});
