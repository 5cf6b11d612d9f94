#![no_main]

use convgen_types::{RawType, TypeArena};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        // Fuzz the parser
        if let Ok(raw) = RawType::parse(s) {
            // If parsing succeeds, classification must not panic either
            let mut types = TypeArena::new();
            let _ = types.classify(&raw);
        }
    }
});
