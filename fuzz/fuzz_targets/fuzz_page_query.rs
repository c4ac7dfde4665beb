#![no_main]

use libfuzzer_sys::fuzz_target;
use socckit::{PageLimits, PageRequest};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let limits = PageLimits {
            default_size: 20,
            max_size: 2000,
        };
        if let Ok(request) = PageRequest::from_query(Some(s), limits) {
            assert!(request.size <= limits.max_size);
        }
    }
});
