#![no_main]

use libfuzzer_sys::fuzz_target;
use pflog::config::FilterConfig;
use pflog::filter::{StreamKind, MAX_FILTERS, MAX_FILTER_NAME_LEN};

fuzz_target!(|data: &[u8]| {
    // Split the input into the three sources; parsing must never panic
    // and must keep the registry within its bounds.
    let mut parts = data.splitn(3, |&b| b == 0);
    let config = FilterConfig {
        combined: parts.next().map(<[u8]>::to_vec),
        stdout: parts.next().map(<[u8]>::to_vec),
        stderr: parts.next().map(<[u8]>::to_vec),
    };
    let registry = config.build_registry();

    for stream in [StreamKind::Stdout, StreamKind::Stderr] {
        assert!(registry.count(stream) <= MAX_FILTERS);
        assert!(registry.list(stream).iter().all(|n| n.len() <= MAX_FILTER_NAME_LEN));
    }
});
