#![no_main]

use libfuzzer_sys::fuzz_target;

use conciliador::core::normalize_uuid;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let once = normalize_uuid(s);
        // Normalization is idempotent.
        assert_eq!(normalize_uuid(&once), once);
    }
});
