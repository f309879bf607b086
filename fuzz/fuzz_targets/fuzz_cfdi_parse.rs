#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;

use conciliador::cfdi::{SourceContext, extract_invoice};
use conciliador::core::RunConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let ctx = SourceContext {
            employee: "Ana",
            source_month: "Enero",
            source_path: Path::new("fuzz.xml"),
        };
        // Must not panic — errors are fine, panics are bugs.
        let _ = extract_invoice(s, ctx, &RunConfig::default());
    }
});
