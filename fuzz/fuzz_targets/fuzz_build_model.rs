#![no_main]

use costflow::document::{build_model, Document};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // build_model must never panic on arbitrary (even structurally valid
    // YAML) documents: malformed models should surface as EngineError.
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(doc) = serde_yaml::from_str::<Document>(text) {
            let _ = build_model(doc);
        }
    }
});
