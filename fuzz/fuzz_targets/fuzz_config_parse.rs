//! Fuzz target: ChainConfig TOML parsing robustness
//!
//! Feeds arbitrary bytes to the config parser. Malformed input must be
//! rejected gracefully, never panic, and accepted configs must validate.
//!
//! Run: cargo +nightly fuzz run fuzz_config_parse

#![no_main]
use auction_chain::config::ChainConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = toml::from_str::<ChainConfig>(text) {
            // Whatever parsed must be safely validatable and re-encodable.
            let _ = config.validate();
            let _ = toml::to_string(&config);
        }
    }
});
