#![no_main]
//! Fuzz target for config TOML parsing
//!
//! Feeds random bytes as TOML to the config parser to find panics,
//! hangs, or unexpected behavior in deserialization and validation.

use libfuzzer_sys::fuzz_target;

use windowsim::config::Config;
use windowsim::PlatformFactory;

fuzz_target!(|data: &[u8]| {
    // Try parsing as TOML config - must never panic
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = toml::from_str::<Config>(s) {
            // Validation and factory construction must agree
            match PlatformFactory::from_config(&config) {
                Ok(factory) => {
                    assert!(config.validate().is_ok());
                    let _ = factory.create_window();
                }
                Err(_) => assert!(config.validate().is_err()),
            }
        }
    }
});
