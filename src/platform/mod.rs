// buildtail - platform/mod.rs
//
// Platform abstraction layer: config directory resolution and config.toml
// loading.
// Dependencies: standard library, directories crate, ui (colour mode type).

pub mod config;
