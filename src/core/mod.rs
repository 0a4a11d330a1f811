// buildtail - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library and the regex engine only.
// Must NOT depend on: ui, platform, app, or any I/O directly.

pub mod classify;
pub mod model;
