// ThreatLog - platform/mod.rs
//
// Platform abstraction layer: config directories and file I/O.
// Dependencies: standard library, directories, memmap2, toml.
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;
