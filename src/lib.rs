// ThreatLog - lib.rs
//
// Library entry point. The `tla` binary in `main.rs` is a thin front end
// over these modules; integration tests drive them directly.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
