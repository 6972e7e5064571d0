// ThreatLog - app/mod.rs
//
// Application layer: rule source resolution and run orchestration.
// Dependencies: core, platform, util.

pub mod analysis;
pub mod rule_mgr;
