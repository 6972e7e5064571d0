// ThreatLog - core/mod.rs
//
// Core analysis layer: extraction, timestamp resolution, rule evaluation,
// aggregation and rendering.
// Dependencies: regex, chrono, serde, rayon, csv.
// Must NOT depend on: app, platform, or read files directly.

pub mod export;
pub mod filter;
pub mod model;
pub mod parser;
pub mod report;
pub mod rules;
pub mod timestamp;
