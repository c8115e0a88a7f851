// Library root: scoring, role classification and constrained team selection
// for fantasy cricket elevens. The binary crate and the integration tests use
// the modules below directly.

pub mod captain;
pub mod config;
pub mod lineup;
pub mod pipeline;
pub mod player;
pub mod registry;
pub mod role;
pub mod roster;
pub mod scoring;
pub mod selection;
pub mod stats;
