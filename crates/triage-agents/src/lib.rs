//! # Triage Agents
//!
//! The evidence-gathering layer of OpsTriage: backend connectors,
//! per-source evidence adapters and the orchestrator that runs them as a
//! sequential pipeline, merges their bundles and produces the resolution
//! report and the incident chat stream.

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod adapters;
pub mod connectors;
pub mod data;
pub mod orchestrator;

pub use orchestrator::{Orchestrator, PipelineStats, ResolutionReport};
