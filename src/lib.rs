//! Option strategy synthesis: turn a market view (free text or a numeric
//! analysis signal) into a concrete option structure with parameters,
//! payoff, risk metrics and a delta-one equivalent stock position.

pub mod catalog;
pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod hedge;
pub mod intent;
pub mod journal;
pub mod matcher;
pub mod payoff;
pub mod risk;
pub mod synth;
pub mod types;
pub mod utils;
