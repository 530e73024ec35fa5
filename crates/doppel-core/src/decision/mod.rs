//! Decision simulation.

pub mod simulator;

pub use simulator::DecisionSimulator;
