//! Schema module - Configuration and scenario types for lattice Boltzmann runs.

mod config;
mod scenario;

pub use config::*;
pub use scenario::*;
