//! Lattice Flow - Two-dimensional lattice Boltzmann flow solver.
//!
//! This crate implements the D2Q9 lattice Boltzmann method with a BGK
//! collision operator, full-way bounce-back walls, moving lids and Zou-He
//! inlet/outlet edges. Diagnostics cover vorticity snapshots, a velocity
//! probe and momentum-exchange forces on embedded obstacles.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, scenarios and validation
//! - `compute`: Numerical kernels, diagnostics and the solver time loop
//!
//! # Example
//!
//! ```rust,no_run
//! use lattice_flow::{
//!     compute::{RunStatus, Solver},
//!     schema::SimulationConfig,
//! };
//!
//! // Lid-driven cavity at Re = 1000
//! let config = SimulationConfig::cavity(128, 128, 0.5384, 0.1);
//!
//! let mut solver = Solver::<f64>::new(config).expect("valid config");
//! assert_eq!(solver.run(), RunStatus::Completed);
//!
//! let report = solver.finish();
//! println!("Max speed after {} steps: {}", report.steps, report.stats.max_speed);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{FlowStats, RunReport, RunStatus, SimulationState, Solver, run_simulation};
pub use schema::{Scenario, SimulationConfig};
