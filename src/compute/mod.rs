//! Compute module - Numerical kernels for the D2Q9 lattice Boltzmann method.

mod boundary;
mod collision;
mod diagnostics;
mod equilibrium;
mod force;
mod lattice;
mod moments;
mod propagator;
mod real;
mod state;
mod streaming;
mod vorticity;

pub use boundary::*;
pub use collision::*;
pub use diagnostics::*;
pub use equilibrium::*;
pub use force::*;
pub use lattice::*;
pub use moments::*;
pub use propagator::*;
pub use real::*;
pub use state::*;
pub use streaming::*;
pub use vorticity::*;
