//! Boundary condition kernels.
//!
//! All kernels act on `f_in` after streaming and before moment recovery.
//! Edge kernels cover their edge without the two corner nodes, which belong
//! to the bounce-back walls.

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use super::{D2Q9, Lattice, Real, SimulationState, equilibrium_into, node_moments};
use crate::schema::{Edge, EdgeCondition, Execution};

const Q: usize = D2Q9::Q;

/// Density used when the inlet mass balance produces a non-positive value.
pub const INLET_DENSITY_FALLBACK: f64 = 1.0;

/// Lattice directions grouped by their orientation relative to an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDirections {
    /// Point into the domain; unknown after streaming.
    pub incoming: [usize; 3],
    /// Tangential to the edge, including rest.
    pub parallel: [usize; 3],
    /// Point out of the domain; known after streaming.
    pub outgoing: [usize; 3],
}

impl EdgeDirections {
    pub fn for_edge(edge: Edge) -> Self {
        let (nx, ny) = edge.inward_normal();
        let mut incoming = [0; 3];
        let mut parallel = [0; 3];
        let mut outgoing = [0; 3];
        let (mut i, mut p, mut o) = (0, 0, 0);
        for (k, &(cx, cy)) in D2Q9::VELOCITIES.iter().enumerate() {
            match cx * nx + cy * ny {
                d if d > 0 => {
                    incoming[i] = k;
                    i += 1;
                }
                0 => {
                    parallel[p] = k;
                    p += 1;
                }
                _ => {
                    outgoing[o] = k;
                    o += 1;
                }
            }
        }
        Self {
            incoming,
            parallel,
            outgoing,
        }
    }
}

/// Full-way bounce-back at every solid node: `f[k] = f[opposite[k]]`.
pub fn bounce_back<T: Real>(state: &mut SimulationState<T>, execution: Execution) {
    let nx = state.nx;
    let fields = state.fields_mut();
    let mask = fields.mask;

    match execution {
        #[cfg(not(target_arch = "wasm32"))]
        Execution::Parallel => {
            fields
                .f_in
                .par_chunks_mut(nx * Q)
                .zip(mask.par_chunks(nx))
                .for_each(|(row, mask_row)| bounce_back_row(row, mask_row));
        }
        _ => {
            fields
                .f_in
                .chunks_mut(nx * Q)
                .zip(mask.chunks(nx))
                .for_each(|(row, mask_row)| bounce_back_row(row, mask_row));
        }
    }
}

#[inline]
fn bounce_back_row<T: Real>(row: &mut [T], mask_row: &[bool]) {
    if !mask_row.iter().any(|&s| s) {
        return;
    }
    let mut scratch = [T::zero(); Q];
    for (x, &solid) in mask_row.iter().enumerate() {
        if !solid {
            continue;
        }
        let node = &mut row[x * Q..(x + 1) * Q];
        scratch.copy_from_slice(node);
        for k in 0..Q {
            node[k] = scratch[D2Q9::OPPOSITE[k]];
        }
    }
}

/// Apply one edge condition.
pub fn apply_edge_condition<T: Real>(
    state: &mut SimulationState<T>,
    lattice: &Lattice<T>,
    condition: &EdgeCondition,
) {
    match *condition {
        EdgeCondition::MovingLid { edge, velocity } => {
            moving_lid(state, lattice, edge, T::lit(velocity))
        }
        EdgeCondition::VelocityInlet { edge, velocity } => {
            velocity_inlet(state, lattice, edge, T::lit(velocity))
        }
        EdgeCondition::PressureOutlet { edge, density } => {
            pressure_outlet(state, lattice, edge, T::lit(density))
        }
    }
}

/// Moving wall: overwrite the edge with equilibrium at the lid velocity.
///
/// Density is taken from the adjacent interior node. `velocity` runs along
/// the edge tangent (+x for south/north edges, +y for west/east edges).
pub fn moving_lid<T: Real>(
    state: &mut SimulationState<T>,
    lattice: &Lattice<T>,
    edge: Edge,
    velocity: T,
) {
    let (tx, ty) = edge.tangent();
    let ux = velocity * T::lit(tx as f64);
    let uy = velocity * T::lit(ty as f64);
    let mut feq = [T::zero(); Q];

    for (x, y) in edge.nodes(state.nx, state.ny) {
        if state.is_solid(x, y) {
            continue;
        }
        let (ix, iy) = edge.interior_neighbor(x, y);
        let rho = state
            .populations(ix, iy)
            .iter()
            .fold(T::zero(), |acc, &f| acc + f);

        equilibrium_into(rho, ux, uy, lattice, &mut feq);
        let base = state.fidx(x, y, 0);
        state.f_in[base..base + Q].copy_from_slice(&feq);
    }
}

/// Zou-He velocity inlet with `velocity` along the inward normal.
///
/// Density comes from the 1-D mass balance over the known populations.
/// Each of the three incoming populations is its equilibrium value plus the
/// equilibrium excess of its known opposite.
pub fn velocity_inlet<T: Real>(
    state: &mut SimulationState<T>,
    lattice: &Lattice<T>,
    edge: Edge,
    velocity: T,
) {
    let dirs = EdgeDirections::for_edge(edge);
    let (nx_, ny_) = edge.inward_normal();
    let ux = velocity * T::lit(nx_ as f64);
    let uy = velocity * T::lit(ny_ as f64);
    let two = T::lit(2.0);
    let fallback = T::lit(INLET_DENSITY_FALLBACK);
    let mut feq = [T::zero(); Q];

    for (x, y) in edge.nodes(state.nx, state.ny) {
        if state.is_solid(x, y) {
            continue;
        }
        let base = state.fidx(x, y, 0);
        let f = &mut state.f_in[base..base + Q];

        let parallel = dirs.parallel.iter().fold(T::zero(), |acc, &k| acc + f[k]);
        let outgoing = dirs.outgoing.iter().fold(T::zero(), |acc, &k| acc + f[k]);
        let mut rho = (parallel + two * outgoing) / (T::one() - velocity);
        if rho <= T::zero() {
            log::trace!("inlet density {:?} at ({}, {}) clamped", rho, x, y);
            rho = fallback;
        }

        equilibrium_into(rho, ux, uy, lattice, &mut feq);
        rebuild_incoming(f, &feq, &dirs);
    }
}

/// Zou-He style pressure outlet with prescribed `density`.
///
/// Velocity is extrapolated from the adjacent interior node (zero gradient).
pub fn pressure_outlet<T: Real>(
    state: &mut SimulationState<T>,
    lattice: &Lattice<T>,
    edge: Edge,
    density: T,
) {
    let dirs = EdgeDirections::for_edge(edge);
    let mut feq = [T::zero(); Q];

    for (x, y) in edge.nodes(state.nx, state.ny) {
        if state.is_solid(x, y) {
            continue;
        }
        let (ix, iy) = edge.interior_neighbor(x, y);
        let (_, u, v) = node_moments(state.populations(ix, iy), lattice);

        equilibrium_into(density, u, v, lattice, &mut feq);
        let base = state.fidx(x, y, 0);
        rebuild_incoming(&mut state.f_in[base..base + Q], &feq, &dirs);
    }
}

/// f_k = feq_k + (feq_opp - f_opp) for each unknown direction k.
#[inline]
fn rebuild_incoming<T: Real>(f: &mut [T], feq: &[T; Q], dirs: &EdgeDirections) {
    for &k in &dirs.incoming {
        let o = D2Q9::OPPOSITE[k];
        f[k] = feq[k] + (feq[o] - f[o]);
    }
}
