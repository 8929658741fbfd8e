//! Macroscopic moment recovery (density and velocity).

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use super::{D2Q9, Lattice, Real, SimulationState};
use crate::schema::Execution;

const Q: usize = D2Q9::Q;

/// Density and velocity of a single node's populations.
#[inline(always)]
pub fn node_moments<T: Real>(f: &[T], lattice: &Lattice<T>) -> (T, T, T) {
    let mut rho = T::zero();
    let mut mx = T::zero();
    let mut my = T::zero();
    for k in 0..Q {
        rho = rho + f[k];
        mx = mx + f[k] * lattice.cx[k];
        my = my + f[k] * lattice.cy[k];
    }
    (rho, mx / rho, my / rho)
}

/// Recover rho, u, v from `f_in` for every node.
///
/// Solid nodes are pinned to the reference state rho = 1, u = v = 0.
pub fn compute_moments<T: Real>(
    state: &mut SimulationState<T>,
    lattice: &Lattice<T>,
    execution: Execution,
) {
    let nx = state.nx;
    let fields = state.fields_mut();
    let f_in: &[T] = fields.f_in;

    match execution {
        #[cfg(not(target_arch = "wasm32"))]
        Execution::Parallel => {
            f_in.par_chunks(nx * Q)
                .zip(fields.rho.par_chunks_mut(nx))
                .zip(fields.u.par_chunks_mut(nx))
                .zip(fields.v.par_chunks_mut(nx))
                .zip(fields.mask.par_chunks(nx))
                .for_each(|((((f, rho), u), v), mask)| moments_row(f, rho, u, v, mask, lattice));
        }
        _ => {
            f_in.chunks(nx * Q)
                .zip(fields.rho.chunks_mut(nx))
                .zip(fields.u.chunks_mut(nx))
                .zip(fields.v.chunks_mut(nx))
                .zip(fields.mask.chunks(nx))
                .for_each(|((((f, rho), u), v), mask)| moments_row(f, rho, u, v, mask, lattice));
        }
    }
}

#[inline]
fn moments_row<T: Real>(
    f_row: &[T],
    rho_row: &mut [T],
    u_row: &mut [T],
    v_row: &mut [T],
    mask_row: &[bool],
    lattice: &Lattice<T>,
) {
    for (x, &solid) in mask_row.iter().enumerate() {
        if solid {
            rho_row[x] = T::one();
            u_row[x] = T::zero();
            v_row[x] = T::zero();
            continue;
        }
        let (rho, u, v) = node_moments(&f_row[x * Q..(x + 1) * Q], lattice);
        rho_row[x] = rho;
        u_row[x] = u;
        v_row[x] = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::equilibrium;

    #[test]
    fn test_moments_of_equilibrium() {
        let lattice = Lattice::<f64>::new();
        let mut state = SimulationState::<f64>::fluid(6, 5, 0.6);
        let feq = equilibrium(1.1, 0.04, -0.03, &lattice);
        let i = state.fidx(2, 3, 0);
        state.f_in[i..i + Q].copy_from_slice(&feq);

        compute_moments(&mut state, &lattice, Execution::Sequential);

        let n = state.idx(2, 3);
        assert!((state.rho[n] - 1.1).abs() < 1e-12);
        assert!((state.u[n] - 0.04).abs() < 1e-12);
        assert!((state.v[n] + 0.03).abs() < 1e-12);
        assert!((state.rho[state.idx(0, 0)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_solid_nodes_forced_to_reference() {
        let lattice = Lattice::<f64>::new();
        let mut mask = vec![false; 4 * 4];
        mask[5] = true;
        let mut state = SimulationState::<f64>::new(4, 4, 0.6, mask);
        for k in 0..Q {
            state.f_in[5 * Q + k] = 7.0 + k as f64;
        }

        compute_moments(&mut state, &lattice, Execution::Sequential);

        assert_eq!(state.rho[5], 1.0);
        assert_eq!(state.u[5], 0.0);
        assert_eq!(state.v[5], 0.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let lattice = Lattice::<f64>::new();
        let mut a = SimulationState::<f64>::fluid(12, 9, 0.6);
        for (i, f) in a.f_in.iter_mut().enumerate() {
            *f += 0.001 * ((i * 7919) % 13) as f64;
        }
        let mut b = SimulationState::<f64>::fluid(12, 9, 0.6);
        b.f_in.copy_from_slice(&a.f_in);

        compute_moments(&mut a, &lattice, Execution::Sequential);
        compute_moments(&mut b, &lattice, Execution::Parallel);

        assert_eq!(a.rho, b.rho);
        assert_eq!(a.u, b.u);
        assert_eq!(a.v, b.v);
    }
}
