//! BGK single-relaxation-time collision.
//!
//! f_out_k = f_in_k - omega * (f_in_k - feq_k), omega = 1 / tau.

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use super::{D2Q9, Lattice, Real, SimulationState, equilibrium_into};
use crate::schema::Execution;

const Q: usize = D2Q9::Q;

/// Relax every fluid node toward equilibrium, writing `f_out`.
///
/// Expects rho, u, v to be current for this step. Solid nodes copy `f_in`
/// through unchanged so their reflected populations stream next step.
pub fn collide<T: Real>(state: &mut SimulationState<T>, lattice: &Lattice<T>, execution: Execution) {
    let nx = state.nx;
    let omega = T::one() / state.tau;
    let fields = state.fields_mut();
    let f_in: &[T] = fields.f_in;
    let rho: &[T] = fields.rho;
    let u: &[T] = fields.u;
    let v: &[T] = fields.v;
    let mask = fields.mask;

    match execution {
        #[cfg(not(target_arch = "wasm32"))]
        Execution::Parallel => {
            fields
                .f_out
                .par_chunks_mut(nx * Q)
                .zip(f_in.par_chunks(nx * Q))
                .enumerate()
                .for_each(|(y, (out, inp))| {
                    let row = y * nx..(y + 1) * nx;
                    collide_row(
                        out,
                        inp,
                        &rho[row.clone()],
                        &u[row.clone()],
                        &v[row.clone()],
                        &mask[row],
                        omega,
                        lattice,
                    );
                });
        }
        _ => {
            fields
                .f_out
                .chunks_mut(nx * Q)
                .zip(f_in.chunks(nx * Q))
                .enumerate()
                .for_each(|(y, (out, inp))| {
                    let row = y * nx..(y + 1) * nx;
                    collide_row(
                        out,
                        inp,
                        &rho[row.clone()],
                        &u[row.clone()],
                        &v[row.clone()],
                        &mask[row],
                        omega,
                        lattice,
                    );
                });
        }
    }
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn collide_row<T: Real>(
    out: &mut [T],
    inp: &[T],
    rho: &[T],
    u: &[T],
    v: &[T],
    mask: &[bool],
    omega: T,
    lattice: &Lattice<T>,
) {
    // One scratch per row worker.
    let mut feq = [T::zero(); Q];

    for x in 0..mask.len() {
        let base = x * Q;
        let f_node = &inp[base..base + Q];
        let out_node = &mut out[base..base + Q];

        if mask[x] {
            out_node.copy_from_slice(f_node);
            continue;
        }

        equilibrium_into(rho[x], u[x], v[x], lattice, &mut feq);
        for k in 0..Q {
            out_node[k] = f_node[k] - omega * (f_node[k] - feq[k]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{compute_moments, node_moments};
    use proptest::prelude::*;

    fn perturbed_state(noise: &[f64; 9]) -> SimulationState<f64> {
        let lattice = Lattice::<f64>::new();
        let mut state = SimulationState::<f64>::fluid(3, 3, 0.7);
        let i = state.fidx(1, 1, 0);
        for k in 0..Q {
            state.f_in[i + k] = lattice.weights[k] * (1.0 + noise[k]);
        }
        compute_moments(&mut state, &lattice, Execution::Sequential);
        state
    }

    #[test]
    fn test_collision_conserves_moments() {
        let lattice = Lattice::<f64>::new();
        let mut state =
            perturbed_state(&[0.1, -0.2, 0.05, 0.3, -0.1, 0.2, -0.05, 0.15, -0.3]);
        collide(&mut state, &lattice, Execution::Sequential);

        let i = state.fidx(1, 1, 0);
        let (rho_in, u_in, v_in) = node_moments(&state.f_in[i..i + Q], &lattice);
        let (rho_out, u_out, v_out) = node_moments(&state.f_out[i..i + Q], &lattice);
        assert!((rho_in - rho_out).abs() < 1e-14);
        assert!((u_in - u_out).abs() < 1e-14);
        assert!((v_in - v_out).abs() < 1e-14);

        // The distribution itself must change.
        let changed = (0..Q).any(|k| (state.f_in[i + k] - state.f_out[i + k]).abs() > 1e-6);
        assert!(changed);
    }

    #[test]
    fn test_tau_one_yields_equilibrium() {
        let lattice = Lattice::<f64>::new();
        let mut state = perturbed_state(&[0.0, 0.1, 0.0, -0.1, 0.0, 0.05, 0.0, -0.05, 0.0]);
        state.tau = 1.0;
        collide(&mut state, &lattice, Execution::Sequential);

        let n = state.idx(1, 1);
        let feq = crate::compute::equilibrium(state.rho[n], state.u[n], state.v[n], &lattice);
        let i = state.fidx(1, 1, 0);
        for k in 0..Q {
            assert!((state.f_out[i + k] - feq[k]).abs() < 1e-14);
        }
    }

    #[test]
    fn test_solid_nodes_pass_through() {
        let lattice = Lattice::<f64>::new();
        let mut mask = vec![false; 9];
        mask[4] = true;
        let mut state = SimulationState::<f64>::new(3, 3, 0.6, mask);
        for k in 0..Q {
            state.f_in[4 * Q + k] = 0.5 + k as f64;
        }
        compute_moments(&mut state, &lattice, Execution::Sequential);
        collide(&mut state, &lattice, Execution::Parallel);
        assert_eq!(&state.f_out[4 * Q..5 * Q], &state.f_in[4 * Q..5 * Q]);
    }

    proptest! {
        #[test]
        fn collision_conserves_mass_and_momentum(
            noise in prop::array::uniform9(-0.3..0.3_f64),
            tau in 0.51..2.0_f64,
        ) {
            let lattice = Lattice::<f64>::new();
            let mut state = perturbed_state(&noise);
            state.tau = tau;
            collide(&mut state, &lattice, Execution::Sequential);

            let i = state.fidx(1, 1, 0);
            let (r0, u0, v0) = node_moments(&state.f_in[i..i + Q], &lattice);
            let (r1, u1, v1) = node_moments(&state.f_out[i..i + Q], &lattice);
            prop_assert!((r0 - r1).abs() < 1e-12);
            prop_assert!((u0 - u1).abs() < 1e-12);
            prop_assert!((v0 - v1).abs() < 1e-12);
        }
    }
}
