//! Vorticity (curl of the velocity field).

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use super::{Real, SimulationState};
use crate::schema::Execution;

/// Central-difference vorticity into `out` (length nx * ny).
///
/// w = dv/dx - du/dy on interior nodes; the one-node halo is set to zero.
pub fn vorticity_into<T: Real>(state: &SimulationState<T>, out: &mut [T], execution: Execution) {
    let nx = state.nx;
    let ny = state.ny;
    let u = &state.u;
    let v = &state.v;

    match execution {
        #[cfg(not(target_arch = "wasm32"))]
        Execution::Parallel => {
            out.par_chunks_mut(nx)
                .enumerate()
                .for_each(|(y, row)| vorticity_row(row, u, v, y, nx, ny));
        }
        _ => {
            out.chunks_mut(nx)
                .enumerate()
                .for_each(|(y, row)| vorticity_row(row, u, v, y, nx, ny));
        }
    }
}

/// Vorticity as a freshly allocated field.
pub fn vorticity<T: Real>(state: &SimulationState<T>, execution: Execution) -> Vec<T> {
    let mut out = vec![T::zero(); state.grid_size()];
    vorticity_into(state, &mut out, execution);
    out
}

#[inline]
fn vorticity_row<T: Real>(row: &mut [T], u: &[T], v: &[T], y: usize, nx: usize, ny: usize) {
    row.fill(T::zero());
    if y == 0 || y + 1 >= ny || nx < 3 {
        return;
    }
    let half = T::lit(0.5);
    for x in 1..nx - 1 {
        let dv_dx = (v[y * nx + x + 1] - v[y * nx + x - 1]) * half;
        let du_dy = (u[(y + 1) * nx + x] - u[(y - 1) * nx + x]) * half;
        row[x] = dv_dx - du_dy;
    }
}
