//! Pull-based streaming.
//!
//! Every destination node gathers `f_in[x, y, k] = f_out[x - cx_k, y - cy_k, k]`,
//! so each row writes only its own slice of `f_in`.
//!
//! Sources outside the grid wrap around. In periodic configurations that is
//! the physics; in bounded ones every perimeter node is either solid or owned
//! by an edge boundary kernel that overwrites the wrapped populations right
//! after this stage, which configuration validation enforces.

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use super::{D2Q9, Real, SimulationState};
use crate::schema::Execution;

const Q: usize = D2Q9::Q;

/// Propagate `f_out` into `f_in` along each lattice direction.
pub fn stream<T: Real>(state: &mut SimulationState<T>, execution: Execution) {
    let nx = state.nx;
    let ny = state.ny;
    let fields = state.fields_mut();
    let f_out: &[T] = fields.f_out;

    match execution {
        #[cfg(not(target_arch = "wasm32"))]
        Execution::Parallel => {
            fields
                .f_in
                .par_chunks_mut(nx * Q)
                .enumerate()
                .for_each(|(y, row)| stream_row(row, f_out, y, nx, ny));
        }
        _ => {
            fields
                .f_in
                .chunks_mut(nx * Q)
                .enumerate()
                .for_each(|(y, row)| stream_row(row, f_out, y, nx, ny));
        }
    }
}

#[inline]
fn stream_row<T: Real>(row: &mut [T], f_out: &[T], y: usize, nx: usize, ny: usize) {
    // Source rows for cy = -1, 0, +1.
    let y_up = (y + ny - 1) % ny;
    let y_down = (y + 1) % ny;

    for x in 0..nx {
        let x_left = (x + nx - 1) % nx;
        let x_right = (x + 1) % nx;
        let dst = &mut row[x * Q..(x + 1) * Q];

        for (k, &(cx, cy)) in D2Q9::VELOCITIES.iter().enumerate() {
            let sx = match cx {
                1 => x_left,
                -1 => x_right,
                _ => x,
            };
            let sy = match cy {
                1 => y_up,
                -1 => y_down,
                _ => y,
            };
            dst[k] = f_out[(sy * nx + sx) * Q + k];
        }
    }
}
