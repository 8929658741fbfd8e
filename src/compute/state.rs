//! Simulation state container.

use super::{D2Q9, Lattice, Real, equilibrium_into};

const Q: usize = D2Q9::Q;

/// Field arrays of one lattice Boltzmann run.
///
/// Node (x, y) lives at `y * nx + x`; its populations at
/// `(y * nx + x) * 9 + k`, so each grid row is one contiguous chunk.
pub struct SimulationState<T: Real> {
    /// Post-streaming populations.
    pub f_in: Vec<T>,
    /// Post-collision populations.
    pub f_out: Vec<T>,
    /// Density per node.
    pub rho: Vec<T>,
    /// X velocity per node.
    pub u: Vec<T>,
    /// Y velocity per node.
    pub v: Vec<T>,
    /// Solid mask, fixed at construction.
    mask: Vec<bool>,
    /// Grid width (X dimension).
    pub nx: usize,
    /// Grid height (Y dimension).
    pub ny: usize,
    /// BGK relaxation time.
    pub tau: T,
    /// Completed iterations.
    pub step: u64,
}

impl<T: Real> SimulationState<T> {
    /// Create a state at rest (rho = 1, u = v = 0) over the given mask.
    ///
    /// # Panics
    ///
    /// Panics if `mask` does not hold `nx * ny` entries.
    pub fn new(nx: usize, ny: usize, tau: T, mask: Vec<bool>) -> Self {
        assert_eq!(
            mask.len(),
            nx * ny,
            "mask length does not match a {}x{} grid",
            nx,
            ny
        );
        let nodes = nx * ny;
        let mut state = Self {
            f_in: vec![T::zero(); nodes * Q],
            f_out: vec![T::zero(); nodes * Q],
            rho: vec![T::one(); nodes],
            u: vec![T::zero(); nodes],
            v: vec![T::zero(); nodes],
            mask,
            nx,
            ny,
            tau,
            step: 0,
        };
        state.initialize(&Lattice::new(), T::one(), T::zero(), T::zero());
        state
    }

    /// Create a fully fluid state at rest.
    pub fn fluid(nx: usize, ny: usize, tau: T) -> Self {
        Self::new(nx, ny, tau, vec![false; nx * ny])
    }

    /// Reset every node to equilibrium at (rho, u, v).
    ///
    /// Solid nodes are set to the reference state instead.
    pub fn initialize(&mut self, lattice: &Lattice<T>, rho: T, u: T, v: T) {
        let mut fluid_eq = [T::zero(); Q];
        let mut solid_eq = [T::zero(); Q];
        equilibrium_into(rho, u, v, lattice, &mut fluid_eq);
        equilibrium_into(T::one(), T::zero(), T::zero(), lattice, &mut solid_eq);

        for node in 0..self.nx * self.ny {
            let (feq, r, uu, vv) = if self.mask[node] {
                (&solid_eq, T::one(), T::zero(), T::zero())
            } else {
                (&fluid_eq, rho, u, v)
            };
            self.f_in[node * Q..(node + 1) * Q].copy_from_slice(feq);
            self.f_out[node * Q..(node + 1) * Q].copy_from_slice(feq);
            self.rho[node] = r;
            self.u[node] = uu;
            self.v[node] = vv;
        }
        self.step = 0;
    }

    /// Node index of (x, y).
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.nx + x
    }

    /// Population index of (x, y, k).
    #[inline]
    pub fn fidx(&self, x: usize, y: usize, k: usize) -> usize {
        (y * self.nx + x) * Q + k
    }

    /// Number of nodes.
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.nx * self.ny
    }

    /// Solid mask (true = solid).
    #[inline]
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    #[inline]
    pub fn is_solid(&self, x: usize, y: usize) -> bool {
        self.mask[y * self.nx + x]
    }

    /// Post-streaming populations of one node.
    #[inline]
    pub fn populations(&self, x: usize, y: usize) -> &[T] {
        let start = (y * self.nx + x) * Q;
        &self.f_in[start..start + Q]
    }

    /// Number of fluid nodes.
    pub fn fluid_count(&self) -> usize {
        self.mask.iter().filter(|&&s| !s).count()
    }

    /// Total mass held by fluid nodes (sum of post-streaming populations).
    pub fn total_mass(&self) -> f64 {
        self.f_in
            .chunks_exact(Q)
            .zip(self.mask.iter())
            .filter(|(_, solid)| !**solid)
            .map(|(f, _)| f.iter().fold(0.0, |acc, &p| acc + p.as_f64()))
            .sum()
    }

    /// Split borrow used by kernels that read the mask while writing fields.
    #[inline]
    pub(crate) fn fields_mut(&mut self) -> FieldsMut<'_, T> {
        FieldsMut {
            f_in: &mut self.f_in,
            f_out: &mut self.f_out,
            rho: &mut self.rho,
            u: &mut self.u,
            v: &mut self.v,
            mask: &self.mask,
        }
    }
}

/// Disjoint mutable views of the field arrays with a shared mask.
pub(crate) struct FieldsMut<'a, T> {
    pub f_in: &'a mut [T],
    pub f_out: &'a mut [T],
    pub rho: &'a mut [T],
    pub u: &'a mut [T],
    pub v: &'a mut [T],
    pub mask: &'a [bool],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_initialization() {
        let state = SimulationState::<f64>::fluid(16, 12, 0.6);
        for y in 0..state.ny {
            for x in 0..state.nx {
                let f = state.populations(x, y);
                assert!((f[D2Q9::REST] - 4.0 / 9.0).abs() < 1e-15);
                assert!((f[D2Q9::EAST] - 1.0 / 9.0).abs() < 1e-15);
                assert!((f[D2Q9::SOUTH_WEST] - 1.0 / 36.0).abs() < 1e-15);
            }
        }
        assert!((state.total_mass() - 16.0 * 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_solid_nodes_keep_reference_state() {
        let mut mask = vec![false; 8 * 8];
        mask[3 * 8 + 4] = true;
        let mut state = SimulationState::<f64>::new(8, 8, 0.6, mask);
        state.initialize(&Lattice::new(), 1.0, 0.1, 0.0);

        let solid = state.idx(4, 3);
        assert_eq!(state.u[solid], 0.0);
        assert_eq!(state.rho[solid], 1.0);
        assert!((state.u[state.idx(0, 0)] - 0.1).abs() < 1e-15);
        assert_eq!(state.fluid_count(), 63);
    }

    #[test]
    #[should_panic(expected = "mask length does not match a 6x4 grid")]
    fn test_mismatched_mask_rejected() {
        let _ = SimulationState::<f64>::new(6, 4, 0.6, vec![false; 20]);
    }

    #[test]
    fn test_indexing() {
        let state = SimulationState::<f32>::fluid(5, 4, 0.6);
        assert_eq!(state.idx(2, 3), 17);
        assert_eq!(state.fidx(2, 3, 4), 17 * 9 + 4);
        assert_eq!(state.grid_size(), 20);
    }
}
