//! Equilibrium distribution for the D2Q9 lattice.

use super::{Lattice, Real};

/// Compute the second-order equilibrium populations into `out`.
///
/// feq_k = w_k * rho * (1 + 3 (c_k . u) + 4.5 (c_k . u)^2 - 1.5 |u|^2)
#[inline(always)]
pub fn equilibrium_into<T: Real>(rho: T, u: T, v: T, lattice: &Lattice<T>, out: &mut [T; 9]) {
    let three = T::lit(3.0);
    let four_half = T::lit(4.5);
    let one_half = T::lit(1.5);
    let usq = one_half * (u * u + v * v);

    for k in 0..9 {
        let cu = lattice.cx[k] * u + lattice.cy[k] * v;
        out[k] = lattice.weights[k] * rho * (T::one() + three * cu + four_half * cu * cu - usq);
    }
}

/// Equilibrium populations as a stack array.
#[inline]
pub fn equilibrium<T: Real>(rho: T, u: T, v: T, lattice: &Lattice<T>) -> [T; 9] {
    let mut out = [T::zero(); 9];
    equilibrium_into(rho, u, v, lattice, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::D2Q9;
    use proptest::prelude::*;

    fn moments(f: &[f64; 9], lattice: &Lattice<f64>) -> (f64, f64, f64) {
        let mut rho = 0.0;
        let mut mx = 0.0;
        let mut my = 0.0;
        for k in 0..9 {
            rho += f[k];
            mx += f[k] * lattice.cx[k];
            my += f[k] * lattice.cy[k];
        }
        (rho, mx, my)
    }

    #[test]
    fn test_rest_state() {
        let lattice = Lattice::<f64>::new();
        let feq = equilibrium(1.0, 0.0, 0.0, &lattice);
        assert!((feq[D2Q9::REST] - 4.0 / 9.0).abs() < 1e-15);
        assert!((feq[D2Q9::EAST] - 1.0 / 9.0).abs() < 1e-15);
        assert!((feq[D2Q9::NORTH_EAST] - 1.0 / 36.0).abs() < 1e-15);
    }

    #[test]
    fn test_moments_recovered() {
        let lattice = Lattice::<f64>::new();
        for &(rho, u, v) in &[(1.0, 0.05, -0.02), (0.93, -0.1, 0.08), (1.2, 0.0, 0.15)] {
            let feq = equilibrium(rho, u, v, &lattice);
            let (r, mx, my) = moments(&feq, &lattice);
            assert!((r - rho).abs() < 1e-12, "density {} vs {}", r, rho);
            assert!((mx - rho * u).abs() < 1e-12, "x momentum {} vs {}", mx, rho * u);
            assert!((my - rho * v).abs() < 1e-12, "y momentum {} vs {}", my, rho * v);
        }
    }

    #[test]
    fn test_single_precision_moments() {
        let lattice = Lattice::<f32>::new();
        let feq = equilibrium(1.05f32, 0.08, 0.03, &lattice);
        let rho: f32 = feq.iter().sum();
        let mx: f32 = (0..9).map(|k| feq[k] * lattice.cx[k]).sum();
        assert!((rho - 1.05).abs() < 1e-6);
        assert!((mx - 1.05 * 0.08).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn equilibrium_preserves_moments(
            rho in 0.5..2.0_f64,
            u in -0.2..0.2_f64,
            v in -0.2..0.2_f64,
        ) {
            let lattice = Lattice::<f64>::new();
            let feq = equilibrium(rho, u, v, &lattice);
            let (r, mx, my) = moments(&feq, &lattice);
            prop_assert!((r - rho).abs() < 1e-12);
            prop_assert!((mx - rho * u).abs() < 1e-12);
            prop_assert!((my - rho * v).abs() < 1e-12);
        }
    }
}
