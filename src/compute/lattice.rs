//! D2Q9 lattice constants.
//!
//! Direction layout (index: velocity):
//!
//! ```text
//!   6   2   5
//!     \ | /
//!   3 - 0 - 1
//!     / | \
//!   7   4   8
//! ```
//!
//! 0 is the rest direction, 1-4 are axis-aligned, 5-8 are diagonals.

use super::Real;

/// Static D2Q9 velocity set.
pub struct D2Q9;

impl D2Q9 {
    /// Number of discrete velocities.
    pub const Q: usize = 9;

    /// Rest direction.
    pub const REST: usize = 0;
    pub const EAST: usize = 1;
    pub const NORTH: usize = 2;
    pub const WEST: usize = 3;
    pub const SOUTH: usize = 4;
    pub const NORTH_EAST: usize = 5;
    pub const NORTH_WEST: usize = 6;
    pub const SOUTH_WEST: usize = 7;
    pub const SOUTH_EAST: usize = 8;

    /// Discrete velocities (cx, cy).
    pub const VELOCITIES: [(i32, i32); 9] = [
        (0, 0),
        (1, 0),
        (0, 1),
        (-1, 0),
        (0, -1),
        (1, 1),
        (-1, 1),
        (-1, -1),
        (1, -1),
    ];

    /// Quadrature weights.
    pub const WEIGHTS: [f64; 9] = [
        4.0 / 9.0,
        1.0 / 9.0,
        1.0 / 9.0,
        1.0 / 9.0,
        1.0 / 9.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 36.0,
    ];

    /// Opposite directions for bounce-back.
    pub const OPPOSITE: [usize; 9] = [0, 3, 4, 1, 2, 7, 8, 5, 6];

    /// Speed of sound squared.
    pub const CS2: f64 = 1.0 / 3.0;
}

/// Lattice parameters converted once into the working precision.
#[derive(Debug, Clone, Copy)]
pub struct Lattice<T: Real> {
    pub weights: [T; 9],
    pub cx: [T; 9],
    pub cy: [T; 9],
}

impl<T: Real> Lattice<T> {
    pub fn new() -> Self {
        let mut weights = [T::zero(); 9];
        let mut cx = [T::zero(); 9];
        let mut cy = [T::zero(); 9];
        for k in 0..D2Q9::Q {
            weights[k] = T::lit(D2Q9::WEIGHTS[k]);
            cx[k] = T::lit(D2Q9::VELOCITIES[k].0 as f64);
            cy[k] = T::lit(D2Q9::VELOCITIES[k].1 as f64);
        }
        Self { weights, cx, cy }
    }

    #[inline(always)]
    pub fn weight(&self, k: usize) -> T {
        self.weights[k]
    }

    #[inline(always)]
    pub fn velocity(&self, k: usize) -> (i32, i32) {
        D2Q9::VELOCITIES[k]
    }

    #[inline(always)]
    pub fn opposite(&self, k: usize) -> usize {
        D2Q9::OPPOSITE[k]
    }
}

impl<T: Real> Default for Lattice<T> {
    fn default() -> Self {
        Self::new()
    }
}
