//! Floating-point precision abstraction.
//!
//! All kernels are generic over [`Real`], implemented for `f32` and `f64`.

use std::fmt::Debug;

use num_traits::Float;

/// Scalar type used for populations and macroscopic fields.
pub trait Real: Float + Default + Debug + Send + Sync + 'static {
    /// Convert an `f64` literal into this precision.
    fn lit(value: f64) -> Self;

    /// Widen to `f64` for diagnostics.
    fn as_f64(self) -> f64;

    /// Narrow to `f32` for reduced-precision snapshots.
    fn as_f32(self) -> f32;
}

impl Real for f32 {
    #[inline(always)]
    fn lit(value: f64) -> Self {
        value as f32
    }

    #[inline(always)]
    fn as_f64(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn as_f32(self) -> f32 {
        self
    }
}

impl Real for f64 {
    #[inline(always)]
    fn lit(value: f64) -> Self {
        value
    }

    #[inline(always)]
    fn as_f64(self) -> f64 {
        self
    }

    #[inline(always)]
    fn as_f32(self) -> f32 {
        self as f32
    }
}
