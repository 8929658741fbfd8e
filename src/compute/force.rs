//! Obstacle force by momentum exchange.
//!
//! Every fluid population about to stream into a selected solid node is
//! reflected, transferring 2 * f_out_k * c_k of momentum to the obstacle.

use serde::{Deserialize, Serialize};

use super::{D2Q9, Real, SimulationState};
use crate::schema::ObstacleSelector;

const Q: usize = D2Q9::Q;

/// Force and coefficients at one sampled step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceSample {
    pub step: u64,
    pub fx: f64,
    pub fy: f64,
    /// Drag coefficient.
    pub cd: f64,
    /// Lift coefficient.
    pub cl: f64,
}

/// Normalization for force coefficients: 0.5 * rho_ref * U^2 * D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceScales {
    pub reference_density: f64,
    pub velocity: f64,
    pub length: f64,
}

impl ForceScales {
    #[inline]
    pub fn dynamic_pressure_length(&self) -> f64 {
        0.5 * self.reference_density * self.velocity * self.velocity * self.length
    }
}

/// Net force (Fx, Fy) on the solid nodes accepted by `selector`.
pub fn obstacle_force<T: Real>(state: &SimulationState<T>, selector: &ObstacleSelector) -> (f64, f64) {
    let nx = state.nx;
    let ny = state.ny;
    let mask = state.mask();
    let mut fx = 0.0;
    let mut fy = 0.0;

    for y in 0..ny {
        for x in 0..nx {
            if mask[y * nx + x] {
                continue;
            }
            let base = (y * nx + x) * Q;
            for (k, &(cx, cy)) in D2Q9::VELOCITIES.iter().enumerate().skip(1) {
                let sx = x as i64 + cx as i64;
                let sy = y as i64 + cy as i64;
                if sx < 0 || sy < 0 || sx >= nx as i64 || sy >= ny as i64 {
                    continue;
                }
                let (sx, sy) = (sx as usize, sy as usize);
                if !mask[sy * nx + sx] || !selector.includes(sx, sy, nx, ny) {
                    continue;
                }
                let f = state.f_out[base + k].as_f64();
                fx += 2.0 * f * cx as f64;
                fy += 2.0 * f * cy as f64;
            }
        }
    }

    (fx, fy)
}

/// Force sample with drag and lift coefficients.
pub fn sample_force<T: Real>(
    state: &SimulationState<T>,
    selector: &ObstacleSelector,
    scales: &ForceScales,
) -> ForceSample {
    let (fx, fy) = obstacle_force(state, selector);
    let norm = scales.dynamic_pressure_length();
    ForceSample {
        step: state.step,
        fx,
        fy,
        cd: fx / norm,
        cl: fy / norm,
    }
}

/// Half the peak-to-peak lift coefficient over `samples`.
pub fn lift_amplitude(samples: &[ForceSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let (min, max) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.cl), hi.max(s.cl))
        });
    0.5 * (max - min)
}

/// Mean drag coefficient over `samples`.
pub fn mean_drag(samples: &[ForceSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.cd).sum::<f64>() / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_state() -> SimulationState<f64> {
        // 9x7 channel with walls on top/bottom and a single solid node at (4, 3).
        let (nx, ny) = (9, 7);
        let mut mask = vec![false; nx * ny];
        for x in 0..nx {
            mask[x] = true;
            mask[(ny - 1) * nx + x] = true;
        }
        mask[3 * nx + 4] = true;
        SimulationState::new(nx, ny, 0.6, mask)
    }

    #[test]
    fn test_rest_state_has_no_force() {
        let state = block_state();
        let (fx, fy) = obstacle_force(&state, &ObstacleSelector::Interior);
        assert!(fx.abs() < 1e-14);
        assert!(fy.abs() < 1e-14);
    }

    #[test]
    fn test_eastward_population_pushes_obstacle() {
        let mut state = block_state();
        let i = state.fidx(3, 3, D2Q9::EAST);
        state.f_out[i] += 0.5;

        let (fx, fy) = obstacle_force(&state, &ObstacleSelector::Interior);
        assert!((fx - 1.0).abs() < 1e-14);
        assert!(fy.abs() < 1e-14);
    }

    #[test]
    fn test_selector_excludes_walls() {
        let mut state = block_state();
        // Push into the bottom wall only.
        let i = state.fidx(1, 1, D2Q9::SOUTH);
        state.f_out[i] += 0.25;

        let (_, fy_obstacle) = obstacle_force(&state, &ObstacleSelector::Interior);
        let (_, fy_all) = obstacle_force(&state, &ObstacleSelector::AllSolid);
        assert!(fy_obstacle.abs() < 1e-14);
        assert!((fy_all + 0.5).abs() < 1e-14);

        let rows = ObstacleSelector::RowRange { min_row: 2, max_row: 4 };
        let (_, fy_rows) = obstacle_force(&state, &rows);
        assert!(fy_rows.abs() < 1e-14);
    }

    #[test]
    fn test_coefficients() {
        let mut state = block_state();
        let i = state.fidx(3, 3, D2Q9::EAST);
        state.f_out[i] += 0.5;
        let scales = ForceScales {
            reference_density: 1.0,
            velocity: 0.1,
            length: 2.0,
        };
        let sample = sample_force(&state, &ObstacleSelector::Interior, &scales);
        assert!((sample.cd - 1.0 / 0.01).abs() < 1e-9);
        assert!(sample.cl.abs() < 1e-12);
    }

    #[test]
    fn test_lift_amplitude() {
        let samples: Vec<ForceSample> = (0..100)
            .map(|s| ForceSample {
                step: s,
                fx: 0.0,
                fy: 0.0,
                cd: 1.5,
                cl: 0.3 * (s as f64 * 0.2).sin(),
            })
            .collect();
        let amp = lift_amplitude(&samples);
        assert!((amp - 0.3).abs() < 0.01);
        assert!((mean_drag(&samples) - 1.5).abs() < 1e-12);
        assert_eq!(lift_amplitude(&[]), 0.0);
    }
}
