//! Diagnostics recorded during a run.
//!
//! All counters and buffers live in [`Diagnostics`], owned by the solver.
//! Probe and force buffers are reserved up front (up to
//! [`MAX_RESERVED_SAMPLES`] each) so recording them does not allocate inside
//! the time loop.

use serde::{Deserialize, Serialize};

use super::{ForceSample, ForceScales, Real, SimulationState, sample_force, vorticity_into};
use crate::schema::SimulationConfig;

/// Upper bound on samples reserved per series. Longer runs grow the buffers
/// once they pass this many samples.
pub const MAX_RESERVED_SAMPLES: u64 = 1 << 20;

/// Reduced-precision vorticity field at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VorticitySnapshot {
    pub step: u64,
    pub nx: usize,
    pub ny: usize,
    /// Row-major field, `y * nx + x`.
    pub field: Vec<f32>,
}

impl VorticitySnapshot {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.field[y * self.nx + x]
    }
}

/// Flow statistics for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowStats {
    pub total_mass: f64,
    pub max_speed: f64,
    pub mean_speed: f64,
    pub min_density: f64,
    pub max_density: f64,
    pub fluid_nodes: usize,
}

impl FlowStats {
    /// Compute statistics over the fluid nodes of `state`.
    pub fn from_state<T: Real>(state: &SimulationState<T>) -> Self {
        let mut total_mass = 0.0f64;
        let mut max_speed = 0.0f64;
        let mut sum_speed = 0.0f64;
        let mut min_density = f64::INFINITY;
        let mut max_density = f64::NEG_INFINITY;
        let mut fluid_nodes = 0usize;

        for (i, &solid) in state.mask().iter().enumerate() {
            if solid {
                continue;
            }
            let rho = state.rho[i].as_f64();
            let u = state.u[i].as_f64();
            let v = state.v[i].as_f64();
            let speed = (u * u + v * v).sqrt();

            total_mass += rho;
            max_speed = max_speed.max(speed);
            sum_speed += speed;
            min_density = min_density.min(rho);
            max_density = max_density.max(rho);
            fluid_nodes += 1;
        }

        Self {
            total_mass,
            max_speed,
            mean_speed: if fluid_nodes > 0 {
                sum_speed / fluid_nodes as f64
            } else {
                0.0
            },
            min_density,
            max_density,
            fluid_nodes,
        }
    }

    /// Whether every statistic is finite.
    pub fn is_finite(&self) -> bool {
        self.total_mass.is_finite()
            && self.max_speed.is_finite()
            && self.mean_speed.is_finite()
            && self.min_density.is_finite()
            && self.max_density.is_finite()
    }
}

/// Diagnostic context: sample buffers and one-shot flags.
pub struct Diagnostics<T: Real> {
    /// Vorticity snapshots, oldest first.
    pub snapshots: Vec<VorticitySnapshot>,
    /// Obstacle force samples, oldest first.
    pub forces: Vec<ForceSample>,
    /// Probe time series of v at the probe node.
    pub probe: Vec<f64>,
    /// Whether the symmetry-breaking perturbation has fired.
    pub perturbation_applied: bool,
    /// Number of divergence checks performed.
    pub divergence_checks: u64,
    /// Scratch for the full-precision vorticity field.
    vorticity: Vec<T>,
    scales: ForceScales,
}

impl<T: Real> Diagnostics<T> {
    pub fn new(config: &SimulationConfig) -> Self {
        let diag = &config.diagnostics;
        let capacity = |interval: Option<u64>| -> usize {
            interval
                .map(|n| (config.iterations / n.max(1)).min(MAX_RESERVED_SAMPLES) as usize + 1)
                .unwrap_or(0)
        };

        let probe_capacity = diag
            .probe
            .map(|_| capacity(Some(diag.probe_interval)))
            .unwrap_or(0);
        let vorticity = if diag.snapshot_interval.is_some() {
            vec![T::zero(); config.grid_size()]
        } else {
            Vec::new()
        };

        Self {
            snapshots: Vec::with_capacity(capacity(diag.snapshot_interval)),
            forces: Vec::with_capacity(capacity(diag.force_interval)),
            probe: Vec::with_capacity(probe_capacity),
            perturbation_applied: false,
            divergence_checks: 0,
            vorticity,
            scales: ForceScales {
                reference_density: diag.reference_density,
                velocity: diag.characteristic_velocity,
                length: diag.characteristic_length,
            },
        }
    }

    /// Record whatever is due at the state's current step.
    pub fn record(&mut self, state: &SimulationState<T>, config: &SimulationConfig) {
        let diag = &config.diagnostics;
        let step = state.step;

        if let Some(node) = diag.probe {
            if step % diag.probe_interval == 0 {
                self.probe.push(state.v[state.idx(node.x, node.y)].as_f64());
            }
        }

        if let Some(interval) = diag.force_interval {
            if step % interval == 0 {
                self.forces
                    .push(sample_force(state, &diag.obstacle, &self.scales));
            }
        }

        if let Some(interval) = diag.snapshot_interval {
            if step % interval == 0 {
                self.snapshot(state, config);
            }
        }
    }

    fn snapshot(&mut self, state: &SimulationState<T>, config: &SimulationConfig) {
        vorticity_into(state, &mut self.vorticity, config.execution);
        let field: Vec<f32> = self.vorticity.iter().map(|w| w.as_f32()).collect();
        log::debug!("vorticity snapshot at step {}", state.step);
        self.snapshots.push(VorticitySnapshot {
            step: state.step,
            nx: state.nx,
            ny: state.ny,
            field,
        });
    }
}
