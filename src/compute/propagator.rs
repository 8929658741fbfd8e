//! Solver - Main time loop for the lattice Boltzmann method.
//!
//! Orchestrates all kernels for each time step:
//! stream -> bounce-back -> edge conditions -> moments -> collision -> diagnostics.

use serde::{Deserialize, Serialize};

use super::{
    D2Q9, Diagnostics, FlowStats, ForceSample, Lattice, Real, SimulationState, VorticitySnapshot,
    apply_edge_condition, bounce_back, collide, compute_moments, equilibrium_into, stream,
};
use crate::schema::{ConfigError, Domain, EdgeCondition, Execution, Precision, SimulationConfig};

const Q: usize = D2Q9::Q;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum RunStatus {
    Running,
    /// All configured iterations finished.
    Completed,
    /// The divergence check tripped at `step` with the sampled `density`.
    Aborted { step: u64, density: f64 },
}

/// Everything a finished run hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    /// Iterations actually performed.
    pub steps: u64,
    pub snapshots: Vec<VorticitySnapshot>,
    pub forces: Vec<ForceSample>,
    /// Probe time series of v.
    pub probe: Vec<f64>,
    pub stats: FlowStats,
}

/// Lattice Boltzmann solver owning the state for the whole run.
///
/// In parallel mode the solver owns its rayon pool. [`Solver::advance`] and
/// [`Solver::run`] enter the pool once per call, so the steps inside do not
/// allocate after warm-up.
pub struct Solver<T: Real> {
    config: SimulationConfig,
    lattice: Lattice<T>,
    state: SimulationState<T>,
    edges: Vec<EdgeCondition>,
    diagnostics: Diagnostics<T>,
    status: RunStatus,
    /// Node index sampled by the divergence check.
    divergence_node: usize,
    #[cfg(not(target_arch = "wasm32"))]
    pool: Option<rayon::ThreadPool>,
}

impl<T: Real> Solver<T> {
    /// Create a solver with the geometry described by `config.scenario`.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let domain = config.scenario.build(config.nx, config.ny);
        Self::with_domain(config, domain)
    }

    /// Create a solver over an externally built domain.
    pub fn with_domain(config: SimulationConfig, domain: Domain) -> Result<Self, ConfigError> {
        config.validate()?;
        config.validate_domain(&domain)?;

        let divergence = config.resolve_divergence_node(&domain.mask)?;
        let divergence_node = divergence.y * config.nx + divergence.x;
        #[cfg(not(target_arch = "wasm32"))]
        let pool = match config.execution {
            Execution::Parallel => {
                let mut builder = rayon::ThreadPoolBuilder::new();
                if let Some(threads) = config.threads {
                    builder = builder.num_threads(threads);
                }
                let pool = builder
                    .build()
                    .map_err(|e| ConfigError::WorkerPool(e.to_string()))?;
                Some(pool)
            }
            Execution::Sequential => None,
        };

        let lattice = Lattice::new();
        let (u0, v0) = domain.initial_velocity;
        let mut state = SimulationState::new(config.nx, config.ny, T::lit(config.tau), domain.mask);
        state.initialize(&lattice, T::one(), T::lit(u0), T::lit(v0));

        let diagnostics = Diagnostics::new(&config);
        let status = if config.iterations == 0 {
            RunStatus::Completed
        } else {
            RunStatus::Running
        };

        Ok(Self {
            config,
            lattice,
            state,
            edges: domain.edges,
            diagnostics,
            status,
            divergence_node,
            #[cfg(not(target_arch = "wasm32"))]
            pool,
        })
    }

    /// Perform one iteration. Does nothing once the run has finished.
    pub fn step(&mut self) -> RunStatus {
        self.in_pool(Self::step_once)
    }

    /// Perform up to `steps` iterations, stopping early when the run ends.
    pub fn advance(&mut self, steps: u64) -> RunStatus {
        self.in_pool(|solver| {
            for _ in 0..steps {
                if solver.step_once() != RunStatus::Running {
                    break;
                }
            }
            solver.status
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn in_pool<R: Send>(&mut self, op: impl FnOnce(&mut Self) -> R + Send) -> R {
        match self.pool.take() {
            Some(pool) => {
                let result = pool.install(|| op(self));
                self.pool = Some(pool);
                result
            }
            None => op(self),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn in_pool<R>(&mut self, op: impl FnOnce(&mut Self) -> R) -> R {
        op(self)
    }

    fn step_once(&mut self) -> RunStatus {
        if self.status != RunStatus::Running {
            return self.status;
        }
        let execution = self.config.execution;

        self.apply_perturbation();

        stream(&mut self.state, execution);
        bounce_back(&mut self.state, execution);
        for condition in &self.edges {
            apply_edge_condition(&mut self.state, &self.lattice, condition);
        }
        compute_moments(&mut self.state, &self.lattice, execution);
        collide(&mut self.state, &self.lattice, execution);

        self.state.step += 1;
        self.diagnostics.record(&self.state, &self.config);

        if self.state.step % self.config.diagnostics.divergence_interval == 0 {
            self.check_divergence();
        }
        if self.status == RunStatus::Running && self.state.step >= self.config.iterations {
            self.status = RunStatus::Completed;
        }
        self.status
    }

    /// Run until all iterations complete or the run aborts.
    pub fn run(&mut self) -> RunStatus {
        log::info!(
            "running {} iterations on {}x{} (tau = {})",
            self.config.iterations,
            self.config.nx,
            self.config.ny,
            self.config.tau
        );
        self.in_pool(|solver| while solver.step_once() == RunStatus::Running {});

        match self.status {
            RunStatus::Aborted { step, density } => {
                log::warn!("run aborted at step {}: density {}", step, density)
            }
            _ => log::info!("run completed after {} steps", self.state.step),
        }
        self.status
    }

    /// Consume the solver and return the collected diagnostics.
    pub fn finish(self) -> RunReport {
        let stats = FlowStats::from_state(&self.state);
        RunReport {
            status: self.status,
            steps: self.state.step,
            snapshots: self.diagnostics.snapshots,
            forces: self.diagnostics.forces,
            probe: self.diagnostics.probe,
            stats,
        }
    }

    /// Inject the one-shot transverse velocity kick when its step comes up.
    fn apply_perturbation(&mut self) {
        let Some(p) = &self.config.perturbation else {
            return;
        };
        if self.diagnostics.perturbation_applied || self.state.step != p.step {
            return;
        }
        self.diagnostics.perturbation_applied = true;

        let state = &mut self.state;
        let amplitude = T::lit(p.amplitude);
        let mut feq = [T::zero(); Q];
        let x_range = p.x.saturating_sub(p.half_width)..=(p.x + p.half_width).min(state.nx - 1);
        let y_range = p.y.saturating_sub(p.half_width)..=(p.y + p.half_width).min(state.ny - 1);

        for y in y_range {
            for x in x_range.clone() {
                if state.is_solid(x, y) {
                    log::debug!("perturbation skips solid node ({}, {})", x, y);
                    continue;
                }
                let n = state.idx(x, y);
                equilibrium_into(state.rho[n], state.u[n], state.v[n] + amplitude, &self.lattice, &mut feq);
                state.f_out[n * Q..(n + 1) * Q].copy_from_slice(&feq);
            }
        }
        log::debug!("perturbation applied at step {}", state.step);
    }

    fn check_divergence(&mut self) {
        self.diagnostics.divergence_checks += 1;
        let rho = self.state.rho[self.divergence_node].as_f64();
        if !rho.is_finite() || rho.abs() > self.config.diagnostics.density_bound {
            self.status = RunStatus::Aborted {
                step: self.state.step,
                density: rho,
            };
        }
    }

    #[inline]
    pub fn state(&self) -> &SimulationState<T> {
        &self.state
    }

    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics<T> {
        &self.diagnostics
    }

    #[inline]
    pub fn status(&self) -> RunStatus {
        self.status
    }

    #[inline]
    pub fn lattice(&self) -> &Lattice<T> {
        &self.lattice
    }
}

/// Build, run and report a simulation at the configured precision.
pub fn run_simulation(config: SimulationConfig) -> Result<RunReport, ConfigError> {
    match config.precision {
        Precision::Single => {
            let mut solver = Solver::<f32>::new(config)?;
            solver.run();
            Ok(solver.finish())
        }
        Precision::Double => {
            let mut solver = Solver::<f64>::new(config)?;
            solver.run();
            Ok(solver.finish())
        }
    }
}
