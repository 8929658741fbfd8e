//! Configuration types for lattice Boltzmann runs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Domain, EdgeCondition, Obstacle, Scenario, StreamingMode};

/// Floating-point precision of the solver fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Single,
    #[default]
    Double,
}

/// How bulk kernels traverse the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    /// Row-parallel on the rayon pool (sequential on wasm).
    #[default]
    Parallel,
    /// Single-threaded.
    Sequential,
}

/// Lattice node coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub x: usize,
    pub y: usize,
}

/// Which solid nodes count as the obstacle when measuring force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObstacleSelector {
    /// Every solid node, channel walls included.
    AllSolid,
    /// Solid nodes off the domain perimeter.
    #[default]
    Interior,
    /// Solid nodes in rows `min_row..=max_row`, perimeter columns excluded.
    RowRange { min_row: usize, max_row: usize },
}

impl ObstacleSelector {
    /// Whether the solid node at (x, y) belongs to the obstacle.
    #[inline]
    pub fn includes(&self, x: usize, y: usize, nx: usize, ny: usize) -> bool {
        let inner_x = x > 0 && x + 1 < nx;
        match *self {
            ObstacleSelector::AllSolid => true,
            ObstacleSelector::Interior => inner_x && y > 0 && y + 1 < ny,
            ObstacleSelector::RowRange { min_row, max_row } => {
                inner_x && y >= min_row && y <= max_row
            }
        }
    }
}

fn default_divergence_interval() -> u64 {
    100
}

fn default_density_bound() -> f64 {
    10.0
}

fn default_one() -> f64 {
    1.0
}

fn default_characteristic_velocity() -> f64 {
    0.1
}

/// Diagnostics recorded during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Record a vorticity snapshot every N steps.
    #[serde(default)]
    pub snapshot_interval: Option<u64>,
    /// Record v at this node every `probe_interval` steps.
    #[serde(default)]
    pub probe: Option<Node>,
    #[serde(default = "default_probe_interval")]
    pub probe_interval: u64,
    /// Sample the obstacle force every N steps.
    #[serde(default)]
    pub force_interval: Option<u64>,
    /// Obstacle diameter D used for force coefficients.
    #[serde(default = "default_one")]
    pub characteristic_length: f64,
    /// Reference velocity U used for force coefficients.
    #[serde(default = "default_characteristic_velocity")]
    pub characteristic_velocity: f64,
    /// Reference density for force coefficients.
    #[serde(default = "default_one")]
    pub reference_density: f64,
    /// Obstacle-only predicate for force measurement.
    #[serde(default)]
    pub obstacle: ObstacleSelector,
    /// Divergence check period in steps.
    #[serde(default = "default_divergence_interval")]
    pub divergence_interval: u64,
    /// Node sampled by the divergence check (grid centre if unset).
    #[serde(default)]
    pub divergence_node: Option<Node>,
    /// Densities with larger magnitude count as divergence.
    #[serde(default = "default_density_bound")]
    pub density_bound: f64,
}

fn default_probe_interval() -> u64 {
    1
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: None,
            probe: None,
            probe_interval: default_probe_interval(),
            force_interval: None,
            characteristic_length: 1.0,
            characteristic_velocity: default_characteristic_velocity(),
            reference_density: 1.0,
            obstacle: ObstacleSelector::default(),
            divergence_interval: default_divergence_interval(),
            divergence_node: None,
            density_bound: default_density_bound(),
        }
    }
}

/// One-shot symmetry-breaking perturbation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationConfig {
    /// Step at which the perturbation is injected.
    pub step: u64,
    /// Centre node; must be fluid.
    pub x: usize,
    pub y: usize,
    /// Half-width of the square block of perturbed nodes.
    #[serde(default)]
    pub half_width: usize,
    /// Transverse velocity added to each perturbed node.
    pub amplitude: f64,
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid width in nodes (X dimension).
    pub nx: usize,
    /// Grid height in nodes (Y dimension).
    pub ny: usize,
    /// BGK relaxation time, must exceed 0.5.
    pub tau: f64,
    #[serde(default)]
    pub precision: Precision,
    /// Number of iterations to run.
    pub iterations: u64,
    #[serde(default)]
    pub execution: Execution,
    /// Worker threads for parallel execution (rayon's default when unset).
    #[serde(default)]
    pub threads: Option<usize>,
    pub scenario: Scenario,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub perturbation: Option<PerturbationConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::cavity(128, 128, 0.56, 0.1)
    }
}

impl SimulationConfig {
    /// Lid-driven cavity preset.
    pub fn cavity(nx: usize, ny: usize, tau: f64, lid_velocity: f64) -> Self {
        Self {
            nx,
            ny,
            tau,
            precision: Precision::Double,
            iterations: 10_000,
            execution: Execution::Parallel,
            threads: None,
            scenario: Scenario::LidDrivenCavity { lid_velocity },
            diagnostics: DiagnosticsConfig {
                characteristic_length: nx as f64,
                characteristic_velocity: lid_velocity,
                ..DiagnosticsConfig::default()
            },
            perturbation: None,
        }
    }

    /// Channel with a cylinder at a quarter of the length, slightly off the centreline.
    pub fn cylinder_channel(nx: usize, ny: usize, tau: f64, inlet_velocity: f64, radius: f64) -> Self {
        let cx = (nx / 5) as f64;
        let cy = (ny / 2) as f64;
        let diameter = 2.0 * radius;
        Self {
            nx,
            ny,
            tau,
            precision: Precision::Double,
            iterations: 20_000,
            execution: Execution::Parallel,
            threads: None,
            scenario: Scenario::Channel {
                inlet_velocity,
                outlet_density: 1.0,
                obstacle: Some(Obstacle::Cylinder {
                    center: (cx, cy),
                    radius,
                }),
            },
            diagnostics: DiagnosticsConfig {
                force_interval: Some(10),
                probe: Some(Node {
                    x: (cx + 3.0 * diameter) as usize,
                    y: ny / 2,
                }),
                characteristic_length: diameter,
                characteristic_velocity: inlet_velocity,
                ..DiagnosticsConfig::default()
            },
            perturbation: Some(PerturbationConfig {
                step: 500,
                x: (cx + radius + 3.0) as usize,
                y: ny / 2 + 1,
                half_width: 1,
                amplitude: 0.5 * inlet_velocity,
            }),
        }
    }

    /// Total number of lattice nodes.
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.nx * self.ny
    }

    /// Node sampled by the divergence check before the geometry is known.
    pub fn divergence_node(&self) -> Node {
        self.diagnostics.divergence_node.unwrap_or(Node {
            x: self.nx / 2,
            y: self.ny / 2,
        })
    }

    /// Divergence node resolved against a solid mask.
    ///
    /// A configured node must be fluid. Without one, the fluid node closest
    /// to the grid centre is used.
    pub fn resolve_divergence_node(&self, mask: &[bool]) -> Result<Node, ConfigError> {
        if let Some(node) = self.diagnostics.divergence_node {
            if mask[node.y * self.nx + node.x] {
                return Err(ConfigError::NodeOnSolid {
                    what: "divergence_node",
                    x: node.x,
                    y: node.y,
                });
            }
            return Ok(node);
        }

        let (cx, cy) = ((self.nx / 2) as i64, (self.ny / 2) as i64);
        mask.iter()
            .enumerate()
            .filter(|&(_, &solid)| !solid)
            .map(|(i, _)| Node {
                x: i % self.nx,
                y: i / self.nx,
            })
            .min_by_key(|n| {
                let dx = n.x as i64 - cx;
                let dy = n.y as i64 - cy;
                dx * dx + dy * dy
            })
            .ok_or(ConfigError::NoFluidNodes)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate parameters that do not depend on the geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nx < 3 || self.ny < 3 {
            return Err(ConfigError::InvalidDimensions {
                nx: self.nx,
                ny: self.ny,
            });
        }
        if !self.tau.is_finite() || self.tau <= 0.5 {
            return Err(ConfigError::InvalidRelaxationTime(self.tau));
        }

        let diag = &self.diagnostics;
        if diag.snapshot_interval == Some(0) {
            return Err(ConfigError::InvalidInterval("snapshot_interval"));
        }
        if diag.force_interval == Some(0) {
            return Err(ConfigError::InvalidInterval("force_interval"));
        }
        if diag.probe_interval == 0 {
            return Err(ConfigError::InvalidInterval("probe_interval"));
        }
        if diag.divergence_interval == 0 {
            return Err(ConfigError::InvalidInterval("divergence_interval"));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::InvalidThreadCount);
        }
        if !(diag.density_bound > 0.0) {
            return Err(ConfigError::InvalidDensityBound(diag.density_bound));
        }
        if diag.force_interval.is_some() {
            for (name, value) in [
                ("characteristic_length", diag.characteristic_length),
                ("characteristic_velocity", diag.characteristic_velocity),
                ("reference_density", diag.reference_density),
            ] {
                if !(value > 0.0) || !value.is_finite() {
                    return Err(ConfigError::InvalidScale { name, value });
                }
            }
        }

        if let Some(probe) = diag.probe {
            self.check_bounds("probe", probe.x, probe.y)?;
        }
        let node = self.divergence_node();
        self.check_bounds("divergence_node", node.x, node.y)?;
        if let Some(p) = &self.perturbation {
            self.check_bounds("perturbation", p.x, p.y)?;
        }

        match &self.scenario {
            Scenario::Channel {
                inlet_velocity,
                outlet_density,
                ..
            } => {
                check_inlet(*inlet_velocity)?;
                check_outlet(*outlet_density)?;
            }
            Scenario::Periodic { .. } | Scenario::LidDrivenCavity { .. } => {}
        }

        Ok(())
    }

    /// Validate the geometry-dependent parts against a built domain.
    pub fn validate_domain(&self, domain: &Domain) -> Result<(), ConfigError> {
        if domain.mask.len() != self.grid_size() {
            return Err(ConfigError::MaskSizeMismatch {
                expected: self.grid_size(),
                actual: domain.mask.len(),
            });
        }
        if domain.mode == StreamingMode::Bounded {
            if let Some((x, y)) = domain.uncovered_perimeter_node(self.nx, self.ny) {
                return Err(ConfigError::UncoveredPerimeter { x, y });
            }
        }
        for condition in &domain.edges {
            match *condition {
                EdgeCondition::VelocityInlet { velocity, .. } => check_inlet(velocity)?,
                EdgeCondition::PressureOutlet { density, .. } => check_outlet(density)?,
                EdgeCondition::MovingLid { .. } => {}
            }
        }
        if let Some(probe) = self.diagnostics.probe {
            if domain.mask[probe.y * self.nx + probe.x] {
                return Err(ConfigError::NodeOnSolid {
                    what: "probe",
                    x: probe.x,
                    y: probe.y,
                });
            }
        }
        self.resolve_divergence_node(&domain.mask)?;
        if let Some(p) = &self.perturbation {
            if domain.mask[p.y * self.nx + p.x] {
                return Err(ConfigError::PerturbationOnSolid { x: p.x, y: p.y });
            }
        }
        Ok(())
    }

    fn check_bounds(&self, what: &'static str, x: usize, y: usize) -> Result<(), ConfigError> {
        if x >= self.nx || y >= self.ny {
            return Err(ConfigError::NodeOutOfBounds { what, x, y });
        }
        Ok(())
    }
}

fn check_inlet(velocity: f64) -> Result<(), ConfigError> {
    if !velocity.is_finite() || velocity.abs() >= 1.0 {
        return Err(ConfigError::InvalidInletVelocity(velocity));
    }
    Ok(())
}

fn check_outlet(density: f64) -> Result<(), ConfigError> {
    if !(density > 0.0) || !density.is_finite() {
        return Err(ConfigError::InvalidOutletDensity(density));
    }
    Ok(())
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid dimensions must be at least 3x3, got {nx}x{ny}")]
    InvalidDimensions { nx: usize, ny: usize },
    #[error("Relaxation time must be finite and greater than 0.5, got {0}")]
    InvalidRelaxationTime(f64),
    #[error("Interval `{0}` must be non-zero")]
    InvalidInterval(&'static str),
    #[error("Density bound must be positive, got {0}")]
    InvalidDensityBound(f64),
    #[error("Characteristic scale `{name}` must be positive, got {value}")]
    InvalidScale { name: &'static str, value: f64 },
    #[error("{what} node ({x}, {y}) lies outside the grid")]
    NodeOutOfBounds { what: &'static str, x: usize, y: usize },
    #[error("{what} node ({x}, {y}) is a solid node")]
    NodeOnSolid { what: &'static str, x: usize, y: usize },
    #[error("Thread count must be non-zero")]
    InvalidThreadCount,
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
    #[error("Domain has no fluid nodes")]
    NoFluidNodes,
    #[error("Perturbation target ({x}, {y}) is a solid node")]
    PerturbationOnSolid { x: usize, y: usize },
    #[error("Mask has {actual} entries, expected {expected}")]
    MaskSizeMismatch { expected: usize, actual: usize },
    #[error("Perimeter node ({x}, {y}) is neither solid nor owned by an edge condition")]
    UncoveredPerimeter { x: usize, y: usize },
    #[error("Inlet velocity must satisfy |u| < 1, got {0}")]
    InvalidInletVelocity(f64),
    #[error("Outlet density must be positive, got {0}")]
    InvalidOutletDensity(f64),
}

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
}
