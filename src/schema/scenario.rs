//! Scenario types for building the solid mask and edge boundary conditions.

use serde::{Deserialize, Serialize};

/// Domain edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// x = 0
    West,
    /// x = nx - 1
    East,
    /// y = 0
    South,
    /// y = ny - 1
    North,
}

impl Edge {
    /// Unit normal pointing into the domain.
    #[inline]
    pub fn inward_normal(self) -> (i32, i32) {
        match self {
            Edge::West => (1, 0),
            Edge::East => (-1, 0),
            Edge::South => (0, 1),
            Edge::North => (0, -1),
        }
    }

    /// Unit tangent (+x for south/north, +y for west/east).
    #[inline]
    pub fn tangent(self) -> (i32, i32) {
        match self {
            Edge::West | Edge::East => (0, 1),
            Edge::South | Edge::North => (1, 0),
        }
    }

    /// Nodes on this edge, corners excluded.
    pub fn nodes(self, nx: usize, ny: usize) -> impl Iterator<Item = (usize, usize)> {
        let len = match self {
            Edge::West | Edge::East => ny,
            Edge::South | Edge::North => nx,
        };
        (1..len.saturating_sub(1)).map(move |t| match self {
            Edge::West => (0, t),
            Edge::East => (nx - 1, t),
            Edge::South => (t, 0),
            Edge::North => (t, ny - 1),
        })
    }

    /// Whether (x, y) lies on this edge, corners excluded.
    pub fn contains(self, x: usize, y: usize, nx: usize, ny: usize) -> bool {
        let inner_x = x > 0 && x + 1 < nx;
        let inner_y = y > 0 && y + 1 < ny;
        match self {
            Edge::West => x == 0 && inner_y,
            Edge::East => x + 1 == nx && inner_y,
            Edge::South => y == 0 && inner_x,
            Edge::North => y + 1 == ny && inner_x,
        }
    }

    /// Adjacent node one step into the domain.
    #[inline]
    pub fn interior_neighbor(self, x: usize, y: usize) -> (usize, usize) {
        match self {
            Edge::West => (x + 1, y),
            Edge::East => (x - 1, y),
            Edge::South => (x, y + 1),
            Edge::North => (x, y - 1),
        }
    }
}

/// Boundary condition owning one domain edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EdgeCondition {
    /// Moving wall, equilibrium at the lid velocity (tangential).
    MovingLid { edge: Edge, velocity: f64 },
    /// Zou-He inlet with prescribed velocity along the inward normal.
    VelocityInlet { edge: Edge, velocity: f64 },
    /// Zou-He outlet with prescribed density.
    PressureOutlet { edge: Edge, density: f64 },
}

impl EdgeCondition {
    pub fn edge(&self) -> Edge {
        match *self {
            EdgeCondition::MovingLid { edge, .. }
            | EdgeCondition::VelocityInlet { edge, .. }
            | EdgeCondition::PressureOutlet { edge, .. } => edge,
        }
    }
}

/// How streaming treats sources outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingMode {
    /// Wrap around; the domain is a torus.
    Periodic,
    /// Walled domain; every perimeter node must be solid or owned by an edge condition.
    Bounded,
}

/// Embedded solid obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum Obstacle {
    /// Disc of lattice nodes with |x - center| <= radius.
    Cylinder { center: (f64, f64), radius: f64 },
    /// Axis-aligned block, inclusive corners.
    Rectangle {
        min: (usize, usize),
        max: (usize, usize),
    },
}

impl Obstacle {
    fn contains(&self, x: usize, y: usize) -> bool {
        match self {
            Obstacle::Cylinder { center, radius } => {
                let dx = x as f64 - center.0;
                let dy = y as f64 - center.1;
                dx * dx + dy * dy <= radius * radius
            }
            Obstacle::Rectangle { min, max } => {
                x >= min.0 && x <= max.0 && y >= min.1 && y <= max.1
            }
        }
    }
}

/// Predefined flow configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Scenario {
    /// Fully periodic box of fluid moving at a uniform velocity.
    Periodic { velocity: (f64, f64) },
    /// Square cavity, no-slip walls on three sides and a lid on the north edge.
    LidDrivenCavity { lid_velocity: f64 },
    /// Channel with walls on south/north, velocity inlet west, pressure outlet east.
    Channel {
        inlet_velocity: f64,
        outlet_density: f64,
        obstacle: Option<Obstacle>,
    },
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario::LidDrivenCavity { lid_velocity: 0.1 }
    }
}

/// Geometry and boundaries handed to the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    /// Solid mask, `y * nx + x`, true = solid.
    pub mask: Vec<bool>,
    pub mode: StreamingMode,
    /// Applied in order after bounce-back.
    pub edges: Vec<EdgeCondition>,
    /// Initial fluid velocity.
    pub initial_velocity: (f64, f64),
}

impl Domain {
    /// Domain from an externally built mask.
    pub fn from_mask(mask: Vec<bool>, mode: StreamingMode, edges: Vec<EdgeCondition>) -> Self {
        Self {
            mask,
            mode,
            edges,
            initial_velocity: (0.0, 0.0),
        }
    }

    /// First perimeter node that is neither solid nor owned by an edge condition.
    pub fn uncovered_perimeter_node(&self, nx: usize, ny: usize) -> Option<(usize, usize)> {
        let perimeter = (0..nx)
            .flat_map(|x| [(x, 0), (x, ny - 1)])
            .chain((1..ny.saturating_sub(1)).flat_map(|y| [(0, y), (nx - 1, y)]));

        perimeter.into_iter().find(|&(x, y)| {
            !self.mask[y * nx + x]
                && !self
                    .edges
                    .iter()
                    .any(|c| c.edge().contains(x, y, nx, ny))
        })
    }
}

impl Scenario {
    /// Build the mask and boundary set for an nx x ny grid.
    pub fn build(&self, nx: usize, ny: usize) -> Domain {
        let mut mask = vec![false; nx * ny];

        match self {
            Scenario::Periodic { velocity } => Domain {
                mask,
                mode: StreamingMode::Periodic,
                edges: Vec::new(),
                initial_velocity: *velocity,
            },
            Scenario::LidDrivenCavity { lid_velocity } => {
                for y in 0..ny {
                    mask[y * nx] = true;
                    mask[y * nx + nx - 1] = true;
                }
                mask[..nx].fill(true);

                Domain {
                    mask,
                    mode: StreamingMode::Bounded,
                    edges: vec![EdgeCondition::MovingLid {
                        edge: Edge::North,
                        velocity: *lid_velocity,
                    }],
                    initial_velocity: (0.0, 0.0),
                }
            }
            Scenario::Channel {
                inlet_velocity,
                outlet_density,
                obstacle,
            } => {
                mask[..nx].fill(true);
                mask[(ny - 1) * nx..].fill(true);
                if let Some(obstacle) = obstacle {
                    for y in 0..ny {
                        for x in 0..nx {
                            if obstacle.contains(x, y) {
                                mask[y * nx + x] = true;
                            }
                        }
                    }
                }

                Domain {
                    mask,
                    mode: StreamingMode::Bounded,
                    edges: vec![
                        EdgeCondition::VelocityInlet {
                            edge: Edge::West,
                            velocity: *inlet_velocity,
                        },
                        EdgeCondition::PressureOutlet {
                            edge: Edge::East,
                            density: *outlet_density,
                        },
                    ],
                    initial_velocity: (*inlet_velocity, 0.0),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cavity_mask() {
        let domain = Scenario::LidDrivenCavity { lid_velocity: 0.1 }.build(10, 8);
        let solid = |x: usize, y: usize| domain.mask[y * 10 + x];
        assert!(solid(0, 4) && solid(9, 4) && solid(5, 0));
        assert!(solid(0, 7) && solid(9, 7));
        assert!(!solid(5, 7));
        assert!(!solid(5, 4));
        assert_eq!(domain.uncovered_perimeter_node(10, 8), None);
    }

    #[test]
    fn test_channel_with_cylinder() {
        let scenario = Scenario::Channel {
            inlet_velocity: 0.05,
            outlet_density: 1.0,
            obstacle: Some(Obstacle::Cylinder {
                center: (10.0, 6.0),
                radius: 2.0,
            }),
        };
        let domain = scenario.build(30, 12);
        assert!(domain.mask[6 * 30 + 10]);
        assert!(domain.mask[6 * 30 + 12]);
        assert!(!domain.mask[6 * 30 + 13]);
        assert!(domain.mask[0] && domain.mask[11 * 30 + 29]);
        assert_eq!(domain.edges.len(), 2);
        assert_eq!(domain.initial_velocity, (0.05, 0.0));
        assert_eq!(domain.uncovered_perimeter_node(30, 12), None);
    }

    #[test]
    fn test_uncovered_perimeter_detected() {
        let domain = Domain::from_mask(vec![false; 6 * 5], StreamingMode::Bounded, Vec::new());
        assert_eq!(domain.uncovered_perimeter_node(6, 5), Some((0, 0)));
    }

    #[test]
    fn test_edge_nodes_exclude_corners() {
        let west: Vec<_> = Edge::West.nodes(5, 4).collect();
        assert_eq!(west, vec![(0, 1), (0, 2)]);
        let north: Vec<_> = Edge::North.nodes(5, 4).collect();
        assert_eq!(north, vec![(1, 3), (2, 3), (3, 3)]);
        assert!(Edge::East.contains(4, 2, 5, 4));
        assert!(!Edge::East.contains(4, 0, 5, 4));
        assert_eq!(Edge::South.interior_neighbor(2, 0), (2, 1));
    }

    #[test]
    fn test_scenario_json_roundtrip() {
        let scenario = Scenario::Channel {
            inlet_velocity: 0.1,
            outlet_density: 1.0,
            obstacle: Some(Obstacle::Rectangle {
                min: (4, 4),
                max: (6, 8),
            }),
        };
        let json = serde_json::to_string(&scenario).unwrap();
        assert!(json.contains("\"type\":\"Channel\""));
        let back: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scenario);
    }
}
