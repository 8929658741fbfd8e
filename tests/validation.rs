//! Long-running physical validation of the two reference flows.

use lattice_flow::{
    compute::{RunStatus, Solver, lift_amplitude, mean_drag},
    schema::SimulationConfig,
};

#[test]
fn test_lid_driven_cavity_stays_bounded() {
    let mut config = SimulationConfig::cavity(100, 100, 0.54, 0.1);
    config.iterations = 10_000;
    config.diagnostics.snapshot_interval = Some(5_000);

    let mut solver = Solver::<f64>::new(config).unwrap();
    assert_eq!(solver.run(), RunStatus::Completed);
    let report = solver.finish();

    assert_eq!(report.steps, 10_000);
    assert!(report.stats.is_finite(), "non-finite flow: {:?}", report.stats);
    assert!(report.stats.max_speed > 0.01);
    assert!(
        report.stats.max_speed < 0.2,
        "velocity exceeds twice the lid speed: {}",
        report.stats.max_speed
    );
    assert!(report.stats.min_density > 0.9 && report.stats.max_density < 1.1);

    let last = report.snapshots.last().unwrap();
    assert!(last.field.iter().all(|w| w.is_finite()));
    // The lid drags the fluid clockwise, so vorticity under the lid is negative.
    assert!(last.get(50, 97) < 0.0);
}

#[test]
fn test_channel_edges_hold_density() {
    let mut config = SimulationConfig::cylinder_channel(120, 30, 0.56, 0.05, 3.0);
    config.iterations = 2_000;

    let mut solver = Solver::<f64>::new(config).unwrap();
    assert_eq!(solver.run(), RunStatus::Completed);
    let stats = solver.finish().stats;

    assert!(stats.is_finite());
    let mean_density = stats.total_mass / stats.fluid_nodes as f64;
    assert!(
        (mean_density - 1.0).abs() < 0.03,
        "mean density drifted to {}",
        mean_density
    );
    assert!(
        stats.min_density > 0.9 && stats.max_density < 1.1,
        "density range [{}, {}]",
        stats.min_density,
        stats.max_density
    );
}

#[test]
fn test_cylinder_sheds_vortices() {
    // Re = U D / nu = 0.1 * 10 / 0.01 = 100
    let mut config = SimulationConfig::cylinder_channel(200, 42, 0.53, 0.1, 5.0);
    config.iterations = 20_000;

    let mut solver = Solver::<f64>::new(config).unwrap();
    assert_eq!(solver.run(), RunStatus::Completed);
    let report = solver.finish();

    assert!(report.stats.is_finite());
    assert_eq!(report.forces.len(), 2_000);

    let late = &report.forces[report.forces.len() - 500..];
    let cd = mean_drag(late);
    let cl = lift_amplitude(late);
    assert!(cd.is_finite() && cd > 0.5 && cd < 10.0, "drag coefficient {}", cd);
    assert!(cl > 0.02, "lift amplitude {} shows no shedding", cl);

    let probe = &report.probe[report.probe.len() - 5_000..];
    let crossings = probe
        .windows(2)
        .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
        .count();
    assert!(crossings >= 3, "probe v crossed zero {} times", crossings);
}
