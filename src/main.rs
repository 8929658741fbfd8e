//! Lattice Flow CLI - Run simulations from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use lattice_flow::{
    compute::{FlowStats, Real, RunReport, RunStatus, Solver, lift_amplitude, mean_drag},
    schema::{Precision, SimulationConfig},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [report.json]", args[0]);
        eprintln!();
        eprintln!("Run a lattice Boltzmann simulation from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to simulation configuration file");
        eprintln!("  report.json  Where to write the run report (optional)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let report_path = args.get(2).map(PathBuf::from);

    let config = SimulationConfig::from_json_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading {}: {}", config_path.display(), e);
        std::process::exit(1);
    });

    println!("Lattice Flow Simulation");
    println!("=======================");
    println!("Grid: {}x{}", config.nx, config.ny);
    println!("tau: {}", config.tau);
    println!("Precision: {:?}", config.precision);
    println!("Iterations: {}", config.iterations);
    println!();

    let report = match config.precision {
        Precision::Single => run::<f32>(config),
        Precision::Double => run::<f64>(config),
    };

    print_summary(&report);

    if let Some(path) = report_path {
        let written = serde_json::to_string_pretty(&report)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("Report written to {}", path.display()),
            Err(e) => {
                eprintln!("Error writing report: {}", e);
                std::process::exit(1);
            }
        }
    }

    if matches!(report.status, RunStatus::Aborted { .. }) {
        std::process::exit(2);
    }
}

fn run<T: Real>(config: SimulationConfig) -> RunReport {
    let iterations = config.iterations;
    let mut solver = Solver::<T>::new(config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    println!("Running simulation...");
    let start = Instant::now();
    let progress_every = (iterations / 10).max(1);

    // Print progress every 10%
    while solver.advance(progress_every) == RunStatus::Running {
        let step = solver.state().step;
        let stats = FlowStats::from_state(solver.state());
        let steps_per_sec = step as f32 / start.elapsed().as_secs_f32();
        println!(
            "  Step {}/{}: mass={:.6}, max |u|={:.6}, {:.1} steps/s",
            step, iterations, stats.total_mass, stats.max_speed, steps_per_sec
        );
    }

    let elapsed = start.elapsed();
    let report = solver.finish();
    println!(
        "Time: {:.2}s ({:.1} steps/s)",
        elapsed.as_secs_f32(),
        report.steps as f32 / elapsed.as_secs_f32()
    );
    report
}

fn print_summary(report: &RunReport) {
    println!();
    match report.status {
        RunStatus::Aborted { step, density } => {
            println!("Aborted at step {}: density {} out of bounds", step, density)
        }
        _ => println!("Completed {} steps", report.steps),
    }

    let stats = &report.stats;
    println!("Final state:");
    println!("  Fluid nodes: {}", stats.fluid_nodes);
    println!("  Total mass: {:.6}", stats.total_mass);
    println!(
        "  Density range: [{:.6}, {:.6}]",
        stats.min_density, stats.max_density
    );
    println!(
        "  Speed: max={:.6}, mean={:.6}",
        stats.max_speed, stats.mean_speed
    );

    if !report.forces.is_empty() {
        println!("  Mean Cd: {:.4}", mean_drag(&report.forces));
        println!("  Cl amplitude: {:.4}", lift_amplitude(&report.forces));
    }
    if !report.probe.is_empty() {
        println!("  Probe samples: {}", report.probe.len());
    }
    println!("  Vorticity snapshots: {}", report.snapshots.len());
}

fn print_example_config() {
    let config = SimulationConfig::cylinder_channel(400, 100, 0.53, 0.1, 10.0);

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
}
