//! Delivery Route Solver - Command Line Interface
//!
//! Orders delivery stops read from a JSON file and reports the route.

use clap::{Parser, Subcommand, ValueEnum};
use delivery_route_solver::compare::{CompareConfig, Comparison};
use delivery_route_solver::config::{AlgorithmKind, SolverConfig};
use delivery_route_solver::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic};
use delivery_route_solver::heuristics::local_search::{LocalSearch, Vnd};
use delivery_route_solver::instance::RouteInstance;
use delivery_route_solver::planner::RoutePlanner;
use delivery_route_solver::Result;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "delivery-route-solver")]
#[command(version = "1.0")]
#[command(about = "Orders delivery stops with nearest neighbor and local search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a route for an instance
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// JSON configuration file; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Algorithm to use
        #[arg(short, long, value_enum)]
        algorithm: Option<Algorithm>,

        /// Return to the origin after the last delivery
        #[arg(long)]
        closed: bool,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Average speed in km/h for arrival estimates
        #[arg(long)]
        speed: Option<f64>,

        /// Output route report to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze an instance
    Analyze {
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Compare algorithms on an instance
    Compare {
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of runs
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Return to the origin after the last delivery
        #[arg(long)]
        closed: bool,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Nearest Neighbor construction
    Nn,
    /// Randomized Nearest Neighbor
    NnRandom,
    /// Multi-start construction
    MultiStart,
    /// Multi-start followed by 2-Opt
    TwoOpt,
    /// Multi-start followed by Variable Neighborhood Descent
    Vnd,
}

impl From<Algorithm> for AlgorithmKind {
    fn from(a: Algorithm) -> Self {
        match a {
            Algorithm::Nn => AlgorithmKind::NearestNeighbor,
            Algorithm::NnRandom => AlgorithmKind::NearestNeighborRandom,
            Algorithm::MultiStart => AlgorithmKind::MultiStart,
            Algorithm::TwoOpt => AlgorithmKind::TwoOpt,
            Algorithm::Vnd => AlgorithmKind::Vnd,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Solve { instance, config, algorithm, closed, seed, speed, output, verbose } => {
            load_config(config.as_deref()).and_then(|mut cfg| {
                if let Some(a) = algorithm {
                    cfg.algorithm = a.into();
                }
                if closed {
                    cfg.closed_route = true;
                }
                if let Some(s) = seed {
                    cfg.seed = s;
                }
                if let Some(v) = speed {
                    cfg.average_speed_kmh = v;
                }
                cfg.validate()?;
                solve_instance(&instance, cfg, output, verbose)
            })
        }

        Commands::Analyze { instance } => analyze_instance(&instance),

        Commands::Compare { instance, runs, closed, output } => compare_algorithms(&instance, runs, closed, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<SolverConfig> {
    match path {
        Some(p) => SolverConfig::from_file(p),
        None => Ok(SolverConfig::default()),
    }
}

fn solve_instance(path: &Path, config: SolverConfig, output: Option<PathBuf>, verbose: bool) -> Result<()> {
    println!("Loading instance from {:?}...", path);
    let mut instance = RouteInstance::from_file(path)?;

    if verbose {
        println!("{}", instance.statistics());
    }

    let speed = config.average_speed_kmh;
    let planner = RoutePlanner::new(config);
    let route = planner.plan(&mut instance);

    println!("\n========== Results ==========");
    println!("Algorithm: {}", route.algorithm);
    println!("Distance: {:.2} km", route.distance_km);
    println!("Closed route: {}", route.closed);
    println!("Complete: {}", route.complete);
    println!("Time: {:.4}s", route.computation_time);
    if let Some(iter) = route.iterations {
        println!("Improving moves: {}", iter);
    }

    println!("\n{:<4} {:<20} {:<30} {:>10} {:>8}", "#", "Stop", "Label", "Km", "ETA");
    let legs = route.legs(&instance, speed);
    for (pos, &s) in route.order.iter().enumerate() {
        let stop = &instance.stops[s];
        let (km, eta) = if pos == 0 {
            (0.0, 0.0)
        } else {
            let leg = &legs[pos - 1];
            (leg.cumulative_km, leg.arrival_minute)
        };
        println!("{:<4} {:<20} {:<30} {:>10.2} {:>7.0}m", pos, stop.id, stop.label, km, eta);
    }
    if route.closed {
        if let Some(last) = legs.last() {
            println!("{:<4} {:<20} {:<30} {:>10.2} {:>7.0}m", "", last.to, "(return)", last.cumulative_km, last.arrival_minute);
        }
    }

    if verbose {
        println!("\nOrder: {:?}", route.order);
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&route.report(&instance, speed))?;
        std::fs::write(&out_path, json)?;
        println!("\nRoute saved to {:?}", out_path);
    }

    Ok(())
}

fn analyze_instance(path: &Path) -> Result<()> {
    let instance = RouteInstance::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let with_cep = instance.stops.iter().filter(|s| s.cep.is_some()).count();
    println!("Stops with CEP: {}/{}", with_cep, instance.len());

    let nn = NearestNeighborHeuristic::new().construct(&instance);
    let mut improved = nn.clone();
    Vnd::with_standard_operators().improve(&instance, &mut improved);

    println!("\nQuick Route Estimates:");
    println!("  Nearest Neighbor: {:.2} km", nn.distance_km);
    println!("  Nearest Neighbor + VND: {:.2} km", improved.distance_km);

    Ok(())
}

fn compare_algorithms(path: &Path, runs: usize, closed: bool, output: Option<PathBuf>) -> Result<()> {
    let mut instance = RouteInstance::from_file(path)?;
    instance.closed_route |= closed;

    println!("Comparing algorithms on {} ({} stops)...\n", instance.name, instance.len());

    let config = CompareConfig {
        runs,
        ..Default::default()
    };
    let solver = SolverConfig {
        closed_route: instance.closed_route,
        ..Default::default()
    };
    let mut comparison = Comparison::new(config, solver);
    comparison.run(&instance)?;

    println!("========== Summary ==========");
    println!("{}", comparison.generate_report());

    if let Some(out_path) = output {
        comparison.export_to_csv(&out_path)?;
        println!("Results exported to {:?}", out_path);

        let stats_path = out_path.with_extension("stats.csv");
        comparison.export_statistics_csv(&stats_path)?;
        println!("Statistics exported to {:?}", stats_path);
    }

    Ok(())
}
