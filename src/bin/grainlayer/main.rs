//! Grainlayer CLI - turns cohesive grain boundaries into finite-thickness
//! interface layers.
//!
//! Usage: grainlayer -i MESH.inp -c CENTROIDS [OPTIONS]
//!
//! Run `grainlayer --help` for all options.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use env_logger::Env;

use grainlayer::config::{Config, DEFAULT_SHRINK_FACTOR};
use grainlayer::pipeline;

#[derive(Parser)]
#[command(name = "grainlayer")]
#[command(author, version, about = "Polycrystal grain boundary layer generator", long_about = None)]
struct Cli {
    /// Input mesh (Abaqus .inp with cohesive elements)
    #[arg(short, long)]
    input: PathBuf,

    /// Grain centroid file
    #[arg(short, long)]
    centroids: PathBuf,

    /// Treat the domain as periodic
    #[arg(short, long, value_enum, default_value = "n")]
    periodic: YesNo,

    /// Shrink factor, in (0, 1)
    #[arg(short, long, default_value_t = DEFAULT_SHRINK_FACTOR)]
    shrink: f64,

    /// Output mesh (default: INPUT with extension .modified.inp)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Distance within which nodes count as coincident
    #[arg(long)]
    tolerance: Option<f64>,

    /// Margin a periodic match must hold over the runner-up
    #[arg(long)]
    tie_epsilon: Option<f64>,

    /// Let nodes on the domain faces move off their face
    #[arg(long)]
    free_domain_faces: bool,

    /// Repair periodic pairs broken by shrinkage instead of failing
    #[arg(long)]
    reconcile_periodic: bool,

    /// Leave the holes at grain junctions open
    #[arg(long)]
    no_junctions: bool,

    /// First label for generated elements
    #[arg(long)]
    first_element_id: Option<u64>,

    /// Element set prefix marking grains
    #[arg(long)]
    grain_prefix: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum YesNo {
    /// Yes
    #[value(alias = "yes")]
    Y,
    /// No
    #[value(alias = "no")]
    N,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new(&self.input, &self.centroids)
            .with_periodic(self.periodic == YesNo::Y)
            .with_shrink_factor(self.shrink)
            .with_constrain_domain_faces(!self.free_domain_faces)
            .with_reconcile_periodic(self.reconcile_periodic)
            .with_fill_junctions(!self.no_junctions);
        if let Some(output) = &self.output {
            config = config.with_output(output);
        }
        if let Some(tolerance) = self.tolerance {
            config = config.with_tolerance(tolerance);
        }
        if let Some(tie_epsilon) = self.tie_epsilon {
            config = config.with_tie_epsilon(tie_epsilon);
        }
        if let Some(id) = self.first_element_id {
            config = config.with_first_element_id(id);
        }
        if let Some(prefix) = &self.grain_prefix {
            config = config.with_grain_prefix(prefix.as_str());
        }
        config
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let config = cli.config();
    match pipeline::run(&config) {
        Ok(summary) => {
            println!("Grains: {}", summary.grains);
            println!("Interface elements: {}", summary.conversion.interfaces.len());
            if !summary.conversion.junctions.is_empty() {
                println!("Junction elements: {}", summary.conversion.junctions.len());
            }
            if config.periodic {
                println!("Periodic links: {}", summary.conversion.periodic_links);
            }
            println!("Saved: {} ({:.2?})", summary.output.display(), summary.elapsed);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
