mod commands;
mod config;
mod logging;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fairwheel")]
#[command(about = "Fair spinning wheel: provably unbiased picks, animated and shareable")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spin a wheel and print the animation frames and the winner
    Spin {
        /// Entry labels
        #[arg(required = true)]
        labels: Vec<String>,
        /// Comma-separated weights, one per label
        #[arg(short, long, value_delimiter = ',')]
        weights: Vec<u32>,
        /// Animation length in milliseconds
        #[arg(short, long)]
        duration: Option<f64>,
        /// Simulated frames per second
        #[arg(long, default_value_t = 10)]
        fps: u32,
        /// Seed for a reproducible spin instead of the system generator
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print a share link for a wheel
    Share {
        /// Entry labels
        #[arg(required = true)]
        labels: Vec<String>,
        /// Comma-separated weights, one per label
        #[arg(short, long, value_delimiter = ',')]
        weights: Vec<u32>,
        /// Wheel name
        #[arg(short, long)]
        name: Option<String>,
        /// Comma-separated past winners
        #[arg(long, value_delimiter = ',')]
        history: Vec<String>,
    },

    /// Show the wheel inside a share link
    Open {
        token: String,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Spin many times and report how often each entry won
    Simulate {
        /// Entry labels
        #[arg(required = true)]
        labels: Vec<String>,
        /// Comma-separated weights, one per label
        #[arg(short, long, value_delimiter = ',')]
        weights: Vec<u32>,
        #[arg(short, long, default_value_t = 100_000)]
        spins: u32,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup(cli.verbose);
    let spin_config = config::load();

    match cli.command {
        Commands::Spin {
            labels,
            weights,
            duration,
            fps,
            seed,
        } => {
            let mut spin_config = spin_config;
            if let Some(duration) = duration {
                spin_config.duration_ms = duration;
            }
            commands::spin(&labels, &weights, spin_config, fps, seed)
        }
        Commands::Share {
            labels,
            weights,
            name,
            history,
        } => commands::share(&labels, &weights, name, history, spin_config),
        Commands::Open { token, json } => commands::open(&token, json, spin_config),
        Commands::Simulate {
            labels,
            weights,
            spins,
            seed,
        } => commands::simulate(&labels, &weights, spins, seed, spin_config),
    }
}
