use std::error::Error;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use priority_scheduling_simulator::io::Console;
use priority_scheduling_simulator::kernel::{Driver, FitStrategy, SystemConfig};

/// Interactive priority scheduling, memory and device queue simulator.
#[derive(Parser)]
#[command(name = "priority-scheduler")]
#[command(version)]
#[command(
    about = "Simulates preemptive priority scheduling, contiguous memory and device queues",
    long_about = None
)]
struct Cli {
    /// Total memory in bytes (prompted for if omitted)
    #[arg(short, long)]
    memory: Option<usize>,

    /// Number of hard disks, 1-10 (prompted for if omitted)
    #[arg(short, long)]
    disks: Option<usize>,

    /// How a hole is chosen for a new process
    #[arg(long, value_enum, default_value_t = Fit::First)]
    fit: Fit,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Fit {
    First,
    Best,
}

impl From<Fit> for FitStrategy {
    fn from(fit: Fit) -> Self {
        match fit {
            Fit::First => FitStrategy::FirstFit,
            Fit::Best => FitStrategy::BestFit,
        }
    }
}

/// `-v` count to filter: warnings by default, then info, debug, trace.
fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with console output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose))),
        )
        .init();

    let stdin = std::io::stdin();
    let mut console = Console::new(stdin.lock(), std::io::stdout());

    let (memory_size, num_disks) = console.configure(cli.memory, cli.disks)?;
    let config = SystemConfig::new(memory_size, num_disks)?.with_fit_strategy(cli.fit.into());

    let mut driver = Driver::new(config);
    console.run(&mut driver)?;

    Ok(())
}
