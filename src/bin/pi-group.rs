use clap::{Parser, Subcommand};
use simple_pi::config::DEFAULT_SAMPLES;
use simple_pi::distributed::{greeting, monte_carlo_pi_group, trapezoid_pi_group};
use simple_pi::group::ProcessGroup;
use simple_pi::quadrature::partition;
use simple_pi::shard::ShardPlan;
use simple_pi::timing::{timed, Timed};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pi-group", version, about = "Pi estimators on a shared memory process group")]
struct Cli {
    /// Number of processes
    #[arg(short, global = true, default_value_t = 4)]
    p: usize,
    #[command(subcommand)]
    program: Program,
}

#[derive(Subcommand)]
enum Program {
    /// Every rank reports its processor name
    Hello,
    /// Monte Carlo estimate with shard sizes scattered from rank 0
    MonteCarlo {
        /// Number of samples
        #[arg(short, default_value_t = DEFAULT_SAMPLES)]
        n: u64,
    },
    /// Trapezoid rule, partial sums collected by send/recv and by gather
    Trapezoid {
        /// Number of steps
        #[arg(short, default_value_t = DEFAULT_SAMPLES)]
        n: u64,
    },
}

fn run(cli: Cli) -> simple_pi::Result<()> {
    // Reject bad arguments before any rank is spawned
    match cli.program {
        Program::Hello => {}
        Program::MonteCarlo { n } => {
            ShardPlan::new(n, cli.p)?;
        }
        Program::Trapezoid { n } => {
            partition(n, 0, cli.p)?;
        }
    }

    let group = ProcessGroup::init(cli.p)?;

    match cli.program {
        Program::Hello => println!("{}", greeting(&group)),
        Program::MonteCarlo { n } => {
            group.barrier()?;
            let run = timed(|| monte_carlo_pi_group(&group, n, None)).transpose()?;
            if let Some(tally) = run.value {
                let report = Timed {
                    value: tally.estimate()?,
                    elapsed: run.elapsed,
                };
                println!("Samples: {}", tally.samples);
                println!("{}", report);
            }
        }
        Program::Trapezoid { n } => {
            group.barrier()?;
            let run = timed(|| trapezoid_pi_group(&group, n)).transpose()?;
            if let Some(sums) = run.value {
                let report = Timed {
                    value: sums.point_to_point,
                    elapsed: run.elapsed,
                };
                println!("Gathered: {:.6}", sums.gathered);
                println!("{}", report);
            }
        }
    }

    group.finalize()
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
