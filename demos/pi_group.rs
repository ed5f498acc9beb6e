use clap::Parser;
use simple_pi::config::DEFAULT_SAMPLES;
use simple_pi::distributed::monte_carlo_pi_group;
use simple_pi::group::ProcessGroup;
use simple_pi::shard::ShardPlan;
use simple_pi::timing::timed;

#[derive(Parser)]
#[command(about = "Monte Carlo Pi Estimator (process group)")]
struct Args {
    /// Number of samples
    #[arg(short, default_value_t = DEFAULT_SAMPLES)]
    n: u64,
    /// Number of processes
    #[arg(short, default_value_t = 4)]
    p: usize,
}

fn main() -> simple_pi::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Fail on bad arguments before spawning anything
    ShardPlan::new(args.n, args.p)?;
    let group = ProcessGroup::init(args.p)?;

    group.barrier()?;
    let run = timed(|| monte_carlo_pi_group(&group, args.n, None)).transpose()?;

    if let Some(tally) = &run.value {
        println!("Result: {:.6}", tally.estimate()?);
        println!("Elapsed time: {:.6}", run.seconds());
    }

    group.finalize()
}
