use clap::Parser;
use simple_pi::group::ProcessGroup;
use simple_pi::quadrature::partition;
use simple_pi::{PiError, Result};

const PARTIAL_SUM_TAG: i32 = 0;

#[derive(Parser)]
#[command(about = "Trapezoid rule Pi across a process group")]
struct Args {
    /// Number of steps
    #[arg(short, default_value_t = 1_000_000)]
    n: u64,
    /// Number of processes
    #[arg(short, default_value_t = 4)]
    p: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    partition(args.n, 0, args.p)?;
    let group = ProcessGroup::init(args.p)?;

    // Each rank integrates its own slice of [0, 1]
    let segment = partition(args.n, group.rank(), group.size())?;
    let local = segment.integrate();
    println!(
        "Rank {} integrated [{:.4}, {:.4}] in {} steps",
        group.rank(),
        segment.a,
        segment.b,
        segment.steps
    );

    // Point-to-point: every rank sends its partial sum to rank 0
    if group.rank() == 0 {
        let mut total = local;
        for rank in 1..group.size() {
            total += group.recv::<f64>(rank, PARTIAL_SUM_TAG)?;
        }
        println!("Pi={:.6} (send/recv, {} steps)", total, args.n);
    } else {
        group.send(&local, 0, PARTIAL_SUM_TAG)?;
    }

    // Same sum again through a gather
    if let Some(parts) = group.gather(&local, 0)? {
        let total: f64 = parts.iter().sum();
        println!("Pi={:.6} (gather)", total);
        if (total - std::f64::consts::PI).abs() > 1e-3 {
            return Err(PiError::Communication(format!("gathered sum {} is off", total)));
        }
    }

    group.finalize()
}
