use clap::Parser;
use simple_pi::distributed::greeting;
use simple_pi::group::ProcessGroup;

#[derive(Parser)]
#[command(about = "Hello world from every rank of a process group")]
struct Args {
    /// Number of processes
    #[arg(short, default_value_t = 4)]
    p: usize,
}

fn main() -> simple_pi::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Spawns p - 1 copies of this program, each landing here with its own rank
    let group = ProcessGroup::init(args.p)?;
    println!("{}", greeting(&group));

    group.finalize()
}
