use clap::Parser;
use simple_pi::config::{Method, Settings, DEFAULT_SAMPLES};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "simple-pi", version, about = "Monte Carlo Pi Estimator")]
struct Cli {
    /// Number of samples
    #[arg(short, default_value_t = DEFAULT_SAMPLES)]
    n: u64,
    /// Number of parallel workers
    #[arg(short, default_value_t = 1)]
    p: usize,
    /// Estimation method
    #[arg(long, value_enum, default_value_t = Method::MonteCarlo)]
    method: Method,
}

impl From<Cli> for Settings {
    fn from(cli: Cli) -> Self {
        Settings {
            samples: cli.n,
            workers: cli.p,
            method: cli.method,
            seed: None,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let settings = Settings::from(Cli::parse());
    match settings.run() {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
