mod session;

use anyhow::Result;
use clap::Parser;

use session::{DemoConfig, DemoSession};

#[derive(Parser)]
#[command(name = "longshot-server")]
#[command(about = "Authoritative hit-scan demo host")]
struct Args {
    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 3.0, help = "Simulated run length in seconds")]
    duration: f32,

    #[arg(short, long, default_value_t = 7)]
    seed: u64,

    #[arg(long, default_value_t = 0.0, help = "Broadcast loss percentage (0-100)")]
    loss_percent: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    anyhow::ensure!(args.tick_rate > 0, "tick rate must be positive");
    anyhow::ensure!(args.duration > 0.0, "duration must be positive");
    anyhow::ensure!(
        (0.0..=100.0).contains(&args.loss_percent),
        "loss percentage must be within 0-100"
    );

    let mut session = DemoSession::new(DemoConfig {
        tick_rate: args.tick_rate,
        duration_secs: args.duration,
        seed: args.seed,
        loss_percent: args.loss_percent,
    });

    log::info!(
        "demo host started: {} ticks/s for {:.1}s",
        args.tick_rate,
        args.duration,
    );
    session.run();
    session.log_summary();

    Ok(())
}
