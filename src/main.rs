use clap::Parser;
use subgame_solver::SolverConfig;

/// Discounted-CFR solver for heads-up no-limit hold'em sub-games.
#[derive(Parser)]
#[command(name = "subgame-solver", version, about)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(short, long)]
    config: std::path::PathBuf,
}

fn main() {
    let args = Args::parse();
    let result = SolverConfig::from_file(&args.config).and_then(|config| config.run());
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
