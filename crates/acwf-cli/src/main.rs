mod cli;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    std::process::exit(cli::run_from_env());
}
