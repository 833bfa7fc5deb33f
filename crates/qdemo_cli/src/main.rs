//! qdemo CLI Entry Point

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qdemo_cli::{demos, Cli};

fn main() {
    // Credentials may live in a local .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.global.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().compact().with_target(false))
        .init();

    if let Err(err) = demos::execute(&cli) {
        for cause in err.chain().skip(1) {
            tracing::debug!("caused by: {}", cause);
        }
        tracing::error!("{:#}", err);
        eprintln!("❌ {:#}", err);
        eprintln!("💡 For IBM hardware, set IBM_QUANTUM_TOKEN (and IBM_QUANTUM_INSTANCE) in .env,");
        eprintln!("   or pass --backend simulator to run locally.");
        std::process::exit(1);
    }
}
