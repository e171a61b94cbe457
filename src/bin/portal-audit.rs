use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portal_audit::cli::{dispatch, Cli};
use portal_audit::exit::AuditExit;

#[tokio::main]
async fn main() -> AuditExit {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let words = cli.words();
    dispatch::execute(&cli.root, &words).await.into()
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
