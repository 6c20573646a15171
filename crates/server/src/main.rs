use clap::Parser;
use hexboard_server::config::Args;
use hexboard_server::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ServerConfig {
        db_path: args.db_path(),
        settings: args.settings()?,
        open: args.open,
        fresh: args.fresh,
    };
    hexboard_server::serve(args.addr(), config).await
}
