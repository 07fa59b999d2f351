use clap::Parser;
use tracing_subscriber::EnvFilter;
use worldscribe::config::Config;
use worldscribe::daemon;
use worldscribe::error::Result;
use worldscribe::Worldscribe;

#[derive(Parser, Debug)]
#[command(name = "worldscribed")]
#[command(about = "Worldscribe chapter streaming daemon")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8000)]
    port: u16,

    #[arg(long)]
    config: Option<String>,

    #[arg(long, env = "WORLDSCRIBE_TOKEN", default_value = "")]
    token: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,worldscribe=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let scribe = Worldscribe::from_config(config)?;
    daemon::run(&cli.host, cli.port, scribe, &cli.token).await
}
