use clap::Parser;
use eyre::Result;
use pool_price_history::{
    cli::CliCmd, config::NodeConfig, connect_http, create_price_series, logging,
};
use tracing::info;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    if let Err(err) = run().await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cmd = CliCmd::parse();
    logging::init(cmd.verbosity.directive());

    let node = match &cmd.rpc_url {
        Some(url) => NodeConfig::new(url.as_str()),
        None => NodeConfig::from_env()?,
    };
    let series_config = cmd.series_config()?;

    let reader = connect_http(&node.rpc_url)?;
    let series = create_price_series(&reader, &series_config).await?;

    info!(
        rows = series.len(),
        first = ?series.first_block(),
        last = ?series.last_block(),
        output = %series_config.output.display(),
        "done"
    );

    Ok(())
}
