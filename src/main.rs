use clap::Parser;
use fieldcrm_lib::commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // HTTP client spans and events; `log` records go through env_logger
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let output = fieldcrm_lib::run(cli).await.map_err(anyhow::Error::msg)?;
    println!("{}", output);
    Ok(())
}
