use clap::Parser;
use csv_geocoder::utils::{logger, validation::Validate};
use csv_geocoder::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    };

    logger::init_logger(cli.verbose, config.json_logs);
    tracing::info!("Starting csv-geocoder");
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    csv_geocoder::server::serve(&config).await?;
    Ok(())
}
