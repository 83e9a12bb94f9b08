use clap::Parser;
use csv_geocoder::config::toml_config::TomlConfig;
use csv_geocoder::core::RowFailurePolicy;
use csv_geocoder::domain::ports::Storage;
use csv_geocoder::storage::default_output_for;
use csv_geocoder::utils::error::ErrorKind;
use csv_geocoder::utils::{logger, validation::{self, Validate}};
use csv_geocoder::{EtlEngine, GeocodePipeline, FileStore, ServiceConfig};

#[derive(Parser)]
#[command(name = "geocode-csv")]
#[command(about = "Geocode a local CSV file without running the web service")]
struct Args {
    /// CSV file with Address, City, State and Country columns
    input: String,

    /// Where to write the result (defaults to processed.csv next to the input)
    #[arg(short, long)]
    output: Option<String>,

    /// Provider API key; falls back to the GEOCODE_API_KEY environment variable
    #[arg(long)]
    api_key: Option<String>,

    /// Optional TOML file with [geocoder] / [error_handling] settings
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long)]
    concurrent_requests: Option<usize>,

    #[arg(long, value_enum)]
    row_failure: Option<RowFailurePolicy>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let mut config = match &args.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(toml) => toml.to_service_config(),
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                std::process::exit(2);
            }
        },
        None => ServiceConfig::default(),
    };
    if let Some(n) = args.concurrent_requests {
        config.concurrent_requests = n;
    }
    if let Some(policy) = args.row_failure {
        config.row_failure = policy;
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("GEOCODE_API_KEY").ok());
    let api_key = match validation::validate_required_field("api_key", &api_key) {
        Ok(key) => key.clone(),
        Err(e) => {
            eprintln!("❌ {} (pass --api-key or set GEOCODE_API_KEY)", e);
            std::process::exit(2);
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_for(&args.input));

    let storage = FileStore::new(".");
    let input = storage.read_file(&args.input).await?;

    let engine = EtlEngine::new(GeocodePipeline::from_config(config)?);
    match engine.run(Some(input.as_slice()), Some(api_key.as_str())).await {
        Ok(result) => {
            storage.write_file(&output, result.content.as_bytes()).await?;
            println!("✅ Geocoded {}/{} rows", result.located, result.rows);
            println!("📁 Output saved to: {}", output);
        }
        Err(e) => {
            tracing::error!("❌ Geocoding failed: {:?}", e);
            eprintln!("❌ {}", e);
            let exit_code = match e.kind() {
                ErrorKind::MissingInput | ErrorKind::InvalidInput => 1,
                ErrorKind::GeocodeRowFailure | ErrorKind::InternalError => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
