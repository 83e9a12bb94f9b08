use clap::Parser;
use csv_geocoder::client::{DEFAULT_ENDPOINT, GENERIC_FAILURE};
use csv_geocoder::utils::logger;
use csv_geocoder::{GeoError, FileStore, UploadClient};

#[derive(Parser)]
#[command(name = "upload-client")]
#[command(about = "Send a CSV to a running csv-geocoder service and save the result")]
struct Args {
    /// CSV file to upload
    file: String,

    /// Provider API key passed through to the service
    #[arg(long)]
    api_key: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    #[arg(short, long, default_value = "processed.csv")]
    output: String,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let storage = FileStore::new(".");
    let client = UploadClient::new(args.endpoint.clone());

    println!("⏳ Processing...");
    match client
        .submit_file(&storage, &args.api_key, &args.file, &args.output)
        .await
    {
        Ok(bytes) => {
            println!("✅ Saved {} ({} bytes)", args.output, bytes);
            Ok(())
        }
        Err(GeoError::MissingInput) => {
            eprintln!("❌ Please enter a valid API Key and select a CSV file.");
            std::process::exit(2);
        }
        Err(e) => {
            tracing::debug!("upload failed: {:?}", e);
            eprintln!("❌ {}", GENERIC_FAILURE);
            std::process::exit(1);
        }
    }
}
