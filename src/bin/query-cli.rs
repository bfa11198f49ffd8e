use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use query_service::model::CompositeQuery;
use query_service::rules::is_all_queries_disabled;
use query_service_sdk::QueryServiceClient;

#[derive(Parser)]
#[command(name = "query-cli")]
#[command(about = "Management CLI for the query service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8090")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a composite query JSON file locally, without a server
    Check { file: PathBuf },
    /// Check a composite query JSON file through the server
    Evaluate { file: PathBuf },
    /// Service health
    Health,
    /// List registered rules
    Rules,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file } => {
            let query: Option<CompositeQuery> = serde_json::from_value(read_json(&file)?)?;
            println!("all_disabled: {}", is_all_queries_disabled(query.as_ref()));
        }
        Commands::Evaluate { file } => {
            let client = QueryServiceClient::new(&cli.url);
            let check = client.is_all_disabled(&read_json(&file)?).await?;
            println!("{}", serde_json::to_string_pretty(&check)?);
        }
        Commands::Health => {
            let client = QueryServiceClient::new(&cli.url);
            let health = client.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Commands::Rules => {
            let client = QueryServiceClient::new(&cli.url);
            let rules = client.list_rules().await?;
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
