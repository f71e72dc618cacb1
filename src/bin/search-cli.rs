use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use line_search::client::{ClientConfig, SearchClient};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "search-cli")]
#[command(about = "Query a line-search server", long_about = None)]
struct Cli {
    /// Client configuration (TLS settings)
    #[arg(short, long, env = "CLIENT_CONFIG_PATH", default_value = "client_config.toml")]
    config: PathBuf,

    #[arg(long, env = "SERVER_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, env = "SERVER_PORT", default_value_t = 44445)]
    port: u16,

    /// Query to send; may be repeated. Without any, read queries from stdin.
    #[arg(short, long)]
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ClientConfig::load(&cli.config)?;

    let mut client = SearchClient::connect(&cli.host, cli.port, &config).await?;
    println!("Server says: {}", client.greeting());

    if !cli.query.is_empty() {
        for query in &cli.query {
            let response = client.query(query).await?;
            if response.is_error() {
                eprintln!("{query}: {response}");
            } else {
                println!("{query}: {response}");
            }
        }
        client.close().await?;
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Enter your query (or 'exit' to quit): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match client.query(query).await {
            Ok(response) if response.is_error() => eprintln!("Server response: {response}"),
            Ok(response) => println!("Server response: {response}"),
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }

    client.close().await?;
    Ok(())
}
