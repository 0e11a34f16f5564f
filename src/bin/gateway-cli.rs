use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the portfolio gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    url: String,

    /// Bearer key for the hardened profile
    #[arg(short, long, env = "API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway is running
    Root,
    /// Liveness probe
    Health,
    /// Fetch portfolio data
    Portfolio {
        /// Account to fetch; the first account when omitted
        #[arg(long)]
        account_id: Option<String>,

        /// Leave out position details
        #[arg(long)]
        no_positions: bool,

        /// Leave out the account summary
        #[arg(long)]
        no_summary: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))?,
        );
    }

    let res = match cli.command {
        Commands::Root => client.get(format!("{}/", base)).send().await?,
        Commands::Health => client.get(format!("{}/api/v1/health", base)).send().await?,
        Commands::Portfolio {
            account_id,
            no_positions,
            no_summary,
        } => {
            let mut query = vec![
                ("include_positions", (!no_positions).to_string()),
                ("include_summary", (!no_summary).to_string()),
            ];
            if let Some(id) = account_id {
                query.push(("account_id", id));
            }
            client
                .get(format!("{}/api/v1/portfolio", base))
                .headers(headers)
                .query(&query)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = serde_json::from_str::<Value>(&text)
        .map(|json| serde_json::to_string_pretty(&json).unwrap_or_else(|_| text.clone()))
        .unwrap_or_else(|_| text.clone());

    if status.is_success() {
        println!("{}", body);
        Ok(())
    } else {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", body);
        Err(format!("request failed with status {}", status).into())
    }
}
