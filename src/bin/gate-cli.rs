use std::net::IpAddr;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Management CLI for the admission gate", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "GATE_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gate status
    Status,
    /// Show decision counters
    Metrics,
    /// List blacklisted IPs
    Blacklist,
    /// Remove an IP from the blacklist
    Unblock { ip: IpAddr },
    /// List blocked countries
    Countries,
    /// Add an IP to the whitelist
    Whitelist { ip: IpAddr },
    /// Remove an IP from the whitelist
    Unwhitelist { ip: IpAddr },
}

impl Commands {
    fn request(&self) -> (Method, String) {
        match self {
            Commands::Status => (Method::GET, "/admin/status".into()),
            Commands::Metrics => (Method::GET, "/admin/metrics".into()),
            Commands::Blacklist => (Method::GET, "/admin/blacklist".into()),
            Commands::Unblock { ip } => (Method::DELETE, format!("/admin/blacklist/{}", ip)),
            Commands::Countries => (Method::GET, "/admin/countries".into()),
            Commands::Whitelist { ip } => (Method::POST, format!("/admin/whitelist/{}", ip)),
            Commands::Unwhitelist { ip } => (Method::DELETE, format!("/admin/whitelist/{}", ip)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let (method, path) = cli.command.request();
    let res = client
        .request(method, format!("{}{}", cli.url, path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
