use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine};
use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Operator CLI for the admission gate", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token for authenticated commands.
    #[arg(short, long, env = "GATE_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show rate limiter and captcha store status
    Status,
    /// Sweep idle rate-limit entries and expired captchas
    Evict,
    /// Show the identity and permissions behind the token
    Whoami,
    /// Request a captcha, optionally saving the PNG
    Captcha {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Answer a captcha
    Verify { id: String, answer: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
    }

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/api/system/gate", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Evict => {
            let res = client
                .post(format!("{}/api/system/gate/evict", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Whoami => {
            let res = client
                .get(format!("{}/api/auth/whoami", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Captcha { out } => {
            let res = client.get(format!("{}/api/captcha", cli.url)).send().await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }
            let body: Value = res.json().await?;
            let image = body["image"].as_str().unwrap_or_default();

            match out {
                Some(path) => {
                    let encoded = image
                        .strip_prefix("data:image/png;base64,")
                        .ok_or("unexpected image encoding")?;
                    std::fs::write(&path, STANDARD.decode(encoded)?)?;
                    println!("captcha_id: {}", body["captcha_id"].as_str().unwrap_or_default());
                    println!("expires_in: {}s", body["expires_in"]);
                    println!("image written to {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&body)?),
            }
        }
        Commands::Verify { id, answer } => {
            let res = client
                .post(format!("{}/api/captcha/verify", cli.url))
                .json(&json!({ "captcha_id": id, "answer": answer }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gate returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
