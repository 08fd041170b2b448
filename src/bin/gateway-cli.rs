use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the portfolio gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Sent as x-forwarded-for to act as a given client
    #[arg(short, long)]
    forwarded_for: Option<String>,

    /// Sent as x-request-id
    #[arg(short, long)]
    request_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness
    Health,
    /// Send a chat message
    Chat {
        message: String,
    },
    /// Submit the contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        company: Option<String>,
        message: String,
    },
    /// Ask for recommendations
    Recommend {
        #[arg(long, default_value = "other")]
        persona: String,
        /// Comma-separated interests
        #[arg(long, value_delimiter = ',')]
        interests: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(ip) = &cli.forwarded_for {
        headers.insert("x-forwarded-for", HeaderValue::from_str(ip)?);
    }
    if let Some(id) = &cli.request_id {
        headers.insert("x-request-id", HeaderValue::from_str(id)?);
    }

    let (path, body) = match cli.command {
        Commands::Health => {
            let res = client
                .get(format!("{}/health", cli.url))
                .headers(headers)
                .send()
                .await?;
            return print_response(res).await;
        }
        Commands::Chat { message } => ("/api/chat", json!({ "message": message })),
        Commands::Contact {
            name,
            email,
            company,
            message,
        } => (
            "/api/contact",
            json!({ "name": name, "email": email, "company": company, "message": message }),
        ),
        Commands::Recommend { persona, interests } => (
            "/api/recommend",
            json!({ "persona": persona, "interests": interests }),
        ),
    };

    let res = client
        .post(format!("{}{}", cli.url, path))
        .headers(headers)
        .json(&body)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    println!("Status: {}", status);
    if let Some(id) = res.headers().get("x-request-id").and_then(|v| v.to_str().ok()) {
        println!("Request ID: {}", id);
    }
    if let Some(retry) = res.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()) {
        println!("Retry after: {}s", retry);
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
