use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::task::JoinSet;

#[derive(Parser)]
#[command(name = "lb-cli")]
#[command(about = "Query and drive the elastic load balancer", long_about = None)]
struct Cli {
    /// Balancer base URL; repeat to rotate requests across several balancers
    #[arg(short, long, default_value = "http://localhost:4001")]
    url: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Balancer liveness
    Health,
    /// CPU usage and open connections per primary worker
    Metrics,
    /// Requests per second per primary worker
    Requests,
    /// Primary and standby pool membership
    Pool,
    /// Send a single request
    Send {
        /// Payload for the `data` field
        data: String,
    },
    /// Fire a stream of requests and summarize where they landed
    Load {
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,

        /// Pause between requests, in milliseconds
        #[arg(short, long, default_value_t = 50)]
        delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let first = cli.url.first().cloned().unwrap_or_else(|| "http://localhost:4001".to_string());

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", first)).send().await?;
            print_response(res).await?;
        }
        Commands::Metrics => {
            let res = client.get(format!("{}/metrics", first)).send().await?;
            print_response(res).await?;
        }
        Commands::Requests => {
            let res = client.get(format!("{}/requestsData", first)).send().await?;
            print_response(res).await?;
        }
        Commands::Pool => {
            let res = client.get(format!("{}/pool", first)).send().await?;
            print_response(res).await?;
        }
        Commands::Send { data } => {
            let res = client
                .post(format!("{}/sendRequest", first))
                .json(&json!({ "data": data }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Load { count, delay_ms } => {
            run_load(&client, &cli.url, count, Duration::from_millis(delay_ms)).await?;
        }
    }

    Ok(())
}

/// Balancers that currently answer `/health`.
async fn healthy_balancers(client: &reqwest::Client, urls: &[String]) -> Vec<String> {
    let mut healthy = Vec::new();
    for url in urls {
        match client.get(format!("{}/health", url)).send().await {
            Ok(res) if res.status().is_success() => healthy.push(url.clone()),
            Ok(res) => eprintln!("Load balancer {} is down: status {}", url, res.status()),
            Err(e) => eprintln!("Load balancer {} is down: {}", url, e),
        }
    }
    healthy
}

async fn run_load(
    client: &reqwest::Client,
    urls: &[String],
    count: usize,
    delay: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let balancers = healthy_balancers(client, urls).await;
    if balancers.is_empty() {
        return Err("no healthy load balancers available".into());
    }

    let mut tasks = JoinSet::new();
    for i in 0..count {
        let url = format!("{}/sendRequest", balancers[i % balancers.len()]);
        let client = client.clone();
        tasks.spawn(async move {
            let body = json!({ "data": format!("request {}", i + 1) });
            let res = client.post(url).json(&body).send().await?;
            let status = res.status();
            let json: Value = res.json().await.unwrap_or(Value::Null);
            Ok::<_, reqwest::Error>((status, json))
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    let mut per_server: BTreeMap<String, usize> = BTreeMap::new();
    let mut failures: BTreeMap<String, usize> = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok((status, body))) if status.is_success() => {
                let server = body["selectedServer"].as_str().unwrap_or("unknown").to_string();
                *per_server.entry(server).or_default() += 1;
            }
            Ok(Ok((status, body))) => {
                let message = body["message"].as_str().unwrap_or("").to_string();
                *failures.entry(format!("{} {}", status, message)).or_default() += 1;
            }
            Ok(Err(e)) => *failures.entry(e.to_string()).or_default() += 1,
            Err(e) => *failures.entry(e.to_string()).or_default() += 1,
        }
    }

    let summary = json!({ "served": per_server, "failed": failures });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: load balancer returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
