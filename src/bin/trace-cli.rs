use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "trace-cli")]
#[command(about = "Inspection CLI for the tracing harness", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:9999")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one request and print its correlation id
    Hit,
    /// List retained call trees
    List,
    /// Show the spans of one call tree
    Show {
        /// Correlation id printed by `hit` or `list`
        correlation_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Hit => {
            let res = client.get(format!("{}/", cli.url)).send().await?;
            let correlation_id = res
                .headers()
                .get("x-correlation-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            println!("{} {}", res.status(), correlation_id);
        }
        Commands::List => {
            let res = client.get(format!("{}/traces", cli.url)).send().await?;
            if let Some(json) = fetch_json(res).await? {
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }
        Commands::Show { correlation_id } => {
            let res = client
                .get(format!("{}/traces/{}", cli.url, correlation_id))
                .send()
                .await?;
            if let Some(Value::Array(records)) = fetch_json(res).await? {
                print_tree(&records, None, 0);
            }
        }
    }

    Ok(())
}

/// Body as JSON, or `None` after reporting a non-success status.
async fn fetch_json(res: reqwest::Response) -> Result<Option<Value>, reqwest::Error> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        eprintln!("Error: harness returned {}: {}", status, text.trim());
        return Ok(None);
    }
    res.json().await.map(Some)
}

/// Print spans whose parent is `parent`, children indented beneath them.
fn print_tree(records: &[Value], parent: Option<&Value>, depth: usize) {
    let children = records.iter().filter(|r| match parent {
        Some(id) => r["parent_id"] == *id,
        None => r["parent_id"].is_null(),
    });
    for record in children {
        let start_us = record["start_us"].as_u64().unwrap_or(0);
        let end_us = record["end_us"].as_u64().unwrap_or(start_us);
        let status = match record["error_detail"]["message"].as_str() {
            Some(message) => format!("ERROR {message}"),
            None => "ok".to_string(),
        };
        println!(
            "{:indent$}{} {}us {}",
            "",
            record["name"].as_str().unwrap_or("?"),
            end_us.saturating_sub(start_us),
            status,
            indent = depth * 2
        );
        print_tree(records, Some(&record["span_id"]), depth + 1);
    }
}
