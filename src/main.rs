//! Reel CLI

use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use reel::serializers::{JsonSerializer, Serializer};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Reel v{}", env!("CARGO_PKG_VERSION"));
        eprintln!();
        eprintln!("Usage: reel <command> [options]");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  inspect <cassette.json>   Show the interactions stored in a cassette");
        process::exit(1);
    }

    let command = &args[1];

    match command.as_str() {
        "inspect" => {
            if args.len() < 3 {
                eprintln!("Usage: reel inspect <cassette.json>");
                process::exit(1);
            }

            if let Err(e) = inspect(Path::new(&args[2])) {
                eprintln!("Error: {e:#}");
                process::exit(1);
            }
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!("Run 'reel' for usage information.");
            process::exit(1);
        }
    }
}

fn inspect(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data = JsonSerializer
        .deserialize(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    println!("Cassette: {}", path.display());
    println!("Recorded with: {}", data.recorded_with);
    println!("Interactions: {}", data.http_interactions.len());

    if let Some(earliest) = data.http_interactions.iter().map(|i| i.recorded_at).min() {
        println!("Earliest recording: {}", earliest.to_rfc3339());
    }

    println!();
    for (index, interaction) in data.http_interactions.iter().enumerate() {
        println!(
            "{index:>4}  {:<7} {}  -> {}",
            interaction.request.method, interaction.request.uri, interaction.response.status.code
        );
    }

    Ok(())
}
