//! Sanity-check an event-log file: print its metadata-backed event count
//! and the first 10 events. Exits 1 on a missing file or decode failure.

use anyhow::{Context, Result};
use nx_eventlog::EventLogReader;
use nx_types::Event;
use std::path::Path;
use std::process::ExitCode;

fn dump(filepath: &str) -> Result<()> {
    let mut reader = EventLogReader::new(filepath)
        .with_context(|| format!("failed to open {filepath}"))?;

    println!("Reading: {filepath}\n");
    println!("Total events: {}", reader.event_count());
    println!("First 10 events:\n");

    let mut count = 0usize;
    while let Some(event) = reader.next().context("failed to decode event")? {
        if count >= 10 {
            break;
        }
        let header = event.header();
        println!("Event {count}:");
        println!("  Type: {}", event.event_type());
        println!("  Symbol: {}", header.symbol);
        println!("  Venue: {}", header.venue);
        println!("  Source: {}", header.source);
        println!("  Seq: {}", header.seq);
        println!("  ts_event_ns: {}", header.ts_event_ns);
        if let Event::Trade(trade) = &event {
            println!("  Price: {}", trade.price);
            println!("  Size: {}", trade.size);
        }
        println!();
        count += 1;
    }

    println!("File is valid and readable");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Some(filepath) = std::env::args().nth(1) else {
        eprintln!("Usage: verify_data <parquet_file>");
        return ExitCode::FAILURE;
    };

    if !Path::new(&filepath).exists() {
        eprintln!("File not found: {filepath}");
        return ExitCode::FAILURE;
    }

    match dump(&filepath) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
