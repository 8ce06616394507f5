// src/bin/debug_extract.rs
// Prints what the extractor sees on the indicator page. Never touches the JSON file.
use cpi_tracker::handlers::update::{load_document, DocumentSource, DEFAULT_INDICATOR};
use cpi_tracker::services::extractor::{extract_observation, find_indicator_tables};
use cpi_tracker::services::fetch::DEFAULT_SOURCE_URL;
use dotenv::dotenv;
use log::{error, info};
use scraper::Html;
use std::{env, path::PathBuf};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    // Optional argument: a saved page to read instead of the live URL
    let source = match env::args().nth(1) {
        Some(path) => DocumentSource::File(PathBuf::from(path)),
        None => DocumentSource::Url(env::var("CPI_SOURCE_URL").unwrap_or_else(|_| DEFAULT_SOURCE_URL.to_string())),
    };
    let indicator = env::var("CPI_INDICATOR").unwrap_or_else(|_| DEFAULT_INDICATOR.to_string());

    info!("Debugging indicator table structure from {:?}", source);
    let html = load_document(&source).await?;

    let document = Html::parse_document(&html);
    let tables = find_indicator_tables(&document);
    println!("Candidate tables: {}", tables.len());
    for (i, (_, mapping)) in tables.iter().enumerate() {
        println!("  table {}: {:?}", i, mapping);
    }

    match extract_observation(&html, &indicator) {
        Ok(obs) => {
            println!("Reference period: {}", obs.reference_period);
            println!("Last value:       {}", obs.last_value);
            println!("Previous value:   {}", obs.previous_value);
        }
        Err(e) => {
            error!("Extraction failed: {}", e);

            let sample = html.chars().take(5000).collect::<String>();
            info!("HTML sample (first 5000 chars):");
            println!("{}", sample);
            return Err(e.into());
        }
    }

    Ok(())
}
