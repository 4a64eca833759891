use std::env;

use omnidex_core::config::EngineConfig;
use omnidex_core::rules::RuleTable;
use omnidex_core::types::{FilterSet, SearchRequest};
use omnidex_engine::SearchPipeline;
use omnidex_sqlite::{SqliteCatalog, TableListing};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut config_path = "omnidex.toml".to_string();
    let mut filters = FilterSet::new();
    let mut words: Vec<String> = Vec::new();
    let mut as_json = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --config requires a path");
                    std::process::exit(1);
                }
                config_path = args[i + 1].clone();
                i += 1;
            }
            "--filter" | "-f" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --filter requires name=value");
                    std::process::exit(1);
                }
                match args[i + 1].split_once('=') {
                    Some((name, value)) => {
                        if !filters.insert(name, value) {
                            eprintln!("Warning: ignoring unknown filter '{}'", name);
                        }
                    }
                    None => {
                        eprintln!("Error: --filter requires name=value");
                        std::process::exit(1);
                    }
                }
                i += 1;
            }
            "--json" => as_json = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            word => words.push(word.to_string()),
        }
        i += 1;
    }
    let q = words.join(" ");

    let config = EngineConfig::from_file(&config_path)?;
    let rules = RuleTable::from_path(&config.rules_file)?;
    let catalog = SqliteCatalog::from_config(&config)?;
    let database = catalog.get(&config.database).ok_or_else(|| {
        anyhow::anyhow!("primary database '{}' missing from [databases]", config.database)
    })?;
    let listing = TableListing::new(database, config.database.clone());
    let mut pipeline =
        SearchPipeline::new(database, &listing, &catalog, &rules, config.missing_rule);

    let response = pipeline.run(&SearchRequest::new(q.clone(), filters))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if q.is_empty() {
        println!("🔍 Timeline: {} rows of {} total", response.results.len(), response.count);
    } else {
        println!("🔍 Found {} matches for: \"{}\"", response.count, q);
    }
    for (i, result) in response.results.iter().enumerate() {
        println!(
            "\n  {}. [{}] {}  ({})",
            i + 1,
            result.record.r#type,
            result.record.title.as_deref().unwrap_or("(untitled)"),
            result.record.timestamp.as_deref().unwrap_or("no timestamp"),
        );
        if let Some(snippet) = result.record.search_1.as_deref() {
            println!("     {}", snippet.lines().next().unwrap_or(""));
        }
    }
    println!("\n📊 Facets:");
    for facet in &response.facets {
        println!("  {}:", facet.column);
        for entry in &facet.results {
            let marker = if entry.selected { "*" } else { " " };
            println!("   {} {} ({})  {}", marker, entry.value, entry.count, entry.toggle_url);
        }
    }
    Ok(())
}

fn print_usage() {
    println!("Usage: omnidex-search [query words] [options]");
    println!("Options:");
    println!("  -c, --config <path>        engine config (default: omnidex.toml)");
    println!("  -f, --filter name=value    filter on type, category or is_public");
    println!("      --json                 print the full response as JSON");
    println!("Example: omnidex-search wolf -f type=github/issues");
}
