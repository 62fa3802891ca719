use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use probate_scraper::apis::{create_adapter, LegacyClient};
use probate_scraper::config::{self, Config, ExactDialCredentials};
use probate_scraper::constants::{get_supported_counties, LEGACY_COUNTIES};
use probate_scraper::enrich::{enrich_phones, ExactDialClient, PropStreamClient};
use probate_scraper::logging;
use probate_scraper::normalize::{flatten, parse_user_date};
use probate_scraper::output;
use probate_scraper::pipeline::Pipeline;
use probate_scraper::session::HttpSession;
use probate_scraper::types::{CaseRecord, SiteAdapter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "probate_scraper")]
#[command(about = "Ohio probate court scraper with contact and property enrichment")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape cases filed in a date range and write the flattened records
    Collect {
        /// First filing date, MM/DD/YYYY (default: today)
        #[arg(long)]
        start_date: Option<String>,
        /// Last filing date, MM/DD/YYYY (default: start date)
        #[arg(long)]
        end_date: Option<String>,
        /// Counties to run (comma-separated). Available: Butler, Warren
        #[arg(long)]
        counties: Option<String>,
    },
    /// Flatten a JSON file of case records into output rows
    Normalize {
        #[arg(long)]
        input: PathBuf,
        /// County label for records that do not carry one
        #[arg(long)]
        county: Option<String>,
        /// Output file stem (default: input file stem + "_flat")
        #[arg(long)]
        name: Option<String>,
    },
    /// Add relatives' mobile numbers to a flattened output file
    EnrichPhones {
        #[arg(long)]
        input: PathBuf,
    },
    /// Look up the property record for a street address
    PropertyValue {
        #[arg(long)]
        address: String,
    },
    /// Collect the last month of legacy.com obituaries
    Obituaries {
        /// Counties (comma-separated). Available: Butler, Clermont, Hamilton, Montgomery, Warren
        #[arg(long)]
        counties: Option<String>,
        /// Cloudflare clearance cookie value
        #[arg(long, env = "LEGACY_CF_CLEARANCE")]
        cf_clearance: String,
    },
}

fn select_adapters(counties: Option<String>) -> Vec<Box<dyn SiteAdapter>> {
    let names: Vec<String> = match counties {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => get_supported_counties().iter().map(|s| s.to_string()).collect(),
    };

    names
        .iter()
        .filter_map(|name| {
            let adapter = create_adapter(name);
            if adapter.is_none() {
                warn!("Unknown county specified: {}", name);
                println!("⚠️  Unknown county: {}", name);
            }
            adapter
        })
        .collect()
}

async fn collect(
    config: &Config,
    start_date: Option<String>,
    end_date: Option<String>,
    counties: Option<String>,
) -> anyhow::Result<()> {
    let start = match start_date {
        Some(s) => parse_user_date(&s)?,
        None => chrono::Local::now().date_naive(),
    };
    let end = match end_date {
        Some(s) => parse_user_date(&s)?,
        None => start,
    };

    let adapters = select_adapters(counties);
    if adapters.is_empty() {
        bail!("no known counties selected");
    }

    println!("🔄 Collecting probate filings...");
    let (table, mut result) = Pipeline::run(adapters, &config.http, start, end).await?;

    let written = output::persist(
        &table,
        Path::new(&config.output.dir),
        &output::file_stem(start, end),
        config.output.write_csv,
    )?;
    result.output_files = written.iter().map(|p| p.display().to_string()).collect();

    println!("\n📊 Run {} results:", result.run_id);
    println!("   Counties: {}", result.counties.join(", "));
    println!("   Records: {}", result.total_records);
    println!("   Failed cases: {}", result.failed_cases);
    for file in &result.output_files {
        println!("   Output file: {}", file);
    }
    if !result.errors.is_empty() {
        warn!("{} errors encountered during run", result.errors.len());
        println!("\n⚠️  Errors encountered:");
        for error in &result.errors {
            println!("   - {}", error);
        }
    }
    Ok(())
}

fn normalize(config: &Config, input: &Path, county: Option<String>, name: Option<String>) -> anyhow::Result<()> {
    let content = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let mut records: Vec<CaseRecord> = serde_json::from_str(&content)?;
    if let Some(county) = county {
        for record in records.iter_mut().filter(|r| r.county.is_none()) {
            record.county = Some(county.clone());
        }
    }

    let table = flatten(&records)?;
    let stem = name.unwrap_or_else(|| {
        let base = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        format!("{}_flat", base)
    });
    let written = output::persist(&table, Path::new(&config.output.dir), &stem, config.output.write_csv)?;
    println!("✅ Flattened {} records into {}", table.len(), written[0].display());
    Ok(())
}

async fn enrich(config: &Config, input: &Path) -> anyhow::Result<()> {
    let credentials = ExactDialCredentials::from_env().context("EXACTDIAL_EMAIL and EXACTDIAL_PASSWORD must be set")?;
    let mut table = output::read_json(input)?;

    let session = HttpSession::open(&config.http)?;
    let mut client = ExactDialClient::login(&session, &credentials).await?;
    let enriched = enrich_phones(&mut client, &mut table).await;
    session.close();

    output::write_json(&table, input)?;
    println!("✅ Added phone numbers to {}/{} rows in {}", enriched, table.len(), input.display());
    Ok(())
}

async fn property_value(config: &Config, address: &str) -> anyhow::Result<()> {
    let token = config::propstream_token_from_env().context("PROPSTREAM_TOKEN must be set")?;
    let session = HttpSession::open(&config.http)?;
    let property = PropStreamClient::new(&session, token).property_value(address).await;
    session.close();

    match property? {
        Some(property) => println!("{}", serde_json::to_string_pretty(&property)?),
        None => println!("⚠️  No single property matched '{}'", address),
    }
    Ok(())
}

async fn obituaries(config: &Config, counties: Option<String>, cf_clearance: &str) -> anyhow::Result<()> {
    let names: Vec<String> = match counties {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => LEGACY_COUNTIES.iter().map(|s| s.to_string()).collect(),
    };
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let today = chrono::Local::now().date_naive();

    println!("🔄 Collecting obituaries...");
    let session = HttpSession::open(&config.http)?;
    let collected = LegacyClient::new(&session, cf_clearance, today).collect_all(&names).await;
    session.close();
    let obituaries = collected?;

    let dir = Path::new(&config.output.dir);
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("obituaries_{}.json", today.format("%m-%d-%Y")));
    fs::write(&path, serde_json::to_string_pretty(&obituaries)?)?;
    println!("✅ Saved {} obituaries to {}", obituaries.len(), path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let outcome = match cli.command {
        Commands::Collect {
            start_date,
            end_date,
            counties,
        } => collect(&config, start_date, end_date, counties).await,
        Commands::Normalize { input, county, name } => normalize(&config, &input, county, name),
        Commands::EnrichPhones { input } => enrich(&config, &input).await,
        Commands::PropertyValue { address } => property_value(&config, &address).await,
        Commands::Obituaries { counties, cf_clearance } => obituaries(&config, counties, &cf_clearance).await,
    };

    if let Err(e) = &outcome {
        error!("Command failed: {:#}", e);
        println!("❌ {:#}", e);
    } else {
        info!("Command completed");
    }
    outcome
}
