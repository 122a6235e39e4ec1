#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for wildfire threat valuation and scoring.
//!
//! Service endpoints come from the built-in configuration unless
//! `--config` points at a replacement; `FIRE_THREAT_*_URL` environment
//! variables override single endpoints. Set `LOCATIONIQ_KEY` to get
//! display names in assessments.

mod progress;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use fire_threat_assess::sites::{Site, load_sites};
use fire_threat_assess::{Assessor, BurnAreaAssessment};
use fire_threat_region_models::RegionTable;
use fire_threat_scoring::{FireStatistics, composite_threat_score};
use fire_threat_valuation::{HttpServices, ServiceConfig, value_nearby_settlements};

use crate::progress::IndicatifProgress;

#[derive(Parser)]
#[command(name = "fire_threat", about = "Wildfire threat exposure scoring")]
struct Cli {
    /// Service configuration TOML (defaults to the built-in endpoints)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Region reference table TOML (defaults to California counties)
    #[arg(long, global = true)]
    regions: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value the settlements near a coordinate
    Value {
        /// Latitude (WGS84)
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude (WGS84)
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Search radius in meters (defaults to the configured radius)
        #[arg(long)]
        radius: Option<u32>,
    },
    /// Compute the composite threat score from known inputs
    Score {
        /// Hazard probability in [0, 1]
        #[arg(long)]
        threat_rating: f64,
        /// Preliminary feasibility score
        #[arg(long, allow_negative_numbers = true)]
        feasibility: f64,
        /// Total neighbor population
        #[arg(long, default_value = "0")]
        population: u64,
        /// Total neighbor value estimate
        #[arg(long, default_value = "0")]
        value: f64,
    },
    /// Assess a single burn site
    Assess {
        /// Latitude (WGS84)
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude (WGS84)
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Hazard probability in [0, 1]
        #[arg(long)]
        threat_rating: f64,
        /// JSON file with the 11 feasibility category scores
        #[arg(long)]
        statistics: PathBuf,
    },
    /// Assess every site in a sites TOML file
    Batch {
        /// Sites file (`[[sites]]` with lat, lng, `threat_rating`, statistics)
        sites: PathBuf,
        /// Number of sites assessed concurrently
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },
    /// List the region reference table
    Regions,
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => ServiceConfig::from_path(path)?,
        None => ServiceConfig::embedded()?,
    };
    Ok(config.with_env_overrides())
}

fn load_regions(path: Option<&Path>) -> Result<RegionTable, Box<dyn std::error::Error>> {
    let table = match path {
        Some(path) => RegionTable::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => RegionTable::california()?,
    };
    log::debug!("Loaded {} regions", table.len());
    Ok(table)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = progress::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            threat_rating,
            feasibility,
            population,
            value,
        } => {
            println!(
                "{}",
                composite_threat_score(threat_rating, feasibility, population, value)
            );
        }
        Commands::Regions => {
            let table = load_regions(cli.regions.as_deref())?;
            println!("{:<20} {:>20} {:>14}", "REGION", "ECONOMIC OUTPUT", "POPULATION");
            println!("{}", "-".repeat(56));
            for region in table.iter() {
                println!(
                    "{:<20} {:>20.0} {:>14}",
                    region.name, region.economic_output, region.reference_population
                );
            }
        }
        Commands::Value { lat, lng, radius } => {
            let table = load_regions(cli.regions.as_deref())?;
            let services = HttpServices::new(load_config(cli.config.as_deref())?)?;
            let radius_m = radius.unwrap_or(services.config().settlement_discovery.radius_m);

            let valuation =
                value_nearby_settlements(&services, &services, &table, lat, lng, radius_m).await;
            print_json(&valuation)?;
        }
        Commands::Assess {
            lat,
            lng,
            threat_rating,
            statistics,
        } => {
            let table = load_regions(cli.regions.as_deref())?;
            let services = HttpServices::new(load_config(cli.config.as_deref())?)?;
            let statistics: FireStatistics =
                serde_json::from_str(&std::fs::read_to_string(&statistics)?)?;

            let site = Site {
                lat,
                lng,
                threat_rating,
                statistics,
            };
            site.validate()?;

            let radius_m = services.config().settlement_discovery.radius_m;
            let assessor = Assessor::new(&services, &services, &services, &table, radius_m);
            let assessment = assessor.assess_site(&site).await;
            print_json(&assessment)?;
        }
        Commands::Batch { sites, concurrency } => {
            let table = load_regions(cli.regions.as_deref())?;
            let services = HttpServices::new(load_config(cli.config.as_deref())?)?;
            let sites = load_sites(&sites)?;

            let radius_m = services.config().settlement_discovery.radius_m;
            let assessor = Assessor::new(&services, &services, &services, &table, radius_m);
            let progress = IndicatifProgress::sites_bar(&multi, "Assessing sites");

            let start = Instant::now();
            let assessments: Vec<BurnAreaAssessment> =
                assessor.assess_batch(&sites, concurrency, &progress).await;
            log::info!(
                "Batch complete: {} sites in {:.1}s",
                assessments.len(),
                start.elapsed().as_secs_f64()
            );

            print_json(&serde_json::json!({
                "status": "success",
                "data": assessments,
            }))?;
        }
    }

    Ok(())
}
