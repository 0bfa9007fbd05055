use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use tracing::debug;
use weather_core::{
    Config, FetchQuery, FetchResult, LocationWeatherRecord, WeatherFetcher, source_from_config,
};

use crate::view;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for a list of cities")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// List current weather for every configured city.
    List {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show details for one city.
    Show {
        /// List index, location id or city name.
        selector: String,

        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Comma-separated location ids; defaults to the configured cities.
    #[arg(long, value_delimiter = ',')]
    ids: Option<Vec<u64>>,

    /// JSON file holding a weather record for this device, listed first.
    #[arg(long)]
    device: Option<PathBuf>,
}

impl SourceArgs {
    fn query(&self, config: &Config) -> anyhow::Result<FetchQuery> {
        let ids = self.ids.clone().unwrap_or_else(|| config.city_ids.clone());
        let mut query = FetchQuery::new(config.api_key()?, ids);

        if let Some(path) = &self.device {
            query = query.with_local_record(read_device_record(path)?);
        }

        Ok(query)
    }
}

fn read_device_record(path: &Path) -> anyhow::Result<LocationWeatherRecord> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read device record: {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse device record: {}", path.display()))
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => {
                let api_key = Password::new("OpenWeather API key:")
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                config.set_api_key(api_key.trim().to_string());
                config.save()?;

                println!("Saved API key to {}", Config::config_file_path()?.display());
            }
            Command::List { source } => {
                let records = fetch(&config, &source).await?;
                print!("{}", view::render_list(&records));
            }
            Command::Show { selector, source } => {
                let records = fetch(&config, &source).await?;
                let record = view::select(&records, &selector)
                    .ok_or_else(|| anyhow!("No city matches '{selector}'"))?;
                print!("{}", view::render_details(record));
            }
        }

        Ok(())
    }
}

async fn fetch(config: &Config, args: &SourceArgs) -> anyhow::Result<Vec<LocationWeatherRecord>> {
    let query = args.query(config)?;
    let fetcher = WeatherFetcher::new(source_from_config(config));

    eprintln!("{}", view::render_state(&fetcher.state()));
    debug!(?query.location_ids, "fetching");

    match fetcher.fetch(&query).await.unwrap_or_else(|| fetcher.state()) {
        FetchResult::Ready(records) => Ok(records),
        FetchResult::Error(message) => bail!(message),
        FetchResult::Loading => bail!("Weather fetch did not finish"),
    }
}
