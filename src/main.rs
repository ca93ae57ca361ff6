use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use stand_dynamics::{
    analysis::{summarize, CdfMethod, MissingParameterPolicy},
    io,
    models::{CensusRow, TreeRecord},
    visualization::{
        print_census_table, print_class_histogram, print_dropped_table, print_ranges_table,
        print_stand_summary, print_transition_table,
    },
    RunConfig, StandModel,
};

#[derive(Parser)]
#[command(
    name = "stand-dynamics",
    about = "Stand Dynamics - Diameter-class transition model for mixed stands",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every subcommand that needs a stand.
#[derive(clap::Args)]
struct StandArgs {
    /// Run configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stand area in square metres
    #[arg(short, long)]
    area: Option<f64>,

    /// Diameter class width
    #[arg(short, long)]
    spacing: Option<u32>,

    /// Lower bound of the smallest class
    #[arg(long)]
    min: Option<f64>,

    /// Upper bound of the smallest class
    #[arg(long)]
    max: Option<f64>,

    /// Label of the smallest class
    #[arg(long)]
    label: Option<u32>,
}

impl StandArgs {
    /// Load the config file (if any) and apply flag overrides.
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => {
                let Some(area) = self.area else {
                    anyhow::bail!("Stand area is required: pass --area or --config");
                };
                RunConfig::new(area)
            }
        };
        if let Some(area) = self.area {
            config.stand_area = area;
        }
        if let Some(spacing) = self.spacing {
            config.spacing = spacing;
        }
        if let Some(min) = self.min {
            config.classes.min = min;
        }
        if let Some(max) = self.max {
            config.classes.max = max;
        }
        if let Some(label) = self.label {
            config.classes.label = label;
        }
        config.transition_config().validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the generated diameter class ranges
    Ranges {
        /// Lower bound of the smallest class
        #[arg(long, default_value = "5.0")]
        min: f64,

        /// Upper bound of the smallest class
        #[arg(long, default_value = "7.0")]
        max: f64,

        /// Label of the smallest class
        #[arg(long, default_value = "6")]
        label: u32,

        /// Diameter class width
        #[arg(short, long, default_value = "2")]
        spacing: u32,
    },

    /// Classify per-tree measurements into diameter classes
    Classify {
        /// Per-tree input file (CSV or JSON, columns species and dbh)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the classified census here (CSV or JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        stand: StandArgs,
    },

    /// Show basal area and diversity covariates of a census
    Stats {
        /// Census file (CSV or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Hide the stems-per-class histogram
        #[arg(long)]
        no_distribution: bool,

        #[command(flatten)]
        stand: StandArgs,
    },

    /// Project a census one period forward
    Project {
        /// Census file (CSV or JSON); per-tree input with --raw
        #[arg(short, long)]
        input: PathBuf,

        /// Treat the input as per-tree measurements and classify it first
        #[arg(long)]
        raw: bool,

        /// Parameter file (TOML or JSON), overrides the config
        #[arg(short, long)]
        parameters: Option<PathBuf>,

        /// Region key, overrides the config
        #[arg(short, long)]
        region: Option<String>,

        /// Slope of the site
        #[arg(long)]
        slope: Option<f64>,

        /// Mean annual temperature
        #[arg(long)]
        mat: Option<f64>,

        /// Mean annual precipitation
        #[arg(long)]
        map: Option<f64>,

        /// Species without coefficients: skip, warn or fail
        #[arg(long)]
        missing: Option<MissingParameterPolicy>,

        /// Normal CDF: abramowitz-stegun or statrs
        #[arg(long)]
        cdf: Option<CdfMethod>,

        /// Write the projected census here (CSV or JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the full step report (outcomes, covariates) as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        stand: StandArgs,
    },
}

fn load_census(path: &Path) -> Result<Vec<CensusRow>> {
    let reader = io::reader_for(path)?;
    reader
        .read(path)
        .with_context(|| format!("Failed to read census {}", path.display()))
}

fn load_trees(path: &Path) -> Result<Vec<TreeRecord>> {
    let reader = io::reader_for(path)?;
    reader
        .read_trees(path)
        .with_context(|| format!("Failed to read tree records {}", path.display()))
}

fn save_census(rows: &[CensusRow], path: &Path, pretty: bool) -> Result<()> {
    io::writer_for(path, pretty)?.write(rows, path)?;
    println!(
        "{} Wrote {} rows -> {}",
        "Success:".green().bold(),
        rows.len(),
        path.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ranges {
            min,
            max,
            label,
            spacing,
        } => {
            let ranges = stand_dynamics::analysis::build_diameter_ranges(min, max, label, spacing)?;
            print_ranges_table(&ranges);
        }

        Commands::Classify {
            input,
            output,
            pretty,
            stand,
        } => {
            let config = stand.resolve()?;
            let records = load_trees(&input)?;
            println!(
                "\n{}",
                format!("Classifying {} trees from {}", records.len(), input.display())
                    .bold()
                    .cyan()
            );

            let ranges = config.ranges()?;
            let classification = stand_dynamics::analysis::classify(&records, &ranges);
            print_census_table("Classified Census", &classification.rows);
            print_class_histogram(&classification.rows, config.stand_area);
            if !classification.dropped.is_empty() {
                print_dropped_table(&classification.dropped);
            }

            if let Some(output) = output {
                save_census(&classification.rows, &output, pretty)?;
            }
        }

        Commands::Stats {
            input,
            no_distribution,
            stand,
        } => {
            let config = stand.resolve()?;
            let census = load_census(&input)?;
            let summary = summarize(&census, config.stand_area);
            print_stand_summary(&summary);
            if !no_distribution {
                print_class_histogram(&census, config.stand_area);
            }
        }

        Commands::Project {
            input,
            raw,
            parameters,
            region,
            slope,
            mat,
            map,
            missing,
            cdf,
            output,
            report,
            pretty,
            stand,
        } => {
            let mut config = stand.resolve()?;
            if let Some(slope) = slope {
                config.environment.slope = slope;
            }
            if let Some(mat) = mat {
                config.environment.mean_annual_temperature = mat;
            }
            if let Some(map) = map {
                config.environment.mean_annual_precipitation = map;
            }
            if let Some(policy) = missing {
                config.missing_parameters = policy;
            }
            if let Some(cdf) = cdf {
                config.cdf = cdf;
            }

            let Some(params_path) = parameters.or_else(|| config.parameters.clone()) else {
                anyhow::bail!("No parameter file: pass --parameters or set it in the config");
            };
            let Some(region) = region.or_else(|| config.region.clone()) else {
                anyhow::bail!("No region: pass --region or set it in the config");
            };

            let store = io::read_parameter_store(&params_path).with_context(|| {
                format!("Failed to load parameters {}", params_path.display())
            })?;
            let model = StandModel::from_store(&store, &region, config.transition_config())?;

            let census = if raw {
                let records = load_trees(&input)?;
                let classification = model.classify(&records, &config.ranges()?);
                if !classification.dropped.is_empty() {
                    print_dropped_table(&classification.dropped);
                }
                classification.rows
            } else {
                load_census(&input)?
            };

            println!(
                "\n{}",
                format!("Transition Projection: region {region}, one period")
                    .bold()
                    .cyan()
            );
            print_census_table("Current Census", &census);

            let result = model.step(&census)?;
            print_transition_table(&result);
            print_census_table("Projected Census", &result.rows);

            if let Some(report) = &report {
                io::write_json(&result, report, pretty)?;
            }
            if let Some(output) = output {
                save_census(&result.rows, &output, pretty)?;
            }
        }
    }

    Ok(())
}
