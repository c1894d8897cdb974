use anyhow::Context;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

mod config;
mod dosing;
mod error;
mod models;
mod output;
mod parameters;
mod simulation;

use crate::config::{Config, ExportFormat, NumericInput, RawParameters, TextInput};
use crate::output::{export_chart, exporter_for, SvgChart};
use crate::parameters::SimulationParameters;
use crate::simulation::Simulator;

#[derive(Parser)]
#[command(name = "pk_chart")]
#[command(about = "Plot single- and multi-dose pharmacokinetic concentration curves")]
struct Cli {
    /// JSON parameter file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "pk_output")]
    output: PathBuf,

    /// Administration route: iv or oral
    #[arg(long)]
    route: Option<String>,

    /// Dose amount (mg)
    #[arg(long)]
    dose: Option<String>,

    /// Volume of distribution (L)
    #[arg(long)]
    volume: Option<String>,

    /// Elimination rate constant (1/h)
    #[arg(long)]
    ke: Option<String>,

    /// Absorption rate constant (1/h), oral only
    #[arg(long)]
    ka: Option<String>,

    /// Bioavailable fraction, oral only
    #[arg(long = "bioavailability")]
    bioavailability: Option<String>,

    /// Dosing interval (h)
    #[arg(long)]
    interval: Option<String>,

    /// Number of doses
    #[arg(long)]
    doses: Option<String>,

    /// Lower bound of the therapeutic window (mg/L)
    #[arg(long = "min")]
    therapeutic_min: Option<String>,

    /// Upper bound of the therapeutic window (mg/L), "inf" for none
    #[arg(long = "max")]
    therapeutic_max: Option<String>,

    /// Sampling step (h)
    #[arg(long)]
    step: Option<f64>,

    /// Chart image format
    #[arg(short, long, value_enum)]
    format: Option<ExportFormat>,

    /// Resolution scale factor for raster export
    #[arg(long)]
    scale: Option<f64>,

    /// Chart file name without extension
    #[arg(long)]
    filename: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn raw_parameters(&self) -> RawParameters {
        let field = |value: &Option<String>| value.clone().map(NumericInput::from);
        RawParameters {
            route: self.route.clone().map(TextInput::from),
            dose: field(&self.dose),
            volume: field(&self.volume),
            ke: field(&self.ke),
            ka: field(&self.ka),
            bioavailability: field(&self.bioavailability),
            interval: field(&self.interval),
            dose_count: field(&self.doses),
            therapeutic_min: field(&self.therapeutic_min),
            therapeutic_max: field(&self.therapeutic_max),
        }
    }

    /// Flags that were given replace the matching settings in `config`.
    fn apply_overrides(&self, mut config: Config) -> Config {
        config.parameters = config.parameters.merge(self.raw_parameters());
        if let Some(step) = self.step {
            config.simulation.step = step;
        }
        if let Some(format) = self.format {
            config.export.format = format;
        }
        if let Some(scale) = self.scale {
            config.export.scale = scale;
        }
        if let Some(filename) = &self.filename {
            config.export.filename = filename.clone();
        }
        config
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let config = match &self.config {
            Some(path) => {
                let config = Config::from_file(path)
                    .with_context(|| format!("failed to load configuration from {:?}", path))?;
                info!("Loaded configuration from {:?}", path);
                config
            }
            None => Config::default(),
        };

        let config = self.apply_overrides(config);
        config.validate().context("invalid settings")?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = cli.load_config()?;
    let params = SimulationParameters::from_raw(&config.parameters);

    let result = Simulator::from_config(params, &config.simulation).run();
    info!(
        "Simulation completed: {} samples, AUC {:.2} mg*h/L, {:.1}% in therapeutic range",
        result.samples.len(),
        result.metrics.auc,
        result.metrics.percent_in_range
    );

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create output directory {:?}", cli.output))?;
    output::save_results(&result, &cli.output).context("failed to save results")?;

    // A failed export is reported but leaves the saved results in place.
    let renderer = SvgChart::new(config.chart.clone());
    let exported = exporter_for(config.export.format)
        .and_then(|exporter| export_chart(&result, &renderer, exporter.as_ref(), &config.export, &cli.output));
    if let Err(e) = exported {
        error!("Chart export failed: {}", e);
        anyhow::bail!("results were saved to {:?} but the chart could not be exported", cli.output);
    }

    Ok(())
}
