pub mod input;

use crate::error::{PKError, PKResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use input::{NumericInput, RawParameters, TextInput};

/// Smallest and largest sampling step accepted, in hours.
const MIN_STEP: f64 = 0.01;
const MAX_STEP: f64 = 24.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parameters: RawParameters,
    pub simulation: SimulationConfig,
    pub chart: ChartConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub step: f64, // hours between samples
    pub steady_state: SteadyStatePolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step: 0.25,
            steady_state: SteadyStatePolicy::default(),
        }
    }
}

/// When steady state is reported and which trailing window it is averaged over.
///
/// The window is `min(window_half_lives * t½, window_intervals * τ)` hours
/// and is only evaluated once the horizon covers `min_half_lives * t½`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteadyStatePolicy {
    pub window_half_lives: f64,
    pub window_intervals: f64,
    pub min_half_lives: f64,
}

impl Default for SteadyStatePolicy {
    fn default() -> Self {
        Self {
            window_half_lives: 5.0,
            window_intervals: 4.0,
            min_half_lives: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: f64,
    pub height: f64,
    pub title: Option<String>,
    pub show_band: bool,
    pub show_doses: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 560.0,
            title: None,
            show_band: true,
            show_doses: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub filename: String,
    pub scale: f64,
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename: "pk_chart".to_string(),
            scale: 2.0,
            format: ExportFormat::Svg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Png,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> PKResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings that are not form fields. Form fields are never
    /// rejected; see `SimulationParameters::from_raw`.
    pub fn validate(&self) -> PKResult<()> {
        let step = self.simulation.step;
        if !step.is_finite() || !(MIN_STEP..=MAX_STEP).contains(&step) {
            return Err(PKError::Config(format!(
                "Sampling step must be between {} and {} hours, got {}",
                MIN_STEP, MAX_STEP, step
            )));
        }

        let policy = &self.simulation.steady_state;
        for (name, value) in [
            ("window_half_lives", policy.window_half_lives),
            ("window_intervals", policy.window_intervals),
            ("min_half_lives", policy.min_half_lives),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PKError::Config(format!(
                    "Steady-state {} must be positive",
                    name
                )));
            }
        }

        if !(self.chart.width > 0.0 && self.chart.height > 0.0) {
            return Err(PKError::Config(
                "Chart width and height must be positive".to_string(),
            ));
        }

        if !self.export.scale.is_finite() || self.export.scale <= 0.0 {
            return Err(PKError::Config(
                "Export scale must be positive".to_string(),
            ));
        }

        if self.export.filename.trim().is_empty() {
            return Err(PKError::Config(
                "Export filename must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
