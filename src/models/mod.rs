pub mod iv_bolus;
pub mod oral;

use crate::dosing::DosingRegimen;
use crate::parameters::SimulationParameters;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use iv_bolus::IvBolusModel;
pub use oral::OralModel;

/// Below this separation between ka and ke the oral model uses its limiting form.
pub const KA_KE_TOLERANCE: f64 = 1e-6;

pub trait PKModel {
    /// Concentration `elapsed` hours after one dose. Zero before the dose is given.
    fn single_dose(&self, elapsed: f64) -> f64;

    /// Time and height of the single-dose maximum, when the route has one.
    fn peak(&self) -> Option<Peak> {
        None
    }

    fn route(&self) -> Route;

    /// Superposed concentration of every dose given at or before `time`.
    fn concentration(&self, time: f64, regimen: &DosingRegimen) -> f64 {
        let total: f64 = regimen
            .events_before(time)
            .map(|dose| self.single_dose(time - dose.time))
            .sum();
        total.max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub time: f64,
    pub concentration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    #[default]
    Intravenous,
    Oral,
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iv" | "intravenous" | "bolus" | "iv-bolus" | "ivbolus" => Ok(Route::Intravenous),
            "oral" | "po" => Ok(Route::Oral),
            other => Err(format!("Unknown administration route: {}", other)),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Intravenous => write!(f, "IV bolus"),
            Route::Oral => write!(f, "oral"),
        }
    }
}

pub fn create_model(params: &SimulationParameters) -> Box<dyn PKModel> {
    match params.route {
        Route::Intravenous => Box::new(IvBolusModel::new(params.dose, params.volume, params.ke)),
        Route::Oral => Box::new(OralModel::new(
            params.dose,
            params.volume,
            params.ke,
            params.ka,
            params.bioavailability,
        )),
    }
}
