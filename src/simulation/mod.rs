pub mod metrics;
pub mod sample;

use crate::config::{SimulationConfig, SteadyStatePolicy};
use crate::dosing::{DoseEvent, DosingRegimen};
use crate::models::create_model;
use crate::parameters::SimulationParameters;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use metrics::Metrics;
pub use sample::{Sample, Status};

/// Everything one run produces, handed as-is to the writers and the chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub parameters: SimulationParameters,
    pub doses: Vec<DoseEvent>,
    pub samples: Vec<Sample>,
    pub metrics: Metrics,
}

pub struct Simulator {
    params: SimulationParameters,
    step: f64,
    policy: SteadyStatePolicy,
}

impl Simulator {
    pub fn new(params: SimulationParameters, step: f64, policy: SteadyStatePolicy) -> Self {
        Self {
            params,
            step,
            policy,
        }
    }

    pub fn from_config(params: SimulationParameters, config: &SimulationConfig) -> Self {
        Self::new(params, config.step, config.steady_state)
    }

    /// Samples the curve from t = 0 to the horizon inclusive and reduces it to metrics.
    pub fn run(&self) -> SimulationResult {
        let params = &self.params;
        let horizon = params.horizon();
        let model = create_model(params);
        info!(
            "Simulating {} route: {} dose(s) of {} mg every {} h over {} h",
            model.route(),
            params.dose_count,
            params.dose,
            params.interval,
            horizon
        );

        let regimen = DosingRegimen::from_parameters(params);

        // Times are i·step rather than an accumulated sum so the grid stays exact.
        let n_samples = (horizon / self.step + 1e-6).floor() as usize + 1;
        let samples: Vec<Sample> = (0..n_samples)
            .map(|i| {
                let time = i as f64 * self.step;
                let concentration = model.concentration(time, &regimen);
                let status = params.band.classify(concentration);
                Sample {
                    time,
                    concentration,
                    therapeutic_min: params.band.min,
                    therapeutic_max: params.band.max,
                    in_range: status == Status::Therapeutic,
                    status,
                }
            })
            .collect();
        debug!("Generated {} samples at {} h spacing", samples.len(), self.step);

        let metrics = Metrics::compute(&samples, params, model.as_ref(), &self.policy);
        debug!(
            "t1/2 = {:.3} h, AUC = {:.3} mg*h/L, {:.1}% in range",
            metrics.half_life, metrics.auc, metrics.percent_in_range
        );

        SimulationResult {
            parameters: params.clone(),
            doses: regimen.events,
            samples,
            metrics,
        }
    }
}
