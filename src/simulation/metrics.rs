use super::{Sample, Status};
use crate::config::SteadyStatePolicy;
use crate::models::PKModel;
use crate::parameters::SimulationParameters;
use serde::{Deserialize, Serialize};

/// Summary statistics of one simulated curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub half_life: f64,
    pub peak_time: Option<f64>,
    pub peak_concentration: Option<f64>,
    pub auc: f64,
    pub percent_in_range: f64,
    pub observed_cmax: f64,
    pub observed_tmax: f64,
    pub steady_state: Option<SteadyState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteadyState {
    pub window_start: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl Metrics {
    /// Reduces `samples` to summary statistics. Everything except the
    /// analytic peak is read off the samples themselves.
    pub fn compute(
        samples: &[Sample],
        params: &SimulationParameters,
        model: &dyn PKModel,
        policy: &SteadyStatePolicy,
    ) -> Self {
        let half_life = params.half_life();
        let peak = model.peak();
        let (observed_tmax, observed_cmax) = observed_peak(samples);

        Self {
            half_life,
            peak_time: peak.map(|p| p.time),
            peak_concentration: peak.map(|p| p.concentration),
            auc: auc(samples),
            percent_in_range: percent_in_range(samples),
            observed_cmax,
            observed_tmax,
            steady_state: steady_state(samples, params, half_life, policy),
        }
    }
}

/// Linear trapezoidal area under the curve.
pub fn auc(samples: &[Sample]) -> f64 {
    samples
        .windows(2)
        .map(|pair| {
            let dt = pair[1].time - pair[0].time;
            (pair[0].concentration + pair[1].concentration) / 2.0 * dt
        })
        .sum()
}

pub fn percent_in_range(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let in_range = samples
        .iter()
        .filter(|sample| sample.status == Status::Therapeutic)
        .count();
    in_range as f64 / samples.len() as f64 * 100.0
}

/// Earliest sample holding the maximum concentration, as (time, concentration).
pub fn observed_peak(samples: &[Sample]) -> (f64, f64) {
    samples.iter().fold((0.0, 0.0), |best, sample| {
        if sample.concentration > best.1 {
            (sample.time, sample.concentration)
        } else {
            best
        }
    })
}

fn steady_state(
    samples: &[Sample],
    params: &SimulationParameters,
    half_life: f64,
    policy: &SteadyStatePolicy,
) -> Option<SteadyState> {
    // The last sample, not the nominal horizon, closes the window.
    let end = samples.last()?.time;
    if params.dose_count <= 1 || end < policy.min_half_lives * half_life {
        return None;
    }

    let window = (policy.window_half_lives * half_life).min(policy.window_intervals * params.interval);
    let window_start = end - window;

    let concentrations: Vec<f64> = samples
        .iter()
        .filter(|sample| sample.time >= window_start)
        .map(|sample| sample.concentration)
        .collect();
    if concentrations.is_empty() {
        return None;
    }

    let average = concentrations.iter().sum::<f64>() / concentrations.len() as f64;
    let min = concentrations.iter().copied().fold(f64::INFINITY, f64::min);
    let max = concentrations.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(SteadyState {
        window_start,
        average,
        min,
        max,
    })
}
