use crate::config::{NumericInput, RawParameters, TextInput};
use crate::models::Route;
use crate::simulation::Status;
use log::warn;
use serde::{Deserialize, Serialize};

/// Floor for volumes and rate constants.
pub const EPSILON: f64 = 1e-6;
pub const MAX_INTERVAL: f64 = 720.0;
pub const MAX_DOSE_COUNT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TherapeuticBand {
    pub min: f64,
    pub max: f64, // may be +inf
}

impl TherapeuticBand {
    /// Both bounds are inclusive.
    pub fn classify(&self, concentration: f64) -> Status {
        if concentration < self.min {
            Status::Subtherapeutic
        } else if concentration > self.max {
            Status::Toxic
        } else {
            Status::Therapeutic
        }
    }
}

impl Default for TherapeuticBand {
    fn default() -> Self {
        Self {
            min: 5.0,
            max: 15.0,
        }
    }
}

/// Well-formed inputs to a simulation run, as produced by `from_raw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub route: Route,
    pub dose: f64,            // mg
    pub volume: f64,          // L
    pub ke: f64,              // 1/h
    pub ka: f64,              // 1/h, oral only
    pub bioavailability: f64, // oral only
    pub interval: f64,        // h
    pub dose_count: u32,
    pub band: TherapeuticBand, // mg/L
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            route: Route::Intravenous,
            dose: 500.0,
            volume: 50.0,
            ke: 0.1,
            ka: 1.0,
            bioavailability: 1.0,
            interval: 8.0,
            dose_count: 3,
            band: TherapeuticBand::default(),
        }
    }
}

impl SimulationParameters {
    /// Coerces raw form input into a usable parameter set. Never fails:
    /// unusable fields fall back to their defaults and out-of-range values
    /// are clamped, with a warning for each substitution.
    pub fn from_raw(raw: &RawParameters) -> Self {
        let defaults = Self::default();

        let route = match raw.route.as_ref().map(TextInput::as_text) {
            None => defaults.route,
            Some(Some(text)) => text.parse().unwrap_or_else(|err| {
                warn!("{}, using {}", err, defaults.route);
                defaults.route
            }),
            Some(None) => {
                warn!("route is not text ({:?}), using {}", raw.route, defaults.route);
                defaults.route
            }
        };

        let dose = at_least("dose", finite("dose", raw.dose.as_ref(), defaults.dose), 0.0);
        let volume = at_least("volume", finite("volume", raw.volume.as_ref(), defaults.volume), EPSILON);
        let ke = at_least("ke", finite("ke", raw.ke.as_ref(), defaults.ke), EPSILON);
        let ka = at_least("ka", finite("ka", raw.ka.as_ref(), defaults.ka), EPSILON);

        let bioavailability = clamped(
            "bioavailability",
            finite("bioavailability", raw.bioavailability.as_ref(), defaults.bioavailability),
            0.0,
            1.0,
        );
        let interval = clamped(
            "interval",
            finite("interval", raw.interval.as_ref(), defaults.interval),
            EPSILON,
            MAX_INTERVAL,
        );
        let dose_count = clamped(
            "dose_count",
            finite("dose_count", raw.dose_count.as_ref(), defaults.dose_count as f64).round(),
            1.0,
            MAX_DOSE_COUNT as f64,
        ) as u32;

        let band_min = at_least(
            "therapeutic_min",
            finite("therapeutic_min", raw.therapeutic_min.as_ref(), defaults.band.min),
            0.0,
        );
        let band_max = upper_bound(raw.therapeutic_max.as_ref(), defaults.band.max);
        let band_max = if band_max < band_min {
            warn!(
                "therapeutic_max {} is below therapeutic_min {}, using {}",
                band_max, band_min, band_min
            );
            band_min
        } else {
            band_max
        };

        Self {
            route,
            dose,
            volume,
            ke,
            ka,
            bioavailability,
            interval,
            dose_count,
            band: TherapeuticBand {
                min: band_min,
                max: band_max,
            },
        }
    }

    /// Simulated span in hours: `dose_count` intervals plus a day, never less than a day.
    pub fn horizon(&self) -> f64 {
        (self.dose_count as f64 * self.interval + 24.0).max(24.0)
    }

    pub fn half_life(&self) -> f64 {
        std::f64::consts::LN_2 / self.ke
    }
}

fn finite(field: &str, input: Option<&NumericInput>, default: f64) -> f64 {
    let Some(input) = input else {
        return default;
    };

    match input.value() {
        Some(value) if value.is_finite() => value,
        _ => {
            warn!("{} is not a usable number ({:?}), using {}", field, input, default);
            default
        }
    }
}

/// Band maximum additionally accepts +inf, meaning no upper bound.
fn upper_bound(input: Option<&NumericInput>, default: f64) -> f64 {
    match input.and_then(NumericInput::value) {
        Some(value) if value == f64::INFINITY => value,
        Some(value) if value.is_finite() => value,
        _ => finite("therapeutic_max", input, default),
    }
}

fn at_least(field: &str, value: f64, floor: f64) -> f64 {
    if value < floor {
        warn!("{} {} is below {}, using {}", field, value, floor, floor);
        floor
    } else {
        value
    }
}

fn clamped(field: &str, value: f64, min: f64, max: f64) -> f64 {
    if value > max {
        warn!("{} {} is above {}, using {}", field, value, max, max);
        max
    } else {
        at_least(field, value, min)
    }
}
