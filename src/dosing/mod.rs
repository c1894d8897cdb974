use crate::parameters::SimulationParameters;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseEvent {
    pub number: u32, // 1-based
    pub time: f64,
}

/// Evenly spaced doses starting at t = 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DosingRegimen {
    pub events: Vec<DoseEvent>,
}

impl DosingRegimen {
    pub fn new(interval: f64, dose_count: u32) -> Self {
        let events = (0..dose_count)
            .map(|i| DoseEvent {
                number: i + 1,
                time: i as f64 * interval,
            })
            .collect();

        Self { events }
    }

    pub fn from_parameters(params: &SimulationParameters) -> Self {
        Self::new(params.interval, params.dose_count)
    }

    /// Doses administered at or before `time`, in administration order.
    pub fn events_before(&self, time: f64) -> impl Iterator<Item = &DoseEvent> + '_ {
        self.events.iter().take_while(move |event| event.time <= time)
    }
}
