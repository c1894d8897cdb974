use super::{PKModel, Route};

/// One-compartment model for an instantaneous intravenous dose.
#[derive(Debug, Clone, PartialEq)]
pub struct IvBolusModel {
    dose: f64,
    volume: f64,
    ke: f64,
}

impl IvBolusModel {
    pub fn new(dose: f64, volume: f64, ke: f64) -> Self {
        Self { dose, volume, ke }
    }

    /// Concentration immediately after the dose, `D / V`.
    pub fn initial_concentration(&self) -> f64 {
        self.dose / self.volume
    }
}

impl PKModel for IvBolusModel {
    fn single_dose(&self, elapsed: f64) -> f64 {
        if elapsed < 0.0 {
            return 0.0;
        }
        self.initial_concentration() * (-self.ke * elapsed).exp()
    }

    fn route(&self) -> Route {
        Route::Intravenous
    }
}
