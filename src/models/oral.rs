use super::{PKModel, Peak, Route, KA_KE_TOLERANCE};

/// One-compartment model with first-order absorption.
#[derive(Debug, Clone, PartialEq)]
pub struct OralModel {
    dose: f64,
    volume: f64,
    ke: f64,
    ka: f64,
    bioavailability: f64,
}

impl OralModel {
    pub fn new(dose: f64, volume: f64, ke: f64, ka: f64, bioavailability: f64) -> Self {
        Self {
            dose,
            volume,
            ke,
            ka,
            bioavailability,
        }
    }

    fn amount_per_volume(&self) -> f64 {
        self.bioavailability * self.dose / self.volume
    }

    /// Bateman function. Loses precision as ka approaches ke.
    /// `F·D·ka` overflows for very large ka, so the rate ratio is formed first.
    pub fn closed_form(&self, t: f64) -> f64 {
        let rate_ratio = self.ka / (self.ka - self.ke);
        self.amount_per_volume() * rate_ratio * ((-self.ke * t).exp() - (-self.ka * t).exp())
    }

    /// Limit of the Bateman function for ka == ke.
    pub fn limiting_form(&self, t: f64) -> f64 {
        let x = self.ka * t;
        self.amount_per_volume() * x * (-x).exp()
    }
}

impl PKModel for OralModel {
    fn single_dose(&self, elapsed: f64) -> f64 {
        if elapsed < 0.0 {
            return 0.0;
        }

        if (self.ka - self.ke).abs() < KA_KE_TOLERANCE {
            self.limiting_form(elapsed)
        } else {
            self.closed_form(elapsed)
        }
    }

    fn peak(&self) -> Option<Peak> {
        if self.ka - self.ke <= KA_KE_TOLERANCE {
            return None;
        }

        let time = (self.ka / self.ke).ln() / (self.ka - self.ke);
        Some(Peak {
            time,
            concentration: self.single_dose(time),
        })
    }

    fn route(&self) -> Route {
        Route::Oral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_oral_closed_form() {
        let model = OralModel::new(100.0, 10.0, 0.2, 1.0, 1.0);
        let expected = (100.0 * 1.0 / 10.0) * ((-0.2_f64).exp() - (-1.0_f64).exp()) / (1.0 - 0.2);
        assert_relative_eq!(model.single_dose(1.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_oral_starts_at_zero() {
        let model = OralModel::new(500.0, 50.0, 0.1, 1.0, 0.8);
        assert_relative_eq!(model.single_dose(0.0), 0.0, epsilon = 1e-12);
        assert_eq!(model.single_dose(-1.0), 0.0);
    }

    #[test]
    fn test_closed_form_converges_to_limit() {
        let ke = 0.1;
        let near = OralModel::new(500.0, 50.0, ke, ke + 1e-6, 0.9);
        let nearer = OralModel::new(500.0, 50.0, ke, ke + 1e-9, 0.9);

        for t in [0.5, 1.0, 5.0, 10.0, 24.0] {
            let closed = near.closed_form(t);
            let limit = nearer.single_dose(t);
            assert!(closed.is_finite());
            assert_relative_eq!(closed, limit, max_relative = 1e-4);
            assert_relative_eq!(nearer.single_dose(t), nearer.limiting_form(t), epsilon = 1e-15);
        }
    }

    #[test]
    fn test_equal_rates_stay_finite() {
        let model = OralModel::new(500.0, 50.0, 0.3, 0.3, 1.0);
        for i in 0..100 {
            assert!(model.single_dose(i as f64 * 0.5).is_finite());
        }
    }

    #[test]
    fn test_fast_absorption_approaches_bolus() {
        let model = OralModel::new(1000.0, 50.0, 0.1, 1e306, 1.0);
        assert_eq!(model.single_dose(0.0), 0.0);
        for t in [0.25, 1.0, 12.0, 48.0] {
            assert_relative_eq!(model.single_dose(t), 20.0 * (-0.1 * t).exp(), max_relative = 1e-12);
        }
        let peak = model.peak().unwrap();
        assert!(peak.time.is_finite() && peak.time > 0.0);
        assert!(peak.concentration.is_finite());
    }

    #[test]
    fn test_zero_bioavailability() {
        let model = OralModel::new(500.0, 50.0, 0.1, 1.0, 0.0);
        assert_eq!(model.single_dose(3.0), 0.0);
    }

    #[test]
    fn test_peak_matches_analytic_formula() {
        let model = OralModel::new(500.0, 50.0, 0.1, 0.5, 1.0);
        let peak = model.peak().unwrap();
        assert_relative_eq!(peak.time, 5.0_f64.ln() / 0.4, epsilon = 1e-12);
        assert!((peak.time - 4.02).abs() < 0.01);
        assert_relative_eq!(peak.concentration, model.single_dose(peak.time), epsilon = 1e-12);

        // Nothing on a fine grid rises above the analytic peak.
        for i in 0..2000 {
            assert!(model.single_dose(i as f64 * 0.01) <= peak.concentration + 1e-12);
        }
    }

    #[test]
    fn test_no_peak_when_absorption_not_faster() {
        assert!(OralModel::new(500.0, 50.0, 0.5, 0.1, 1.0).peak().is_none());
        assert!(OralModel::new(500.0, 50.0, 0.2, 0.2, 1.0).peak().is_none());
        assert!(OralModel::new(500.0, 50.0, 0.2, 0.2 + 1e-9, 1.0).peak().is_none());
    }
}
