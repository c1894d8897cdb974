/// Linear axis with "nice number" ticks and data→pixel mapping.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub label: String,
    pub ticks: Vec<f64>,
    pub tick_labels: Vec<String>,
}

impl Axis {
    pub fn linear(data_min: f64, data_max: f64, target_ticks: usize) -> Self {
        let (min, max, step) = nice_range(data_min, data_max, target_ticks);

        let mut ticks = Vec::new();
        let mut tick_labels = Vec::new();
        let n = ((max - min) / step).round() as usize;
        for i in 0..=n {
            let value = min + i as f64 * step;
            ticks.push(value);
            tick_labels.push(format_tick(value, step));
        }

        Self {
            min,
            max,
            label: String::new(),
            ticks,
            tick_labels,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let frac = (value - self.min) / (self.max - self.min);
        px_min + frac * (px_max - px_min)
    }
}

fn nice_range(data_min: f64, data_max: f64, target_ticks: usize) -> (f64, f64, f64) {
    if !(data_max - data_min).is_finite() || (data_max - data_min).abs() < 1e-12 {
        return (data_min.min(0.0), data_min.max(0.0) + 1.0, 0.2);
    }
    let rough = (data_max - data_min) / (target_ticks.max(2) - 1) as f64;
    let step = nice_step(rough);
    let min = (data_min / step).floor() * step;
    let max = (data_max / step).ceil() * step;
    (min, max, step)
}

fn nice_step(rough: f64) -> f64 {
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice * 10.0_f64.powf(exp)
}

fn format_tick(value: f64, step: f64) -> String {
    if step >= 1.0 {
        // avoid "-0"
        let value = if value.abs() < step * 0.01 { 0.0 } else { value };
        format!("{}", value.round() as i64)
    } else {
        let decimals = (-step.log10().floor()) as usize;
        format!("{:.prec$}", value, prec = decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_axis_covers_data() {
        let axis = Axis::linear(0.0, 48.0, 8);
        assert!(axis.min <= 0.0);
        assert!(axis.max >= 48.0);
        assert_eq!(axis.ticks.len(), axis.tick_labels.len());
        assert_eq!(axis.tick_labels[0], "0");
    }

    #[test]
    fn test_fractional_ticks() {
        let axis = Axis::linear(0.0, 0.8, 5);
        assert_relative_eq!(axis.ticks[1] - axis.ticks[0], 0.2, epsilon = 1e-12);
        assert_eq!(axis.tick_labels[1], "0.2");
    }

    #[test]
    fn test_flat_data_gets_a_unit_range() {
        let axis = Axis::linear(0.0, 0.0, 5);
        assert!(axis.max > axis.min);
    }

    #[test]
    fn test_data_to_pixel_maps_endpoints() {
        let axis = Axis::linear(0.0, 100.0, 5);
        assert_relative_eq!(axis.data_to_pixel(axis.min, 10.0, 510.0), 10.0);
        assert_relative_eq!(axis.data_to_pixel(axis.max, 10.0, 510.0), 510.0);
        // inverted pixel range for y axes
        assert_relative_eq!(axis.data_to_pixel(axis.max, 400.0, 0.0), 0.0);
    }
}
