use super::axis::Axis;
use super::canvas::{Anchor, Canvas, Color, LineStyle, Style, TextStyle};
use super::ChartRenderer;
use crate::config::ChartConfig;
use crate::error::{PKError, PKResult};
use crate::simulation::SimulationResult;

const CURVE: Color = Color::rgb(37, 99, 235);
const BAND: Color = Color::rgb(34, 197, 94);
const BAND_EDGE: Color = Color::rgb(22, 163, 74);
const STEADY: Color = Color::rgb(147, 51, 234);
const DOSE: Color = Color::rgb(148, 163, 184);
const PEAK: Color = Color::rgb(220, 38, 38);
const AXIS: Color = Color::rgb(51, 65, 85);
const GRID: Color = Color::rgb(226, 232, 240);
const TILE: Color = Color::rgb(248, 250, 252);

const MARGIN_LEFT: f64 = 72.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 52.0;
const MARGIN_BOTTOM: f64 = 140.0;

/// Concentration-time chart with the therapeutic band, dose markers and a
/// row of metric tiles underneath.
pub struct SvgChart {
    config: ChartConfig,
}

impl SvgChart {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    fn title(&self, result: &SimulationResult) -> String {
        if let Some(title) = &self.config.title {
            return title.clone();
        }
        let p = &result.parameters;
        if p.dose_count == 1 {
            format!("{} mg {}, single dose", fmt_num(p.dose), p.route)
        } else {
            format!(
                "{} mg {} every {} h, {} doses",
                fmt_num(p.dose),
                p.route,
                fmt_num(p.interval),
                p.dose_count
            )
        }
    }
}

impl ChartRenderer for SvgChart {
    fn render(&self, result: &SimulationResult) -> PKResult<String> {
        let width = self.config.width;
        let height = self.config.height;
        let left = MARGIN_LEFT;
        let right = width - MARGIN_RIGHT;
        let top = MARGIN_TOP;
        let bottom = height - MARGIN_BOTTOM;
        if right <= left || bottom <= top {
            return Err(PKError::Render(format!(
                "chart of {}x{} is too small for its margins",
                width, height
            )));
        }

        let params = &result.parameters;
        let metrics = &result.metrics;
        let band = params.band;
        let horizon = result.samples.last().map(|s| s.time).unwrap_or(0.0);

        let mut y_top = metrics.observed_cmax.max(band.min);
        if band.max.is_finite() {
            y_top = y_top.max(band.max);
        }
        let x_axis = Axis::linear(0.0, horizon, 9).with_label("Time (h)");
        let y_axis = Axis::linear(0.0, y_top * 1.1, 6).with_label("Concentration (mg/L)");
        let px = |t: f64| x_axis.data_to_pixel(t, left, right);
        let py = |c: f64| y_axis.data_to_pixel(c, bottom, top);

        let mut canvas = Canvas::new(width, height);

        let title_style = TextStyle {
            size: 16.0,
            bold: true,
            anchor: Anchor::Middle,
            ..Default::default()
        };
        canvas.text(width / 2.0, 28.0, &self.title(result), &title_style);

        draw_axes(&mut canvas, &x_axis, &y_axis, left, right, top, bottom);

        canvas.begin_clip(left, top, right - left, bottom - top);

        if self.config.show_band {
            let band_top = if band.max.is_finite() { py(band.max) } else { top };
            canvas.rect(
                left,
                band_top,
                right - left,
                py(band.min) - band_top,
                &Style::filled(BAND).with_opacity(0.12),
            );
            let edge = LineStyle::dashed(BAND_EDGE, 1.0);
            canvas.line(left, py(band.min), right, py(band.min), &edge);
            if band.max.is_finite() {
                canvas.line(left, py(band.max), right, py(band.max), &edge);
            }
        }

        if let Some(steady) = &metrics.steady_state {
            let x0 = px(steady.window_start);
            canvas.rect(x0, top, px(horizon) - x0, bottom - top, &Style::filled(STEADY).with_opacity(0.06));
            canvas.line(x0, py(steady.average), px(horizon), py(steady.average), &LineStyle::dashed(STEADY, 1.2));
        }

        if self.config.show_doses {
            for dose in &result.doses {
                canvas.line(px(dose.time), top, px(dose.time), bottom, &LineStyle::dotted(DOSE, 1.0));
            }
        }

        let points: Vec<(f64, f64)> = result
            .samples
            .iter()
            .map(|s| (px(s.time), py(s.concentration)))
            .collect();
        canvas.polyline(&points, &LineStyle::solid(CURVE, 2.0));

        if metrics.observed_cmax > 0.0 {
            canvas.circle(
                px(metrics.observed_tmax),
                py(metrics.observed_cmax),
                3.5,
                &Style::filled(PEAK).with_stroke(Color::rgb(255, 255, 255), 1.0),
            );
        }

        canvas.end_clip();

        if self.config.show_band {
            let label = TextStyle {
                size: 10.0,
                color: BAND_EDGE,
                anchor: Anchor::End,
                ..Default::default()
            };
            canvas.text(right - 4.0, py(band.min) - 4.0, &format!("MEC {}", fmt_num(band.min)), &label);
            if band.max.is_finite() && band.max <= y_axis.max {
                canvas.text(right - 4.0, py(band.max) - 4.0, &format!("MTC {}", fmt_num(band.max)), &label);
            }
        }

        if self.config.show_doses {
            let label = TextStyle {
                size: 9.0,
                color: DOSE,
                anchor: Anchor::Middle,
                ..Default::default()
            };
            // Labels crowd together past a couple dozen doses.
            if result.doses.len() <= 24 {
                for dose in &result.doses {
                    canvas.text(px(dose.time), top - 6.0, &format!("D{}", dose.number), &label);
                }
            }
        }

        draw_tiles(&mut canvas, result, left, right, height - 78.0);

        canvas
            .finish_svg()
            .map_err(|e| PKError::Render(e.to_string()))
    }
}

fn draw_axes(canvas: &mut Canvas, x_axis: &Axis, y_axis: &Axis, left: f64, right: f64, top: f64, bottom: f64) {
    let tick = TextStyle {
        size: 10.0,
        color: AXIS,
        anchor: Anchor::Middle,
        ..Default::default()
    };
    let grid = LineStyle::solid(GRID, 0.8);
    let axis = LineStyle::solid(AXIS, 1.0);

    for (value, label) in x_axis.ticks.iter().zip(&x_axis.tick_labels) {
        let x = x_axis.data_to_pixel(*value, left, right);
        canvas.line(x, top, x, bottom, &grid);
        canvas.line(x, bottom, x, bottom + 4.0, &axis);
        canvas.text(x, bottom + 16.0, label, &tick);
    }

    let y_tick = TextStyle {
        anchor: Anchor::End,
        ..tick.clone()
    };
    for (value, label) in y_axis.ticks.iter().zip(&y_axis.tick_labels) {
        let y = y_axis.data_to_pixel(*value, bottom, top);
        canvas.line(left, y, right, y, &grid);
        canvas.line(left - 4.0, y, left, y, &axis);
        canvas.text(left - 7.0, y + 3.5, label, &y_tick);
    }

    canvas.line(left, bottom, right, bottom, &axis);
    canvas.line(left, top, left, bottom, &axis);

    let label = TextStyle {
        size: 12.0,
        color: AXIS,
        anchor: Anchor::Middle,
        ..Default::default()
    };
    canvas.text((left + right) / 2.0, bottom + 34.0, &x_axis.label, &label);
    canvas.text_rotated(18.0, (top + bottom) / 2.0, &y_axis.label, &label, -90.0);
}

fn draw_tiles(canvas: &mut Canvas, result: &SimulationResult, left: f64, right: f64, y: f64) {
    let metrics = &result.metrics;
    let mut tiles = vec![
        ("Half-life".to_string(), format!("{:.2} h", metrics.half_life)),
        (
            "Tmax / Cmax".to_string(),
            match (metrics.peak_time, metrics.peak_concentration) {
                (Some(t), Some(c)) => format!("{:.2} h / {:.2}", t, c),
                _ => "n/a".to_string(),
            },
        ),
        ("AUC".to_string(), format!("{:.1} mg*h/L", metrics.auc)),
        ("In range".to_string(), format!("{:.1}%", metrics.percent_in_range)),
    ];
    tiles.push(match &metrics.steady_state {
        Some(steady) => (
            "Css avg (min-max)".to_string(),
            format!("{:.2} ({:.2}-{:.2})", steady.average, steady.min, steady.max),
        ),
        None => ("Steady state".to_string(), "not reached".to_string()),
    });

    let gap = 10.0;
    let tile_w = (right - left - gap * (tiles.len() - 1) as f64) / tiles.len() as f64;
    let tile_h = 56.0;
    let caption = TextStyle {
        size: 10.0,
        color: AXIS,
        ..Default::default()
    };
    let value = TextStyle {
        size: 13.0,
        bold: true,
        ..Default::default()
    };

    for (i, (name, text)) in tiles.iter().enumerate() {
        let x = left + i as f64 * (tile_w + gap);
        canvas.rect(x, y, tile_w, tile_h, &Style::filled(TILE).with_stroke(GRID, 1.0));
        canvas.text(x + 10.0, y + 20.0, name, &caption);
        canvas.text(x + 10.0, y + 42.0, text, &value);
    }
}

fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SteadyStatePolicy;
    use crate::models::Route;
    use crate::parameters::{SimulationParameters, TherapeuticBand};
    use crate::simulation::Simulator;

    fn simulate(params: SimulationParameters) -> SimulationResult {
        Simulator::new(params, 0.25, SteadyStatePolicy::default()).run()
    }

    #[test]
    fn test_chart_contains_curve_band_and_tiles() {
        let result = simulate(SimulationParameters::default());
        let svg = SvgChart::new(ChartConfig::default()).render(&result).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("MEC 5"));
        assert!(svg.contains("MTC 15"));
        assert!(svg.contains("D3"));
        assert!(svg.contains("Half-life"));
        assert!(svg.contains("500 mg IV bolus every 8 h, 3 doses"));
    }

    #[test]
    fn test_open_band_has_no_upper_line() {
        let result = simulate(SimulationParameters {
            route: Route::Oral,
            dose_count: 1,
            band: TherapeuticBand {
                min: 0.0,
                max: f64::INFINITY,
            },
            ..Default::default()
        });
        let svg = SvgChart::new(ChartConfig::default()).render(&result).unwrap();

        assert!(!svg.contains("MTC"));
        assert!(svg.contains("single dose"));
        assert!(!svg.contains("inf"));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn test_hidden_layers_and_custom_title() {
        let result = simulate(SimulationParameters::default());
        let config = ChartConfig {
            title: Some("Vancomycin <q8h>".to_string()),
            show_band: false,
            show_doses: false,
            ..Default::default()
        };
        let svg = SvgChart::new(config).render(&result).unwrap();

        assert!(svg.contains("Vancomycin &lt;q8h&gt;"));
        assert!(!svg.contains("MEC"));
        assert!(!svg.contains(">D1<"));
    }

    #[test]
    fn test_steady_state_reference_line() {
        let result = simulate(SimulationParameters {
            dose_count: 10,
            ..Default::default()
        });
        assert!(result.metrics.steady_state.is_some());
        let svg = SvgChart::new(ChartConfig::default()).render(&result).unwrap();
        assert!(svg.contains("Css avg"));
        assert!(svg.contains("#9333ea"));
    }

    #[test]
    fn test_too_small_chart_is_rejected() {
        let result = simulate(SimulationParameters::default());
        let config = ChartConfig {
            width: 50.0,
            height: 50.0,
            ..Default::default()
        };
        assert!(matches!(
            SvgChart::new(config).render(&result),
            Err(PKError::Render(_))
        ));
    }
}
