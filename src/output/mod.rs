pub mod axis;
pub mod canvas;
pub mod chart;
pub mod export;

use crate::config::{ExportConfig, ExportFormat};
use crate::dosing::DoseEvent;
use crate::error::PKResult;
use crate::models::Route;
use crate::parameters::SimulationParameters;
use crate::simulation::{Metrics, Sample, SimulationResult};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

pub use chart::SvgChart;
pub use export::exporter_for;

/// Turns a finished run into chart markup.
pub trait ChartRenderer {
    fn render(&self, result: &SimulationResult) -> PKResult<String>;
}

/// Turns chart markup into the bytes of an image file.
pub trait ImageExporter {
    fn format(&self) -> ExportFormat;
    fn export(&self, chart: &str, scale: f64) -> PKResult<Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    generated_at: DateTime<Utc>,
    parameters: &'a SimulationParameters,
    doses: &'a [DoseEvent],
    metrics: &'a Metrics,
}

pub fn save_results<P: AsRef<Path>>(result: &SimulationResult, output_dir: P) -> PKResult<()> {
    let output_path = output_dir.as_ref();

    save_samples(&result.samples, output_path.join("samples.csv"))?;
    save_metrics(result, output_path.join("metrics.json"))?;
    generate_report(result, output_path)?;

    info!("Results saved to {:?}", output_path);
    Ok(())
}

/// Renders the chart and writes it as `<filename>.<ext>` in `output_dir`.
pub fn export_chart<P: AsRef<Path>>(
    result: &SimulationResult,
    renderer: &dyn ChartRenderer,
    exporter: &dyn ImageExporter,
    config: &ExportConfig,
    output_dir: P,
) -> PKResult<PathBuf> {
    let chart = renderer.render(result)?;
    let bytes = exporter.export(&chart, config.scale)?;

    let path = output_dir
        .as_ref()
        .join(format!("{}.{}", config.filename, exporter.format().extension()));
    std::fs::write(&path, bytes)?;

    info!("Chart exported to {:?}", path);
    Ok(path)
}

fn save_samples<P: AsRef<Path>>(samples: &[Sample], path: P) -> PKResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "TIME",
        "CONCENTRATION",
        "THERAPEUTIC_MIN",
        "THERAPEUTIC_MAX",
        "IN_RANGE",
        "STATUS",
    ])?;

    for sample in samples {
        writer.write_record(&[
            sample.time.to_string(),
            sample.concentration.to_string(),
            sample.therapeutic_min.to_string(),
            sample.therapeutic_max.to_string(),
            sample.in_range.to_string(),
            sample.status.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_metrics<P: AsRef<Path>>(result: &SimulationResult, path: P) -> PKResult<()> {
    let summary = RunSummary {
        generated_at: Utc::now(),
        parameters: &result.parameters,
        doses: &result.doses,
        metrics: &result.metrics,
    };

    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &summary)?;
    Ok(())
}

fn or_na(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.3} {}", v, unit),
        None => "n/a".to_string(),
    }
}

/// Markdown summary of one run.
pub fn generate_report<P: AsRef<Path>>(result: &SimulationResult, output_dir: P) -> PKResult<()> {
    let report_path = output_dir.as_ref().join("report.md");
    let p = &result.parameters;
    let m = &result.metrics;
    let end = result.samples.last().map_or(0.0, |s| s.time);

    let oral = match p.route {
        Route::Oral => format!(
            "- **Absorption rate (ka)**: {} 1/h\n- **Bioavailability (F)**: {}\n",
            p.ka, p.bioavailability
        ),
        Route::Intravenous => String::new(),
    };

    let steady_state = match &m.steady_state {
        Some(ss) => format!(
            "- Window: {:.2} h to {:.2} h\n- Average: {:.3} mg/L\n- Minimum: {:.3} mg/L\n- Maximum: {:.3} mg/L",
            ss.window_start,
            end,
            ss.average,
            ss.min,
            ss.max
        ),
        None => "Not reached within the simulated horizon.".to_string(),
    };

    let band_max = if p.band.max.is_finite() {
        format!("{} mg/L", p.band.max)
    } else {
        "no upper bound".to_string()
    };

    let report_content = format!(
        r#"# Pharmacokinetic Simulation Report

Generated {}

## Regimen
- **Route**: {}
- **Dose**: {} mg x {} every {} h
- **Volume of distribution**: {} L
- **Elimination rate (ke)**: {} 1/h
{}- **Therapeutic window**: {} mg/L to {}

## Metrics
- **Half-life**: {:.3} h
- **Tmax (analytic)**: {}
- **Cmax (analytic)**: {}
- **Observed Cmax**: {:.3} mg/L at {:.2} h
- **AUC (0-{} h)**: {:.3} mg*h/L
- **Time in therapeutic range**: {:.1}%

## Steady State
{}

## Files Generated
- `samples.csv`: concentration-time samples with therapeutic status
- `metrics.json`: parameters, dose times and metrics
"#,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        p.route,
        p.dose,
        p.dose_count,
        p.interval,
        p.volume,
        p.ke,
        oral,
        p.band.min,
        band_max,
        m.half_life,
        or_na(m.peak_time, "h"),
        or_na(m.peak_concentration, "mg/L"),
        m.observed_cmax,
        m.observed_tmax,
        end,
        m.auc,
        m.percent_in_range,
        steady_state,
    );

    std::fs::write(report_path, report_content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChartConfig, SteadyStatePolicy};
    use crate::error::PKError;
    use crate::parameters::TherapeuticBand;
    use crate::simulation::Simulator;

    fn simulate(params: SimulationParameters) -> SimulationResult {
        Simulator::new(params, 0.25, SteadyStatePolicy::default()).run()
    }

    #[test]
    fn test_save_results_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = simulate(SimulationParameters::default());
        save_results(&result, dir.path()).unwrap();

        let mut reader = csv::Reader::from_path(dir.path().join("samples.csv")).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 6);
        assert_eq!(&headers[0], "TIME");
        assert_eq!(&headers[5], "STATUS");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), result.samples.len());
        assert_eq!(&rows[0][0], "0");
        assert_eq!(&rows[0][4], "true");
        assert_eq!(&rows[0][5], "therapeutic");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("metrics.json")).unwrap()).unwrap();
        assert!(json["generated_at"].is_string());
        assert_eq!(json["parameters"]["route"], "intravenous");
        assert_eq!(json["doses"].as_array().unwrap().len(), 3);
        assert!(json["metrics"]["peak_time"].is_null());

        let report = std::fs::read_to_string(dir.path().join("report.md")).unwrap();
        assert!(report.contains("**Route**: IV bolus"));
        assert!(report.contains("**Tmax (analytic)**: n/a"));
    }

    #[test]
    fn test_report_for_oral_open_band() {
        let dir = tempfile::tempdir().unwrap();
        let result = simulate(SimulationParameters {
            route: Route::Oral,
            ka: 0.5,
            dose_count: 1,
            band: TherapeuticBand {
                min: 0.0,
                max: f64::INFINITY,
            },
            ..Default::default()
        });
        generate_report(&result, dir.path()).unwrap();

        let report = std::fs::read_to_string(dir.path().join("report.md")).unwrap();
        assert!(report.contains("Bioavailability"));
        assert!(report.contains("no upper bound"));
        assert!(report.contains("**Tmax (analytic)**: 4.024 h"));
        assert!(report.contains("Not reached"));
    }

    #[test]
    fn test_export_chart_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = simulate(SimulationParameters::default());
        let config = ExportConfig {
            filename: "regimen".to_string(),
            ..Default::default()
        };

        let renderer = SvgChart::new(ChartConfig::default());
        let exporter = exporter_for(ExportFormat::Svg).unwrap();
        let path = export_chart(&result, &renderer, exporter.as_ref(), &config, dir.path()).unwrap();

        assert_eq!(path, dir.path().join("regimen.svg"));
        assert!(std::fs::read_to_string(path).unwrap().contains("<polyline"));
    }

    struct BlankRenderer;

    impl ChartRenderer for BlankRenderer {
        fn render(&self, _result: &SimulationResult) -> PKResult<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_export_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = simulate(SimulationParameters::default());
        let config = ExportConfig::default();
        let exporter = exporter_for(ExportFormat::Svg).unwrap();

        let outcome = export_chart(&result, &BlankRenderer, exporter.as_ref(), &config, dir.path());
        assert!(matches!(outcome, Err(PKError::Export(_))));
        assert!(!dir.path().join("pk_chart.svg").exists());
    }
}
