use super::ImageExporter;
use crate::config::ExportFormat;
use crate::error::{PKError, PKResult};
use log::debug;

pub fn exporter_for(format: ExportFormat) -> PKResult<Box<dyn ImageExporter>> {
    match format {
        ExportFormat::Svg => Ok(Box::new(SvgExporter)),
        #[cfg(feature = "png")]
        ExportFormat::Png => Ok(Box::new(PngExporter::default())),
        #[cfg(not(feature = "png"))]
        ExportFormat::Png => Err(PKError::Export(
            "PNG export is not available in this build (enable the `png` feature)".to_string(),
        )),
    }
}

fn ensure_target(chart: &str) -> PKResult<()> {
    if chart.trim().is_empty() {
        return Err(PKError::Export("nothing to export: chart is empty".to_string()));
    }
    Ok(())
}

/// Writes the chart markup unchanged. Vector output has no resolution, so
/// the scale factor is ignored.
pub struct SvgExporter;

impl ImageExporter for SvgExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Svg
    }

    fn export(&self, chart: &str, scale: f64) -> PKResult<Vec<u8>> {
        ensure_target(chart)?;
        debug!("Exporting SVG ({} bytes, scale {} ignored)", chart.len(), scale);
        Ok(chart.as_bytes().to_vec())
    }
}

/// Rasterizes the chart with resvg on a white background.
#[cfg(feature = "png")]
#[derive(Default)]
pub struct PngExporter;

#[cfg(feature = "png")]
impl ImageExporter for PngExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Png
    }

    fn export(&self, chart: &str, scale: f64) -> PKResult<Vec<u8>> {
        use resvg::{tiny_skia, usvg};

        ensure_target(chart)?;

        let mut opt = usvg::Options::default();
        opt.fontdb_mut().load_system_fonts();
        let tree = usvg::Tree::from_str(chart, &opt).map_err(|e| PKError::Export(e.to_string()))?;

        let scale = scale as f32;
        let size = tree.size();
        let width = (size.width() * scale).ceil() as u32;
        let height = (size.height() * scale).ceil() as u32;
        debug!("Rasterizing chart at {}x{} px", width, height);

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| PKError::Export(format!("cannot allocate a {}x{} image", width, height)))?;
        pixmap.fill(tiny_skia::Color::WHITE);

        resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

        pixmap.encode_png().map_err(|e| PKError::Export(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20"><rect width="40" height="20" fill="white" /></svg>"#;

    #[test]
    fn test_svg_export_passes_markup_through() {
        let exporter = exporter_for(ExportFormat::Svg).unwrap();
        assert_eq!(exporter.format(), ExportFormat::Svg);
        assert_eq!(exporter.export(CHART, 2.0).unwrap(), CHART.as_bytes());
    }

    #[test]
    fn test_empty_chart_is_rejected() {
        let exporter = SvgExporter;
        assert!(matches!(exporter.export("  \n", 1.0), Err(PKError::Export(_))));
    }

    #[cfg(not(feature = "png"))]
    #[test]
    fn test_png_unavailable_without_feature() {
        assert!(matches!(exporter_for(ExportFormat::Png), Err(PKError::Export(_))));
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_png_export_scales_output() {
        let bytes = PngExporter.export(CHART, 2.0).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        // IHDR width and height, big-endian
        assert_eq!(u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]), 80);
        assert_eq!(u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]), 40);
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_png_export_rejects_invalid_markup() {
        assert!(matches!(PngExporter.export("<svg", 1.0), Err(PKError::Export(_))));
    }
}
