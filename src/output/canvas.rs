use std::fmt::{self, Write as FmtWrite};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_svg(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Fill + stroke style for rectangles and paths.
#[derive(Debug, Clone)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
        }
    }
}

impl Style {
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Default::default()
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f64) -> Self {
        self.stroke = Some(color);
        self.stroke_width = width;
        self
    }
}

#[derive(Debug, Clone)]
pub struct LineStyle {
    pub color: Color,
    pub width: f64,
    pub dash: Option<&'static str>,
}

impl LineStyle {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: Some("6 3"),
        }
    }

    pub fn dotted(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: Some("2 3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(&self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub size: f64,
    pub color: Color,
    pub anchor: Anchor,
    pub bold: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 11.0,
            color: Color::rgb(0, 0, 0),
            anchor: Anchor::Start,
            bold: false,
        }
    }
}

#[derive(Debug, Clone)]
enum Element {
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        style: Style,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        style: LineStyle,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        style: LineStyle,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        style: Style,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        style: TextStyle,
        rotate: Option<f64>,
    },
    Clipped {
        clip_id: String,
        children: Vec<Element>,
    },
}

/// Deferred-mode SVG canvas. Coordinates are in user units, origin top-left.
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    elements: Vec<Element>,
    clips: Vec<(String, f64, f64, f64, f64)>,
    open_clip: Option<(String, Vec<Element>)>,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
            clips: Vec::new(),
            open_clip: None,
        }
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        self.push(Element::Rect {
            x,
            y,
            w,
            h,
            style: style.clone(),
        });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        self.push(Element::Line {
            x1,
            y1,
            x2,
            y2,
            style: style.clone(),
        });
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        if points.len() < 2 {
            return;
        }
        self.push(Element::Polyline {
            points: points.to_vec(),
            style: style.clone(),
        });
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) {
        self.push(Element::Circle {
            cx,
            cy,
            r,
            style: style.clone(),
        });
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.push(Element::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: None,
        });
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        self.push(Element::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: Some(angle),
        });
    }

    /// Everything drawn until `end_clip` is clipped to the given rectangle.
    pub fn begin_clip(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.end_clip();
        let id = format!("clip{}", self.clips.len());
        self.clips.push((id.clone(), x, y, w, h));
        self.open_clip = Some((id, Vec::new()));
    }

    pub fn end_clip(&mut self) {
        if let Some((clip_id, children)) = self.open_clip.take() {
            self.elements.push(Element::Clipped { clip_id, children });
        }
    }

    fn push(&mut self, element: Element) {
        match &mut self.open_clip {
            Some((_, children)) => children.push(element),
            None => self.elements.push(element),
        }
    }

    pub fn finish_svg(mut self) -> Result<String, fmt::Error> {
        self.end_clip();

        let mut out = String::with_capacity(64 * 1024);
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        )?;

        if !self.clips.is_empty() {
            out.push_str("<defs>\n");
            for (id, x, y, w, h) in &self.clips {
                writeln!(
                    out,
                    r#"<clipPath id="{id}"><rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" /></clipPath>"#
                )?;
            }
            out.push_str("</defs>\n");
        }

        writeln!(out, r#"<rect width="{}" height="{}" fill="white" />"#, self.width, self.height)?;

        for element in &self.elements {
            render_element(&mut out, element)?;
        }

        out.push_str("</svg>\n");
        Ok(out)
    }
}

fn render_element(out: &mut String, element: &Element) -> fmt::Result {
    match element {
        Element::Rect { x, y, w, h, style } => {
            write!(out, r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#)?;
            write_style(out, style)?;
            out.push_str(" />\n");
        }
        Element::Line { x1, y1, x2, y2, style } => {
            write!(out, r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#)?;
            write_line_style(out, style)?;
            out.push_str(" />\n");
        }
        Element::Polyline { points, style } => {
            out.push_str(r#"<polyline points=""#);
            for (i, (x, y)) in points.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write!(out, "{x:.2},{y:.2}")?;
            }
            out.push_str(r#"" fill="none""#);
            write_line_style(out, style)?;
            out.push_str(" />\n");
        }
        Element::Circle { cx, cy, r, style } => {
            write!(out, r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}""#)?;
            write_style(out, style)?;
            out.push_str(" />\n");
        }
        Element::Text {
            x,
            y,
            content,
            style,
            rotate,
        } => {
            write!(out, r#"<text x="{x:.2}" y="{y:.2}""#)?;
            write!(out, r#" font-family="sans-serif" font-size="{:.1}""#, style.size)?;
            write!(out, r#" fill="{}" text-anchor="{}""#, style.color.to_svg(), style.anchor.as_str())?;
            if style.bold {
                out.push_str(r#" font-weight="bold""#);
            }
            if let Some(angle) = rotate {
                write!(out, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#)?;
            }
            out.push('>');
            escape_into(out, content);
            out.push_str("</text>\n");
        }
        Element::Clipped { clip_id, children } => {
            writeln!(out, r#"<g clip-path="url(#{clip_id})">"#)?;
            for child in children {
                render_element(out, child)?;
            }
            out.push_str("</g>\n");
        }
    }
    Ok(())
}

fn write_style(out: &mut String, style: &Style) -> fmt::Result {
    match &style.fill {
        Some(fill) => write!(out, r#" fill="{}""#, fill.to_svg())?,
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(stroke) = &style.stroke {
        write!(out, r#" stroke="{}" stroke-width="{:.2}""#, stroke.to_svg(), style.stroke_width)?;
    }
    if (style.opacity - 1.0).abs() > 1e-4 {
        write!(out, r#" opacity="{:.3}""#, style.opacity)?;
    }
    Ok(())
}

fn write_line_style(out: &mut String, style: &LineStyle) -> fmt::Result {
    write!(out, r#" stroke="{}" stroke-width="{:.2}""#, style.color.to_svg(), style.width)?;
    if let Some(dash) = style.dash {
        write!(out, r#" stroke-dasharray="{dash}""#)?;
    }
    Ok(())
}

fn escape_into(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_canvas() {
        let svg = Canvas::new(100.0, 50.0).finish_svg().unwrap();
        assert!(svg.contains(r#"width="100""#));
        assert!(svg.contains(r#"height="50""#));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut canvas = Canvas::new(200.0, 100.0);
        canvas.text(10.0, 20.0, "AUC <0-24> & more", &TextStyle::default());
        let svg = canvas.finish_svg().unwrap();
        assert!(svg.contains("AUC &lt;0-24&gt; &amp; more"));
    }

    #[test]
    fn test_clipped_elements_are_grouped() {
        let mut canvas = Canvas::new(200.0, 100.0);
        canvas.begin_clip(10.0, 10.0, 50.0, 50.0);
        canvas.line(0.0, 0.0, 100.0, 100.0, &LineStyle::dashed(Color::rgb(255, 0, 0), 1.0));
        canvas.end_clip();
        let svg = canvas.finish_svg().unwrap();

        assert!(svg.contains(r#"<clipPath id="clip0">"#));
        assert!(svg.contains(r#"<g clip-path="url(#clip0)">"#));
        assert!(svg.contains(r##"stroke="#ff0000""##));
        assert!(svg.contains(r#"stroke-dasharray="6 3""#));
    }

    #[test]
    fn test_single_point_polyline_is_skipped() {
        let mut canvas = Canvas::new(200.0, 100.0);
        canvas.polyline(&[(1.0, 1.0)], &LineStyle::solid(Color::rgb(0, 0, 0), 1.0));
        assert!(!canvas.finish_svg().unwrap().contains("<polyline"));
    }
}
