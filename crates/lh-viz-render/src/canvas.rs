use crate::color::Color;
use crate::primitives::*;
use crate::text::{measure_text, TextMetrics};

/// An SVG element stored for deferred rendering.
#[derive(Debug, Clone)]
enum SvgElement {
    Rect { x: f64, y: f64, w: f64, h: f64, style: Style },
    Line { x1: f64, y1: f64, x2: f64, y2: f64, style: LineStyle },
    Polyline { points: Vec<(f64, f64)>, style: LineStyle },
    Text { x: f64, y: f64, content: String, style: TextStyle, rotate: Option<f64> },
    Circle { cx: f64, cy: f64, r: f64, style: Style },
}

/// Immediate-mode SVG canvas. Coordinates in points (1pt = 1/72").
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    font_family: String,
    elements: Vec<SvgElement>,
}

impl Canvas {
    pub fn new(width: f64, height: f64, font_family: &str) -> crate::Result<Self> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(crate::RenderError::Layout(format!(
                "canvas size must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height, font_family: font_family.to_string(), elements: Vec::new() })
    }

    // --- Drawing primitives ---

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        self.elements.push(SvgElement::Rect { x, y, w, h, style: style.clone() });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        self.elements.push(SvgElement::Line { x1, y1, x2, y2, style: style.clone() });
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        if points.len() < 2 {
            return;
        }
        self.elements.push(SvgElement::Polyline { points: points.to_vec(), style: style.clone() });
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.elements.push(SvgElement::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: None,
        });
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        self.elements.push(SvgElement::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: Some(angle),
        });
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) {
        self.elements.push(SvgElement::Circle { cx, cy, r, style: style.clone() });
    }

    /// Error bar: vertical line + optional horizontal caps.
    pub fn error_bar(&mut self, x: f64, y_lo: f64, y_hi: f64, cap_width: f64, style: &LineStyle) {
        self.line(x, y_lo, x, y_hi, style);
        if cap_width > 0.0 {
            let half = cap_width / 2.0;
            self.line(x - half, y_lo, x + half, y_lo, style);
            self.line(x - half, y_hi, x + half, y_hi, style);
        }
    }

    /// Horizontal error bar.
    pub fn error_bar_h(&mut self, x_lo: f64, x_hi: f64, y: f64, cap_height: f64, style: &LineStyle) {
        self.line(x_lo, y, x_hi, y, style);
        if cap_height > 0.0 {
            let half = cap_height / 2.0;
            self.line(x_lo, y - half, x_lo, y + half, style);
            self.line(x_hi, y - half, x_hi, y + half, style);
        }
    }

    /// Filled data marker.
    pub fn marker(&mut self, x: f64, y: f64, marker: &MarkerStyle) {
        let style = Style {
            fill: Some(marker.color),
            stroke: Some(Color::rgb(255, 255, 255)),
            stroke_width: 0.6,
        };
        match marker.shape {
            MarkerShape::Circle => self.circle(x, y, marker.size, &style),
            MarkerShape::Square => {
                let s = marker.size * 0.9;
                self.rect(x - s, y - s, 2.0 * s, 2.0 * s, &style);
            }
        }
    }

    // --- Text measurement ---

    pub fn measure_text(&self, content: &str, style: &TextStyle) -> TextMetrics {
        measure_text(content, style)
    }

    // --- SVG output ---

    pub fn finish_svg(&self) -> String {
        let mut out = String::with_capacity(32 * 1024);
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = self.width,
            h = self.height,
        ));
        out.push_str(&format!(
            "<rect width=\"{}\" height=\"{}\" fill=\"white\" />\n",
            self.width, self.height
        ));
        for elem in &self.elements {
            self.render_element(&mut out, elem);
        }
        out.push_str("</svg>\n");
        out
    }

    fn render_element(&self, out: &mut String, elem: &SvgElement) {
        match elem {
            SvgElement::Rect { x, y, w, h, style } => {
                out.push_str(&format!(
                    r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#
                ));
                write_style_attrs(out, style);
                out.push_str(" />\n");
            }
            SvgElement::Line { x1, y1, x2, y2, style } => {
                out.push_str(&format!(
                    r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#
                ));
                write_line_attrs(out, style);
                out.push_str(" />\n");
            }
            SvgElement::Polyline { points, style } => {
                let pts: Vec<String> = points.iter().map(|(x, y)| format!("{x:.2},{y:.2}")).collect();
                out.push_str(&format!(r#"<polyline points="{}" fill="none""#, pts.join(" ")));
                write_line_attrs(out, style);
                out.push_str(" />\n");
            }
            SvgElement::Text { x, y, content, style, rotate } => {
                out.push_str(&format!(
                    r#"<text x="{x:.2}" y="{y:.2}" font-family="{}" font-size="{:.1}" fill="{}" text-anchor="{}" dominant-baseline="{}""#,
                    self.font_family,
                    style.size,
                    style.color.to_svg_fill(),
                    style.anchor.as_str(),
                    style.baseline.as_str(),
                ));
                if style.weight == FontWeight::Bold {
                    out.push_str(r#" font-weight="bold""#);
                }
                if let Some(angle) = rotate {
                    out.push_str(&format!(r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#));
                }
                out.push('>');
                out.push_str(&escape_xml(content));
                out.push_str("</text>\n");
            }
            SvgElement::Circle { cx, cy, r, style } => {
                out.push_str(&format!(r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}""#));
                write_style_attrs(out, style);
                out.push_str(" />\n");
            }
        }
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_style_attrs(out: &mut String, style: &Style) {
    match &style.fill {
        Some(fill) => out.push_str(&format!(r#" fill="{}""#, fill.to_svg_fill())),
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(stroke) = &style.stroke {
        out.push_str(&format!(
            r#" stroke="{}" stroke-width="{:.2}""#,
            stroke.to_svg_fill(),
            style.stroke_width
        ));
    }
}

fn write_line_attrs(out: &mut String, style: &LineStyle) {
    out.push_str(&format!(
        r#" stroke="{}" stroke-width="{:.2}""#,
        style.color.to_svg_fill(),
        style.width
    ));
    if let Some(dash) = &style.dash {
        out.push_str(&format!(r#" stroke-dasharray="{dash}""#));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_canvas() {
        let c = Canvas::new(100.0, 50.0, "sans-serif").unwrap();
        let svg = c.finish_svg();
        assert!(svg.contains("width=\"100\""));
        assert!(svg.contains("height=\"50\""));
        assert!(svg.ends_with("</svg>\n"));
        assert!(Canvas::new(0.0, 50.0, "sans-serif").is_err());
    }

    #[test]
    fn text_is_escaped() {
        let mut c = Canvas::new(200.0, 100.0, "DejaVu Sans, sans-serif").unwrap();
        c.text(10.0, 20.0, "Replication & <Contributions>", &TextStyle::default());
        let svg = c.finish_svg();
        assert!(svg.contains("Replication &amp; &lt;Contributions&gt;"));
        assert!(svg.contains("font-family=\"DejaVu Sans, sans-serif\""));
    }

    #[test]
    fn markers_and_caps() {
        let mut c = Canvas::new(200.0, 100.0, "sans-serif").unwrap();
        c.error_bar(50.0, 80.0, 20.0, 10.0, &LineStyle::solid(Color::hex("#e41a1c"), 1.0));
        c.marker(50.0, 50.0, &MarkerStyle { shape: MarkerShape::Square, ..Default::default() });
        c.line(0.0, 10.0, 200.0, 10.0, &LineStyle::dashed(Color::rgb(0, 0, 0), 0.8));
        // A single point draws nothing.
        c.polyline(&[(1.0, 1.0)], &LineStyle::solid(Color::rgb(0, 0, 0), 1.0));
        let svg = c.finish_svg();
        assert_eq!(svg.matches("<line").count(), 4);
        assert_eq!(svg.matches("stroke-dasharray=\"6 3\"").count(), 1);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(!svg.contains("<polyline"));
        assert!(!svg.contains("opacity="));
    }
}
