use crate::canvas::Canvas;
use crate::color::Color;
use crate::primitives::*;
use crate::text::measure_text;

pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub shape: MarkerShape,
}

/// Size of a legend box, so callers can reserve room for it.
pub fn legend_size(title: &str, entries: &[LegendEntry], font_size: f64) -> (f64, f64) {
    let (text_style, title_style) = styles(font_size);
    let max_w = entries
        .iter()
        .map(|e| measure_text(&e.label, &text_style).width)
        .fold(measure_text(title, &title_style).width - SWATCH_W - GAP, f64::max);
    let rows = entries.len() + usize::from(!title.is_empty());
    (PADDING + SWATCH_W + GAP + max_w + PADDING, PADDING + rows as f64 * (font_size + 4.0) + PADDING)
}

const SWATCH_W: f64 = 16.0;
const GAP: f64 = 6.0;
const PADDING: f64 = 6.0;

fn styles(font_size: f64) -> (TextStyle, TextStyle) {
    let text = TextStyle { size: font_size * 0.9, baseline: TextBaseline::Central, ..Default::default() };
    let title = TextStyle { weight: FontWeight::Bold, ..text.clone() };
    (text, title)
}

/// Draw a legend with its top-left corner at (`x`, `y`): an optional title,
/// then one marker-and-line swatch per entry.
pub fn draw_legend(
    canvas: &mut Canvas,
    x: f64,
    y: f64,
    title: &str,
    entries: &[LegendEntry],
    font_size: f64,
    frame: bool,
) {
    if entries.is_empty() {
        return;
    }
    let (w, h) = legend_size(title, entries, font_size);
    let row_height = font_size + 4.0;
    let (text_style, title_style) = styles(font_size);

    let bg_style = Style {
        fill: Some(Color::rgba(255, 255, 255, 0.9)),
        stroke: if frame { Some(Color::rgb(200, 200, 200)) } else { None },
        stroke_width: 0.5,
    };
    canvas.rect(x, y, w, h, &bg_style);

    let mut row = 0usize;
    if !title.is_empty() {
        canvas.text(x + PADDING, y + PADDING + row_height / 2.0, title, &title_style);
        row += 1;
    }
    for entry in entries {
        let ey = y + PADDING + row as f64 * row_height + row_height / 2.0;
        let sx = x + PADDING;
        canvas.line(sx, ey, sx + SWATCH_W, ey, &LineStyle::solid(entry.color, 1.5));
        canvas.marker(
            sx + SWATCH_W / 2.0,
            ey,
            &MarkerStyle { shape: entry.shape, color: entry.color, size: 3.0 },
        );
        canvas.text(sx + SWATCH_W + GAP, ey, &entry.label, &text_style);
        row += 1;
    }
}
