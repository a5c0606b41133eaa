use lh_viz::coefficients::CoefficientArtifact;

use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::header::{draw_figure_title, header_height};
use crate::layout::axes::Axis;
use crate::layout::multi_panel::PlotArea;
use crate::plots::axes_draw::draw_frame;
use crate::primitives::*;

/// One row per model: estimate marker with a ±1.96·SE whisker, and a dashed
/// reference line at zero.
pub fn render(artifact: &CoefficientArtifact, config: &VizConfig) -> crate::Result<String> {
    let entries = &artifact.entries;
    let n = entries.len();
    if n == 0 {
        return Ok(empty_svg());
    }

    let row_h = 28.0;
    let fig_w = config.figure.width;
    let top = header_height(config, false) + 8.0;
    let fig_h = (top + row_h * n as f64 + 60.0).max(200.0);
    let mut canvas = Canvas::new(fig_w, fig_h, &config.font.family)?;

    let label_style = TextStyle {
        size: config.font.tick_size,
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    let label_w = entries
        .iter()
        .map(|e| canvas.measure_text(&e.label, &label_style).width)
        .fold(0.0_f64, f64::max)
        + 10.0;

    let area = PlotArea::new(label_w + 15.0, top, fig_w - label_w - 30.0, row_h * n as f64);
    draw_figure_title(&mut canvas, &artifact.meta.title, None, config);

    // Always keep zero in view.
    let lo = entries.iter().map(|e| e.lower).fold(0.0_f64, f64::min);
    let hi = entries.iter().map(|e| e.upper).fold(0.0_f64, f64::max);
    let pad = (hi - lo).max(1e-6) * 0.25;
    let x_axis = Axis::auto_linear(lo - pad, hi + pad, 6).with_label(&artifact.regressor);
    let px = |v: f64| x_axis.data_to_pixel(v, area.left, area.right());

    if config.grid.show {
        let grid = LineStyle::solid(config.grid.color.with_alpha(config.grid.alpha), 0.6);
        for &t in &x_axis.tick_positions {
            canvas.line(px(t), area.top, px(t), area.bottom(), &grid);
        }
    }
    canvas.line(px(0.0), area.top, px(0.0), area.bottom(), &LineStyle::dashed(config.colors.reference_line, 0.8));

    let palette = config.palette_colors("deep");
    let val_style = TextStyle {
        size: config.font.tick_size * 0.85,
        color: config.colors.annotation,
        anchor: TextAnchor::Start,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    for (i, entry) in entries.iter().enumerate() {
        let y = area.top + (i as f64 + 0.5) * row_h;
        let color = palette[i % palette.len().max(1)];

        canvas.text(area.left - 5.0, y, &entry.label, &label_style);
        canvas.error_bar_h(px(entry.lower), px(entry.upper), y, 6.0, &LineStyle::solid(color, 1.5));
        canvas.marker(px(entry.estimate), y, &MarkerStyle { color, size: 3.5, ..Default::default() });
        canvas.text(
            px(entry.upper) + 6.0,
            y,
            &format!("{:.4} \u{00B1} {:.4}", entry.estimate, entry.std_error),
            &val_style,
        );
    }

    // x ticks along the bottom spine
    let tick_label = TextStyle {
        size: config.font.tick_size,
        color: config.colors.frame,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };
    for (t, label) in x_axis.tick_positions.iter().zip(&x_axis.tick_labels) {
        let x = px(*t);
        canvas.line(x, area.bottom(), x, area.bottom() + config.axes.tick_length, &LineStyle::solid(config.colors.frame, 0.6));
        canvas.text(x, area.bottom() + config.axes.tick_length + 3.0, label, &tick_label);
    }
    canvas.text(
        area.left + area.width / 2.0,
        area.bottom() + config.axes.tick_length + config.font.tick_size + 18.0,
        &x_axis.label,
        &TextStyle {
            size: config.font.label_size,
            anchor: TextAnchor::Middle,
            ..Default::default()
        },
    );

    draw_frame(&mut canvas, &area, config);
    Ok(canvas.finish_svg())
}

fn empty_svg() -> String {
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="160" height="50"><text x="10" y="30">No coefficient data</text></svg>"#.into()
}
