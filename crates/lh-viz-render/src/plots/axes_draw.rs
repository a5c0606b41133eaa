use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::multi_panel::PlotArea;
use crate::primitives::*;

/// Which labels a panel draws. Panels sharing a y axis only label the first.
#[derive(Debug, Clone, Copy)]
pub struct AxisLabels {
    pub y_ticks: bool,
    pub y_title: bool,
    pub x_title: bool,
}

impl AxisLabels {
    pub const ALL: AxisLabels = AxisLabels { y_ticks: true, y_title: true, x_title: true };
}

/// Draw spines, ticks, horizontal grid and axis titles for one panel.
pub fn draw_axes(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    labels: AxisLabels,
    config: &VizConfig,
) {
    let frame_color = config.colors.frame;
    let tick_style_line = LineStyle::solid(frame_color, 0.6);
    let inward = config.axes.tick_direction == "in";
    let tl = config.axes.tick_length;

    // Grid first so spines and data sit on top.
    if config.grid.show {
        let grid_style = LineStyle::solid(config.grid.color.with_alpha(config.grid.alpha), 0.6);
        for &val in &y_axis.tick_positions {
            let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
            if py >= area.top - 0.5 && py <= area.bottom() + 0.5 {
                canvas.line(area.left, py, area.right(), py, &grid_style);
            }
        }
    }

    draw_frame(canvas, area, config);

    let tick_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };

    // --- X axis ticks ---
    for (i, &val) in x_axis.tick_positions.iter().enumerate() {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if px < area.left - 0.5 || px > area.right() + 0.5 {
            continue;
        }
        let dir = if inward { -1.0 } else { 1.0 };
        canvas.line(px, area.bottom(), px, area.bottom() + dir * tl, &tick_style_line);
        if config.axes.show_top_ticks {
            canvas.line(px, area.top, px, area.top - dir * tl, &tick_style_line);
        }
        if let Some(label) = x_axis.tick_labels.get(i) {
            let label_y = if inward { area.bottom() + 3.0 } else { area.bottom() + tl + 3.0 };
            canvas.text(px, label_y, label, &tick_label_style);
        }
    }

    // --- Y axis ticks ---
    let y_tick_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    for (i, &val) in y_axis.tick_positions.iter().enumerate() {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if py < area.top - 0.5 || py > area.bottom() + 0.5 {
            continue;
        }
        let dir = if inward { 1.0 } else { -1.0 };
        canvas.line(area.left, py, area.left + dir * tl, py, &tick_style_line);
        if config.axes.show_right_ticks {
            canvas.line(area.right(), py, area.right() - dir * tl, py, &tick_style_line);
        }
        if labels.y_ticks {
            if let Some(label) = y_axis.tick_labels.get(i) {
                let label_x = if inward { area.left - 4.0 } else { area.left - tl - 4.0 };
                canvas.text(label_x, py, label, &y_tick_label_style);
            }
        }
    }

    // --- Axis titles ---
    let label_style = TextStyle {
        size: config.font.label_size,
        color: frame_color,
        anchor: TextAnchor::Middle,
        ..Default::default()
    };
    if labels.x_title && !x_axis.label.is_empty() {
        let label_y = area.bottom() + tl + config.font.tick_size + 16.0;
        canvas.text(area.left + area.width / 2.0, label_y, &x_axis.label, &label_style);
    }
    if labels.y_title && !y_axis.label.is_empty() {
        let widest = y_axis
            .tick_labels
            .iter()
            .map(|l| canvas.measure_text(l, &y_tick_label_style).width)
            .fold(0.0_f64, f64::max);
        let label_x = area.left - tl - widest - 12.0;
        let label_y = area.top + area.height / 2.0;
        canvas.text_rotated(label_x, label_y, &y_axis.label, &label_style, -90.0);
    }
}

/// Spines only. Despined themes keep the left and bottom ones.
pub fn draw_frame(canvas: &mut Canvas, area: &PlotArea, config: &VizConfig) {
    let style = LineStyle::solid(config.colors.frame, 0.8);
    canvas.line(area.left, area.bottom(), area.right(), area.bottom(), &style);
    canvas.line(area.left, area.top, area.left, area.bottom(), &style);
    if !config.axes.despine {
        canvas.line(area.left, area.top, area.right(), area.top, &style);
        canvas.line(area.right(), area.top, area.right(), area.bottom(), &style);
    }
}
