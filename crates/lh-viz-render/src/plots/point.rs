use lh_viz::pointplot::{CiMethod, PointPlotArtifact};

use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::header::{draw_figure_title, header_height};
use crate::layout::axes::Axis;
use crate::layout::legend::{draw_legend, legend_size, LegendEntry};
use crate::layout::multi_panel::PanelRow;
use crate::plots::axes_draw::{draw_axes, AxisLabels};
use crate::primitives::*;
use crate::text::measure_text;

/// One panel per facet: group means joined per hue, with capped interval
/// bars. Panels share the y axis; the legend sits right of the last panel.
pub fn render(artifact: &PointPlotArtifact, config: &VizConfig) -> crate::Result<String> {
    let n_panels = artifact.panels.len();
    if n_panels == 0 {
        return Err(crate::RenderError::Layout(format!(
            "point plot '{}' has no panels",
            artifact.meta.title
        )));
    }

    let (lo, hi) = artifact
        .panels
        .iter()
        .flat_map(|p| &p.series)
        .flat_map(|s| &s.points)
        .flat_map(|p| [p.ci_lower, p.ci_upper, p.mean])
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let (lo, hi) = if lo.is_finite() { (lo, hi) } else { (0.0, 1.0) };
    let y_axis = Axis::auto_linear(lo, hi, 6).with_label(&artifact.outcome);
    let x_axis = Axis::categorical(&artifact.x_labels).with_label(&artifact.x_title);

    let palette = config.palette_colors(&artifact.palette);
    if palette.is_empty() {
        return Err(crate::RenderError::Layout("empty palette".into()));
    }
    let entries: Vec<LegendEntry> = artifact
        .hue_labels
        .iter()
        .enumerate()
        .map(|(i, label)| LegendEntry {
            label: label.clone(),
            color: palette[i % palette.len()],
            shape: MarkerShape::cycle(i),
        })
        .collect();

    // Margins from label extents.
    let tick_style = TextStyle { size: config.font.tick_size, ..Default::default() };
    let widest_tick = y_axis
        .tick_labels
        .iter()
        .map(|l| measure_text(l, &tick_style).width)
        .fold(0.0_f64, f64::max);
    let left = 15.0 + config.axes.tick_length + widest_tick + config.font.label_size + 16.0;
    let panel_title_h = config.font.label_size + 10.0;
    let top = header_height(config, true) + panel_title_h;
    let bottom = config.axes.tick_length + config.font.tick_size + config.font.label_size + 30.0;
    let (legend_w, _) = legend_size(&artifact.hue_title, &entries, config.font.size);

    let fig = &config.figure;
    let row = PanelRow::new(n_panels, left, top, fig.panel_width, fig.panel_height, fig.panel_gap);
    let width = row.right() + 20.0 + legend_w + 15.0;
    let height = top + fig.panel_height + bottom;
    let mut canvas = Canvas::new(width, height, &config.font.family)?;

    let subtitle = format!(
        "{}; {} rows excluded for missing values",
        describe_ci(&artifact.ci, artifact.confidence),
        artifact.n_excluded
    );
    draw_figure_title(&mut canvas, &artifact.meta.title, Some(&subtitle), config);

    let panel_title_style = TextStyle {
        size: config.font.label_size,
        color: config.colors.frame,
        anchor: TextAnchor::Middle,
        ..Default::default()
    };
    let n_hue = artifact.hue_labels.len().max(1);
    let pts = &config.points;

    for (k, (panel, area)) in artifact.panels.iter().zip(&row.panels).enumerate() {
        let labels = AxisLabels { y_ticks: k == 0, y_title: k == 0, x_title: true };
        draw_axes(&mut canvas, area, &x_axis, &y_axis, labels, config);
        canvas.text(
            area.left + area.width / 2.0,
            area.top - 8.0,
            &format!("{} = {}", artifact.facet_name, panel.facet),
            &panel_title_style,
        );

        let unit = x_axis.unit_pixels(area.left, area.right());
        for (hi, series) in panel.series.iter().enumerate() {
            let entry = &entries[hi % entries.len().max(1)];
            let offset = pts.dodge * (hi as f64 - (n_hue as f64 - 1.0) / 2.0);
            let line = LineStyle::solid(entry.color, pts.line_width);
            let coords: Vec<(f64, f64, f64, f64)> = series
                .points
                .iter()
                .map(|p| {
                    (
                        x_axis.data_to_pixel(p.x as f64 + offset, area.left, area.right()),
                        y_axis.data_to_pixel(p.mean, area.bottom(), area.top),
                        y_axis.data_to_pixel(p.ci_lower, area.bottom(), area.top),
                        y_axis.data_to_pixel(p.ci_upper, area.bottom(), area.top),
                    )
                })
                .collect();

            let path: Vec<(f64, f64)> = coords.iter().map(|&(x, y, _, _)| (x, y)).collect();
            canvas.polyline(&path, &line);
            for &(x, y, y_lo, y_hi) in &coords {
                canvas.error_bar(x, y_lo, y_hi, pts.capsize * unit, &line);
                canvas.marker(
                    x,
                    y,
                    &MarkerStyle { shape: entry.shape, size: pts.marker_size, color: entry.color },
                );
            }
        }
    }

    draw_legend(
        &mut canvas,
        row.right() + 20.0,
        top + 10.0,
        &artifact.hue_title,
        &entries,
        config.font.size,
        false,
    );
    Ok(canvas.finish_svg())
}

fn describe_ci(ci: &CiMethod, confidence: f64) -> String {
    let level = format!("{:.0}%", confidence * 100.0);
    match ci {
        CiMethod::Normal => format!("{} normal-approximation intervals", level),
        CiMethod::Bootstrap { n_boot, .. } => {
            format!("{} bootstrap intervals ({} resamples)", level, n_boot)
        }
    }
}
