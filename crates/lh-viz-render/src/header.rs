use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::primitives::*;

/// Height reserved above the panels for the figure title and subtitle.
pub fn header_height(config: &VizConfig, has_subtitle: bool) -> f64 {
    let mut h = config.font.title_size + 14.0;
    if has_subtitle {
        h += config.font.tick_size + 6.0;
    }
    h
}

/// Figure title centred over the canvas, with an optional grey subtitle
/// (interval method, sample counts).
pub fn draw_figure_title(canvas: &mut Canvas, title: &str, subtitle: Option<&str>, config: &VizConfig) {
    let cx = canvas.width / 2.0;
    let y = config.font.title_size + 6.0;
    let title_style = TextStyle {
        size: config.font.title_size,
        color: config.colors.frame,
        weight: FontWeight::Bold,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Alphabetic,
    };
    canvas.text(cx, y, title, &title_style);

    if let Some(sub) = subtitle.filter(|s| !s.is_empty()) {
        let sub_style = TextStyle {
            size: config.font.tick_size,
            color: config.colors.annotation,
            anchor: TextAnchor::Middle,
            ..Default::default()
        };
        canvas.text(cx, y + config.font.tick_size + 6.0, sub, &sub_style);
    }
}
