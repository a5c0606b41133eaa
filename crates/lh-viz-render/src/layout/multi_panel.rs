/// Data region of one panel, in canvas points.
#[derive(Debug, Clone, Copy)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Y of the x axis; pixel y grows downward.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Equal-width panels side by side, sharing one y axis.
#[derive(Debug, Clone)]
pub struct PanelRow {
    pub panels: Vec<PlotArea>,
}

impl PanelRow {
    pub fn new(n: usize, left: f64, top: f64, panel_width: f64, height: f64, gap: f64) -> Self {
        let panels = (0..n)
            .map(|i| PlotArea::new(left + i as f64 * (panel_width + gap), top, panel_width, height))
            .collect();
        Self { panels }
    }

    /// Right edge of the last panel.
    pub fn right(&self) -> f64 {
        self.panels.last().map(|p| p.right()).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panels_tile_left_to_right() {
        let row = PanelRow::new(4, 50.0, 30.0, 100.0, 200.0, 10.0);
        assert_eq!(row.panels.len(), 4);
        assert!((row.panels[1].left - 160.0).abs() < 1e-9);
        assert!((row.right() - 480.0).abs() < 1e-9);
    }

    #[test]
    fn panels_share_top_and_bottom() {
        let row = PanelRow::new(3, 0.0, 25.0, 80.0, 150.0, 5.0);
        for p in &row.panels {
            assert_eq!(p.top, 25.0);
            assert!((p.bottom() - 175.0).abs() < 1e-9);
        }
        assert_eq!(PanelRow::new(0, 0.0, 0.0, 80.0, 150.0, 5.0).right(), 0.0);
    }
}
